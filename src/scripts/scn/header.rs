//! Size header and choice offset table of an SCN script.
//!
//! The file starts with a u32 LE `total_size` counting the bytes after a
//! fixed `size_offset` (`file_length - total_size`). When `size_offset` is
//! larger than 12, records of 36 bytes fill `12..size_offset`; the u32 LE at
//! byte 32 of each record points at the file tag marker of one choice,
//! relative to `size_offset`.
use super::marker::FILE_TAG_MARKER;
use super::segment::Segment;
use crate::ext::io::*;
use crate::types::SegmentKind;
use anyhow::Result;

pub const CHOICE_TABLE_START: u32 = 12;
pub const CHOICE_RECORD_SIZE: u32 = 36;
pub const CHOICE_OFFSET_FIELD: u32 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScnHeader {
    pub size_offset: u32,
}

impl ScnHeader {
    pub fn read(data: &[u8]) -> Result<Self> {
        let total_size = data
            .peek_u32_at(0)
            .map_err(|e| anyhow::anyhow!("Failed to read size header: {}", e))?;
        let size_offset = u32::try_from(data.len())
            .ok()
            .and_then(|len| len.checked_sub(total_size))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Size header {} does not fit a file of {} bytes",
                    total_size,
                    data.len()
                )
            })?;
        Ok(ScnHeader { size_offset })
    }
}

/// What [fix_header] changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderFix {
    /// Only the size header was rewritten; the file has no choice table.
    SizeOnly,
    /// Size header and all table records were rewritten.
    Table(usize),
    /// The table did not match the file tags found, so it was left alone.
    TableSkipped { expected: usize, found: usize },
}

/// Rewrites the size header and the choice offset table of `data`, which
/// must be the concatenation of `segments`.
pub fn fix_header(
    filename: &str,
    data: &mut [u8],
    size_offset: u32,
    segments: &[Segment],
) -> Result<HeaderFix> {
    let len = u32::try_from(data.len())
        .map_err(|_| anyhow::anyhow!("{}: file is too large", filename))?;
    let total_size = len.checked_sub(size_offset).ok_or_else(|| {
        anyhow::anyhow!(
            "{}: file of {} bytes is shorter than its header ({} bytes)",
            filename,
            len,
            size_offset
        )
    })?;
    data.write_u32_at(0, total_size)?;
    if size_offset <= CHOICE_TABLE_START {
        return Ok(HeaderFix::SizeOnly);
    }
    if (size_offset - CHOICE_TABLE_START) % CHOICE_RECORD_SIZE != 0 {
        tracing::warn!(
            "{}: header size {} is not a whole number of choice records",
            filename,
            size_offset
        );
        crate::COUNTER.inc_warning();
    }
    let expected = ((size_offset - CHOICE_TABLE_START) / CHOICE_RECORD_SIZE) as usize;

    let mut pos = 0usize;
    let mut choice_pos = Vec::new();
    for s in segments {
        if s.kind() == SegmentKind::FileTag {
            choice_pos.push(pos);
        }
        pos += s.len();
    }
    if choice_pos.len() != expected {
        tracing::warn!(
            "{}: header suggests there should be {} choices, but found {} in file",
            filename,
            expected,
            choice_pos.len()
        );
        crate::COUNTER.inc_warning();
        return Ok(HeaderFix::TableSkipped {
            expected,
            found: choice_pos.len(),
        });
    }

    for (i, p) in choice_pos.iter().enumerate() {
        let offset = (*p as u64)
            .checked_sub(size_offset as u64 + FILE_TAG_MARKER.len() as u64)
            .and_then(|o| u32::try_from(o).ok())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "{}: file tag {} at {:#x} lies inside the header",
                    filename,
                    i,
                    p
                )
            })?;
        let field = CHOICE_TABLE_START + CHOICE_RECORD_SIZE * i as u32 + CHOICE_OFFSET_FIELD;
        data.write_u32_at(field as usize, offset)?;
    }
    Ok(HeaderFix::Table(expected))
}

#[cfg(test)]
mod tests {
    use super::super::segment::{combine_segments, split_segments};
    use super::*;

    /// A file whose header holds one choice record and whose file tag
    /// payload starts at offset 100.
    fn one_choice_file() -> Vec<u8> {
        let mut data = vec![0u8; 48];
        data.resize(97, 0x11);
        data.extend_from_slice(&FILE_TAG_MARKER);
        data.extend_from_slice(b"2_1.scn\0");
        data.extend_from_slice(&[0x22; 8]);
        let total = (data.len() - 48) as u32;
        data[..4].copy_from_slice(&total.to_le_bytes());
        data
    }

    #[test]
    fn test_read_header() {
        let data = one_choice_file();
        let header = ScnHeader::read(&data).unwrap();
        assert_eq!(header.size_offset, 48);
        assert!(ScnHeader::read(&[1, 0]).is_err());
        assert!(ScnHeader::read(&[0xff, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_fix_table() {
        let data = one_choice_file();
        let segments = split_segments(&data).unwrap();
        let mut segments: Vec<_> = segments
            .iter()
            .map(|s| {
                if s.kind() == SegmentKind::FileTag {
                    s.with_data(b"2_1b.scn".to_vec())
                } else {
                    s.clone()
                }
            })
            .collect();
        // Grow the body in front of the file tag by 5 bytes.
        let mut grown = segments[0].data().to_vec();
        grown.extend_from_slice(&[0x33; 5]);
        segments[0] = Segment::structural(grown);
        let mut out = combine_segments(&segments);
        let fix = fix_header("a.scn", &mut out, 48, &segments).unwrap();
        assert_eq!(fix, HeaderFix::Table(1));
        assert_eq!(out.peek_u32_at(0).unwrap(), (out.len() - 48) as u32);
        // Payload moved from 100 to 105.
        assert_eq!(out.peek_u32_at(12 + 32).unwrap(), 105 - 48 - 3);
    }

    #[test]
    fn test_fix_table_in_place() {
        let data = one_choice_file();
        let segments = split_segments(&data).unwrap();
        let mut out = combine_segments(&segments);
        fix_header("a.scn", &mut out, 48, &segments).unwrap();
        assert_eq!(out.peek_u32_at(12 + 32).unwrap(), 100 - 48 - 3);
        assert_eq!(out.peek_u32_at(0).unwrap(), (data.len() - 48) as u32);
    }

    #[test]
    fn test_count_mismatch_skips_table() {
        let mut data = vec![0u8; 84];
        data.extend_from_slice(&FILE_TAG_MARKER);
        data.extend_from_slice(b"x.scn\0");
        let segments = split_segments(&data).unwrap();
        let before = data.clone();
        let fix = fix_header("b.scn", &mut data, 84, &segments).unwrap();
        assert_eq!(
            fix,
            HeaderFix::TableSkipped {
                expected: 2,
                found: 1
            }
        );
        assert_eq!(data[4..], before[4..]);
        assert_eq!(data.peek_u32_at(0).unwrap(), 9);
    }

    #[test]
    fn test_uneven_header_rounds_down() {
        // 38 bytes of table: one whole record plus two stray bytes.
        let mut data = vec![0u8; 50];
        data.resize(97, 0x11);
        data.extend_from_slice(&FILE_TAG_MARKER);
        data.extend_from_slice(b"x.scn\0");
        let segments = split_segments(&data).unwrap();
        let before = crate::COUNTER.warnings();
        let fix = fix_header("n.scn", &mut data, 50, &segments).unwrap();
        assert_eq!(fix, HeaderFix::Table(1));
        assert!(crate::COUNTER.warnings() > before);
        assert_eq!(data.peek_u32_at(12 + 32).unwrap(), 100 - 50 - 3);
        assert_eq!(data.peek_u32_at(0).unwrap(), (data.len() - 50) as u32);
    }

    #[test]
    fn test_small_header() {
        let mut data = vec![0u8; 20];
        let segments = split_segments(&data).unwrap();
        assert_eq!(
            fix_header("c.scn", &mut data, 12, &segments).unwrap(),
            HeaderFix::SizeOnly
        );
        assert_eq!(data.peek_u32_at(0).unwrap(), 8);
        assert!(fix_header("c.scn", &mut data, 30, &segments).is_err());
    }
}
