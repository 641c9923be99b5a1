//! Byte level fixes applied around the text substitution.
use super::marker::FILE_TAG_MARKER;
use crate::utils::pattern::BytePattern;
use anyhow::Result;

lazy_static::lazy_static! {
    /// Speech bubble directives. Removed from reflowed files because the
    /// bubbles do not fit translated text.
    static ref BUBBLE_PATTERNS: [BytePattern; 3] = [
        BytePattern::new(
            "f0 45 f2 ?? ?? ?? ?? f2 ?? ?? ?? ?? f2 ?? ?? ?? ?? f2 ?? ?? ?? ??"
        ).unwrap(),
        BytePattern::new("f0 46 f2 ?? ?? ?? ?? f0 20").unwrap(),
        BytePattern::new("f0 46 f2 07 00 00 00").unwrap(),
    ];
    /// Route change jump: `f2`, u32 LE offset, file tag marker.
    static ref ROUTE_CHANGE_PATTERN: BytePattern =
        BytePattern::new("f2 ?? ?? ?? ?? f0 1a f1").unwrap();
}

/// Deletes speech bubble directives. Each pattern is applied once over the
/// whole buffer, in order.
pub fn remove_bubbles(data: &[u8]) -> Vec<u8> {
    let mut data = data.to_vec();
    for pat in BUBBLE_PATTERNS.iter() {
        data = pat.remove_all(&data);
    }
    data
}

/// Shifts the offsets embedded in route change jumps by `size_diff`, the
/// growth of the whole file. They are measured like the size header and
/// must move with it.
pub fn fix_route_change(filename: &str, data: &[u8], size_diff: i64) -> Result<Vec<u8>> {
    let mut error = None;
    let out = ROUTE_CHANGE_PATTERN.replace_all(data, |m| {
        let mut offset = [0u8; 4];
        offset.copy_from_slice(&m[1..5]);
        let old = u32::from_le_bytes(offset);
        let new = match u32::try_from(old as i64 + size_diff) {
            Ok(v) => v,
            Err(_) => {
                if error.is_none() {
                    error = Some(anyhow::anyhow!(
                        "{}: route change offset {:#x} cannot move by {}",
                        filename,
                        old,
                        size_diff
                    ));
                }
                old
            }
        };
        tracing::debug!(
            "{}: updating route change offset from {:#x} to {:#x}",
            filename,
            old,
            new
        );
        let mut out = Vec::with_capacity(m.len());
        out.push(m[0]);
        out.extend_from_slice(&new.to_le_bytes());
        out.extend_from_slice(&FILE_TAG_MARKER);
        out
    });
    match error {
        Some(e) => Err(e),
        None => Ok(out),
    }
}

#[test]
fn test_remove_bubbles() {
    let mut data = vec![0x01];
    data.extend_from_slice(&[0xf0, 0x45, 0xf2, 1, 2, 3, 4, 0xf2, 5, 6, 7, 8]);
    data.extend_from_slice(&[0xf2, 9, 9, 9, 9, 0xf2, 0, 0, 0, 0]);
    data.push(0x02);
    data.extend_from_slice(&[0xf0, 0x46, 0xf2, 0xaa, 0xbb, 0xcc, 0xdd, 0xf0, 0x20]);
    data.push(0x03);
    data.extend_from_slice(&[0xf0, 0x46, 0xf2, 0x07, 0, 0, 0]);
    data.extend_from_slice(&[0xf0, 0x46, 0xf2, 0x08, 0, 0, 0]);
    let cleaned = remove_bubbles(&data);
    assert_eq!(
        cleaned,
        vec![0x01, 0x02, 0x03, 0xf0, 0x46, 0xf2, 0x08, 0, 0, 0]
    );
    assert_eq!(remove_bubbles(&cleaned), cleaned);
}

#[test]
fn test_fix_route_change() {
    let mut data = vec![0x00, 0xf2];
    data.extend_from_slice(&0x100u32.to_le_bytes());
    data.extend_from_slice(&FILE_TAG_MARKER);
    data.extend_from_slice(b"4_9_8.scn\0");
    let fixed = fix_route_change("4_9_7.scn", &data, -0x10).unwrap();
    assert_eq!(fixed.len(), data.len());
    assert_eq!(&fixed[2..6], &0xf0u32.to_le_bytes());
    assert_eq!(&fixed[6..], &data[6..]);
    let fixed = fix_route_change("4_9_7.scn", &data, 0x20).unwrap();
    assert_eq!(&fixed[2..6], &0x120u32.to_le_bytes());
    assert!(fix_route_change("4_9_7.scn", &data, -0x101).is_err());
    assert_eq!(fix_route_change("4_9_7.scn", b"none", 5).unwrap(), b"none");
}
