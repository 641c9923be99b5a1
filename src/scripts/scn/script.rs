use super::header::{HeaderFix, ScnHeader, fix_header};
use super::marker::{TERMINATOR, text_marker};
use super::patch::{fix_route_change, remove_bubbles};
use super::segment::*;
use crate::format::fmt_message;
use crate::scripts::base::*;
use crate::types::*;
use crate::utils::encoding::*;
use crate::utils::escape::*;
use anyhow::Result;
use std::collections::HashMap;

#[derive(Debug)]
pub struct ScnScriptBuilder {}

impl ScnScriptBuilder {
    pub fn new() -> Self {
        ScnScriptBuilder {}
    }
}

impl ScriptBuilder for ScnScriptBuilder {
    fn default_encoding(&self) -> Encoding {
        Encoding::Cp932
    }

    fn build_script(
        &self,
        buf: Vec<u8>,
        filename: &str,
        encoding: Encoding,
        config: &ExtraConfig,
    ) -> Result<Box<dyn Script>> {
        Ok(Box::new(ScnScript::new(buf, filename, encoding, config)))
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["scn"]
    }

    fn script_type(&self) -> &'static ScriptType {
        &ScriptType::Scn
    }
}

/// Raw segments sharing one translation key, in encounter order.
struct Slots {
    key: String,
    kind: SegmentKind,
    index: u32,
    positions: Vec<usize>,
}

fn group_slots(filename: &str, segments: &[Segment]) -> Vec<Slots> {
    let mut groups: Vec<Slots> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();
    for (i, s) in segments.iter().enumerate() {
        let key = match s.key(filename) {
            Some(key) => key,
            None => continue,
        };
        match by_key.get(&key) {
            Some(&g) => groups[g].positions.push(i),
            None => {
                by_key.insert(key.clone(), groups.len());
                groups.push(Slots {
                    key,
                    kind: s.kind(),
                    index: s.index(),
                    positions: vec![i],
                });
            }
        }
    }
    groups
}

/// Spreads the encoded parts of a logical line over its slots. Parts beyond
/// the last slot are appended to it; for dialog lines they are separated by
/// a terminator and the line's own marker so that they form new
/// continuation slots.
fn distribute_parts(
    kind: SegmentKind,
    index: u32,
    parts: Vec<Vec<u8>>,
    slot_count: usize,
) -> Vec<Vec<u8>> {
    let mut parts = parts.into_iter();
    let mut result = Vec::with_capacity(slot_count);
    for _ in 1..slot_count {
        result.push(parts.next().unwrap_or_default());
    }
    let mut last = parts.next().unwrap_or_default();
    for extra in parts {
        if kind == SegmentKind::Text {
            last.push(TERMINATOR);
            last.extend_from_slice(&text_marker(index));
        } else {
            last.extend_from_slice(SCRIPT_NEWLINE.as_bytes());
        }
        last.extend(extra);
    }
    result.push(last);
    result
}

/// Fits a replacement into a slot whose size must not change.
///
/// A shorter payload is padded with spaces up to the slot size. A longer
/// one is rejected with a warning and `None` is returned, so the slot keeps
/// its original bytes.
pub fn fit_strict_slot(
    filename: &str,
    key: &str,
    original: &[u8],
    mut payload: Vec<u8>,
) -> Option<Vec<u8>> {
    if payload.len() > original.len() {
        tracing::warn!(
            "{}: translation for {} (len: {}) is too long for the original line (len: {}) in strict size mode",
            filename,
            key,
            payload.len(),
            original.len()
        );
        crate::COUNTER.inc_warning();
        return None;
    }
    payload.resize(original.len(), b' ');
    Some(payload)
}

#[derive(Debug)]
pub struct ScnScript {
    filename: String,
    data: Vec<u8>,
    encoding: Encoding,
    policy: FilePolicy,
    wrap_width: usize,
}

impl ScnScript {
    pub fn new(data: Vec<u8>, filename: &str, encoding: Encoding, config: &ExtraConfig) -> Self {
        let filename = crate::utils::files::base_name(filename);
        let policy = config.policy.for_file(&filename);
        ScnScript {
            filename,
            data,
            encoding,
            policy,
            wrap_width: config.wrap_width,
        }
    }

    /// Segments of the script as stored on disk.
    pub fn segments(&self) -> Result<Vec<Segment>> {
        split_segments(&self.data)
    }

    /// Wraps, splits and encodes a translated logical line.
    fn encode_parts(&self, key: &str, text: &str) -> Result<Vec<Vec<u8>>> {
        let text = fmt_message(text, self.default_format_type());
        split_continuations(&text)
            .into_iter()
            .map(|part| {
                encode_string(self.encoding, &escape_script_newlines(part), true)
                    .map_err(|e| anyhow::anyhow!("{}: {}: {}", self.filename, key, e))
            })
            .collect()
    }

    /// Returns a new segment list with translations swapped in.
    fn substitute(&self, segments: &[Segment], lines: &LineMap) -> Result<Vec<Segment>> {
        let mut out = segments.to_vec();
        for slots in group_slots(&self.filename, segments) {
            let text = match lines.get(&slots.key) {
                Some(text) => text,
                None => continue,
            };
            let parts = self.encode_parts(&slots.key, text)?;
            if parts.len() < slots.positions.len() {
                tracing::debug!(
                    "{}: {} has {} slots but only {} parts, clearing the rest",
                    self.filename,
                    slots.key,
                    slots.positions.len(),
                    parts.len()
                );
            }
            let payloads =
                distribute_parts(slots.kind, slots.index, parts, slots.positions.len());
            for (&pos, payload) in slots.positions.iter().zip(payloads) {
                let original = &segments[pos];
                let payload = if self.policy.strict_size {
                    match fit_strict_slot(&self.filename, &slots.key, original.data(), payload) {
                        Some(p) => p,
                        None => continue,
                    }
                } else {
                    payload
                };
                out[pos] = original.with_data(payload);
            }
        }
        Ok(out)
    }
}

impl Script for ScnScript {
    fn default_format_type(&self) -> FormatOptions {
        if self.policy.strict_size {
            FormatOptions::None
        } else {
            FormatOptions::WordWrap {
                width: self.wrap_width,
            }
        }
    }

    fn extract_records(&self) -> Result<Vec<TranslationRecord>> {
        let segments = self.segments()?;
        let mut records = Vec::new();
        for slots in group_slots(&self.filename, &segments) {
            let texts: Vec<String> = slots
                .positions
                .iter()
                .map(|&p| decode_text(self.encoding, segments[p].data()))
                .collect();
            if slots.positions.len() > 1 {
                tracing::debug!(
                    "{}: {} is split over {} slots",
                    self.filename,
                    slots.key,
                    slots.positions.len()
                );
            }
            records.push(TranslationRecord {
                filename: self.filename.clone(),
                key: slots.key,
                index: slots.index as usize,
                length: slots.positions.iter().map(|&p| segments[p].len()).sum(),
                original_text: unescape_script_newlines(&join_continuations(&texts)),
                ..Default::default()
            });
        }
        Ok(records)
    }

    fn import_lines(&self, lines: &LineMap) -> Result<Vec<u8>> {
        let header = ScnHeader::read(&self.data)
            .map_err(|e| anyhow::anyhow!("{}: {}", self.filename, e))?;
        let data = if self.policy.strict_size {
            self.data.clone()
        } else {
            remove_bubbles(&self.data)
        };
        let segments = split_segments(&data)
            .map_err(|e| anyhow::anyhow!("{}: {}", self.filename, e))?;
        let segments = self.substitute(&segments, lines)?;
        let mut out = combine_segments(&segments);
        match fix_header(&self.filename, &mut out, header.size_offset, &segments)? {
            HeaderFix::SizeOnly => {}
            HeaderFix::Table(count) => {
                tracing::debug!("{}: rewrote {} choice offsets", self.filename, count)
            }
            HeaderFix::TableSkipped { .. } => {
                tracing::info!(
                    "{}: choice table kept as is, choices may jump to wrong places",
                    self.filename
                )
            }
        }
        if self.policy.route_fix {
            let diff = out.len() as i64 - self.data.len() as i64;
            out = fix_route_change(&self.filename, &out, diff)?;
        }
        if tracing::enabled!(tracing::Level::DEBUG) {
            match split_segments(&out) {
                Ok(segs) => tracing::debug!(
                    "{} segments:\n{}",
                    self.filename,
                    dump_segments(&segs, self.encoding)
                ),
                Err(e) => tracing::debug!("{}: cannot dump output: {}", self.filename, e),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::super::marker::*;
    use super::*;
    use crate::ext::io::Peek;

    /// Builds a script with a 12 byte header and the given body.
    fn script_file(body: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; 12];
        data.extend_from_slice(body);
        let total = (data.len() - 12) as u32;
        data[..4].copy_from_slice(&total.to_le_bytes());
        data
    }

    fn text_line(index: u32, text: &[u8]) -> Vec<u8> {
        let mut out = text_marker(index).to_vec();
        out.extend_from_slice(text);
        out.push(0);
        out
    }

    fn config(policy: ScnPolicy) -> ExtraConfig {
        ExtraConfig {
            policy,
            wrap_width: 50,
            replace_name_brackets: true,
        }
    }

    fn build(data: Vec<u8>, name: &str, policy: ScnPolicy) -> ScnScript {
        ScnScript::new(data, name, Encoding::Cp932, &config(policy))
    }

    #[test]
    fn test_extract_records() {
        let line = encode_string(Encoding::Cp932, "こんにちは\\Nせかい", true).unwrap();
        let body = [text_line(0, &line), text_line(1, b"plain")].concat();
        let script = build(script_file(&body), "dir/1_1.scn", ScnPolicy::empty());
        let records = script.extract_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].filename, "1_1.scn");
        assert_eq!(records[0].key, "1_1.scn-text-0");
        assert_eq!(records[0].original_text, "こんにちは\nせかい");
        assert_eq!(records[0].length, 18);
        assert_eq!(records[1].key, "1_1.scn-text-1");
        assert_eq!(records[1].original_text, "plain");
        assert_eq!(records[1].length, 5);
    }

    #[test]
    fn test_extract_merges_continuations() {
        let body = [
            text_line(0, b"first"),
            text_line(0, b"second"),
            text_line(1, b"third"),
        ]
        .concat();
        let script = build(script_file(&body), "a.scn", ScnPolicy::empty());
        let records = script.extract_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].original_text, "first\n~~~~\nsecond");
        assert_eq!(records[0].length, 11);
        assert_eq!(records[1].original_text, "third");
    }

    #[test]
    fn test_continuation_round_trip() {
        let body = [
            text_line(0, b"first\\Nline"),
            text_line(0, b"second"),
            text_line(1, b"third"),
        ]
        .concat();
        let data = script_file(&body);
        let script = build(data.clone(), "a.scn", ScnPolicy::empty());
        let mut lines = LineMap::new();
        for r in script.extract_records().unwrap() {
            lines.insert(r.key, r.original_text);
        }
        assert_eq!(script.import_lines(&lines).unwrap(), data);
    }

    #[test]
    fn test_import_replaces_and_fixes_size() {
        let body = [text_line(0, b"short"), vec![0xaa, 0xbb]].concat();
        let data = script_file(&body);
        let script = build(data.clone(), "a.scn", ScnPolicy::empty());
        let mut lines = LineMap::new();
        lines.insert("a.scn-text-0".to_string(), "a longer line".to_string());
        let out = script.import_lines(&lines).unwrap();
        assert_eq!(out.len(), data.len() + 8);
        assert_eq!(out.peek_u32_at(0).unwrap(), (out.len() - 12) as u32);
        assert_eq!(&out[17..30], b"a longer line");
        assert_eq!(&out[30..], &[0, 0xaa, 0xbb]);
    }

    #[test]
    fn test_import_wraps_and_splits() {
        let body = text_line(0, b"x");
        let data = script_file(&body);
        let script = ScnScript::new(
            data,
            "a.scn",
            Encoding::Cp932,
            &ExtraConfig {
                policy: ScnPolicy::empty(),
                wrap_width: 5,
                replace_name_brackets: true,
            },
        );
        let mut lines = LineMap::new();
        lines.insert("a.scn-text-0".to_string(), "aa bb cc\n~~~~\ndd".to_string());
        let out = script.import_lines(&lines).unwrap();
        let expected_body = [
            text_line(0, b"aa bb\\Ncc"),
            text_line(0, b"dd"),
        ]
        .concat();
        assert_eq!(&out[12..], &expected_body[..]);
        let segments = split_segments(&out).unwrap();
        let texts: Vec<_> = segments
            .iter()
            .filter(|s| s.kind() == SegmentKind::Text)
            .map(|s| (s.index(), s.data().to_vec()))
            .collect();
        assert_eq!(
            texts,
            vec![(0, b"aa bb\\Ncc".to_vec()), (0, b"dd".to_vec())]
        );
    }

    #[test]
    fn test_strict_slot_padding() {
        let original = b"0123456789";
        let fitted = fit_strict_slot("s.scn", "k", original, b"abcdef".to_vec()).unwrap();
        assert_eq!(fitted.len(), 10);
        assert_eq!(&fitted, b"abcdef    ");
        assert_eq!(
            fit_strict_slot("s.scn", "k", original, b"abcdefghijkl".to_vec()),
            None
        );
    }

    #[test]
    fn test_strict_size_import() {
        let body = [
            text_line(0, b"0123456789"),
            text_line(1, b"0123456789"),
            vec![0xf0, 0x46, 0xf2, 0x07, 0, 0, 0],
        ]
        .concat();
        let data = script_file(&body);
        let mut policy = ScnPolicy::empty();
        policy.strict_size.insert("s.scn".to_string());
        let script = build(data.clone(), "s.scn", policy);
        assert_eq!(script.default_format_type(), FormatOptions::None);
        let mut lines = LineMap::new();
        lines.insert("s.scn-text-0".to_string(), "abcdef".to_string());
        lines.insert("s.scn-text-1".to_string(), "abcdefghijkl".to_string());
        let out = script.import_lines(&lines).unwrap();
        // Same size, bubble kept, long line rejected.
        assert_eq!(out.len(), data.len());
        assert_eq!(&out[17..27], b"abcdef    ");
        assert_eq!(&out[33..43], b"0123456789");
        assert_eq!(&out[44..], &[0xf0, 0x46, 0xf2, 0x07, 0, 0, 0]);
    }

    #[test]
    fn test_bubbles_removed_before_scan() {
        let body = [
            vec![0xf0, 0x46, 0xf2, 0x07, 0, 0, 0],
            text_line(0, b"hello"),
        ]
        .concat();
        let data = script_file(&body);
        let script = build(data.clone(), "a.scn", ScnPolicy::empty());
        let out = script.import_lines(&LineMap::new()).unwrap();
        assert_eq!(out.len(), data.len() - 7);
        assert_eq!(out.peek_u32_at(0).unwrap(), (out.len() - 12) as u32);
        assert_eq!(&out[12..], &text_line(0, b"hello")[..]);
    }

    #[test]
    fn test_route_fix_follows_size() {
        let mut jump = vec![0xf2];
        jump.extend_from_slice(&0x40u32.to_le_bytes());
        jump.extend_from_slice(&FILE_TAG_MARKER);
        jump.extend_from_slice(b"4_9_8.scn\0");
        let body = [text_line(0, b"abc"), jump].concat();
        let data = script_file(&body);
        let mut policy = ScnPolicy::empty();
        policy.route_fix.insert("4_9_7.scn".to_string());
        let script = build(data.clone(), "4_9_7.scn", policy);
        let mut lines = LineMap::new();
        lines.insert("4_9_7.scn-text-0".to_string(), "abcdef".to_string());
        let out = script.import_lines(&lines).unwrap();
        assert_eq!(out.len(), data.len() + 3);
        let jump_at = 12 + 5 + 6 + 1;
        assert_eq!(out[jump_at], 0xf2);
        assert_eq!(out.peek_u32_at(jump_at + 1).unwrap(), 0x43);
    }

    #[test]
    fn test_route_offsets_kept_outside_route_files() {
        let mut jump = vec![0xf2];
        jump.extend_from_slice(&0x40u32.to_le_bytes());
        jump.extend_from_slice(&FILE_TAG_MARKER);
        jump.extend_from_slice(b"1_2.scn\0");
        let body = [text_line(0, b"abc"), jump].concat();
        let data = script_file(&body);
        let script = build(data.clone(), "1_1.scn", ScnPolicy::default());
        let mut lines = LineMap::new();
        lines.insert("1_1.scn-text-0".to_string(), "abcdef".to_string());
        let out = script.import_lines(&lines).unwrap();
        assert_eq!(out.len(), data.len() + 3);
        let jump_at = 12 + 5 + 6 + 1;
        assert_eq!(out[jump_at], 0xf2);
        assert_eq!(out.peek_u32_at(jump_at + 1).unwrap(), 0x40);
        assert_eq!(&out[jump_at + 5..], &data[jump_at - 3 + 5..]);
    }

    #[test]
    fn test_encode_failure_is_fatal() {
        let data = script_file(&text_line(0, b"abc"));
        let script = build(data, "a.scn", ScnPolicy::empty());
        let mut lines = LineMap::new();
        lines.insert("a.scn-text-0".to_string(), "😀".to_string());
        assert!(script.import_lines(&lines).is_err());
    }

    #[test]
    fn test_distribute_parts() {
        let parts = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];
        let out = distribute_parts(SegmentKind::Text, 2, parts.clone(), 2);
        let mut glued = b"b\0".to_vec();
        glued.extend_from_slice(&text_marker(2));
        glued.extend_from_slice(b"c");
        assert_eq!(out, vec![b"a".to_vec(), glued]);
        let out = distribute_parts(SegmentKind::Text, 0, vec![b"a".to_vec()], 3);
        assert_eq!(out, vec![b"a".to_vec(), vec![], vec![]]);
        let out = distribute_parts(SegmentKind::Choice, 0, parts, 1);
        assert_eq!(out, vec![b"a\\Nb\\Nc".to_vec()]);
    }
}
