//! Splitting an SCN script into typed segments and joining them back.
use super::marker::*;
use crate::types::*;
use crate::utils::encoding::decode_text;
use anyhow::Result;
use memchr::memmem;
use std::fmt::Write;

/// A contiguous slice of a script.
///
/// Semantic segments hold only the bytes between a marker and its
/// terminator. Structural segments hold everything else, markers and
/// terminators included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    kind: SegmentKind,
    index: u32,
    data: Vec<u8>,
}

impl Segment {
    pub fn new(kind: SegmentKind, index: u32, data: Vec<u8>) -> Self {
        Segment { kind, index, data }
    }

    pub fn structural(data: Vec<u8>) -> Self {
        Segment {
            kind: SegmentKind::Structural,
            index: 0,
            data,
        }
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// Occurrence number among segments of the same kind. Always 0 for
    /// structural segments.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Same segment carrying another payload.
    pub fn with_data(&self, data: Vec<u8>) -> Self {
        Segment {
            kind: self.kind,
            index: self.index,
            data,
        }
    }

    /// Translation key of a semantic segment.
    pub fn key(&self, filename: &str) -> Option<String> {
        if self.kind.is_semantic() {
            Some(segment_key(filename, self.kind, self.index as usize))
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum NextMatch {
    Unknown,
    At(usize),
    Never,
}

/// Remembers where a marker occurs next so that a marker is not searched
/// again while the scan position is still before the known occurrence.
struct MarkerSearch {
    marker: Vec<u8>,
    next: NextMatch,
}

impl MarkerSearch {
    fn new(marker: &[u8]) -> Self {
        MarkerSearch {
            marker: marker.to_vec(),
            next: NextMatch::Unknown,
        }
    }

    fn set_marker(&mut self, marker: &[u8]) {
        self.marker.clear();
        self.marker.extend_from_slice(marker);
        self.next = NextMatch::Unknown;
    }

    /// Earliest occurrence at or after `pos`.
    fn find(&mut self, data: &[u8], pos: usize) -> Option<usize> {
        match self.next {
            NextMatch::At(p) if p >= pos => return Some(p),
            NextMatch::Never => return None,
            _ => {}
        }
        self.next = match memmem::find(&data[pos..], &self.marker) {
            Some(p) => NextMatch::At(pos + p),
            None => NextMatch::Never,
        };
        match self.next {
            NextMatch::At(p) => Some(p),
            _ => None,
        }
    }
}

struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
    text_index: u32,
    choice_index: u32,
    file_tag_index: u32,
    text: MarkerSearch,
    choice: MarkerSearch,
    file_tag: MarkerSearch,
    segments: Vec<Segment>,
}

impl<'a> Scanner<'a> {
    fn new(data: &'a [u8]) -> Self {
        Scanner {
            data,
            pos: 0,
            text_index: 0,
            choice_index: 0,
            file_tag_index: 0,
            text: MarkerSearch::new(&text_marker(0)),
            choice: MarkerSearch::new(&CHOICE_MARKER),
            file_tag: MarkerSearch::new(&FILE_TAG_MARKER),
            segments: Vec::new(),
        }
    }

    /// Nearest marker after the scan position. Ties prefer text, then
    /// choice, then file tag.
    fn next_marker(&mut self) -> Option<(SegmentKind, usize, usize)> {
        let candidates = [
            self.text
                .find(self.data, self.pos)
                .map(|p| (SegmentKind::Text, p, TEXT_MARKER_LEN)),
            self.choice
                .find(self.data, self.pos)
                .map(|p| (SegmentKind::Choice, p, CHOICE_MARKER.len())),
            self.file_tag
                .find(self.data, self.pos)
                .map(|p| (SegmentKind::FileTag, p, FILE_TAG_MARKER.len())),
        ];
        let mut best: Option<(SegmentKind, usize, usize)> = None;
        for c in candidates.into_iter().flatten() {
            match best {
                Some((_, p, _)) if p <= c.1 => {}
                _ => best = Some(c),
            }
        }
        best
    }

    fn index_of(&self, kind: SegmentKind) -> u32 {
        match kind {
            SegmentKind::Text => self.text_index,
            SegmentKind::Choice => self.choice_index,
            SegmentKind::FileTag => self.file_tag_index,
            SegmentKind::Structural => 0,
        }
    }

    fn advance_index(&mut self, kind: SegmentKind) -> Result<()> {
        let overflow = || anyhow::anyhow!("Too many {} segments", kind);
        match kind {
            SegmentKind::Text => {
                self.text_index = self.text_index.checked_add(1).ok_or_else(overflow)?;
                self.text.set_marker(&text_marker(self.text_index));
            }
            SegmentKind::Choice => {
                self.choice_index = self.choice_index.checked_add(1).ok_or_else(overflow)?;
            }
            SegmentKind::FileTag => {
                self.file_tag_index = self.file_tag_index.checked_add(1).ok_or_else(overflow)?;
            }
            SegmentKind::Structural => {}
        }
        Ok(())
    }

    fn run(mut self) -> Result<Vec<Segment>> {
        loop {
            let (kind, begin, marker_len) = match self.next_marker() {
                Some(m) => m,
                None => {
                    self.segments
                        .push(Segment::structural(self.data[self.pos..].to_vec()));
                    break;
                }
            };
            let start = begin + marker_len;
            let len = memchr::memchr(TERMINATOR, &self.data[start..]).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unterminated {} segment starting at offset {:#x}",
                    kind,
                    start
                )
            })?;
            let index = self.index_of(kind);
            self.segments
                .push(Segment::structural(self.data[self.pos..start].to_vec()));
            self.segments.push(Segment::new(
                kind,
                index,
                self.data[start..start + len].to_vec(),
            ));
            // The terminator stays in front of the next structural segment.
            self.pos = start + len;
            // A text marker that shows up again continues the same logical line.
            let continued =
                kind == SegmentKind::Text && self.text.find(self.data, self.pos).is_some();
            if !continued {
                self.advance_index(kind)?;
            }
        }
        Ok(self.segments)
    }
}

/// Splits `data` into segments.
///
/// Concatenating the payloads of the result always gives back `data`.
/// Fails on a marker without terminator.
pub fn split_segments(data: &[u8]) -> Result<Vec<Segment>> {
    let segments = Scanner::new(data).run()?;
    if combine_segments(&segments) != data {
        return Err(anyhow::anyhow!(
            "Segment scan does not reproduce the input ({} bytes)",
            data.len()
        ));
    }
    Ok(segments)
}

/// Joins segment payloads into a script buffer.
pub fn combine_segments(segments: &[Segment]) -> Vec<u8> {
    let mut out = Vec::with_capacity(segments.iter().map(|s| s.len()).sum());
    for s in segments {
        out.extend_from_slice(&s.data);
    }
    out
}

fn hex_dump(out: &mut String, data: &[u8]) {
    for (i, row) in data.chunks(16).enumerate() {
        let _ = writeln!(out, "{:08x}  {}", i * 16, hex::encode(row));
    }
}

/// Human readable listing of segments with their byte offsets.
pub fn dump_segments(segments: &[Segment], encoding: Encoding) -> String {
    let mut out = String::new();
    let mut offset = 0;
    for s in segments {
        let _ = writeln!(
            out,
            "offset: {} ({:x})\nkind: {}\nindex: {}",
            offset,
            offset,
            if s.kind.is_semantic() {
                s.kind.as_ref()
            } else {
                "structural"
            },
            s.index
        );
        if s.kind == SegmentKind::Text {
            let _ = writeln!(out, "text: {}\n", decode_text(encoding, &s.data));
        } else {
            out.push_str("data:\n");
            hex_dump(&mut out, &s.data);
            out.push('\n');
        }
        offset += s.len();
    }
    out
}
