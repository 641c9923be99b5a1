use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Copy, Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Text Encoding
pub enum Encoding {
    /// Try UTF-8 first, then Shift-JIS, then GB2312
    Auto,
    /// UTF-8 encoding
    Utf8,
    /// Shift-JIS encoding
    Cp932,
    /// GB2312 encoding
    Gb2312,
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Cp932
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
/// Text Encoding
pub enum TextEncoding {
    /// Use script's default encoding
    Default,
    /// Automatically detect encoding
    Auto,
    /// UTF-8 encoding
    Utf8,
    #[value(alias("jis"))]
    /// Shift-JIS encoding
    Cp932,
    #[value(alias("gbk"))]
    /// GB2312 encoding
    Gb2312,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
/// Script type
pub enum ScriptType {
    /// Pure Pure SCN script
    Scn,
}

/// Kind of a slice produced by the SCN segment scanner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SegmentKind {
    /// Untouched bytes, markers included.
    Structural,
    /// Dialog line.
    Text,
    /// Branching choice label.
    Choice,
    /// Destination file name of a choice.
    FileTag,
}

impl SegmentKind {
    /// Whether segments of this kind carry translatable text.
    pub fn is_semantic(&self) -> bool {
        !matches!(self, SegmentKind::Structural)
    }
}

impl AsRef<str> for SegmentKind {
    fn as_ref(&self) -> &str {
        match self {
            SegmentKind::Structural => "",
            SegmentKind::Text => "text",
            SegmentKind::Choice => "choice",
            SegmentKind::FileTag => "filetag",
        }
    }
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Builds the key joining a segment with its translation record.
pub fn segment_key(filename: &str, kind: SegmentKind, index: usize) -> String {
    format!("{}-{}-{}", filename, kind, index)
}

/// One row of the translation table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
    #[serde(rename = "FILENAME")]
    pub filename: String,
    #[serde(rename = "KEY")]
    pub key: String,
    #[serde(rename = "INDEX")]
    pub index: usize,
    #[serde(rename = "LENGTH")]
    pub length: usize,
    #[serde(rename = "ORIGINAL_TEXT")]
    pub original_text: String,
    #[serde(rename = "TRANSLATED_TEXT", default)]
    pub translated_text: String,
    #[serde(rename = "EDITTED_TEXT", default)]
    pub edited_text: String,
    #[serde(rename = "NOTES", default)]
    pub notes: String,
    #[serde(rename = "STATUS", default)]
    pub status: String,
    #[serde(rename = "LINE_STATUS", default)]
    pub line_status: String,
}

impl TranslationRecord {
    /// Returns the text that should replace the original, if any.
    /// Edited text wins over translated text.
    pub fn replacement(&self) -> Option<&str> {
        if !self.edited_text.is_empty() {
            Some(&self.edited_text)
        } else if !self.translated_text.is_empty() {
            Some(&self.translated_text)
        } else {
            None
        }
    }
}

/// Replacement text per segment key, before wrapping and encoding.
pub type LineMap = HashMap<String, String>;

/// Policy flags of a single file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilePolicy {
    /// Slots keep their size: no reflow, no bubble removal, no growth.
    pub strict_size: bool,
    /// Embedded route-change offsets must follow the file size delta.
    pub route_fix: bool,
}

/// File name keyed policy table.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScnPolicy {
    #[serde(default)]
    pub strict_size: BTreeSet<String>,
    #[serde(default)]
    pub route_fix: BTreeSet<String>,
}

impl Default for ScnPolicy {
    fn default() -> Self {
        ScnPolicy {
            strict_size: ["2_6_6.scn", "4_12_1.scn"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            route_fix: ["4_9_7.scn", "4_10_2.scn", "4_13_9.scn", "5_10_1.scn"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ScnPolicy {
    /// A table without any special-cased files.
    pub fn empty() -> Self {
        ScnPolicy {
            strict_size: BTreeSet::new(),
            route_fix: BTreeSet::new(),
        }
    }

    /// Looks up the flags for a file. Only the base name is compared.
    pub fn for_file(&self, filename: &str) -> FilePolicy {
        let base = std::path::Path::new(filename)
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());
        FilePolicy {
            strict_size: self.strict_size.contains(&base),
            route_fix: self.route_fix.contains(&base),
        }
    }
}

/// Format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatOptions {
    /// Reflow on spaces so that no line is wider than `width`
    WordWrap { width: usize },
    /// Do not wrap line
    None,
}

pub struct ExtraConfig {
    /// Per file policy table
    pub policy: ScnPolicy,
    /// Maximum visible line width used when reflowing translations
    pub wrap_width: usize,
    /// Replace `【` `】` with `「` `」` in translations
    pub replace_name_brackets: bool,
}

impl Default for ExtraConfig {
    fn default() -> Self {
        ExtraConfig {
            policy: ScnPolicy::default(),
            wrap_width: 50,
            replace_name_brackets: true,
        }
    }
}

/// Outcome of processing one script file.
pub enum ScriptResult {
    Ok,
    /// Nothing to extract from the file.
    Ignored,
}

#[test]
fn test_policy_lookup() {
    let policy = ScnPolicy::default();
    assert!(policy.for_file("2_6_6.scn").strict_size);
    assert!(policy.for_file("script/4_12_1.scn").strict_size);
    assert!(!policy.for_file("4_12_1.scn").route_fix);
    assert!(policy.for_file("5_10_1.scn").route_fix);
    assert_eq!(policy.for_file("1_1_1.scn"), FilePolicy::default());
    assert_eq!(ScnPolicy::empty().for_file("2_6_6.scn"), FilePolicy::default());
}

#[test]
fn test_policy_from_json() {
    let policy: ScnPolicy =
        serde_json::from_str(r#"{"strict_size": ["a.scn"]}"#).unwrap();
    assert!(policy.for_file("a.scn").strict_size);
    assert!(policy.route_fix.is_empty());
}

#[test]
fn test_record_replacement() {
    let mut record = TranslationRecord::default();
    assert_eq!(record.replacement(), None);
    record.translated_text = "Hello".to_string();
    assert_eq!(record.replacement(), Some("Hello"));
    record.edited_text = "Hi".to_string();
    assert_eq!(record.replacement(), Some("Hi"));
}
