use fancy_regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

lazy_static::lazy_static! {
    static ref COLOR_CODE_REGEX: Regex = Regex::new(r"\\c[0-9]+").unwrap();
    static ref VOICE_CODE_REGEX: Regex = Regex::new(r#"\\V"[^"]*""#).unwrap();
}

/// Width of `s` as shown in game. Color (`\c12`) and voice (`\V"file"`)
/// directives take no room.
pub fn visible_length(s: &str) -> usize {
    let s = COLOR_CODE_REGEX.replace_all(s, "");
    let s = VOICE_CODE_REGEX.replace_all(&s, "");
    s.graphemes(true).count()
}

pub struct WordWrapper {
    width: usize,
}

impl WordWrapper {
    pub fn new(width: usize) -> Self {
        WordWrapper { width }
    }

    /// Reflows every line of `message` on spaces. Words are never split, so
    /// a single word wider than the limit gets a line of its own.
    pub fn format(&self, message: &str) -> String {
        let mut lines: Vec<String> = Vec::new();
        for line in message.split('\n') {
            let line = line.strip_suffix(' ').unwrap_or(line);
            let mut current: Vec<&str> = Vec::new();
            for word in line.split(' ') {
                current.push(word);
                if current.len() > 1 && visible_length(&current.join(" ")) > self.width {
                    current.pop();
                    lines.push(current.join(" "));
                    current.clear();
                    current.push(word);
                }
            }
            lines.push(current.join(" "));
        }
        lines.join("\n")
    }
}

#[test]
fn test_visible_length() {
    assert_eq!(visible_length("Hello"), 5);
    assert_eq!(visible_length(r"\c3Hello\c0"), 5);
    assert_eq!(visible_length(r#"\V"voice01"Hi"#), 2);
    assert_eq!(visible_length("「あ」"), 3);
}

#[test]
fn test_wrap() {
    let wrapper = WordWrapper::new(5);
    assert_eq!(wrapper.format("aa bb cc"), "aa bb\ncc");
    assert_eq!(wrapper.format(""), "");
    assert_eq!(wrapper.format("aa\nbb cc dd"), "aa\nbb cc\ndd");
    assert_eq!(wrapper.format("abcdefgh ij"), "abcdefgh\nij");
    assert_eq!(wrapper.format("ab cd "), "ab cd");
}

#[test]
fn test_wrap_ignores_control_codes() {
    let wrapper = WordWrapper::new(5);
    assert_eq!(wrapper.format(r"\c3aa bb\c0 cc"), "\\c3aa bb\\c0\ncc");
    let wrapper = WordWrapper::new(12);
    let text = r#"\V"v_0001"Hello there friend"#;
    let wrapped = wrapper.format(text);
    assert_eq!(wrapped, "\\V\"v_0001\"Hello there\nfriend");
    for line in wrapped.split('\n') {
        assert!(visible_length(line) <= 12);
    }
}

#[test]
fn test_wrap_keeps_sentinel_line() {
    let wrapper = WordWrapper::new(5);
    assert_eq!(
        wrapper.format("aa bb cc\n~~~~\ndd"),
        "aa bb\ncc\n~~~~\ndd"
    );
}
