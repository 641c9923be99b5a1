//! Escape and Unescape Utilities

/// Canonical in-script newline escape.
pub const SCRIPT_NEWLINE: &str = "\\N";
/// Newline escape written by older translation patches. Only read, never written.
pub const LEGACY_SCRIPT_NEWLINE: &str = "\\n";
/// Separator used in a logical line made of several physical text slots.
pub const CONTINUATION_SENTINEL: &str = "\n~~~~\n";

/// Converts in-script newline escapes (`\N` and `\n`) into newlines.
pub fn unescape_script_newlines(s: &str) -> String {
    s.replace(SCRIPT_NEWLINE, "\n")
        .replace(LEGACY_SCRIPT_NEWLINE, "\n")
}

/// Converts newlines into the canonical in-script escape.
pub fn escape_script_newlines(s: &str) -> String {
    s.replace('\n', SCRIPT_NEWLINE)
}

/// Joins the decoded slots of one logical line.
pub fn join_continuations<S: AsRef<str>>(parts: &[S]) -> String {
    let mut result = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            result.push_str(CONTINUATION_SENTINEL);
        }
        result.push_str(part.as_ref());
    }
    result
}

/// Splits a logical line back into its physical slots.
pub fn split_continuations(s: &str) -> Vec<&str> {
    s.split(CONTINUATION_SENTINEL).collect()
}

#[test]
fn test_script_newlines() {
    assert_eq!(unescape_script_newlines(r"a\Nb\nc"), "a\nb\nc");
    assert_eq!(escape_script_newlines("a\nb\nc"), r"a\Nb\Nc");
    assert_eq!(
        escape_script_newlines(&unescape_script_newlines(r"a\nb")),
        r"a\Nb"
    );
}

#[test]
fn test_continuations() {
    let joined = join_continuations(&["first", "second"]);
    assert_eq!(joined, "first\n~~~~\nsecond");
    assert_eq!(split_continuations(&joined), vec!["first", "second"]);
    assert_eq!(split_continuations("single"), vec!["single"]);
    assert_eq!(join_continuations::<&str>(&[]), "");
}
