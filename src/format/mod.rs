//! Module for shaping translated text before it is written into a script.
mod wrap;

pub use wrap::{WordWrapper, visible_length};

use crate::types::*;

/// Replaces the name brackets used in the translation sheet with the ones
/// the game font can render.
pub fn replace_name_brackets(s: &str) -> String {
    s.replace('【', "「").replace('】', "」")
}

/// Formats a translated line with the given options.
pub fn fmt_message(message: &str, opt: FormatOptions) -> String {
    match opt {
        FormatOptions::WordWrap { width } => WordWrapper::new(width).format(message),
        FormatOptions::None => message.to_string(),
    }
}

#[test]
fn test_fmt_message() {
    assert_eq!(
        fmt_message("aa bb cc", FormatOptions::WordWrap { width: 5 }),
        "aa bb\ncc"
    );
    assert_eq!(fmt_message("aa bb cc", FormatOptions::None), "aa bb cc");
    assert_eq!(replace_name_brackets("【Ai】Hi"), "「Ai」Hi");
}
