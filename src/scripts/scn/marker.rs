//! Marker bytes that introduce the translatable parts of an SCN script.
/// Lead byte of a dialog line marker. Followed by the line index as u32 LE.
pub const TEXT_MARKER_TAG: u8 = 0xf3;
/// Length of a dialog line marker.
pub const TEXT_MARKER_LEN: usize = 5;
/// Introduces a choice label.
pub const CHOICE_MARKER: [u8; 3] = [0xf0, 0x1c, 0xf1];
/// Introduces the destination file name of a choice.
pub const FILE_TAG_MARKER: [u8; 3] = [0xf0, 0x1a, 0xf1];
/// Ends every text, choice and file tag payload.
pub const TERMINATOR: u8 = 0;

/// Marker of the `index`th dialog line.
pub fn text_marker(index: u32) -> [u8; TEXT_MARKER_LEN] {
    let mut b = [0u8; TEXT_MARKER_LEN];
    b[0] = TEXT_MARKER_TAG;
    b[1..].copy_from_slice(&index.to_le_bytes());
    b
}

#[test]
fn test_text_marker() {
    assert_eq!(text_marker(0), [0xf3, 0, 0, 0, 0]);
    assert_eq!(text_marker(0x0102), [0xf3, 0x02, 0x01, 0, 0]);
}

#[test]
fn test_marker_lead_bytes_are_distinct() {
    assert_ne!(TEXT_MARKER_TAG, CHOICE_MARKER[0]);
    assert_ne!(CHOICE_MARKER, FILE_TAG_MARKER);
}
