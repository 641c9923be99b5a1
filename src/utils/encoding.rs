use crate::types::*;

pub fn decode_to_string(
    encoding: Encoding,
    data: &[u8],
    check: bool,
) -> Result<String, anyhow::Error> {
    match encoding {
        Encoding::Auto => decode_to_string(Encoding::Utf8, data, true)
            .or_else(|_| decode_to_string(Encoding::Cp932, data, true))
            .or_else(|_| decode_to_string(Encoding::Gb2312, data, check)),
        Encoding::Utf8 => {
            if check {
                Ok(String::from_utf8(data.to_vec())?)
            } else {
                Ok(String::from_utf8_lossy(data).into_owned())
            }
        }
        Encoding::Cp932 => {
            let result = encoding_rs::SHIFT_JIS.decode_without_bom_handling(data);
            if result.1 && check {
                Err(anyhow::anyhow!("Failed to decode Shift-JIS"))
            } else {
                Ok(result.0.into_owned())
            }
        }
        Encoding::Gb2312 => {
            let result = encoding_rs::GBK.decode_without_bom_handling(data);
            if result.1 && check {
                Err(anyhow::anyhow!("Failed to decode GB2312"))
            } else {
                Ok(result.0.into_owned())
            }
        }
    }
}

/// Decodes script text, failing soft.
///
/// Returns an empty string when the bytes cannot be decoded. GBK text is
/// also rejected when it decodes to fewer characters than half its byte
/// count, which takes four byte GB18030 sequences that game text never
/// uses, so such bytes are taken for binary data.
/// Shift-JIS has no such sequences and is rejected on decode errors only.
/// Callers must read an empty result as "not decodable" unless the input
/// was empty.
pub fn decode_text(encoding: Encoding, data: &[u8]) -> String {
    let s = match decode_to_string(encoding, data, true) {
        Ok(s) => s,
        Err(_) => return String::new(),
    };
    if encoding == Encoding::Gb2312 && s.chars().count() < data.len().div_ceil(2) {
        return String::new();
    }
    s
}

pub fn encode_string(
    encoding: Encoding,
    data: &str,
    check: bool,
) -> Result<Vec<u8>, anyhow::Error> {
    match encoding {
        Encoding::Auto => Ok(data.as_bytes().to_vec()),
        Encoding::Utf8 => Ok(data.as_bytes().to_vec()),
        Encoding::Cp932 => {
            let result = encoding_rs::SHIFT_JIS.encode(data);
            if result.2 {
                if check {
                    return Err(anyhow::anyhow!(
                        "Failed to encode Shift-JIS: {:?}",
                        data
                    ));
                }
                tracing::warn!(
                    "Some characters could not be encoded in Shift-JIS: {}",
                    data
                );
                crate::COUNTER.inc_warning();
            }
            Ok(result.0.to_vec())
        }
        Encoding::Gb2312 => {
            let result = encoding_rs::GBK.encode(data);
            if result.2 {
                if check {
                    return Err(anyhow::anyhow!("Failed to encode GB2312: {:?}", data));
                }
                tracing::warn!(
                    "Some characters could not be encoded in GB2312: {}",
                    data
                );
                crate::COUNTER.inc_warning();
            }
            Ok(result.0.to_vec())
        }
    }
}

#[test]
fn test_decode_to_string() {
    assert_eq!(
        decode_to_string(
            Encoding::Utf8,
            &[228, 184, 173, 230, 150, 135, 230, 181, 139, 232, 175, 149],
            true
        )
        .unwrap(),
        "中文测试".to_string()
    );
    assert_eq!(
        decode_to_string(
            Encoding::Cp932,
            &[
                130, 171, 130, 225, 130, 215, 130, 194, 130, 187, 130, 211, 130, 198
            ],
            true
        )
        .unwrap(),
        "きゃべつそふと".to_string()
    );
    assert_eq!(
        decode_to_string(Encoding::Gb2312, &[214, 208, 206, 196], true).unwrap(),
        "中文".to_string()
    );
    assert_eq!(
        decode_to_string(
            Encoding::Auto,
            &[
                130, 171, 130, 225, 130, 215, 130, 194, 130, 187, 130, 211, 130, 198
            ],
            true
        )
        .unwrap(),
        "きゃべつそふと".to_string()
    );
    assert!(decode_to_string(Encoding::Cp932, &[0x82], true).is_err());
}

#[test]
fn test_decode_text_fails_soft() {
    assert_eq!(decode_text(Encoding::Cp932, b"Hello"), "Hello");
    assert_eq!(
        decode_text(Encoding::Cp932, &[130, 171, 130, 225]),
        "きゃ".to_string()
    );
    // Lone lead byte
    assert_eq!(decode_text(Encoding::Cp932, &[b'a', 0x82]), "");
    assert_eq!(decode_text(Encoding::Cp932, &[]), "");
    assert_eq!(decode_text(Encoding::Gb2312, &[214, 208, 206, 196]), "中文");
    // A lone four byte sequence decodes but is too short to be text.
    assert_eq!(
        decode_to_string(Encoding::Gb2312, &[0x81, 0x30, 0x81, 0x30], true).unwrap(),
        "\u{80}"
    );
    assert_eq!(decode_text(Encoding::Gb2312, &[0x81, 0x30, 0x81, 0x30]), "");
    assert_eq!(decode_text(Encoding::Gb2312, b"a\x81\x30\x81\x30"), "");
}

#[test]
fn test_encode_string() {
    assert_eq!(
        encode_string(Encoding::Utf8, "中文测试", true).unwrap(),
        vec![228, 184, 173, 230, 150, 135, 230, 181, 139, 232, 175, 149]
    );
    assert_eq!(
        encode_string(Encoding::Cp932, "きゃべつそふと", true).unwrap(),
        vec![
            130, 171, 130, 225, 130, 215, 130, 194, 130, 187, 130, 211, 130, 198
        ]
    );
    assert_eq!(
        encode_string(Encoding::Gb2312, "中文", true).unwrap(),
        vec![214, 208, 206, 196]
    );
    assert!(encode_string(Encoding::Cp932, "😀", true).is_err());
}
