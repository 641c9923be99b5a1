//! Byte patterns with wildcard positions.
//!
//! A pattern is written as space separated hex bytes, `??` matches any byte:
//! `"f0 46 f2 ?? ?? ?? ?? f0 20"`.
use anyhow::Result;
use memchr::memmem::Finder;

#[derive(Debug)]
pub struct BytePattern {
    tokens: Vec<Option<u8>>,
    /// Finder for the literal bytes before the first wildcard.
    prefix: Finder<'static>,
}

impl BytePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let mut tokens = Vec::new();
        for tok in pattern.split_ascii_whitespace() {
            if tok == "??" {
                tokens.push(None);
            } else if tok.len() == 2 {
                tokens.push(Some(u8::from_str_radix(tok, 16).map_err(|e| {
                    anyhow::anyhow!("Invalid byte {:?} in pattern {:?}: {}", tok, pattern, e)
                })?));
            } else {
                return Err(anyhow::anyhow!(
                    "Invalid token {:?} in pattern {:?}",
                    tok,
                    pattern
                ));
            }
        }
        let prefix: Vec<u8> = tokens.iter().map_while(|t| *t).collect();
        if prefix.is_empty() {
            return Err(anyhow::anyhow!(
                "Pattern {:?} must start with a literal byte",
                pattern
            ));
        }
        Ok(BytePattern {
            tokens,
            prefix: Finder::new(&prefix).into_owned(),
        })
    }

    /// Length in bytes of every match.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    fn matches_at(&self, data: &[u8], pos: usize) -> bool {
        data.len() - pos >= self.tokens.len()
            && self
                .tokens
                .iter()
                .zip(&data[pos..])
                .all(|(t, b)| t.map_or(true, |t| t == *b))
    }

    /// Finds the first match starting at or after `from`.
    pub fn find_from(&self, data: &[u8], from: usize) -> Option<usize> {
        let mut start = from;
        while start < data.len() {
            let pos = start + self.prefix.find(&data[start..])?;
            if self.matches_at(data, pos) {
                return Some(pos);
            }
            start = pos + 1;
        }
        None
    }

    /// Start offsets of all non-overlapping matches, left to right.
    pub fn find_all(&self, data: &[u8]) -> Vec<usize> {
        let mut result = Vec::new();
        let mut from = 0;
        while let Some(pos) = self.find_from(data, from) {
            result.push(pos);
            from = pos + self.len();
        }
        result
    }

    /// Replaces every non-overlapping match with the output of `f`.
    pub fn replace_all<F: FnMut(&[u8]) -> Vec<u8>>(&self, data: &[u8], mut f: F) -> Vec<u8> {
        let mut result = Vec::with_capacity(data.len());
        let mut last = 0;
        for pos in self.find_all(data) {
            result.extend_from_slice(&data[last..pos]);
            result.extend(f(&data[pos..pos + self.len()]));
            last = pos + self.len();
        }
        result.extend_from_slice(&data[last..]);
        result
    }

    /// Deletes every non-overlapping match.
    pub fn remove_all(&self, data: &[u8]) -> Vec<u8> {
        self.replace_all(data, |_| Vec::new())
    }
}

#[test]
fn test_pattern_parse() {
    assert_eq!(BytePattern::new("f0 ?? 20").unwrap().len(), 3);
    assert!(BytePattern::new("?? f0").is_err());
    assert!(BytePattern::new("f0 zz").is_err());
    assert!(BytePattern::new("f00").is_err());
}

#[test]
fn test_pattern_find() {
    let pat = BytePattern::new("f2 ?? ?? f0").unwrap();
    let data = [0x00, 0xf2, 0x01, 0x02, 0xf0, 0xf2, 0xf2, 0x09, 0xf0, 0xf2];
    assert_eq!(pat.find_all(&data), vec![1, 5]);
    assert_eq!(pat.find_from(&data, 2), Some(5));
    assert_eq!(pat.find_from(&data, 6), None);
    assert_eq!(pat.remove_all(&data), vec![0x00, 0xf2]);
}

#[test]
fn test_pattern_replace() {
    let pat = BytePattern::new("aa ??").unwrap();
    let out = pat.replace_all(&[0xaa, 0x01, 0xbb, 0xaa, 0x02], |m| vec![m[1], m[1]]);
    assert_eq!(out, vec![0x01, 0x01, 0xbb, 0x02, 0x02]);
}
