//! Little-endian field access on in-memory buffers.
use std::io::{Error, ErrorKind, Result};

fn out_of_range(offset: usize, size: usize, len: usize) -> Error {
    Error::new(
        ErrorKind::UnexpectedEof,
        format!(
            "Field at offset {} (size {}) is beyond the end of the data ({} bytes)",
            offset, size, len
        ),
    )
}

/// Reads fixed-size fields from a byte buffer without moving any cursor.
pub trait Peek {
    fn peek_extract_at(&self, offset: usize, buf: &mut [u8]) -> Result<()>;

    fn peek_u32_at(&self, offset: usize) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.peek_extract_at(offset, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }
}

/// Overwrites fixed-size fields in place. The buffer never grows.
pub trait WriteAt {
    fn write_all_at(&mut self, offset: usize, data: &[u8]) -> Result<()>;

    fn write_u32_at(&mut self, offset: usize, value: u32) -> Result<()> {
        self.write_all_at(offset, &value.to_le_bytes())
    }
}

impl Peek for [u8] {
    fn peek_extract_at(&self, offset: usize, buf: &mut [u8]) -> Result<()> {
        let end = offset
            .checked_add(buf.len())
            .ok_or_else(|| out_of_range(offset, buf.len(), self.len()))?;
        if end > self.len() {
            return Err(out_of_range(offset, buf.len(), self.len()));
        }
        buf.copy_from_slice(&self[offset..end]);
        Ok(())
    }
}

impl Peek for Vec<u8> {
    fn peek_extract_at(&self, offset: usize, buf: &mut [u8]) -> Result<()> {
        self.as_slice().peek_extract_at(offset, buf)
    }
}

impl WriteAt for [u8] {
    fn write_all_at(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let len = self.len();
        let end = offset
            .checked_add(data.len())
            .ok_or_else(|| out_of_range(offset, data.len(), len))?;
        if end > len {
            return Err(out_of_range(offset, data.len(), len));
        }
        self[offset..end].copy_from_slice(data);
        Ok(())
    }
}

impl WriteAt for Vec<u8> {
    fn write_all_at(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        self.as_mut_slice().write_all_at(offset, data)
    }
}

#[test]
fn test_peek_and_write() {
    let mut data = vec![0x10, 0x00, 0x00, 0x00, 0xaa, 0xbb];
    assert_eq!(data.peek_u32_at(0).unwrap(), 16);
    assert_eq!(data.peek_u32_at(2).unwrap(), 0xbbaa0000);
    assert!(data.peek_u32_at(3).is_err());
    data.write_u32_at(2, 0x04030201).unwrap();
    assert_eq!(data, vec![0x10, 0x00, 0x01, 0x02, 0x03, 0x04]);
    assert!(data.write_u32_at(3, 1).is_err());
    assert_eq!(data.len(), 6);
}
