//! Translation table stored as CSV.
//!
//! The header row is
//! `FILENAME,KEY,INDEX,LENGTH,ORIGINAL_TEXT,TRANSLATED_TEXT,EDITTED_TEXT,NOTES,STATUS,LINE_STATUS`.
//! Only `KEY` and one of the two translation columns matter when patching;
//! the remaining columns are carried for the translators.
use crate::types::*;
use anyhow::Result;

/// Parses a translation table.
pub fn read_records(data: &[u8]) -> Result<Vec<TranslationRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);
    let mut records = Vec::new();
    for (i, result) in reader.deserialize().enumerate() {
        let record: TranslationRecord =
            result.map_err(|e| anyhow::anyhow!("Bad translation record {}: {}", i + 1, e))?;
        records.push(record);
    }
    Ok(records)
}

/// Serializes a translation table, header row included.
pub fn write_records(records: &[TranslationRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to write translation table: {}", e))
}
