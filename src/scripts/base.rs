use crate::types::*;
use anyhow::Result;
use std::io::Write;

pub trait ScriptBuilder: std::fmt::Debug {
    fn default_encoding(&self) -> Encoding;

    fn build_script(
        &self,
        buf: Vec<u8>,
        filename: &str,
        encoding: Encoding,
        config: &ExtraConfig,
    ) -> Result<Box<dyn Script>>;

    fn build_script_from_file(
        &self,
        filename: &str,
        encoding: Encoding,
        config: &ExtraConfig,
    ) -> Result<Box<dyn Script>> {
        let data = crate::utils::files::read_file(filename)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", filename, e))?;
        self.build_script(data, filename, encoding, config)
    }

    fn extensions(&self) -> &'static [&'static str];

    fn script_type(&self) -> &'static ScriptType;
}

pub trait Script: std::fmt::Debug {
    /// How translated text is shaped before it is written into this script.
    fn default_format_type(&self) -> FormatOptions;

    /// One record per translatable line, original text filled in.
    fn extract_records(&self) -> Result<Vec<TranslationRecord>>;

    /// Builds the patched script with `lines` substituted.
    fn import_lines(&self, lines: &LineMap) -> Result<Vec<u8>>;

    fn import_lines_filename(&self, lines: &LineMap, filename: &str) -> Result<Vec<u8>> {
        let data = self.import_lines(lines)?;
        let mut f = crate::utils::files::write_file(filename)?;
        f.write_all(&data)?;
        f.flush()?;
        Ok(data)
    }
}
