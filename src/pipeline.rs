//! Per-file extract and patch drivers used by the command-line front end.
use crate::scripts::{BUILDER, Script, ScriptBuilder};
use crate::types::*;
use crate::utils::encoding::encode_string;
use crate::utils::escape::*;
use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn get_encoding(
    encoding: Option<TextEncoding>,
    builder: &Box<dyn ScriptBuilder + Send + Sync>,
) -> Encoding {
    match encoding {
        Some(TextEncoding::Default) | None => builder.default_encoding(),
        Some(TextEncoding::Auto) => Encoding::Auto,
        Some(TextEncoding::Utf8) => Encoding::Utf8,
        Some(TextEncoding::Cp932) => Encoding::Cp932,
        Some(TextEncoding::Gb2312) => Encoding::Gb2312,
    }
}

/// Encoding every script of a run is read and written with.
pub fn script_encoding(encoding: Option<TextEncoding>) -> Encoding {
    match BUILDER.first() {
        Some(builder) => get_encoding(encoding, builder),
        None => Encoding::default(),
    }
}

/// Finds the builder for `filename` by extension.
pub fn find_builder(filename: &str) -> Result<&'static Box<dyn ScriptBuilder + Send + Sync>> {
    let lower = filename.to_lowercase();
    for builder in BUILDER.iter() {
        for ext in builder.extensions() {
            if lower.ends_with(&format!(".{}", ext)) {
                return Ok(builder);
            }
        }
    }
    Err(anyhow::anyhow!("Unsupported script type: {}", filename))
}

pub fn parse_script(
    filename: &str,
    encoding: Option<TextEncoding>,
    config: &ExtraConfig,
) -> Result<Box<dyn Script>> {
    let builder = find_builder(filename)?;
    let encoding = get_encoding(encoding, builder);
    builder.build_script_from_file(filename, encoding, config)
}

/// Collects the text already present in a translated script, keyed like
/// the records of the untranslated one. Strict-size padding is trimmed.
pub fn collect_translations(
    filename: &str,
    encoding: Option<TextEncoding>,
    config: &ExtraConfig,
    into: &mut LineMap,
) -> Result<()> {
    tracing::info!("Reading translation from {}", filename);
    let script = parse_script(filename, encoding, config)?;
    for record in script.extract_records()? {
        let parts: Vec<&str> = split_continuations(&record.original_text)
            .into_iter()
            .map(|s| s.trim())
            .collect();
        into.insert(record.key, join_continuations(&parts));
    }
    Ok(())
}

/// Extracts the records of one script, prefilled from `existing`.
pub fn extract_file(
    filename: &str,
    encoding: Option<TextEncoding>,
    config: &ExtraConfig,
    existing: &LineMap,
) -> Result<Vec<TranslationRecord>> {
    tracing::info!("Extracting {}", filename);
    let script = parse_script(filename, encoding, config)?;
    let mut records = script.extract_records()?;
    for record in records.iter_mut() {
        if let Some(text) = existing.get(&record.key) {
            if !text.is_empty() && text != &record.original_text {
                record.translated_text = text.clone();
            }
        }
    }
    tracing::debug!("{}: {} records", filename, records.len());
    Ok(records)
}

/// Turns translation records into replacement lines.
///
/// Records without key or replacement are skipped. Fails if any
/// replacement cannot be represented in `encoding`.
pub fn build_line_map(
    records: &[TranslationRecord],
    encoding: Encoding,
    config: &ExtraConfig,
) -> Result<LineMap> {
    let mut lines = LineMap::new();
    for record in records {
        if record.key.is_empty() {
            continue;
        }
        let text = match record.replacement() {
            Some(text) => text,
            None => continue,
        };
        let text = if config.replace_name_brackets {
            crate::format::replace_name_brackets(text)
        } else {
            text.to_string()
        };
        encode_string(encoding, &escape_script_newlines(&text), true).map_err(|e| {
            anyhow::anyhow!("Translation for {} cannot be encoded: {}", record.key, e)
        })?;
        if lines.insert(record.key.clone(), text).is_some() {
            tracing::debug!("Duplicate translation for {}, keeping the last one", record.key);
        }
    }
    Ok(lines)
}

/// Where a processed input file goes.
pub fn output_path(filename: &str, output: &str, is_dir: bool) -> String {
    if is_dir || Path::new(output).is_dir() {
        let mut pb = PathBuf::from(output);
        pb.push(crate::utils::files::base_name(filename));
        pb.to_string_lossy().into_owned()
    } else {
        output.to_string()
    }
}

/// Compares a patched script with a known-good build of it.
/// Returns whether both are identical; differences are only warned about.
pub fn check_reference(filename: &str, data: &[u8], reference: &str) -> bool {
    let path = if Path::new(reference).is_dir() {
        Path::new(reference).join(crate::utils::files::base_name(filename))
    } else {
        PathBuf::from(reference)
    };
    match std::fs::read(&path) {
        Ok(expected) if expected == data => {
            tracing::debug!("{} matches {}", filename, path.display());
            true
        }
        Ok(expected) => {
            let first = data
                .iter()
                .zip(expected.iter())
                .position(|(a, b)| a != b)
                .unwrap_or(data.len().min(expected.len()));
            tracing::warn!(
                "{} differs from reference {} (len: {} vs {}, first difference at {:#x})",
                filename,
                path.display(),
                data.len(),
                expected.len(),
                first
            );
            crate::COUNTER.inc_warning();
            false
        }
        Err(e) => {
            tracing::warn!("Reference {} not usable: {}", path.display(), e);
            crate::COUNTER.inc_warning();
            false
        }
    }
}

/// Patches one script and writes it below `output`.
pub fn patch_file(
    filename: &str,
    encoding: Option<TextEncoding>,
    config: &ExtraConfig,
    lines: &LineMap,
    output: &str,
    is_dir: bool,
    reference: Option<&str>,
) -> Result<ScriptResult> {
    tracing::info!("Patching {}", filename);
    let script = parse_script(filename, encoding, config)?;
    let out_f = output_path(filename, output, is_dir);
    let data = script.import_lines_filename(lines, &out_f)?;
    if let Some(reference) = reference {
        check_reference(filename, &data, reference);
    }
    Ok(ScriptResult::Ok)
}

/// Writes the translation table to `output`.
pub fn write_table(records: &[TranslationRecord], output: &str) -> Result<()> {
    let data = crate::output_scripts::csv::write_records(records)?;
    let mut f = crate::utils::files::write_file(output)?;
    f.write_all(&data)?;
    f.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripts::scn::marker::text_marker;
    use std::fs;

    fn sample_script(lines: &[&[u8]]) -> Vec<u8> {
        let mut data = vec![0u8; 12];
        for (i, line) in lines.iter().enumerate() {
            data.extend_from_slice(&text_marker(i as u32));
            data.extend_from_slice(line);
            data.push(0);
        }
        let total = (data.len() - 12) as u32;
        data[..4].copy_from_slice(&total.to_le_bytes());
        data
    }

    fn config() -> ExtraConfig {
        ExtraConfig {
            policy: ScnPolicy::empty(),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_line_map() {
        let records = vec![
            TranslationRecord {
                key: "a.scn-text-0".to_string(),
                translated_text: "【Ai】Hi".to_string(),
                ..Default::default()
            },
            TranslationRecord {
                key: "a.scn-text-1".to_string(),
                ..Default::default()
            },
            TranslationRecord {
                translated_text: "orphan".to_string(),
                ..Default::default()
            },
        ];
        let lines = build_line_map(&records, Encoding::Cp932, &config()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines["a.scn-text-0"], "「Ai」Hi");

        let bad = vec![TranslationRecord {
            key: "a.scn-text-0".to_string(),
            edited_text: "😀".to_string(),
            ..Default::default()
        }];
        assert!(build_line_map(&bad, Encoding::Cp932, &config()).is_err());
    }

    #[test]
    fn test_extract_and_patch() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let tl = dir.path().join("tl");
        let out = dir.path().join("out");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&tl).unwrap();
        fs::write(src.join("1_1.scn"), sample_script(&[b"one", b"two"])).unwrap();
        fs::write(tl.join("1_1.scn"), sample_script(&[b"uno   ", b"two"])).unwrap();
        let cfg = config();

        let mut existing = LineMap::new();
        collect_translations(tl.join("1_1.scn").to_str().unwrap(), None, &cfg, &mut existing)
            .unwrap();
        let src_file = src.join("1_1.scn");
        let records =
            extract_file(src_file.to_str().unwrap(), None, &cfg, &existing).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].translated_text, "uno");
        // Same as the original, so not prefilled.
        assert_eq!(records[1].translated_text, "");

        let table = dir.path().join("tllines.csv");
        write_table(&records, table.to_str().unwrap()).unwrap();
        let mut records =
            crate::output_scripts::csv::read_records(&fs::read(&table).unwrap()).unwrap();
        records[1].edited_text = "dos".to_string();
        let lines = build_line_map(&records, Encoding::Cp932, &cfg).unwrap();

        patch_file(
            src_file.to_str().unwrap(),
            None,
            &cfg,
            &lines,
            out.to_str().unwrap(),
            true,
            None,
        )
        .unwrap();
        let patched = fs::read(out.join("1_1.scn")).unwrap();
        assert_eq!(patched, sample_script(&[b"uno", b"dos"]));
        assert!(check_reference(
            "1_1.scn",
            &patched,
            dir.path().join("out").to_str().unwrap()
        ));
        assert!(!check_reference("1_1.scn", &patched, src.to_str().unwrap()));
    }

    #[test]
    fn test_unsupported_file() {
        assert!(find_builder("a.txt").is_err());
        assert!(find_builder("dir/A.SCN").is_ok());
    }
}
