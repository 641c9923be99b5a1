//! Retrieval of the translation table from a local path or a remote location.
use anyhow::Result;

/// Whether the source names a remote location.
pub fn is_url(s: &str) -> bool {
    s.starts_with("http")
}

/// Reads the raw bytes of a translation table.
pub fn fetch(source: &str) -> Result<Vec<u8>> {
    if is_url(source) {
        download(source)
    } else {
        Ok(crate::utils::files::read_file(source)?)
    }
}

#[cfg(feature = "download")]
fn download(url: &str) -> Result<Vec<u8>> {
    tracing::info!("Downloading translation from {}", url);
    let resp = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(resp.bytes()?.to_vec())
}

#[cfg(not(feature = "download"))]
fn download(url: &str) -> Result<Vec<u8>> {
    Err(anyhow::anyhow!(
        "Cannot fetch {}: built without the download feature",
        url
    ))
}

#[test]
fn test_is_url() {
    assert!(is_url("https://example.com/sheet.csv"));
    assert!(is_url("http://localhost/a.csv"));
    assert!(!is_url("tllines.csv"));
    assert!(!is_url("./http/tllines.csv"));
}
