use crate::scripts::ALL_EXTS;
use std::fs;
use std::io;
use std::io::{Read, Write};
use std::path::Path;

fn has_script_ext(path: &Path) -> bool {
    path.file_name().map_or(false, |file| {
        let file = file.to_string_lossy().to_lowercase();
        ALL_EXTS
            .iter()
            .any(|ext| file.ends_with(&format!(".{}", ext)))
    })
}

pub fn find_files(path: &str, recursive: bool) -> io::Result<Vec<String>> {
    let mut result = Vec::new();
    let dir_path = Path::new(&path);

    if dir_path.is_dir() {
        for entry in fs::read_dir(dir_path)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && has_script_ext(&path) {
                if let Some(path_str) = path.to_str() {
                    result.push(path_str.to_string());
                }
            } else if recursive && path.is_dir() {
                if let Some(path_str) = path.to_str() {
                    let mut sub_files = find_files(path_str, recursive)?;
                    result.append(&mut sub_files);
                }
            }
        }
    }
    result.sort();
    Ok(result)
}

/// Expands `path` into script files. The flag tells whether `path` was a directory.
pub fn collect_files(path: &str, recursive: bool) -> io::Result<(Vec<String>, bool)> {
    let pa = Path::new(path);
    if pa.is_dir() {
        return Ok((find_files(path, recursive)?, true));
    }
    if pa.is_file() {
        return Ok((vec![path.to_string()], false));
    }
    Err(io::Error::new(
        io::ErrorKind::NotFound,
        format!("Path {} is neither a file nor a directory", pa.display()),
    ))
}

pub fn read_file<F: AsRef<Path> + ?Sized>(f: &F) -> io::Result<Vec<u8>> {
    let mut content = Vec::new();
    if f.as_ref() == Path::new("-") {
        io::stdin().read_to_end(&mut content)?;
    } else {
        content = fs::read(f)?;
    }
    Ok(content)
}

pub fn write_file<F: AsRef<Path> + ?Sized>(f: &F) -> io::Result<Box<dyn Write>> {
    Ok(if f.as_ref() == Path::new("-") {
        Box::new(io::stdout())
    } else {
        make_sure_dir_exists(f)?;
        Box::new(io::BufWriter::new(fs::File::create(f)?))
    })
}

pub fn make_sure_dir_exists<F: AsRef<Path> + ?Sized>(f: &F) -> io::Result<()> {
    let path = f.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// File name component of `path`, used as the record file name.
pub fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_files() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join("b.scn"), b"").unwrap();
        fs::write(dir.path().join("A.SCN"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::write(sub.join("c.scn"), b"").unwrap();
        let root = dir.path().to_str().unwrap();

        let (files, is_dir) = collect_files(root, false).unwrap();
        assert!(is_dir);
        let names: Vec<_> = files.iter().map(|f| base_name(f)).collect();
        assert_eq!(names, vec!["A.SCN", "b.scn"]);

        let (files, _) = collect_files(root, true).unwrap();
        assert_eq!(files.len(), 3);

        let single = dir.path().join("b.scn");
        let (files, is_dir) = collect_files(single.to_str().unwrap(), false).unwrap();
        assert!(!is_dir);
        assert_eq!(files.len(), 1);

        assert!(collect_files(dir.path().join("missing").to_str().unwrap(), false).is_err());
    }
}
