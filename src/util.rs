use std::fs;
use std::io;
use std::path::Path;

/// Lowercases `s` and replaces every run of whitespace with a single hyphen.
/// Used for filename-derived slugs and heading ids.
pub fn hyphenate(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

/// Removes `dir` and everything below it. A directory that doesn't exist is
/// already clean.
pub fn rmdir(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}

/// Writes `contents` to `path`, creating parent directories as needed.
pub fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}
