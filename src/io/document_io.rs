use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::parse::normalize_line_endings;

/// Error type for document and config I/O
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not parse config: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not watch document: {0}")]
    WatchError(#[from] notify::Error),
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}

/// Read a task document, with line endings normalized to `\n`.
/// A missing file reads as an empty document.
pub fn read_document(path: &Path) -> Result<String, DocumentError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(normalize_line_endings(&text).into_owned()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(DocumentError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Replace the document's content on disk.
pub fn save_document(path: &Path, text: &str) -> Result<(), DocumentError> {
    atomic_write(path, text.as_bytes()).map_err(|e| DocumentError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write via a temp file in the same directory, then rename over the target.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("todo.txt");

        atomic_write(&path, b"[ ] a\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[ ] a\n");

        // Overwrite
        atomic_write(&path, b"[x] a\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[x] a\n");
    }

    #[test]
    fn test_read_normalizes_line_endings() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("todo.txt");
        fs::write(&path, "[ ] a\r\n[x] b\r").unwrap();
        assert_eq!(read_document(&path).unwrap(), "[ ] a\n[x] b\n");
    }

    #[test]
    fn test_read_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(read_document(&tmp.path().join("nope.txt")).unwrap(), "");
    }

    #[test]
    fn test_read_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = read_document(tmp.path()).unwrap_err();
        assert!(matches!(err, DocumentError::ReadError { .. }));
    }

    #[test]
    fn test_save_then_read() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("todo.txt");
        save_document(&path, "[*] doing\n").unwrap();
        assert_eq!(read_document(&path).unwrap(), "[*] doing\n");
    }
}
