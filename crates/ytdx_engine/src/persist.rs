use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    // Writability probe.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Writes files under `dir` through a sibling temp file and a rename, so a
/// reader never sees a half-written target.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Opens a temp file in the target directory for streaming writes.
    pub fn temp_file(&self) -> Result<NamedTempFile, PersistError> {
        ensure_output_dir(&self.dir)?;
        Ok(NamedTempFile::new_in(&self.dir)?)
    }

    /// Flushes `tmp` and moves it to `{dir}/{filename}`, replacing any existing file.
    pub fn commit(&self, mut tmp: NamedTempFile, filename: &str) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        let mut tmp = self.temp_file()?;
        tmp.write_all(content.as_bytes())?;
        self.commit(tmp, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_output_dir_creates_nested_directories() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        ensure_output_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn ensure_output_dir_rejects_files() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        let err = ensure_output_dir(&file).unwrap_err();
        assert!(matches!(err, PersistError::OutputDir(_)));
    }

    #[test]
    fn write_replaces_existing_file() {
        let root = tempfile::tempdir().unwrap();
        let writer = AtomicFileWriter::new(root.path().to_path_buf());
        writer.write("cfg.json", "old").unwrap();
        let path = writer.write("cfg.json", "new").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "new");
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn commit_swaps_the_target_by_rename() {
        use std::io::Read;
        use std::os::unix::fs::MetadataExt;

        let root = tempfile::tempdir().unwrap();
        let writer = AtomicFileWriter::new(root.path().to_path_buf());
        let target = writer.write("clip.bin", "old").unwrap();
        let mut reader = fs::File::open(&target).unwrap();

        let mut tmp = writer.temp_file().unwrap();
        tmp.write_all(b"new").unwrap();
        let tmp_inode = fs::metadata(tmp.path()).unwrap().ino();
        let committed = writer.commit(tmp, "clip.bin").unwrap();

        assert_eq!(fs::metadata(&committed).unwrap().ino(), tmp_inode);
        assert_eq!(fs::read_to_string(&committed).unwrap(), "new");
        let mut old = String::new();
        reader.read_to_string(&mut old).unwrap();
        assert_eq!(old, "old");
    }
}
