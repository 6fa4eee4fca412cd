//! File sink implementation

use crate::core::{LoggerError, Result, Sink};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Create the parent directory of `path` if it has one
pub(crate) fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation("creating log directory", parent.display().to_string(), e)
            })?;
        }
    }
    Ok(())
}

/// Open `path` for appending, creating missing directories
pub(crate) fn open_append(path: &Path) -> Result<BufWriter<File>> {
    create_parent_dir(path)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LoggerError::io_operation("opening log file", path.display().to_string(), e))?;
    Ok(BufWriter::new(file))
}

/// Appends everything to one file
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let writer = open_append(&path)?;
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn log(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_sink_creates_directories_and_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/app.log");

        {
            let mut sink = FileSink::new(&path).unwrap();
            sink.log(b"first\n").unwrap();
        }
        {
            let mut sink = FileSink::new(&path).unwrap();
            sink.log(b"second\n").unwrap();
            sink.flush().unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
