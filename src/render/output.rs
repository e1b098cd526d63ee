//! Writing rendered bytes to disk.
//!
//! A [`PartialFile`] removes itself when dropped before [`PartialFile::commit`],
//! so a failed write never leaves a truncated drawing behind.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::GadError;
use crate::log::debug;

/// An output file that is deleted unless committed
pub struct PartialFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    committed: bool,
}

impl PartialFile {
    pub fn create(path: &Path) -> Result<Self, GadError> {
        let file = File::create(path).map_err(|source| GadError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), GadError> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        writer.write_all(bytes).map_err(|source| GadError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Flush and close the file, keeping it.
    pub fn commit(mut self) -> Result<(), GadError> {
        let result = match self.writer.take() {
            Some(writer) => writer
                .into_inner()
                .map_err(|e| e.into_error())
                .and_then(|file| file.sync_all()),
            None => Ok(()),
        };
        match result {
            Ok(()) => {
                self.committed = true;
                Ok(())
            }
            Err(source) => Err(GadError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        drop(self.writer.take());
        if fs::remove_file(&self.path).is_ok() {
            debug!(path = %self.path.display(), "removed partial output");
        }
    }
}

/// Write `bytes` to `path`, leaving no file behind on failure.
pub fn write_guarded(path: &Path, bytes: &[u8]) -> Result<(), GadError> {
    let mut file = PartialFile::create(path)?;
    file.write_all(bytes)?;
    file.commit()
}
