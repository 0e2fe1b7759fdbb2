//! Atomic output writes.
//!
//! Every output lands via a sibling temporary under the final directory that
//! is renamed into place on success. The temporary is removed on any error or
//! abort, so partial outputs are never visible. Renaming replaces a symlink
//! entry at the destination rather than following it.

use crate::error::{Result, ScrubError};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// An output being written to a sibling temporary. Dropping it without
/// [`AtomicFile::commit`] discards the temporary.
#[derive(Debug)]
pub struct AtomicFile {
    tmp: NamedTempFile,
    dest: PathBuf,
}

impl AtomicFile {
    /// Start an atomic write targeting `dest`, creating parent directories.
    pub fn begin(dest: &Path) -> Result<Self> {
        let parent = dest.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            std::fs::create_dir_all(parent)?;
        }
        let dir = parent.unwrap_or_else(|| Path::new("."));
        let file_name = dest.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let tmp = tempfile::Builder::new()
            .prefix(&format!(".{file_name}."))
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| {
                ScrubError::output_write(format!(
                    "failed to create temporary in {}: {e}",
                    dir.display()
                ))
            })?;
        Ok(Self { tmp, dest: dest.to_path_buf() })
    }

    /// The open temporary, for streaming writers (e.g. an archive builder).
    pub fn file(&mut self) -> &mut File {
        self.tmp.as_file_mut()
    }

    /// Rename the temporary over the destination.
    pub fn commit(self) -> Result<()> {
        let dest = self.dest;
        self.tmp.persist(&dest).map_err(|e| {
            ScrubError::output_write(format!("failed to persist {}: {}", dest.display(), e.error))
        })?;
        Ok(())
    }
}

/// Write `bytes` to `dest` atomically.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let mut out = AtomicFile::begin(dest)?;
    out.file().write_all(bytes)?;
    out.commit()
}

/// Copy `src` to `dest` atomically, streaming through the temporary.
pub fn copy_atomic(src: &Path, dest: &Path) -> Result<()> {
    let mut out = AtomicFile::begin(dest)?;
    let mut input = File::open(src)?;
    std::io::copy(&mut input, out.file())?;
    out.commit()
}
