//! In-place patching of reserved slots in a written file.
//!
//! A patch overwrites exactly as many bytes as the slot it fills; the file
//! never grows, shrinks or shifts.

use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Read-write handle used to fill reserved slots.
#[derive(Debug)]
pub struct FilePatcher {
    file: File,
    path: PathBuf,
    size: u64,
}

impl FilePatcher {
    /// Open an existing file for patching.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self { file, path, size })
    }

    /// Size of the file when it was opened.
    pub fn file_size(&self) -> u64 {
        self.size
    }

    /// Path of the patched file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the `slot_len` bytes starting at `offset` with `bytes`.
    ///
    /// `bytes` must be exactly `slot_len` long and the slot must lie inside
    /// the file.
    pub fn patch(&mut self, offset: u64, slot_len: usize, bytes: &[u8]) -> Result<()> {
        if bytes.len() != slot_len {
            return Err(Error::PatchLengthMismatch {
                offset,
                expected: slot_len,
                actual: bytes.len(),
            });
        }

        let in_bounds = offset
            .checked_add(slot_len as u64)
            .map_or(false, |end| end <= self.size);
        if !in_bounds {
            return Err(Error::PatchOutOfBounds {
                offset,
                len: slot_len,
                file_size: self.size,
            });
        }

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        self.file.flush()?;

        log::trace!("patched {} bytes at offset {} in {}", slot_len, offset, self.path.display());
        Ok(())
    }
}

/// Open `path`, apply a single patch and close it.
pub fn patch_file(path: impl AsRef<Path>, offset: u64, slot_len: usize, bytes: &[u8]) -> Result<()> {
    FilePatcher::open(path)?.patch(offset, slot_len, bytes)
}
