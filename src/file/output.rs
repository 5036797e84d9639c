//! Memory-mapped file handling for binary output.
//!
//! This module provides the [`Output`] type for writing rebuilt PE images to disk.
//! The destination file is created at its final size up front and memory-mapped for
//! random-access writes; an unfinalized output is deleted on drop so interrupted
//! rebuilds never leave a truncated image behind.

use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};

use crate::{Error::FileError, Result};

/// A memory-mapped output file with finalize-or-cleanup semantics.
///
/// Rebuilt images are written through `Output` rather than a plain
/// [`std::fs::File`]: the total size is known after layout assignment, so the
/// file can be created at full size and filled through the mapping. Until
/// [`Output::finalize`] is called the file is considered incomplete and is
/// removed when the `Output` is dropped.
///
/// # Examples
///
/// ```rust,no_run
/// use pescope::file::Output;
///
/// let mut output = Output::create("rebuilt.exe", 4096)?;
/// output.write_at(0, b"MZ")?;
/// output.finalize()?;
/// # Ok::<(), pescope::Error>(())
/// ```
pub struct Output {
    mmap: MmapMut,
    target_path: PathBuf,
    finalized: bool,
}

impl Output {
    /// Creates a new memory-mapped output file of the given size.
    ///
    /// # Arguments
    ///
    /// * `target_path` - The path where the file should be created
    /// * `size` - The total size of the file to create
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the file cannot be created, sized,
    /// or mapped.
    pub fn create<P: AsRef<Path>>(target_path: P, size: u64) -> Result<Self> {
        let target_path = target_path.as_ref().to_path_buf();

        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&target_path)
            .map_err(FileError)?;

        file.set_len(size).map_err(FileError)?;

        let mmap = unsafe { MmapOptions::new().map_mut(&file).map_err(FileError)? };

        Ok(Self {
            mmap,
            target_path,
            finalized: false,
        })
    }

    /// Writes data at a specific offset in the file.
    ///
    /// # Arguments
    /// * `offset` - Byte offset where to write the data
    /// * `data` - Byte slice to write to the file
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the write would exceed the file size.
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let start = usize::try_from(offset).map_err(|_| crate::Error::OutOfBounds)?;
        let Some(end) = start.checked_add(data.len()) else {
            return Err(crate::Error::OutOfBounds);
        };

        if end > self.mmap.len() {
            return Err(crate::Error::OutOfBounds);
        }

        self.mmap[start..end].copy_from_slice(data);
        Ok(())
    }

    /// Gets the total size of the file.
    pub fn size(&self) -> u64 {
        self.mmap.len() as u64
    }

    /// Gets the target path where the file will be created.
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Finalizes the file by flushing all pending writes.
    ///
    /// After this call the file is complete and will remain at the target path.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the flush fails.
    pub fn finalize(mut self) -> Result<()> {
        self.mmap.flush().map_err(FileError)?;
        self.finalized = true;
        Ok(())
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        if !self.finalized {
            // Incomplete output, remove it
            let _ = self.mmap.flush();
            let _ = std::fs::remove_file(&self.target_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs::File, io::Read};
    use tempfile::tempdir;

    #[test]
    fn test_write_and_finalize() {
        let temp_dir = tempdir().unwrap();
        let target_path = temp_dir.path().join("test.bin");

        {
            let mut output = Output::create(&target_path, 16).unwrap();
            output.write_at(0, b"Test content").unwrap();
            output.finalize().unwrap();
        }

        assert!(target_path.exists());

        let mut file = File::open(&target_path).unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();

        assert_eq!(&contents[0..12], b"Test content");
        assert_eq!(contents.len(), 16);
    }

    #[test]
    fn test_unfinalized_cleanup() {
        let temp_dir = tempdir().unwrap();
        let target_path = temp_dir.path().join("incomplete.bin");

        {
            let mut output = Output::create(&target_path, 16).unwrap();
            output.write_at(0, b"partial").unwrap();
        }

        assert!(!target_path.exists());
    }

    #[test]
    fn test_bounds_checking() {
        let temp_dir = tempdir().unwrap();
        let target_path = temp_dir.path().join("test.bin");

        let mut output = Output::create(&target_path, 10).unwrap();

        assert!(output.write_at(8, b"too long").is_err());
        assert!(output.write_at(10, &[0x42]).is_err());
        assert!(output.write_at(0, &[0x42; 10]).is_ok());
    }
}
