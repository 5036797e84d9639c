use super::Backend;
use crate::{
    Error::{FileError, OutOfBounds},
    Result,
};

use memmap2::Mmap;
use std::{fs, path::Path};

/// Input image backed by a physical file on disk
#[derive(Debug)]
pub struct Physical {
    data: Mmap,
}

impl Physical {
    /// Create a new physical backend
    ///
    /// ## Arguments
    /// * 'path' - The file path to use
    pub fn new(path: &Path) -> Result<Physical> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => return Err(FileError(error)),
        };

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(OutOfBounds);
        };

        if offset_end > self.data.len() {
            return Err(OutOfBounds);
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_invalid_file_path() {
        let result = Physical::new(Path::new("/nonexistent/path/to/file.dll"));
        assert!(result.is_err());
        match result.unwrap_err() {
            FileError(io_error) => {
                assert_eq!(io_error.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected FileError"),
        }
    }

    #[test]
    fn test_physical_reads() {
        let temp_dir = tempfile::tempdir().unwrap();
        let temp_path = temp_dir.path().join("backing.bin");
        std::fs::write(&temp_path, [0x4D, 0x5A, 0x90, 0x00, 0x03]).unwrap();

        let physical = Physical::new(&temp_path).unwrap();
        assert_eq!(physical.len(), 5);
        assert_eq!(physical.data()[0], 0x4D);
        assert_eq!(physical.data_slice(1, 2).unwrap(), &[0x5A, 0x90]);
        assert!(physical.data_slice(4, 2).is_err());
        assert!(physical.data_slice(usize::MAX, 1).is_err());
    }
}
