//! Blob Heap (`#Blob`) for CLI metadata.
//!
//! Provides access to the ECMA-335 `#Blob` heap, which stores binary data such as
//! signatures, constants, and custom attribute values. Each entry is prefixed by a
//! compressed length.
//!
//! # Reference
//! - [ECMA-335 II.24.2.4](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{Error::OutOfBounds, Parser, Result};

/// '#Blob' points to streams of bytes. Each valid blob is referenced from a table column,
/// and each carries its byte length as a compressed integer prefix. Chunks not referenced
/// by any column may exist in between valid entries.
///
/// The heap owns its buffer; lookups are O(1) given an index.
///
/// # Examples
///
/// ```rust
/// use pescope::metadata::streams::Blob;
/// let blob = Blob::from(vec![0u8, 0x03, 0x41, 0x42, 0x43]).unwrap();
/// assert_eq!(blob.get(1).unwrap(), &[0x41, 0x42, 0x43]);
/// ```
///
/// ## Reference
/// * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.24.2.4
pub struct Blob {
    data: Vec<u8>,
}

impl Blob {
    /// Create a `Blob` heap from its raw bytes
    ///
    /// # Arguments
    /// * 'data'    - The heap buffer, must start with a NUL byte
    ///
    /// # Errors
    /// Returns an error if the data is empty or doesn't start with a null byte
    pub fn from(data: Vec<u8>) -> Result<Blob> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #Blob heap"));
        }

        Ok(Blob { data })
    }

    /// Get a view into the bytes contained at the provided location. This decodes the
    /// compressed length prefix and returns the entry's payload.
    ///
    /// ## Arguments
    /// * 'index' - The offset within the heap to be accessed (comes from metadata tables)
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds or the length prefix is invalid
    pub fn get(&self, index: usize) -> Result<&[u8]> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(&self.data);
        parser.seek(index)?;

        let length = parser
            .read_compressed_uint()
            .map_err(|_| malformed_error!("Invalid blob index - {}", index))?;

        parser.read_bytes(length as usize)
    }

    /// The heap's raw bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data = {
            let mut data = vec![0xCC; 262143];
            /* i - 0    - should always be 0    */ data[0]          = 0b_00000000_u8;

            /* i - 1    - len 10                */ data[1]          = 0b_00001010_u8;
            /* i - 1    - len 10                */ data[2..12]      .copy_from_slice(&[0x0A; 10]);

            /* i - 12   - len 5                 */ data[12]         = 0b_00000101_u8;
            /* i - 12   - len 5                 */ data[13..18]     .copy_from_slice(&[0xAB; 5]);

            /* i - 18   - invalid lead byte     */ data[18]         = 0b_11111111_u8;

            /* i - 19   - len 257               */ data[19]         = 0b_10000001_u8;
            /* i - 19   - len 257               */ data[20]         = 0b_00000001_u8;
            /* i - 19   - len 257               */ data[21..278]    .copy_from_slice(&[0xBA; 257]);

            /* i - 278  - len 65793             */ data[278]        = 0b_11000000_u8;
            /* i - 278  - len 65793             */ data[279]        = 0b_00000001_u8;
            /* i - 278  - len 65793             */ data[280]        = 0b_00000001_u8;
            /* i - 278  - len 65793             */ data[281]        = 0b_00000001_u8;
            /* i - 278  - len 65793             */ data[282..66075] .copy_from_slice(&[0xBA; 65793]);

            data
        };

        let blob = Blob::from(data).unwrap();

        {
            let indexed = blob.get(0).unwrap();
            assert_eq!(indexed.len(), 0);
        }

        {
            let indexed = blob.get(1).unwrap();
            assert_eq!(indexed, &[0x0A; 10]);
        }

        {
            let indexed = blob.get(12).unwrap();
            assert_eq!(indexed, &[0xAB; 5]);
        }

        {
            if blob.get(18).is_ok() {
                panic!("This should not be valid!")
            }
        }

        {
            let indexed = blob.get(19).unwrap();
            assert_eq!(indexed.len(), 257);
        }

        {
            let indexed = blob.get(278).unwrap();
            assert_eq!(indexed.len(), 65793);
        }
    }

    #[test]
    fn truncated_entry() {
        let blob = Blob::from(vec![0x00, 0x05, 0x01]).unwrap();
        assert!(blob.get(1).is_err());
    }
}
