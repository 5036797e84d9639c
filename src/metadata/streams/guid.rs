//! GUID Heap (`#GUID`) for CLI metadata.
//!
//! Provides access to the ECMA-335 `#GUID` heap, which stores 16-byte GUIDs referenced by
//! 1-based indexes from metadata tables.
//!
//! # Reference
//! - [ECMA-335 II.24.2.5](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{Error::OutOfBounds, Result};

/// The '#GUID' heap is a flat array of 16-byte GUIDs. Indexes from metadata tables are
/// 1-based: index `n` addresses bytes `(n - 1) * 16 .. n * 16`. Index 0 encodes "no GUID".
///
/// The heap owns its buffer; lookups are O(1) given an index.
///
/// # Examples
///
/// ```rust
/// use pescope::metadata::streams::Guid;
/// let guid = Guid::from(vec![0xAA; 16]).unwrap();
/// assert_eq!(guid.get(1).unwrap(), &[0xAA; 16]);
/// ```
///
/// ## Reference
/// * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.24.2.5
pub struct Guid {
    data: Vec<u8>,
}

impl Guid {
    /// Create a `Guid` heap from its raw bytes
    ///
    /// # Arguments
    /// * 'data' - The heap buffer, must be a multiple of 16 bytes
    ///
    /// # Errors
    /// Returns an error if the heap size is not a multiple of 16
    pub fn from(data: Vec<u8>) -> Result<Guid> {
        if data.len() % 16 != 0 {
            return Err(malformed_error!(
                "#GUID heap size {} is not a multiple of 16",
                data.len()
            ));
        }

        Ok(Guid { data })
    }

    /// Get the GUID at the provided 1-based index
    ///
    /// ## Arguments
    /// * 'index' - The 1-based index from a metadata table column
    ///
    /// # Errors
    /// Returns an error for index zero or an index beyond the heap
    pub fn get(&self, index: usize) -> Result<&[u8]> {
        if index == 0 {
            return Err(malformed_error!("#GUID index 0 encodes the null GUID"));
        }

        let start = (index - 1) * 16;
        let end = start + 16;
        if end > self.data.len() {
            return Err(OutOfBounds);
        }

        Ok(&self.data[start..end])
    }

    /// Format the GUID at `index` in registry form
    ///
    /// # Errors
    /// See [`Guid::get`]
    pub fn get_formatted(&self, index: usize) -> Result<String> {
        let bytes = self.get(index)?;

        let data1 = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let data2 = u16::from_le_bytes([bytes[4], bytes[5]]);
        let data3 = u16::from_le_bytes([bytes[6], bytes[7]]);

        Ok(format!(
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            data1,
            data2,
            data3,
            bytes[8],
            bytes[9],
            bytes[10],
            bytes[11],
            bytes[12],
            bytes[13],
            bytes[14],
            bytes[15]
        ))
    }

    /// Amount of GUIDs in the heap
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.len() / 16
    }

    /// The heap's raw bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
