//! String Heap (`#Strings`) for CLI metadata.
//!
//! Provides access to the ECMA-335 `#Strings` heap, which stores identifier strings in
//! UTF-8 encoding. This module exposes the [`Strings`] struct for safe access to the
//! identifier strings referenced by metadata tables.
//!
//! # Reference
//! - [ECMA-335 II.24.2.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::ffi::CStr;

use crate::{Error::OutOfBounds, Result};

/// '#Strings' holds the identifiers referenced from other tables within the CLI metadata:
/// type names, method names, namespaces, and so on. An index into the heap is a byte
/// offset; the string runs to the next NUL terminator.
///
/// The heap owns its buffer; lookups are O(1) given an index.
///
/// # Examples
///
/// ```rust
/// use pescope::metadata::streams::Strings;
/// let strings = Strings::from(vec![0, b'H', b'e', b'l', b'l', b'o', 0]).unwrap();
/// assert_eq!(strings.get(1).unwrap(), "Hello");
/// ```
///
/// ## Reference
/// * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.24.2.3
pub struct Strings {
    data: Vec<u8>,
}

impl Strings {
    /// Create a `Strings` heap from its raw bytes
    ///
    /// # Arguments
    /// * 'data' - The heap buffer, must start with a NUL byte
    ///
    /// # Errors
    /// Returns an error if the string heap data is empty or malformed
    pub fn from(data: Vec<u8>) -> Result<Strings> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Provided #Strings heap is invalid"));
        }

        Ok(Strings { data })
    }

    /// Get the string at the provided heap offset
    ///
    /// ## Arguments
    /// * 'index' - The offset within the heap to be accessed (comes from metadata tables)
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds or the string data is invalid UTF-8
    pub fn get(&self, index: usize) -> Result<&str> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        match CStr::from_bytes_until_nul(&self.data[index..]) {
            Ok(result) => match result.to_str() {
                Ok(result) => Ok(result),
                Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
            },
            Err(_) => Err(malformed_error!("Invalid string at index - {}", index)),
        }
    }

    /// The heap's raw bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
