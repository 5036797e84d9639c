//! User String Heap (`#US`) for CLI metadata.
//!
//! Provides access to the ECMA-335 `#US` heap, which stores user-defined string literals
//! in UTF-16 encoding, each prefixed with a compressed byte length and closed by a terminal
//! flag byte.
//!
//! # Reference
//! - [ECMA-335 II.24.2.4](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use widestring::U16String;

use crate::{Error::OutOfBounds, Parser, Result};

/// The `UserStrings` heap contains all user defined string literals (`ldstr` targets).
/// An index is a byte offset at which a compressed length is followed by UTF-16 code
/// units and one terminal byte flagging whether the string contains special characters.
///
/// The heap owns its buffer; lookups are O(1) given an index.
///
/// # Examples
///
/// ```rust
/// use pescope::metadata::streams::UserStrings;
/// let us = UserStrings::from(vec![0x00, 0x05, b'H', 0x00, b'i', 0x00, 0x00]).unwrap();
/// assert_eq!(us.get(1).unwrap(), "Hi");
/// ```
///
/// ## Reference
/// * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.24.2.4
pub struct UserStrings {
    data: Vec<u8>,
}

impl UserStrings {
    /// Create a `UserStrings` heap from its raw bytes
    ///
    /// # Arguments
    /// * 'data' - The heap buffer, must start with a NUL byte
    ///
    /// # Errors
    /// Returns an error if the user string heap data is empty or malformed
    pub fn from(data: Vec<u8>) -> Result<UserStrings> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Provided #US heap is invalid"));
        }

        Ok(UserStrings { data })
    }

    /// Get the string literal at the provided heap offset
    ///
    /// ## Arguments
    /// * 'index' - The offset within the heap to be accessed (comes from `ldstr` tokens)
    ///
    /// # Errors
    /// Returns an error if the index is out of bounds or the entry is not valid UTF-16
    pub fn get(&self, index: usize) -> Result<String> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(&self.data);
        parser.seek(index)?;

        let byte_length = parser.read_compressed_uint()? as usize;
        if byte_length == 0 {
            return Ok(String::new());
        }

        // Entries are 2n UTF-16 bytes plus one terminal flag byte
        if byte_length % 2 == 0 {
            return Err(malformed_error!(
                "Invalid #US entry length {} at index {}",
                byte_length,
                index
            ));
        }

        let bytes = parser.read_bytes(byte_length - 1)?;
        let mut utf16_chars: Vec<u16> = Vec::with_capacity(bytes.len() / 2);
        for pair in bytes.chunks_exact(2) {
            utf16_chars.push(u16::from_le_bytes([pair[0], pair[1]]));
        }

        let wide = U16String::from_vec(utf16_chars);
        wide.to_string()
            .map_err(|_| malformed_error!("Invalid UTF-16 string at index - {}", index))
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
        let data = vec![
            0x00, 0x1b,
            0x48, 0x00, 0x65, 0x00, 0x6c, 0x00, 0x6c, 0x00, 0x6f, 0x00, 0x2c, 0x00, 0x20, 0x00,
            0x57, 0x00, 0x6f, 0x00, 0x72, 0x00, 0x6c, 0x00, 0x64, 0x00, 0x21, 0x00,
            0x00,
        ];

        let us_str = UserStrings::from(data).unwrap();
        assert_eq!(us_str.get(1).unwrap(), "Hello, World!");
    }

    #[test]
    fn empty_entry() {
        let us_str = UserStrings::from(vec![0x00, 0x00]).unwrap();
        assert_eq!(us_str.get(1).unwrap(), "");
    }

    #[test]
    fn invalid() {
        assert!(UserStrings::from(vec![]).is_err());
        assert!(UserStrings::from(vec![0x22, 0x1b]).is_err());

        // Even byte length has no terminal byte
        let us_str = UserStrings::from(vec![0x00, 0x02, 0x41, 0x00]).unwrap();
        assert!(us_str.get(1).is_err());

        // Length runs past the heap
        let us_str = UserStrings::from(vec![0x00, 0x1b, 0x41]).unwrap();
        assert!(us_str.get(1).is_err());
    }
}
