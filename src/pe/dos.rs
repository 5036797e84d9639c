//! DOS header parsing and serialization.
//!
//! Every PE image starts with an `IMAGE_DOS_HEADER` whose only fields that matter to the
//! rest of the format are `e_magic` (`MZ`) and `e_lfanew`, the file offset of the PE
//! signature. The bytes in between - the DOS stub program - are preserved verbatim so a
//! rebuilt image stays byte-identical.

use crate::{Parser, Result, Writer};

/// The `MZ` signature at offset 0 of every PE image
pub const DOS_MAGIC: u16 = 0x5A4D;

/// Size of the fixed `IMAGE_DOS_HEADER` structure
pub const DOS_HEADER_SIZE: usize = 64;

/// The DOS header plus the stub program that precedes the PE signature.
///
/// The stub is carried as raw bytes: nothing in the managed toolchain reads it,
/// but a structural round-trip must reproduce it exactly.
///
/// # Examples
///
/// ```rust
/// use pescope::pe::DosHeader;
///
/// let header = DosHeader::minimal();
/// assert_eq!(header.next_header_offset(), 0x40);
/// ```
pub struct DosHeader {
    /// `e_magic`, always `MZ`
    pub e_magic: u16,
    /// `e_lfanew`, file offset of the 4-byte PE signature
    pub e_lfanew: u32,
    /// All bytes from the start of the file up to `e_lfanew`, stub included
    raw: Vec<u8>,
}

impl DosHeader {
    /// Create the smallest valid DOS header: 64 bytes, no stub, PE signature
    /// immediately following.
    #[must_use]
    pub fn minimal() -> Self {
        let mut raw = vec![0_u8; DOS_HEADER_SIZE];
        raw[0] = 0x4D;
        raw[1] = 0x5A;
        raw[0x3C] = DOS_HEADER_SIZE as u8;

        DosHeader {
            e_magic: DOS_MAGIC,
            e_lfanew: DOS_HEADER_SIZE as u32,
            raw,
        }
    }

    /// Parse a DOS header (and its stub) from the start of an image
    ///
    /// ## Arguments
    /// * 'parser' - Positioned at offset 0 of the image
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImage`] if the `MZ` magic is missing or
    /// `e_lfanew` points inside the fixed header
    pub fn parse(parser: &mut Parser) -> Result<DosHeader> {
        if parser.len() < DOS_HEADER_SIZE {
            return Err(bad_image_error!(
                "Image of {} bytes is too small for a DOS header",
                parser.len()
            ));
        }

        parser.seek(0)?;
        let e_magic = parser.read_le::<u16>()?;
        if e_magic != DOS_MAGIC {
            return Err(bad_image_error!(
                "Invalid DOS magic {:#06x} at offset 0",
                e_magic
            ));
        }

        parser.seek(0x3C)?;
        let e_lfanew = parser.read_le::<u32>()?;
        if (e_lfanew as usize) < DOS_HEADER_SIZE {
            return Err(bad_image_error!(
                "e_lfanew {:#x} points inside the DOS header",
                e_lfanew
            ));
        }

        parser.seek(0)?;
        let raw = parser.read_bytes(e_lfanew as usize)?.to_vec();

        Ok(DosHeader {
            e_magic,
            e_lfanew,
            raw,
        })
    }

    /// File offset of the 4-byte PE signature
    #[must_use]
    pub fn next_header_offset(&self) -> u32 {
        self.e_lfanew
    }

    /// The preserved header + stub bytes
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Serialize the header and stub
    pub fn write(&self, writer: &mut Writer) {
        writer.write_bytes(&self.raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_roundtrip() {
        let header = DosHeader::minimal();

        let mut writer = Writer::new();
        header.write(&mut writer);
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), DOS_HEADER_SIZE);

        let mut parser = Parser::new(&bytes);
        let reparsed = DosHeader::parse(&mut parser).unwrap();
        assert_eq!(reparsed.e_magic, DOS_MAGIC);
        assert_eq!(reparsed.e_lfanew, 0x40);
        assert_eq!(reparsed.raw(), bytes.as_slice());
    }

    #[test]
    fn stub_is_preserved() {
        let mut bytes = vec![0_u8; 0x80];
        bytes[0] = 0x4D;
        bytes[1] = 0x5A;
        bytes[0x3C] = 0x80;
        bytes[0x40..0x48].copy_from_slice(b"DOS stub");

        let mut parser = Parser::new(&bytes);
        let header = DosHeader::parse(&mut parser).unwrap();
        assert_eq!(header.e_lfanew, 0x80);
        assert_eq!(&header.raw()[0x40..0x48], b"DOS stub");
    }

    #[test]
    fn bad_magic_is_rejected() {
        let bytes = vec![0_u8; DOS_HEADER_SIZE];
        let mut parser = Parser::new(&bytes);

        let result = DosHeader::parse(&mut parser);
        assert!(matches!(result, Err(crate::Error::BadImage { .. })));
    }

    #[test]
    fn lfanew_inside_header_is_rejected() {
        let mut bytes = vec![0_u8; DOS_HEADER_SIZE];
        bytes[0] = 0x4D;
        bytes[1] = 0x5A;
        bytes[0x3C] = 0x10;

        let mut parser = Parser::new(&bytes);
        assert!(DosHeader::parse(&mut parser).is_err());
    }
}
