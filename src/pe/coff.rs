//! COFF file header parsing and serialization.

use bitflags::bitflags;

use crate::{Parser, Result, Writer};

/// Size of the COFF file header in bytes
pub const COFF_HEADER_SIZE: usize = 20;

bitflags! {
    /// `Characteristics` field of the COFF file header
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CoffCharacteristics: u16 {
        /// Relocation information stripped
        const RELOCS_STRIPPED = 0x0001;
        /// Image is executable
        const EXECUTABLE_IMAGE = 0x0002;
        /// COFF line numbers stripped
        const LINE_NUMS_STRIPPED = 0x0004;
        /// COFF symbol table stripped
        const LOCAL_SYMS_STRIPPED = 0x0008;
        /// Image can handle addresses beyond 2GB
        const LARGE_ADDRESS_AWARE = 0x0020;
        /// Machine is 32-bit
        const MACHINE_32BIT = 0x0100;
        /// Debug information stripped
        const DEBUG_STRIPPED = 0x0200;
        /// Image is a DLL
        const DLL = 0x2000;
    }
}

/// The 20-byte COFF file header following the PE signature.
///
/// `number_of_sections` mirrors the section table length; the rebuild pass keeps
/// the two in sync.
pub struct CoffHeader {
    /// Target machine type (0x014C for i386, 0x8664 for x64)
    pub machine: u16,
    /// Amount of entries in the section table
    pub number_of_sections: u16,
    /// Link time, seconds since epoch
    pub time_date_stamp: u32,
    /// Deprecated, zero for images
    pub pointer_to_symbol_table: u32,
    /// Deprecated, zero for images
    pub number_of_symbols: u32,
    /// Size of the optional header that follows
    pub size_of_optional_header: u16,
    /// Image attributes
    pub characteristics: CoffCharacteristics,
}

impl CoffHeader {
    /// Parse a COFF file header at the parser's current position
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the header does not fit
    pub fn parse(parser: &mut Parser) -> Result<CoffHeader> {
        Ok(CoffHeader {
            machine: parser.read_le::<u16>()?,
            number_of_sections: parser.read_le::<u16>()?,
            time_date_stamp: parser.read_le::<u32>()?,
            pointer_to_symbol_table: parser.read_le::<u32>()?,
            number_of_symbols: parser.read_le::<u32>()?,
            size_of_optional_header: parser.read_le::<u16>()?,
            characteristics: CoffCharacteristics::from_bits_retain(parser.read_le::<u16>()?),
        })
    }

    /// Serialize the header
    pub fn write(&self, writer: &mut Writer) {
        writer.write_le::<u16>(self.machine);
        writer.write_le::<u16>(self.number_of_sections);
        writer.write_le::<u32>(self.time_date_stamp);
        writer.write_le::<u32>(self.pointer_to_symbol_table);
        writer.write_le::<u32>(self.number_of_symbols);
        writer.write_le::<u16>(self.size_of_optional_header);
        writer.write_le::<u16>(self.characteristics.bits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x4C, 0x01,             // machine = i386
            0x03, 0x00,             // number_of_sections = 3
            0x12, 0x34, 0x56, 0x78, // time_date_stamp
            0x00, 0x00, 0x00, 0x00, // pointer_to_symbol_table
            0x00, 0x00, 0x00, 0x00, // number_of_symbols
            0xE0, 0x00,             // size_of_optional_header = 224
            0x02, 0x21,             // characteristics
        ];

        let mut parser = Parser::new(&header_bytes);
        let header = CoffHeader::parse(&mut parser).unwrap();

        assert_eq!(header.machine, 0x014C);
        assert_eq!(header.number_of_sections, 3);
        assert_eq!(header.time_date_stamp, 0x78563412);
        assert_eq!(header.size_of_optional_header, 224);
        assert!(header
            .characteristics
            .contains(CoffCharacteristics::EXECUTABLE_IMAGE));

        let mut writer = Writer::new();
        header.write(&mut writer);
        assert_eq!(writer.into_bytes(), header_bytes);
    }
}
