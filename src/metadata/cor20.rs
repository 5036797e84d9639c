//! CLI (COR20) header parsing and serialization.
//!
//! This module defines the [`Cor20Header`] struct, which represents the main header for
//! managed images as found in the CLR runtime header data directory of PE files.
//!
//! # Reference
//! - [ECMA-335 II.25.3.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use bitflags::bitflags;

use crate::{Parser, Result, Writer};

/// Size of the COR20 header in bytes
pub const COR20_HEADER_SIZE: u32 = 72;

bitflags! {
    /// `Flags` field of the COR20 header
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RuntimeFlags: u32 {
        /// Image contains only IL code
        const IL_ONLY = 0x0000_0001;
        /// Image requires a 32-bit process
        const REQUIRE_32BIT = 0x0000_0002;
        /// Image is IL library
        const IL_LIBRARY = 0x0000_0004;
        /// Image is strong-name signed
        const STRONG_NAME_SIGNED = 0x0000_0008;
        /// Entry point is an unmanaged method
        const NATIVE_ENTRYPOINT = 0x0000_0010;
        /// Runtime should track debug data
        const TRACK_DEBUG_DATA = 0x0001_0000;
    }
}

/// The main header of the CLI payload, located at the start of the CLR runtime
/// header data directory of PE files.
///
/// This struct contains all fields defined by the ECMA-335 standard for the CLR 2.0 header.
pub struct Cor20Header {
    /// Size of header in bytes, always 72
    pub cb: u32,
    /// The minimum version of runtime required to run this program
    pub major_runtime_version: u16,
    /// The minor portion of the version
    pub minor_runtime_version: u16,
    /// RVA of the metadata root
    pub meta_data_rva: u32,
    /// Size of the metadata
    pub meta_data_size: u32,
    /// Flags describing this runtime image
    pub flags: RuntimeFlags,
    /// Token for the `MethodDef` or File of the entry point, or an RVA when
    /// `NATIVE_ENTRYPOINT` is set
    pub entry_point_token: u32,
    /// RVA of implementation specific resources
    pub resource_rva: u32,
    /// Size of implementation specific resources
    pub resource_size: u32,
    /// RVA of the strong name hash data
    pub strong_name_signature_rva: u32,
    /// Size of the strong name hash data
    pub strong_name_signature_size: u32,
    /// Always 0
    pub code_manager_table_rva: u32,
    /// Always 0
    pub code_manager_table_size: u32,
    /// RVA of an array of vtable fixup locations
    pub vtable_fixups_rva: u32,
    /// Size of the vtable fixup array
    pub vtable_fixups_size: u32,
    /// Always 0
    pub export_address_table_jmp_rva: u32,
    /// Always 0
    pub export_address_table_jmp_size: u32,
    /// Always 0
    pub managed_native_header_rva: u32,
    /// Always 0
    pub managed_native_header_size: u32,
}

impl Cor20Header {
    /// Create a `Cor20Header` object from a sequence of bytes
    ///
    /// # Arguments
    /// * `data` - The byte slice from which this object shall be created
    ///
    /// # Errors
    /// Returns an error if the data is too short to contain a valid CLR header,
    /// or if any field validation fails per ECMA-335 II.25.3.3.
    pub fn read(data: &[u8]) -> Result<Cor20Header> {
        if data.len() < COR20_HEADER_SIZE as usize {
            return Err(crate::Error::OutOfBounds);
        }

        let mut parser = Parser::new(data);

        let cb = parser.read_le::<u32>()?;
        if cb != COR20_HEADER_SIZE {
            return Err(malformed_error!(
                "Invalid CLR header size: expected 72, got {}",
                cb
            ));
        }

        let major_runtime_version = parser.read_le::<u16>()?;
        let minor_runtime_version = parser.read_le::<u16>()?;
        if major_runtime_version == 0 || major_runtime_version > 10 {
            return Err(malformed_error!(
                "Invalid major runtime version: {}",
                major_runtime_version
            ));
        }

        let meta_data_rva = parser.read_le::<u32>()?;
        if meta_data_rva == 0 {
            return Err(malformed_error!("Metadata RVA cannot be zero"));
        }

        let meta_data_size = parser.read_le::<u32>()?;
        if meta_data_size == 0 {
            return Err(malformed_error!("Metadata size cannot be zero"));
        } else if meta_data_size > 0x1000_0000 {
            return Err(malformed_error!(
                "Metadata size {} exceeds reasonable limit (256MB)",
                meta_data_size
            ));
        }

        let flags = RuntimeFlags::from_bits_retain(parser.read_le::<u32>()?);

        // Entry point token can be any value, including zero
        let entry_point_token = parser.read_le::<u32>()?;

        let resource_rva = parser.read_le::<u32>()?;
        let resource_size = parser.read_le::<u32>()?;
        if (resource_rva == 0 && resource_size != 0) || (resource_rva != 0 && resource_size == 0) {
            return Err(malformed_error!("Resource values are invalid"));
        }

        let strong_name_signature_rva = parser.read_le::<u32>()?;
        let strong_name_signature_size = parser.read_le::<u32>()?;
        if (strong_name_signature_rva == 0 && strong_name_signature_size != 0)
            || (strong_name_signature_rva != 0 && strong_name_signature_size == 0)
        {
            return Err(malformed_error!("Strong name values are invalid"));
        }

        let code_manager_table_rva = parser.read_le::<u32>()?;
        let code_manager_table_size = parser.read_le::<u32>()?;
        if code_manager_table_rva != 0 || code_manager_table_size != 0 {
            return Err(malformed_error!(
                "Code Manager Table fields must be zero (reserved)"
            ));
        }

        let vtable_fixups_rva = parser.read_le::<u32>()?;
        let vtable_fixups_size = parser.read_le::<u32>()?;
        if (vtable_fixups_rva == 0 && vtable_fixups_size != 0)
            || (vtable_fixups_rva != 0 && vtable_fixups_size == 0)
        {
            return Err(malformed_error!("VTable fixups are invalid"));
        }

        let export_address_table_jmp_rva = parser.read_le::<u32>()?;
        let export_address_table_jmp_size = parser.read_le::<u32>()?;
        if export_address_table_jmp_rva != 0 || export_address_table_jmp_size != 0 {
            return Err(malformed_error!(
                "Export Address Table Jump fields must be zero (reserved)"
            ));
        }

        let managed_native_header_rva = parser.read_le::<u32>()?;
        let managed_native_header_size = parser.read_le::<u32>()?;

        Ok(Cor20Header {
            cb,
            major_runtime_version,
            minor_runtime_version,
            meta_data_rva,
            meta_data_size,
            flags,
            entry_point_token,
            resource_rva,
            resource_size,
            strong_name_signature_rva,
            strong_name_signature_size,
            code_manager_table_rva,
            code_manager_table_size,
            vtable_fixups_rva,
            vtable_fixups_size,
            export_address_table_jmp_rva,
            export_address_table_jmp_size,
            managed_native_header_rva,
            managed_native_header_size,
        })
    }

    /// Serialize the header
    pub fn write(&self, writer: &mut Writer) {
        writer.write_le::<u32>(self.cb);
        writer.write_le::<u16>(self.major_runtime_version);
        writer.write_le::<u16>(self.minor_runtime_version);
        writer.write_le::<u32>(self.meta_data_rva);
        writer.write_le::<u32>(self.meta_data_size);
        writer.write_le::<u32>(self.flags.bits());
        writer.write_le::<u32>(self.entry_point_token);
        writer.write_le::<u32>(self.resource_rva);
        writer.write_le::<u32>(self.resource_size);
        writer.write_le::<u32>(self.strong_name_signature_rva);
        writer.write_le::<u32>(self.strong_name_signature_size);
        writer.write_le::<u32>(self.code_manager_table_rva);
        writer.write_le::<u32>(self.code_manager_table_size);
        writer.write_le::<u32>(self.vtable_fixups_rva);
        writer.write_le::<u32>(self.vtable_fixups_size);
        writer.write_le::<u32>(self.export_address_table_jmp_rva);
        writer.write_le::<u32>(self.export_address_table_jmp_size);
        writer.write_le::<u32>(self.managed_native_header_rva);
        writer.write_le::<u32>(self.managed_native_header_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x48, 0x00, 0x00, 0x00, // cb = 72
            0x02, 0x00,             // major_runtime_version = 2
            0x05, 0x00,             // minor_runtime_version = 5
            0x50, 0x20, 0x00, 0x00, // meta_data_rva = 0x2050
            0x00, 0x01, 0x00, 0x00, // meta_data_size = 0x100
            0x01, 0x00, 0x00, 0x00, // flags = IL_ONLY
            0x01, 0x00, 0x00, 0x06, // entry_point_token = 0x06000001
            0x00, 0x00, 0x00, 0x00, // resource_rva
            0x00, 0x00, 0x00, 0x00, // resource_size
            0x00, 0x00, 0x00, 0x00, // strong_name_signature_rva
            0x00, 0x00, 0x00, 0x00, // strong_name_signature_size
            0x00, 0x00, 0x00, 0x00, // code_manager_table_rva
            0x00, 0x00, 0x00, 0x00, // code_manager_table_size
            0x00, 0x00, 0x00, 0x00, // vtable_fixups_rva
            0x00, 0x00, 0x00, 0x00, // vtable_fixups_size
            0x00, 0x00, 0x00, 0x00, // export_address_table_jmp_rva
            0x00, 0x00, 0x00, 0x00, // export_address_table_jmp_size
            0x00, 0x00, 0x00, 0x00, // managed_native_header_rva
            0x00, 0x00, 0x00, 0x00, // managed_native_header_size
        ];

        let header = Cor20Header::read(&header_bytes).unwrap();

        assert_eq!(header.cb, 72);
        assert_eq!(header.major_runtime_version, 2);
        assert_eq!(header.minor_runtime_version, 5);
        assert_eq!(header.meta_data_rva, 0x2050);
        assert_eq!(header.meta_data_size, 0x100);
        assert!(header.flags.contains(RuntimeFlags::IL_ONLY));
        assert_eq!(header.entry_point_token, 0x06000001);

        let mut writer = Writer::new();
        header.write(&mut writer);
        assert_eq!(writer.into_bytes(), header_bytes);
    }

    #[test]
    fn invalid_cb_is_rejected() {
        let mut header_bytes = [0_u8; 72];
        header_bytes[0] = 0x40; // cb = 64

        assert!(Cor20Header::read(&header_bytes).is_err());
    }

    #[test]
    fn reserved_fields_must_be_zero() {
        #[rustfmt::skip]
        let mut header_bytes = [0_u8; 72];
        header_bytes[0] = 0x48; // cb = 72
        header_bytes[4] = 0x02; // major version
        header_bytes[8] = 0x50; // metadata rva
        header_bytes[12] = 0x01; // metadata size
        header_bytes[40] = 0x01; // code manager table rva, reserved

        assert!(Cor20Header::read(&header_bytes).is_err());
    }
}
