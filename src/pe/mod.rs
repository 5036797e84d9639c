//! PE image model: headers, section table, data directories, and rebuilding.
//!
//! This module implements the layered view of a Portable Executable: the
//! [`DosHeader`] and stub, the [`CoffHeader`], the [`OptionalHeader`] (PE32 or
//! PE32+ by magic) with its [`DataDirectory`] table, and the [`Section`]s whose
//! contents are [`crate::segment::Segment`]s.
//!
//! # Key Components
//!
//! - [`PeImage`] - The image itself: parse, edit, rebuild
//! - [`MappingMode`] - Whether the input bytes are the on-disk layout or a
//!   loaded image
//! - [`DataDirectoryType`] - The sixteen well-known directory slots
//!
//! # Examples
//!
//! ```rust,no_run
//! use pescope::{MappingMode, PeImage};
//! use pescope::pe::DataDirectoryType;
//!
//! let data = std::fs::read("app.exe")?;
//! let image = PeImage::parse(&data, MappingMode::Unmapped)?;
//!
//! if let Some(clr) = image.optional.directory(DataDirectoryType::ClrRuntimeHeader) {
//!     if !clr.is_empty() {
//!         println!("CLR header at RVA {:#x}", clr.rva);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # References
//!
//! - Microsoft PE/COFF Specification
//! - ECMA-335 6th Edition, Partition II.25 - File Format Extensions to PE

mod coff;
mod dos;
mod image;
mod optional;
mod section;

pub use coff::{CoffCharacteristics, CoffHeader, COFF_HEADER_SIZE};
pub use dos::{DosHeader, DOS_HEADER_SIZE, DOS_MAGIC};
pub use image::{MappingMode, PeImage, PE_SIGNATURE};
pub use optional::{
    DataDirectory, DataDirectoryType, OptionalHeader, PE32PLUS_MAGIC, PE32_MAGIC,
};
pub use section::{Section, SectionFlags, SectionHeader, SECTION_HEADER_SIZE};
