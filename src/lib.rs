// Copyright 2025-2026 The pescope contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]

//! # pescope
//!
//! A framework for reading, editing, and writing Portable Executable (PE) images with a
//! focus on images carrying a managed (CLI) metadata payload, together with a small x86
//! instruction encoder/decoder for adjacent rewriting tooling. Built in pure Rust,
//! `pescope` round-trips a PE file while preserving and mutating its structure - the
//! foundation for binary-rewriting tools, obfuscation and deobfuscation frameworks, and
//! disassemblers.
//!
//! # Architecture
//!
//! The library is organized into layers that build on each other:
//!
//! - **File Layer**: Bounds-checked binary parsing and serialization primitives
//! - **Segment Layer**: The `(file offset, RVA)` chunk model with two-phase rebuilding
//! - **PE Layer**: Headers, section table, data directories, offset/RVA arithmetic
//! - **Metadata Layer**: ECMA-335 metadata root, heaps, tables, signatures, tokens
//! - **x86 Layer**: ModR/M+SIB+displacement instruction codec with a closed catalogue
//!
//! ## Key Components
//!
//! - [`crate::PeImage`] - Main entry point: parse, edit, rebuild a PE image
//! - [`crate::metadata::NetDirectory`] - The CLI header and all metadata streams
//! - [`crate::x86`] - Instruction assembler, disassembler, and formatter
//! - [`crate::segment`] - The segment tree behind every rebuilt image
//! - [`crate::Error`] and [`crate::Result`] - Comprehensive error handling
//!
//! # Usage Examples
//!
//! ## Parsing an image
//!
//! ```rust,no_run
//! use pescope::{MappingMode, PeImage};
//!
//! let data = std::fs::read("app.exe")?;
//! let image = PeImage::parse(&data, MappingMode::Unmapped)?;
//!
//! for section in &image.sections {
//!     println!("{:8} RVA {:#010x} raw {:#010x}",
//!              section.header.name(),
//!              section.header.virtual_address,
//!              section.header.pointer_to_raw_data);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Reading managed metadata
//!
//! ```rust,no_run
//! use pescope::{MappingMode, PeImage};
//! use pescope::metadata::{tables::TableId, NetDirectory};
//!
//! let data = std::fs::read("app.exe")?;
//! let image = PeImage::parse(&data, MappingMode::Unmapped)?;
//!
//! if let Some(directory) = NetDirectory::from_image(&image)? {
//!     println!("entry point: {}", directory.entry_point());
//!     if let Some(tables) = directory.tables() {
//!         println!("{} types", tables.row_count(TableId::TypeDef));
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Rebuilding after edits
//!
//! ```rust,no_run
//! use pescope::{MappingMode, PeImage};
//! use pescope::pe::{Section, SectionFlags, SectionHeader};
//!
//! let data = std::fs::read("app.exe")?;
//! let mut image = PeImage::parse(&data, MappingMode::Unmapped)?;
//!
//! let header = SectionHeader::new(".patch", SectionFlags::CNT_INITIALIZED_DATA | SectionFlags::MEM_READ);
//! image.add_section(Section::new(header, vec![0u8; 0x200]));
//!
//! image.update_layout()?;
//! image.write_to_path(std::path::Path::new("patched.exe"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Encoding x86
//!
//! ```rust
//! use pescope::x86::{encode, Instruction, Mnemonic, Operand, OperandType, Register};
//!
//! let instruction = Instruction::new(
//!     Mnemonic::Add,
//!     Some(Operand::mem(OperandType::DwordPointer, Register::Esp)),
//!     Some(Operand::reg(Register::Eax)),
//!     None,
//! )?;
//! assert_eq!(encode(&instruction)?, vec![0x01, 0x04, 0x24]);
//! # Ok::<(), pescope::Error>(())
//! ```
//!
//! # Standards Compliance
//!
//! `pescope` implements the **ECMA-335 specification** (6th edition) for CLI metadata and
//! the Microsoft PE/COFF specification for the image format.
//!
//! # Error Handling
//!
//! All operations return [`Result<T, Error>`](Result). Parse errors surface to the caller
//! with the faulting context; they are never silently swallowed. Emit errors abort a
//! rebuild before anything reaches the caller's writer.
//!
//! # Thread Safety
//!
//! Distinct [`PeImage`] instances are independent and may be used from different threads.
//! Mutating a single image requires external synchronization; lazily-initialized members
//! use one-shot initializers and never expose partially initialized state.

#[macro_use]
pub(crate) mod error;

pub mod file;
pub mod metadata;
pub mod pe;
pub mod segment;
pub mod x86;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Usage Examples
///
/// ```rust,no_run
/// use pescope::prelude::*;
///
/// let image = PeImage::from_path(std::path::Path::new("app.exe"), MappingMode::Unmapped)?;
/// let directory = NetDirectory::from_image(&image)?;
/// # Ok::<(), pescope::Error>(())
/// ```
pub mod prelude;

/// `pescope` Result type.
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`crate::Error`]. This is used consistently throughout the crate for all fallible
/// operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `pescope` Error type.
///
/// The main error type for all operations in this crate. Provides detailed error
/// information for image parsing, metadata decoding, rebuild, and x86 codec failures.
pub use error::Error;

/// Low-level binary reader.
///
/// See [`crate::file::parser::Parser`] for cursor-based reading with the ECMA-335
/// variable-length encodings.
pub use file::parser::Parser;

/// Low-level binary writer and its buffer pool.
///
/// See [`crate::file::writer::Writer`] for the append-only emit side.
pub use file::writer::{BufferPool, Writer};

/// The PE image model.
///
/// See [`crate::pe::PeImage`] for parsing, editing, and rebuilding.
pub use pe::{MappingMode, PeImage};
