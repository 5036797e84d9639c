//! CLI metadata parsing and the type system based on ECMA-335.
//!
//! This module implements the managed half of the library: locating the CLI header
//! inside a PE image, walking the metadata root and its streams, decoding table rows
//! through the declarative schema, resolving tokens, and parsing signatures.
//!
//! # Architecture
//!
//! The metadata system is layered:
//! - **Physical layer**: [`cor20::Cor20Header`] and [`root::Root`] locate the streams
//! - **Stream layer**: [`streams`] - the four heaps and the tables heap
//! - **Logical layer**: [`tables`] - schema-driven row access, [`resolver::TokenResolver`]
//! - **Type layer**: [`signatures`] and [`typesystem`]
//!
//! # Key Components
//!
//! - [`NetDirectory`] - Entry point, owns the header and all streams
//! - [`token::Token`] - 32-bit `(table, row)` references
//! - [`tables::TableRow`] - One decoded metadata row
//!
//! # Examples
//!
//! ```rust,no_run
//! use pescope::{MappingMode, PeImage};
//! use pescope::metadata::{tables::TableId, NetDirectory};
//!
//! let data = std::fs::read("app.exe")?;
//! let image = PeImage::parse(&data, MappingMode::Unmapped)?;
//! let directory = NetDirectory::from_image(&image)?.expect("managed image");
//!
//! if let Some(tables) = directory.tables() {
//!     println!("{} methods", tables.row_count(TableId::MethodDef));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Thread Safety
//!
//! A `NetDirectory` is immutable after parsing; lazily-built members use one-shot
//! initializers, so shared references are safe across threads.

pub mod cor20;
pub mod resolver;
pub mod root;
pub mod signatures;
pub mod streams;
pub mod tables;
pub mod token;
pub mod typesystem;

mod directory;

pub use directory::NetDirectory;
