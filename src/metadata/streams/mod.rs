//! Metadata streams and heaps: direct access to the ECMA-335 data structures.
//!
//! A metadata root carries up to six streams. Four are heaps addressed by byte
//! offset - [`Strings`], [`UserStrings`], [`Blob`], and [`Guid`] - and one is the
//! tables heap [`TablesHeader`] (`#~`, or `#-` for the uncompressed layout).
//! Every stream owns its buffer.
//!
//! # Key Components
//!
//! - [`Strings`] - UTF-8 identifier strings, NUL-terminated
//! - [`UserStrings`] - UTF-16 string literals with compressed length prefixes
//! - [`Blob`] - Binary blobs (signatures, constants) with compressed length prefixes
//! - [`Guid`] - 16-byte GUIDs addressed by 1-based index
//! - [`TablesHeader`] - The metadata tables behind their schema header
//!
//! ## Reference
//! - [ECMA-335 II.24.2](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

mod blob;
mod guid;
mod strings;
mod tablesheader;
mod userstrings;

pub use blob::Blob;
pub use guid::Guid;
pub use strings::Strings;
pub use tablesheader::{HeapSizes, RowIterator, TableSummary, TablesHeader};
pub use userstrings::UserStrings;
