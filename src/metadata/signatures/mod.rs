//! Signature parsing for fields, methods, properties, locals, and type specs.
//!
//! Signatures live in the `#Blob` heap as compressed binary descriptions of types and
//! calling conventions. The [`SignatureParser`] walks them by recursive descent over the
//! element-type bytes; the free functions below are the convenient per-kind entry points.
//!
//! # Example
//!
//! ```rust
//! use pescope::metadata::signatures::{parse_field_signature, TypeSignature};
//!
//! // FIELD, int32
//! let sig = parse_field_signature(&[0x06, 0x08])?;
//! assert_eq!(sig.base, TypeSignature::I4);
//! # Ok::<(), pescope::Error>(())
//! ```
//!
//! ## Reference
//! - [ECMA-335 II.23.2](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

mod parser;
mod types;

pub use parser::*;
pub use types::*;

use crate::Result;

/// Parse a method signature (`MethodDefSig`, `MethodRefSig`, `StandAloneMethodSig`)
///
/// # Errors
/// Returns an error if the signature bytes are malformed
pub fn parse_method_signature(data: &[u8]) -> Result<SignatureMethod> {
    SignatureParser::new(data).parse_method_signature()
}

/// Parse a field signature (II.23.2.4)
///
/// # Errors
/// Returns an error if the signature bytes are malformed
pub fn parse_field_signature(data: &[u8]) -> Result<SignatureField> {
    SignatureParser::new(data).parse_field_signature()
}

/// Parse a property signature (II.23.2.5)
///
/// # Errors
/// Returns an error if the signature bytes are malformed
pub fn parse_property_signature(data: &[u8]) -> Result<SignatureProperty> {
    SignatureParser::new(data).parse_property_signature()
}

/// Parse a local variable signature (II.23.2.6)
///
/// # Errors
/// Returns an error if the signature bytes are malformed
pub fn parse_local_var_signature(data: &[u8]) -> Result<SignatureLocalVariables> {
    SignatureParser::new(data).parse_local_var_signature()
}

/// Parse a type specification signature (II.23.2.14)
///
/// # Errors
/// Returns an error if the signature bytes are malformed
pub fn parse_type_spec_signature(data: &[u8]) -> Result<SignatureTypeSpec> {
    SignatureParser::new(data).parse_type_spec_signature()
}

/// Parse a generic method instantiation signature (II.23.2.15)
///
/// # Errors
/// Returns an error if the signature bytes are malformed
pub fn parse_method_spec_signature(data: &[u8]) -> Result<SignatureMethodSpec> {
    SignatureParser::new(data).parse_method_spec_signature()
}
