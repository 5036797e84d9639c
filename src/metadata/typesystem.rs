//! Element type constants and the interned primitive type system.
//!
//! # Key Components
//!
//! - [`ELEMENT_TYPE`] - Standard CLI metadata element type constants
//! - [`TypeSystem`] - Lazily-built, interned primitive types per [`crate::metadata::NetDirectory`]
//!
//! ## References
//!
//! - [ECMA-335 §II.23.1.16 - Element types](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::sync::Arc;

/// Standard CLI metadata element type constants as defined in ECMA-335 §II.23.1.16.
///
/// These single bytes drive signature parsing: primitives are terminals, composite
/// element types are followed by their payload.
#[allow(non_snake_case, dead_code)]
pub mod ELEMENT_TYPE {
    /// Marks the end of a list in signatures
    pub const END: u8 = 0x00;
    /// Void type (no return value)
    pub const VOID: u8 = 0x01;
    /// Boolean type (true/false)
    pub const BOOLEAN: u8 = 0x02;
    /// 16-bit Unicode character
    pub const CHAR: u8 = 0x03;
    /// Signed 8-bit integer
    pub const I1: u8 = 0x04;
    /// Unsigned 8-bit integer
    pub const U1: u8 = 0x05;
    /// Signed 16-bit integer
    pub const I2: u8 = 0x06;
    /// Unsigned 16-bit integer
    pub const U2: u8 = 0x07;
    /// Signed 32-bit integer
    pub const I4: u8 = 0x08;
    /// Unsigned 32-bit integer
    pub const U4: u8 = 0x09;
    /// Signed 64-bit integer
    pub const I8: u8 = 0x0a;
    /// Unsigned 64-bit integer
    pub const U8: u8 = 0x0b;
    /// 32-bit floating point
    pub const R4: u8 = 0x0c;
    /// 64-bit floating point
    pub const R8: u8 = 0x0d;
    /// String type
    pub const STRING: u8 = 0x0e;
    /// Unmanaged pointer (followed by type)
    pub const PTR: u8 = 0x0f;
    /// Managed reference (followed by type)
    pub const BYREF: u8 = 0x10;
    /// Value type (followed by a compressed `TypeDefOrRef` token)
    pub const VALUETYPE: u8 = 0x11;
    /// Reference type/class (followed by a compressed `TypeDefOrRef` token)
    pub const CLASS: u8 = 0x12;
    /// Generic parameter in a generic type definition (represented as number)
    pub const VAR: u8 = 0x13;
    /// Multi-dimensional array (type rank boundsCount bound1 ... loCount lo1 ...)
    pub const ARRAY: u8 = 0x14;
    /// Generic type instantiation (followed by type, arg count, args)
    pub const GENERICINST: u8 = 0x15;
    /// Typed reference type
    pub const TYPEDBYREF: u8 = 0x16;
    /// Native integer type (System.IntPtr)
    pub const I: u8 = 0x18;
    /// Native unsigned integer type (System.UIntPtr)
    pub const U: u8 = 0x19;
    /// Function pointer (followed by a full method signature)
    pub const FNPTR: u8 = 0x1b;
    /// Object type (System.Object)
    pub const OBJECT: u8 = 0x1c;
    /// Single-dimension array with 0 lower bound
    pub const SZARRAY: u8 = 0x1d;
    /// Generic parameter in a generic method definition (represented as number)
    pub const MVAR: u8 = 0x1e;
    /// Required modifier (followed by a compressed `TypeDefOrRef` token)
    pub const CMOD_REQD: u8 = 0x1f;
    /// Optional modifier (followed by a compressed `TypeDefOrRef` token)
    pub const CMOD_OPT: u8 = 0x20;
    /// Implemented within the CLI
    pub const INTERNAL: u8 = 0x21;
    /// Modifier flag (OR'd with following element types)
    pub const MODIFIER: u8 = 0x40;
    /// Sentinel for vararg method signatures
    pub const SENTINEL: u8 = 0x41;
    /// Denotes a local variable that points at a pinned object
    pub const PINNED: u8 = 0x45;
}

/// The primitive types exposed by the type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// System.Void
    Void,
    /// System.Boolean
    Boolean,
    /// System.Char
    Char,
    /// System.SByte
    I1,
    /// System.Byte
    U1,
    /// System.Int16
    I2,
    /// System.UInt16
    U2,
    /// System.Int32
    I4,
    /// System.UInt32
    U4,
    /// System.Int64
    I8,
    /// System.UInt64
    U8,
    /// System.Single
    R4,
    /// System.Double
    R8,
    /// System.String
    String,
    /// System.Object
    Object,
    /// System.TypedReference
    TypedByRef,
    /// System.IntPtr
    IntPtr,
    /// System.UIntPtr
    UIntPtr,
}

impl PrimitiveKind {
    const ALL: [PrimitiveKind; 18] = [
        PrimitiveKind::Void,
        PrimitiveKind::Boolean,
        PrimitiveKind::Char,
        PrimitiveKind::I1,
        PrimitiveKind::U1,
        PrimitiveKind::I2,
        PrimitiveKind::U2,
        PrimitiveKind::I4,
        PrimitiveKind::U4,
        PrimitiveKind::I8,
        PrimitiveKind::U8,
        PrimitiveKind::R4,
        PrimitiveKind::R8,
        PrimitiveKind::String,
        PrimitiveKind::Object,
        PrimitiveKind::TypedByRef,
        PrimitiveKind::IntPtr,
        PrimitiveKind::UIntPtr,
    ];

    /// The element type byte of this primitive
    #[must_use]
    pub fn element_type(&self) -> u8 {
        match self {
            PrimitiveKind::Void => ELEMENT_TYPE::VOID,
            PrimitiveKind::Boolean => ELEMENT_TYPE::BOOLEAN,
            PrimitiveKind::Char => ELEMENT_TYPE::CHAR,
            PrimitiveKind::I1 => ELEMENT_TYPE::I1,
            PrimitiveKind::U1 => ELEMENT_TYPE::U1,
            PrimitiveKind::I2 => ELEMENT_TYPE::I2,
            PrimitiveKind::U2 => ELEMENT_TYPE::U2,
            PrimitiveKind::I4 => ELEMENT_TYPE::I4,
            PrimitiveKind::U4 => ELEMENT_TYPE::U4,
            PrimitiveKind::I8 => ELEMENT_TYPE::I8,
            PrimitiveKind::U8 => ELEMENT_TYPE::U8,
            PrimitiveKind::R4 => ELEMENT_TYPE::R4,
            PrimitiveKind::R8 => ELEMENT_TYPE::R8,
            PrimitiveKind::String => ELEMENT_TYPE::STRING,
            PrimitiveKind::Object => ELEMENT_TYPE::OBJECT,
            PrimitiveKind::TypedByRef => ELEMENT_TYPE::TYPEDBYREF,
            PrimitiveKind::IntPtr => ELEMENT_TYPE::I,
            PrimitiveKind::UIntPtr => ELEMENT_TYPE::U,
        }
    }

    /// The fully qualified BCL name of this primitive
    #[must_use]
    pub fn fullname(&self) -> &'static str {
        match self {
            PrimitiveKind::Void => "System.Void",
            PrimitiveKind::Boolean => "System.Boolean",
            PrimitiveKind::Char => "System.Char",
            PrimitiveKind::I1 => "System.SByte",
            PrimitiveKind::U1 => "System.Byte",
            PrimitiveKind::I2 => "System.Int16",
            PrimitiveKind::U2 => "System.UInt16",
            PrimitiveKind::I4 => "System.Int32",
            PrimitiveKind::U4 => "System.UInt32",
            PrimitiveKind::I8 => "System.Int64",
            PrimitiveKind::U8 => "System.UInt64",
            PrimitiveKind::R4 => "System.Single",
            PrimitiveKind::R8 => "System.Double",
            PrimitiveKind::String => "System.String",
            PrimitiveKind::Object => "System.Object",
            PrimitiveKind::TypedByRef => "System.TypedReference",
            PrimitiveKind::IntPtr => "System.IntPtr",
            PrimitiveKind::UIntPtr => "System.UIntPtr",
        }
    }
}

/// One interned primitive type.
#[derive(Debug, PartialEq, Eq)]
pub struct Primitive {
    /// Which primitive this is
    pub kind: PrimitiveKind,
    /// The element type byte
    pub element_type: u8,
    /// The fully qualified BCL name
    pub fullname: &'static str,
}

/// The interned element-type primitives of one metadata directory.
///
/// Built lazily by [`crate::metadata::NetDirectory::type_system`] through a
/// one-shot initializer: construction is idempotent, and every caller observes
/// the same interned [`Primitive`] references.
pub struct TypeSystem {
    primitives: Vec<Arc<Primitive>>,
}

impl TypeSystem {
    /// Build the primitive set
    #[must_use]
    pub fn new() -> Self {
        let primitives = PrimitiveKind::ALL
            .iter()
            .map(|kind| {
                Arc::new(Primitive {
                    kind: *kind,
                    element_type: kind.element_type(),
                    fullname: kind.fullname(),
                })
            })
            .collect();

        TypeSystem { primitives }
    }

    /// Get the interned reference for a primitive
    #[must_use]
    pub fn primitive(&self, kind: PrimitiveKind) -> Arc<Primitive> {
        let index = PrimitiveKind::ALL
            .iter()
            .position(|candidate| *candidate == kind)
            .expect("every kind is interned");
        self.primitives[index].clone()
    }

    /// Get the interned primitive for an element type byte, `None` for
    /// non-primitive element types
    #[must_use]
    pub fn by_element_type(&self, element_type: u8) -> Option<Arc<Primitive>> {
        self.primitives
            .iter()
            .find(|primitive| primitive.element_type == element_type)
            .cloned()
    }

    /// All interned primitives
    #[must_use]
    pub fn primitives(&self) -> &[Arc<Primitive>] {
        &self.primitives
    }
}

impl Default for TypeSystem {
    fn default() -> Self {
        TypeSystem::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_interned() {
        let ts = TypeSystem::new();

        let a = ts.primitive(PrimitiveKind::I4);
        let b = ts.primitive(PrimitiveKind::I4);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.fullname, "System.Int32");
        assert_eq!(a.element_type, ELEMENT_TYPE::I4);
    }

    #[test]
    fn lookup_by_element_type() {
        let ts = TypeSystem::new();

        assert_eq!(
            ts.by_element_type(ELEMENT_TYPE::STRING).unwrap().kind,
            PrimitiveKind::String
        );
        assert_eq!(
            ts.by_element_type(ELEMENT_TYPE::I).unwrap().kind,
            PrimitiveKind::IntPtr
        );
        assert!(ts.by_element_type(ELEMENT_TYPE::CLASS).is_none());
        assert_eq!(ts.primitives().len(), 18);
    }
}
