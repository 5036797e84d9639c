//! Metadata table identifiers, coded indexes, schema, and row access.
//!
//! The tables heap is walked with a declarative schema: every table in the closed
//! ECMA-335 set `Module (0x00) .. GenericParamConstraint (0x2C)` has a static column
//! layout (see [`schema`]), and [`TableInfo`] derives the physical width of every
//! column from the heap size flags and the row counts of all present tables.
//!
//! # Key Components
//!
//! - [`TableId`] - The closed set of 45 table identifiers
//! - [`CodedIndexType`] / [`CodedIndex`] - Tagged multi-table references
//! - [`TableInfo`] - Cached row counts and index widths
//! - [`TableRow`] - One decoded fixed-width row
//!
//! ## Reference
//! - [ECMA-335 II.22, II.24.2.6](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

pub mod schema;

mod row;
mod tableinfo;

pub use row::TableRow;
pub use tableinfo::{TableInfo, TableInfoRef, TableRowInfo};

use strum::{EnumCount, EnumIter};

use crate::metadata::token::Token;

/// The closed set of metadata table identifiers defined by ECMA-335.
///
/// The discriminants equal the on-disk table ids and the high byte of
/// metadata tokens referencing the table.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, EnumIter, EnumCount)]
#[repr(u8)]
pub enum TableId {
    /// 0x00 - Module definition
    Module = 0x00,
    /// 0x01 - Type references
    TypeRef = 0x01,
    /// 0x02 - Type definitions
    TypeDef = 0x02,
    /// 0x03 - Field pointer indirection (`#-` only)
    FieldPtr = 0x03,
    /// 0x04 - Field definitions
    Field = 0x04,
    /// 0x05 - Method pointer indirection (`#-` only)
    MethodPtr = 0x05,
    /// 0x06 - Method definitions
    MethodDef = 0x06,
    /// 0x07 - Param pointer indirection (`#-` only)
    ParamPtr = 0x07,
    /// 0x08 - Parameter definitions
    Param = 0x08,
    /// 0x09 - Interface implementations
    InterfaceImpl = 0x09,
    /// 0x0A - Member references
    MemberRef = 0x0A,
    /// 0x0B - Constant values
    Constant = 0x0B,
    /// 0x0C - Custom attributes
    CustomAttribute = 0x0C,
    /// 0x0D - Field marshalling information
    FieldMarshal = 0x0D,
    /// 0x0E - Declarative security
    DeclSecurity = 0x0E,
    /// 0x0F - Class layout information
    ClassLayout = 0x0F,
    /// 0x10 - Field layout information
    FieldLayout = 0x10,
    /// 0x11 - Standalone signatures
    StandAloneSig = 0x11,
    /// 0x12 - Event maps
    EventMap = 0x12,
    /// 0x13 - Event pointer indirection (`#-` only)
    EventPtr = 0x13,
    /// 0x14 - Event definitions
    Event = 0x14,
    /// 0x15 - Property maps
    PropertyMap = 0x15,
    /// 0x16 - Property pointer indirection (`#-` only)
    PropertyPtr = 0x16,
    /// 0x17 - Property definitions
    Property = 0x17,
    /// 0x18 - Method semantics (getter/setter/adder/...)
    MethodSemantics = 0x18,
    /// 0x19 - Method implementation overrides
    MethodImpl = 0x19,
    /// 0x1A - Module references
    ModuleRef = 0x1A,
    /// 0x1B - Type specifications
    TypeSpec = 0x1B,
    /// 0x1C - P/Invoke implementation map
    ImplMap = 0x1C,
    /// 0x1D - Field RVAs (mapped initial values)
    FieldRVA = 0x1D,
    /// 0x1E - Edit-and-continue log (`#-` only)
    EncLog = 0x1E,
    /// 0x1F - Edit-and-continue map (`#-` only)
    EncMap = 0x1F,
    /// 0x20 - Assembly manifest
    Assembly = 0x20,
    /// 0x21 - Assembly processor (unused)
    AssemblyProcessor = 0x21,
    /// 0x22 - Assembly OS (unused)
    AssemblyOS = 0x22,
    /// 0x23 - Assembly references
    AssemblyRef = 0x23,
    /// 0x24 - Assembly reference processor (unused)
    AssemblyRefProcessor = 0x24,
    /// 0x25 - Assembly reference OS (unused)
    AssemblyRefOS = 0x25,
    /// 0x26 - Files in the assembly
    File = 0x26,
    /// 0x27 - Exported types
    ExportedType = 0x27,
    /// 0x28 - Manifest resources
    ManifestResource = 0x28,
    /// 0x29 - Nested class relationships
    NestedClass = 0x29,
    /// 0x2A - Generic parameter definitions
    GenericParam = 0x2A,
    /// 0x2B - Generic method instantiations
    MethodSpec = 0x2B,
    /// 0x2C - Generic parameter constraints
    GenericParamConstraint = 0x2C,
}

impl TableId {
    /// Resolve a raw table id to its identifier, `None` for ids outside the
    /// closed set
    #[must_use]
    pub fn from_id(id: u8) -> Option<TableId> {
        use strum::IntoEnumIterator;

        TableId::iter().find(|table| *table as u8 == id)
    }
}

/// Represents all possible coded index types defined in the CLI metadata specification.
///
/// A coded index type defines which combination of metadata tables can be referenced
/// by a particular coded index column. The low bits of the stored value select one of
/// the member tables, the remaining bits are the row index.
///
/// ## Reference
/// - [ECMA-335 II.24.2.6](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, EnumIter, EnumCount)]
#[repr(usize)]
pub enum CodedIndexType {
    /// References `TypeDef`, `TypeRef`, or `TypeSpec` tables.
    TypeDefOrRef,
    /// References `Field`, `Param`, or `Property` tables.
    HasConstant,
    /// References any entity that can have custom attributes attached.
    HasCustomAttribute,
    /// References `Field` or `Param` tables.
    HasFieldMarshal,
    /// References `TypeDef`, `MethodDef`, or `Assembly` tables.
    HasDeclSecurity,
    /// References `TypeDef`, `TypeRef`, `ModuleRef`, `MethodDef`, or `TypeSpec` tables.
    MemberRefParent,
    /// References `Event` or `Property` tables.
    HasSemantics,
    /// References `MethodDef` or `MemberRef` tables.
    MethodDefOrRef,
    /// References `Field` or `MethodDef` tables.
    MemberForwarded,
    /// References `File`, `AssemblyRef`, or `ExportedType` tables.
    Implementation,
    /// References the constructor methods of custom attributes.
    ///
    /// Tag values 0, 1 and 4 are defined but unused by the standard; the
    /// lookup still maps them so decoding never panics on hostile input.
    CustomAttributeType,
    /// References `Module`, `ModuleRef`, `AssemblyRef`, or `TypeRef` tables.
    ResolutionScope,
    /// References `TypeDef` or `MethodDef` tables.
    TypeOrMethodDef,
}

impl CodedIndexType {
    /// Returns the array of table IDs that can be referenced by this coded index type,
    /// in tag order.
    #[must_use]
    pub fn tables(&self) -> &'static [TableId] {
        match self {
            CodedIndexType::TypeDefOrRef => {
                &[TableId::TypeDef, TableId::TypeRef, TableId::TypeSpec]
            }
            CodedIndexType::HasConstant => &[TableId::Field, TableId::Param, TableId::Property],
            CodedIndexType::HasCustomAttribute => &[
                TableId::MethodDef,
                TableId::Field,
                TableId::TypeRef,
                TableId::TypeDef,
                TableId::Param,
                TableId::InterfaceImpl,
                TableId::MemberRef,
                TableId::Module,
                TableId::DeclSecurity, // Labeled 'Permission' in the standard, no such table exists
                TableId::Property,
                TableId::Event,
                TableId::StandAloneSig,
                TableId::ModuleRef,
                TableId::TypeSpec,
                TableId::Assembly,
                TableId::AssemblyRef,
                TableId::File,
                TableId::ExportedType,
                TableId::ManifestResource,
                TableId::GenericParam,
                TableId::GenericParamConstraint,
                TableId::MethodSpec,
            ],
            CodedIndexType::HasFieldMarshal => &[TableId::Field, TableId::Param],
            CodedIndexType::HasDeclSecurity => {
                &[TableId::TypeDef, TableId::MethodDef, TableId::Assembly]
            }
            CodedIndexType::MemberRefParent => &[
                TableId::TypeDef,
                TableId::TypeRef,
                TableId::ModuleRef,
                TableId::MethodDef,
                TableId::TypeSpec,
            ],
            CodedIndexType::HasSemantics => &[TableId::Event, TableId::Property],
            CodedIndexType::MethodDefOrRef => &[TableId::MethodDef, TableId::MemberRef],
            CodedIndexType::MemberForwarded => &[TableId::Field, TableId::MethodDef],
            CodedIndexType::Implementation => {
                &[TableId::File, TableId::AssemblyRef, TableId::ExportedType]
            }
            CodedIndexType::CustomAttributeType => &[
                TableId::MethodDef,
                TableId::MethodDef,
                TableId::MethodDef,
                TableId::MemberRef,
                TableId::MemberRef,
            ],
            CodedIndexType::ResolutionScope => &[
                TableId::Module,
                TableId::ModuleRef,
                TableId::AssemblyRef,
                TableId::TypeRef,
            ],
            CodedIndexType::TypeOrMethodDef => &[TableId::TypeDef, TableId::MethodDef],
        }
    }

    /// Amount of tag bits reserved in the low end of a stored value
    #[must_use]
    pub fn tag_bits(&self) -> u8 {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let bits = (self.tables().len() as f32).log2().ceil() as u8;
        bits
    }
}

/// A decoded coded index value: the selected target table, the row index, and
/// the equivalent metadata token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodedIndex {
    /// The target table selected by the tag bits
    pub table: TableId,
    /// The 1-based row index; zero encodes NULL
    pub row: u32,
    /// The equivalent metadata token
    pub token: Token,
}

impl CodedIndex {
    /// True if the row index is zero
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.row == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_id_from_raw() {
        assert_eq!(TableId::from_id(0x00), Some(TableId::Module));
        assert_eq!(TableId::from_id(0x06), Some(TableId::MethodDef));
        assert_eq!(TableId::from_id(0x2C), Some(TableId::GenericParamConstraint));
        assert_eq!(TableId::from_id(0x2D), None);
        assert_eq!(TableId::from_id(0xFF), None);
    }

    #[test]
    fn tag_bits() {
        assert_eq!(CodedIndexType::TypeDefOrRef.tag_bits(), 2);
        assert_eq!(CodedIndexType::HasSemantics.tag_bits(), 1);
        assert_eq!(CodedIndexType::MemberRefParent.tag_bits(), 3);
        assert_eq!(CodedIndexType::HasCustomAttribute.tag_bits(), 5);
    }
}
