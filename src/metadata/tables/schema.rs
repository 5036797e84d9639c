//! Declarative column layouts for all 45 metadata tables.
//!
//! Each table's row is a fixed-width tuple described by a static [`Column`] slice. The
//! physical width of heap, table, and coded index columns depends on the image (heap size
//! flags and row counts), which [`super::TableInfo`] resolves at parse time.
//!
//! ## Reference
//! - [ECMA-335 II.22](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::metadata::tables::{CodedIndexType, TableId};

/// The logical kind of one column within a table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// A fixed-width integer of 1, 2, or 4 bytes
    Fixed(u8),
    /// An offset into the `#Strings` heap, 2 or 4 bytes
    StringIndex,
    /// A 1-based index into the `#GUID` heap, 2 or 4 bytes
    GuidIndex,
    /// An offset into the `#Blob` heap, 2 or 4 bytes
    BlobIndex,
    /// A 1-based row index into one specific table, 2 or 4 bytes
    TableIndex(TableId),
    /// A tagged index into one of several tables, 2 or 4 bytes
    CodedIndex(CodedIndexType),
}

/// One column of a table row: its name (for diagnostics) and kind.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Column name as given by ECMA-335
    pub name: &'static str,
    /// What the column stores
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

use ColumnKind::{BlobIndex, CodedIndex, Fixed, GuidIndex, StringIndex, TableIndex};

/// Returns the static column layout for a table.
#[must_use]
pub fn table_columns(table: TableId) -> &'static [Column] {
    match table {
        TableId::Module => { const C: &[Column] = &[
            col("Generation", Fixed(2)),
            col("Name", StringIndex),
            col("Mvid", GuidIndex),
            col("EncId", GuidIndex),
            col("EncBaseId", GuidIndex),
        ]; C },
        TableId::TypeRef => { const C: &[Column] = &[
            col("ResolutionScope", CodedIndex(CodedIndexType::ResolutionScope)),
            col("TypeName", StringIndex),
            col("TypeNamespace", StringIndex),
        ]; C },
        TableId::TypeDef => { const C: &[Column] = &[
            col("Flags", Fixed(4)),
            col("TypeName", StringIndex),
            col("TypeNamespace", StringIndex),
            col("Extends", CodedIndex(CodedIndexType::TypeDefOrRef)),
            col("FieldList", TableIndex(TableId::Field)),
            col("MethodList", TableIndex(TableId::MethodDef)),
        ]; C },
        TableId::FieldPtr => { const C: &[Column] = &[col("Field", TableIndex(TableId::Field))]; C },
        TableId::Field => { const C: &[Column] = &[
            col("Flags", Fixed(2)),
            col("Name", StringIndex),
            col("Signature", BlobIndex),
        ]; C },
        TableId::MethodPtr => { const C: &[Column] = &[col("Method", TableIndex(TableId::MethodDef))]; C },
        TableId::MethodDef => { const C: &[Column] = &[
            col("RVA", Fixed(4)),
            col("ImplFlags", Fixed(2)),
            col("Flags", Fixed(2)),
            col("Name", StringIndex),
            col("Signature", BlobIndex),
            col("ParamList", TableIndex(TableId::Param)),
        ]; C },
        TableId::ParamPtr => { const C: &[Column] = &[col("Param", TableIndex(TableId::Param))]; C },
        TableId::Param => { const C: &[Column] = &[
            col("Flags", Fixed(2)),
            col("Sequence", Fixed(2)),
            col("Name", StringIndex),
        ]; C },
        TableId::InterfaceImpl => { const C: &[Column] = &[
            col("Class", TableIndex(TableId::TypeDef)),
            col("Interface", CodedIndex(CodedIndexType::TypeDefOrRef)),
        ]; C },
        TableId::MemberRef => { const C: &[Column] = &[
            col("Class", CodedIndex(CodedIndexType::MemberRefParent)),
            col("Name", StringIndex),
            col("Signature", BlobIndex),
        ]; C },
        TableId::Constant => { const C: &[Column] = &[
            col("Type", Fixed(1)),
            col("Padding", Fixed(1)),
            col("Parent", CodedIndex(CodedIndexType::HasConstant)),
            col("Value", BlobIndex),
        ]; C },
        TableId::CustomAttribute => { const C: &[Column] = &[
            col("Parent", CodedIndex(CodedIndexType::HasCustomAttribute)),
            col("Type", CodedIndex(CodedIndexType::CustomAttributeType)),
            col("Value", BlobIndex),
        ]; C },
        TableId::FieldMarshal => { const C: &[Column] = &[
            col("Parent", CodedIndex(CodedIndexType::HasFieldMarshal)),
            col("NativeType", BlobIndex),
        ]; C },
        TableId::DeclSecurity => { const C: &[Column] = &[
            col("Action", Fixed(2)),
            col("Parent", CodedIndex(CodedIndexType::HasDeclSecurity)),
            col("PermissionSet", BlobIndex),
        ]; C },
        TableId::ClassLayout => { const C: &[Column] = &[
            col("PackingSize", Fixed(2)),
            col("ClassSize", Fixed(4)),
            col("Parent", TableIndex(TableId::TypeDef)),
        ]; C },
        TableId::FieldLayout => { const C: &[Column] = &[
            col("Offset", Fixed(4)),
            col("Field", TableIndex(TableId::Field)),
        ]; C },
        TableId::StandAloneSig => { const C: &[Column] = &[col("Signature", BlobIndex)]; C },
        TableId::EventMap => { const C: &[Column] = &[
            col("Parent", TableIndex(TableId::TypeDef)),
            col("EventList", TableIndex(TableId::Event)),
        ]; C },
        TableId::EventPtr => { const C: &[Column] = &[col("Event", TableIndex(TableId::Event))]; C },
        TableId::Event => { const C: &[Column] = &[
            col("EventFlags", Fixed(2)),
            col("Name", StringIndex),
            col("EventType", CodedIndex(CodedIndexType::TypeDefOrRef)),
        ]; C },
        TableId::PropertyMap => { const C: &[Column] = &[
            col("Parent", TableIndex(TableId::TypeDef)),
            col("PropertyList", TableIndex(TableId::Property)),
        ]; C },
        TableId::PropertyPtr => { const C: &[Column] = &[col("Property", TableIndex(TableId::Property))]; C },
        TableId::Property => { const C: &[Column] = &[
            col("Flags", Fixed(2)),
            col("Name", StringIndex),
            col("Type", BlobIndex),
        ]; C },
        TableId::MethodSemantics => { const C: &[Column] = &[
            col("Semantics", Fixed(2)),
            col("Method", TableIndex(TableId::MethodDef)),
            col("Association", CodedIndex(CodedIndexType::HasSemantics)),
        ]; C },
        TableId::MethodImpl => { const C: &[Column] = &[
            col("Class", TableIndex(TableId::TypeDef)),
            col("MethodBody", CodedIndex(CodedIndexType::MethodDefOrRef)),
            col("MethodDeclaration", CodedIndex(CodedIndexType::MethodDefOrRef)),
        ]; C },
        TableId::ModuleRef => { const C: &[Column] = &[col("Name", StringIndex)]; C },
        TableId::TypeSpec => { const C: &[Column] = &[col("Signature", BlobIndex)]; C },
        TableId::ImplMap => { const C: &[Column] = &[
            col("MappingFlags", Fixed(2)),
            col("MemberForwarded", CodedIndex(CodedIndexType::MemberForwarded)),
            col("ImportName", StringIndex),
            col("ImportScope", TableIndex(TableId::ModuleRef)),
        ]; C },
        TableId::FieldRVA => { const C: &[Column] = &[
            col("RVA", Fixed(4)),
            col("Field", TableIndex(TableId::Field)),
        ]; C },
        TableId::EncLog => { const C: &[Column] = &[col("Token", Fixed(4)), col("FuncCode", Fixed(4))]; C },
        TableId::EncMap => { const C: &[Column] = &[col("Token", Fixed(4))]; C },
        TableId::Assembly => { const C: &[Column] = &[
            col("HashAlgId", Fixed(4)),
            col("MajorVersion", Fixed(2)),
            col("MinorVersion", Fixed(2)),
            col("BuildNumber", Fixed(2)),
            col("RevisionNumber", Fixed(2)),
            col("Flags", Fixed(4)),
            col("PublicKey", BlobIndex),
            col("Name", StringIndex),
            col("Culture", StringIndex),
        ]; C },
        TableId::AssemblyProcessor => { const C: &[Column] = &[col("Processor", Fixed(4))]; C },
        TableId::AssemblyOS => { const C: &[Column] = &[
            col("OSPlatformID", Fixed(4)),
            col("OSMajorVersion", Fixed(4)),
            col("OSMinorVersion", Fixed(4)),
        ]; C },
        TableId::AssemblyRef => { const C: &[Column] = &[
            col("MajorVersion", Fixed(2)),
            col("MinorVersion", Fixed(2)),
            col("BuildNumber", Fixed(2)),
            col("RevisionNumber", Fixed(2)),
            col("Flags", Fixed(4)),
            col("PublicKeyOrToken", BlobIndex),
            col("Name", StringIndex),
            col("Culture", StringIndex),
            col("HashValue", BlobIndex),
        ]; C },
        TableId::AssemblyRefProcessor => { const C: &[Column] = &[
            col("Processor", Fixed(4)),
            col("AssemblyRef", TableIndex(TableId::AssemblyRef)),
        ]; C },
        TableId::AssemblyRefOS => { const C: &[Column] = &[
            col("OSPlatformID", Fixed(4)),
            col("OSMajorVersion", Fixed(4)),
            col("OSMinorVersion", Fixed(4)),
            col("AssemblyRef", TableIndex(TableId::AssemblyRef)),
        ]; C },
        TableId::File => { const C: &[Column] = &[
            col("Flags", Fixed(4)),
            col("Name", StringIndex),
            col("HashValue", BlobIndex),
        ]; C },
        TableId::ExportedType => { const C: &[Column] = &[
            col("Flags", Fixed(4)),
            col("TypeDefId", Fixed(4)),
            col("TypeName", StringIndex),
            col("TypeNamespace", StringIndex),
            col("Implementation", CodedIndex(CodedIndexType::Implementation)),
        ]; C },
        TableId::ManifestResource => { const C: &[Column] = &[
            col("Offset", Fixed(4)),
            col("Flags", Fixed(4)),
            col("Name", StringIndex),
            col("Implementation", CodedIndex(CodedIndexType::Implementation)),
        ]; C },
        TableId::NestedClass => { const C: &[Column] = &[
            col("NestedClass", TableIndex(TableId::TypeDef)),
            col("EnclosingClass", TableIndex(TableId::TypeDef)),
        ]; C },
        TableId::GenericParam => { const C: &[Column] = &[
            col("Number", Fixed(2)),
            col("Flags", Fixed(2)),
            col("Owner", CodedIndex(CodedIndexType::TypeOrMethodDef)),
            col("Name", StringIndex),
        ]; C },
        TableId::MethodSpec => { const C: &[Column] = &[
            col("Method", CodedIndex(CodedIndexType::MethodDefOrRef)),
            col("Instantiation", BlobIndex),
        ]; C },
        TableId::GenericParamConstraint => { const C: &[Column] = &[
            col("Owner", TableIndex(TableId::GenericParam)),
            col("Constraint", CodedIndex(CodedIndexType::TypeDefOrRef)),
        ]; C },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_table_has_columns() {
        for table in TableId::iter() {
            assert!(
                !table_columns(table).is_empty(),
                "{table:?} has no column layout"
            );
        }
    }

    #[test]
    fn module_layout() {
        let columns = table_columns(TableId::Module);
        assert_eq!(columns.len(), 5);
        assert_eq!(columns[0].name, "Generation");
        assert!(matches!(columns[0].kind, ColumnKind::Fixed(2)));
        assert!(matches!(columns[2].kind, ColumnKind::GuidIndex));
    }
}
