use std::sync::Arc;
use strum::{EnumCount, IntoEnumIterator};

use crate::{
    metadata::tables::{
        schema::{table_columns, ColumnKind},
        CodedIndex, CodedIndexType, TableId,
    },
    metadata::token::Token,
    Error::OutOfBounds,
    Result,
};

/// Holds information about the size that reference index fields have
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct TableRowInfo {
    /// The count of rows in this table
    pub rows: u32,
    /// Number of bits required to represent any valid row index
    pub bits: u8,
    /// If the count is > `u16::MAX`, indexes of other tables into this table are 4 bytes instead of 2
    pub is_large: bool,
}

impl TableRowInfo {
    /// Creates a new `TableRowInfo` instance with the given row count.
    ///
    /// # Arguments
    /// * `rows` - The number of rows in the table
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(rows: u32) -> Self {
        let bits = if rows == 0 {
            1
        } else {
            (32 - rows.leading_zeros()) as u8
        };

        Self {
            rows,
            bits,
            is_large: rows > u32::from(u16::MAX),
        }
    }
}

/// `TableInfo` holds the row counts and reference index field sizes
/// of all tables in this image
#[derive(Clone, Default)]
pub struct TableInfo {
    rows: Vec<TableRowInfo>,
    coded_indexes: Vec<u8>,
    is_large_index_str: bool,
    is_large_index_guid: bool,
    is_large_index_blob: bool,
}

/// Cheap-copy reference to a `TableInfo` structure
pub type TableInfoRef = Arc<TableInfo>;

impl TableInfo {
    /// Build a new `TableInfo` struct from parsed row counts and heap size flags
    ///
    /// ## Arguments
    /// * '`row_counts`' - (table, row count) pairs for every present table
    /// * '`large_str`' - True if `#Strings` indexes are 4 bytes
    /// * '`large_guid`' - True if `#GUID` indexes are 4 bytes
    /// * '`large_blob`' - True if `#Blob` indexes are 4 bytes
    #[must_use]
    pub fn new(
        row_counts: &[(TableId, u32)],
        large_str: bool,
        large_guid: bool,
        large_blob: bool,
    ) -> Self {
        let mut table_info = TableInfo {
            rows: vec![TableRowInfo::default(); TableId::GenericParamConstraint as usize + 1],
            coded_indexes: vec![0; CodedIndexType::COUNT],
            is_large_index_str: large_str,
            is_large_index_guid: large_guid,
            is_large_index_blob: large_blob,
        };

        for (table, rows) in row_counts {
            table_info.rows[*table as usize] = TableRowInfo::new(*rows);
        }

        table_info.calculate_coded_index_bits();
        table_info
    }

    /// Decodes a coded index value into its component table and row index.
    ///
    /// # Arguments
    /// * `value` - The encoded value to decode
    /// * `coded_index_type` - The type of coded index being decoded
    ///
    /// # Errors
    /// Returns an error if the tag value is out of bounds for the coded index type
    pub fn decode_coded_index(
        &self,
        value: u32,
        coded_index_type: CodedIndexType,
    ) -> Result<CodedIndex> {
        let tables = coded_index_type.tables();
        let tag_bits = coded_index_type.tag_bits();
        let tag_mask = (1 << tag_bits) - 1;

        let tag = value & tag_mask;
        let row = value >> tag_bits;

        if tag as usize >= tables.len() {
            return Err(OutOfBounds);
        }

        let table = tables[tag as usize];
        Ok(CodedIndex {
            table,
            row,
            token: Token::from_parts(table as u8, row),
        })
    }

    /// Encodes a (table, row) pair into a coded index value.
    ///
    /// # Arguments
    /// * `table` - The target table
    /// * `row` - The 1-based row index
    /// * `coded_index_type` - The type of coded index being encoded
    ///
    /// # Errors
    /// Returns an error if `table` is not a member of the coded index type
    pub fn encode_coded_index(
        &self,
        table: TableId,
        row: u32,
        coded_index_type: CodedIndexType,
    ) -> Result<u32> {
        let tables = coded_index_type.tables();
        let Some(tag) = tables.iter().position(|candidate| *candidate == table) else {
            return Err(malformed_error!(
                "{:?} is not a member of {:?}",
                table,
                coded_index_type
            ));
        };

        Ok((row << coded_index_type.tag_bits()) | tag as u32)
    }

    /// Returns true if a requested table is larger than 2^16 rows and hence requires
    /// 4 byte indexes instead of 2
    ///
    /// ## Arguments
    /// * `id` - The `TableId` to query
    #[must_use]
    pub fn is_large(&self, id: TableId) -> bool {
        self.rows[id as usize].is_large
    }

    /// Indicates the size of indexes into the '#Strings' heap. True means 4 bytes
    #[must_use]
    pub fn is_large_str(&self) -> bool {
        self.is_large_index_str
    }

    /// Indicates the size of indexes into the '#GUID' heap. True means 4 bytes
    #[must_use]
    pub fn is_large_guid(&self) -> bool {
        self.is_large_index_guid
    }

    /// Indicates the size of indexes into the '#Blob' heap. True means 4 bytes
    #[must_use]
    pub fn is_large_blob(&self) -> bool {
        self.is_large_index_blob
    }

    /// Returns the metadata for a specific table.
    ///
    /// # Arguments
    /// * `table` - The `TableId` for which to retrieve metadata
    #[must_use]
    pub fn get(&self, table: TableId) -> &TableRowInfo {
        &self.rows[table as usize]
    }

    /// Returns the number of bits required to represent an index into a specific table.
    #[must_use]
    pub fn table_index_bits(&self, table_id: TableId) -> u8 {
        self.rows[table_id as usize].bits
    }

    /// Returns the number of bytes used for an index into a specific table.
    #[must_use]
    pub fn table_index_bytes(&self, table_id: TableId) -> u8 {
        if self.rows[table_id as usize].bits > 16 {
            4
        } else {
            2
        }
    }

    /// Returns the cached bit size for a specific coded index type.
    #[must_use]
    pub fn coded_index_bits(&self, coded_index_type: CodedIndexType) -> u8 {
        self.coded_indexes[coded_index_type as usize]
    }

    /// Returns the cached byte size for a specific coded index type.
    #[must_use]
    pub fn coded_index_bytes(&self, coded_index_type: CodedIndexType) -> u8 {
        if self.coded_indexes[coded_index_type as usize] > 16 {
            4
        } else {
            2
        }
    }

    /// Physical width in bytes of one column of the given kind
    #[must_use]
    pub fn column_bytes(&self, kind: ColumnKind) -> u8 {
        match kind {
            ColumnKind::Fixed(bytes) => bytes,
            ColumnKind::StringIndex => {
                if self.is_large_index_str {
                    4
                } else {
                    2
                }
            }
            ColumnKind::GuidIndex => {
                if self.is_large_index_guid {
                    4
                } else {
                    2
                }
            }
            ColumnKind::BlobIndex => {
                if self.is_large_index_blob {
                    4
                } else {
                    2
                }
            }
            ColumnKind::TableIndex(table) => self.table_index_bytes(table),
            ColumnKind::CodedIndex(coded) => self.coded_index_bytes(coded),
        }
    }

    /// Physical width in bytes of one row of the given table
    #[must_use]
    pub fn row_bytes(&self, table: TableId) -> u32 {
        table_columns(table)
            .iter()
            .map(|column| u32::from(self.column_bytes(column.kind)))
            .sum()
    }

    /// Calculates the number of bits required for a specific coded index type.
    fn calculate_coded_index_size(&self, coded_index_type: CodedIndexType) -> u8 {
        let tables = coded_index_type.tables();
        let max_bits = tables
            .iter()
            .map(|table| self.table_index_bits(*table))
            .max()
            .unwrap_or(1);

        max_bits + coded_index_type.tag_bits()
    }

    /// Calculates and caches the bit sizes required for all coded index types.
    fn calculate_coded_index_bits(&mut self) {
        for coded_index in CodedIndexType::iter() {
            let size = self.calculate_coded_index_size(coded_index);
            self.coded_indexes[coded_index as usize] = size;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_tables_use_narrow_indexes() {
        let info = TableInfo::new(
            &[(TableId::TypeDef, 10), (TableId::MethodDef, 20)],
            false,
            false,
            false,
        );

        assert_eq!(info.table_index_bytes(TableId::TypeDef), 2);
        assert_eq!(info.coded_index_bytes(CodedIndexType::TypeDefOrRef), 2);
        assert_eq!(info.column_bytes(ColumnKind::StringIndex), 2);
    }

    #[test]
    fn coded_index_widens_at_tag_boundary() {
        // 2^14 TypeDef rows need 14 bits; plus 2 tag bits crosses the 16-bit line
        let info = TableInfo::new(&[(TableId::TypeDef, 1 << 14)], false, false, false);

        assert_eq!(info.table_index_bytes(TableId::TypeDef), 2);
        assert_eq!(info.coded_index_bits(CodedIndexType::TypeDefOrRef), 17);
        assert_eq!(info.coded_index_bytes(CodedIndexType::TypeDefOrRef), 4);

        // One row fewer stays at 14 bits + 2 = 16, still narrow
        let info = TableInfo::new(&[(TableId::TypeDef, (1 << 14) - 1)], false, false, false);
        assert_eq!(info.coded_index_bytes(CodedIndexType::TypeDefOrRef), 2);
    }

    #[test]
    fn large_table_widens_simple_indexes() {
        let info = TableInfo::new(
            &[(TableId::MethodDef, u32::from(u16::MAX) + 1)],
            false,
            false,
            false,
        );

        assert!(info.is_large(TableId::MethodDef));
        assert_eq!(info.table_index_bytes(TableId::MethodDef), 4);
    }

    #[test]
    fn coded_index_roundtrip() {
        let info = TableInfo::new(&[(TableId::TypeDef, 100)], false, false, false);

        let encoded = info
            .encode_coded_index(TableId::TypeRef, 42, CodedIndexType::TypeDefOrRef)
            .unwrap();
        assert_eq!(encoded, (42 << 2) | 1);

        let decoded = info
            .decode_coded_index(encoded, CodedIndexType::TypeDefOrRef)
            .unwrap();
        assert_eq!(decoded.table, TableId::TypeRef);
        assert_eq!(decoded.row, 42);
        assert_eq!(decoded.token.value(), 0x0100_002A);

        assert!(info
            .encode_coded_index(TableId::Module, 1, CodedIndexType::TypeDefOrRef)
            .is_err());
    }

    #[test]
    fn null_coded_index() {
        let info = TableInfo::new(&[], false, false, false);
        let decoded = info
            .decode_coded_index(0, CodedIndexType::TypeDefOrRef)
            .unwrap();
        assert!(decoded.is_null());
    }

    #[test]
    fn module_row_width() {
        let info = TableInfo::new(&[(TableId::Module, 1)], false, false, false);
        // Generation(2) + Name(2) + 3 * Guid(2) = 10
        assert_eq!(info.row_bytes(TableId::Module), 10);

        let info = TableInfo::new(&[(TableId::Module, 1)], true, true, true);
        // Generation(2) + Name(4) + 3 * Guid(4) = 18
        assert_eq!(info.row_bytes(TableId::Module), 18);
    }
}
