//! Tables heap (`#~` / `#-`) parsing.
//!
//! The tables heap carries all metadata tables behind a fixed schema header: version
//! fields, the heap size flags, the valid/sorted bitmasks, one row count per present
//! table, and then the rows themselves back to back. The `#-` variant is the
//! uncompressed layout used by edit-and-continue images; its extra data after the
//! schema header is preserved byte-for-byte.
//!
//! ## Reference
//! * '<https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf>' - II.24.2.6 && II.22

use bitflags::bitflags;
use strum::IntoEnumIterator;

use crate::{
    file::io::{read_le, read_le_at},
    metadata::tables::{TableId, TableInfo, TableInfoRef, TableRow},
    Error::OutOfBounds,
    Result,
};

bitflags! {
    /// `HeapSizes` field of the tables heap header
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HeapSizes: u8 {
        /// `#Strings` indexes are 4 bytes
        const WIDE_STRINGS = 0x01;
        /// `#GUID` indexes are 4 bytes
        const WIDE_GUIDS = 0x02;
        /// `#Blob` indexes are 4 bytes
        const WIDE_BLOBS = 0x04;
        /// Row ids may be deleted, `#-` only
        const PADDING = 0x08;
        /// Stream may hold delta-only information, `#-` only
        const DELTA_ONLY = 0x20;
        /// A 4-byte extra data value follows the row counts
        const EXTRA_DATA = 0x40;
    }
}

/// A summary entry for one present table
#[derive(Debug, Clone, Copy)]
pub struct TableSummary {
    /// The table
    pub table: TableId,
    /// Its row count
    pub rows: u32,
}

/// The `#~` (or `#-`) stream: schema header plus all metadata tables.
///
/// Rows are parsed lazily through the static table schema; the heap owns the
/// stream's bytes. Row lookups bounds-check their 1-based row id, so every
/// valid metadata token resolves in O(1) to its row offset.
///
/// # Examples
///
/// ```rust,no_run
/// use pescope::metadata::{streams::TablesHeader, tables::TableId};
/// # fn get(t: &TablesHeader) -> pescope::Result<()> {
/// if t.has_table(TableId::TypeDef) {
///     for row in t.rows(TableId::TypeDef)? {
///         let row = row?;
///         println!("TypeDef row {} flags {:#x}", row.row, row.value("Flags")?);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct TablesHeader {
    /// Reserved, always 0
    pub reserved: u32,
    /// Major version of the table schema, shall be 2
    pub major_version: u8,
    /// Minor version of the table schema, shall be 0
    pub minor_version: u8,
    /// Heap size and layout flags
    pub heap_sizes: HeapSizes,
    /// Reserved, always 1
    pub reserved2: u8,
    /// Bit vector of present tables
    pub valid: u64,
    /// Bit vector of sorted tables
    pub sorted: u64,
    /// Row counts and index widths for all tables
    pub info: TableInfoRef,
    data: Vec<u8>,
    /// Per table: offset of its first row within `data`
    offsets: Vec<usize>,
    raw_extra: Vec<u8>,
}

impl TablesHeader {
    /// Create a `TablesHeader` object from the stream's bytes
    ///
    /// # Arguments
    /// * 'data' - The stream bytes, starting at the schema header
    ///
    /// # Errors
    /// Returns an error if the header is truncated, a table id outside the
    /// defined set is marked valid, or the declared rows exceed the stream
    pub fn from(data: Vec<u8>) -> Result<TablesHeader> {
        if data.len() < 24 {
            return Err(OutOfBounds);
        }

        let valid = read_le::<u64>(&data[8..])?;
        if valid == 0 {
            return Err(malformed_error!("No valid rows in any of the tables"));
        }

        // Table ids above GenericParamConstraint are outside the closed set
        if valid >> (TableId::GenericParamConstraint as u8 + 1) != 0 {
            return Err(malformed_error!(
                "Valid mask {:#x} marks undefined table ids",
                valid
            ));
        }

        let heap_sizes = HeapSizes::from_bits_retain(read_le::<u8>(&data[6..])?);

        let mut offset = 24_usize;
        let mut row_counts: Vec<(TableId, u32)> = Vec::new();
        for table in TableId::iter() {
            if (valid & (1_u64 << (table as u8))) == 0 {
                continue;
            }

            let rows = read_le_at::<u32>(&data, &mut offset)?;
            if rows == 0 {
                // Empty tables should be omitted from the valid mask
                continue;
            }

            row_counts.push((table, rows));
        }

        let raw_extra = if heap_sizes.contains(HeapSizes::EXTRA_DATA) {
            // Undocumented trailing value, preserved verbatim
            let extra = read_le_at::<u32>(&data, &mut offset)?;
            extra.to_le_bytes().to_vec()
        } else {
            Vec::new()
        };

        let info: TableInfoRef = TableInfo::new(
            &row_counts,
            heap_sizes.contains(HeapSizes::WIDE_STRINGS),
            heap_sizes.contains(HeapSizes::WIDE_GUIDS),
            heap_sizes.contains(HeapSizes::WIDE_BLOBS),
        )
        .into();

        let mut offsets = vec![0_usize; TableId::GenericParamConstraint as usize + 1];
        for (table, rows) in &row_counts {
            offsets[*table as usize] = offset;

            let table_bytes = info.row_bytes(*table) as usize * *rows as usize;
            let Some(end) = offset.checked_add(table_bytes) else {
                return Err(OutOfBounds);
            };
            if end > data.len() {
                return Err(malformed_error!(
                    "{:?} declares {} rows but the stream ends at {:#x}",
                    table,
                    rows,
                    data.len()
                ));
            }

            offset = end;
        }

        Ok(TablesHeader {
            reserved: read_le::<u32>(&data)?,
            major_version: read_le::<u8>(&data[4..])?,
            minor_version: read_le::<u8>(&data[5..])?,
            heap_sizes,
            reserved2: read_le::<u8>(&data[7..])?,
            valid,
            sorted: read_le::<u64>(&data[16..])?,
            info,
            data,
            offsets,
            raw_extra,
        })
    }

    /// Get the count of present tables
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.valid.count_ones()
    }

    /// Check if a specific table is present
    #[must_use]
    pub fn has_table(&self, table: TableId) -> bool {
        (self.valid & (1_u64 << (table as u8))) != 0
    }

    /// Check if a table is present by its numeric id
    #[must_use]
    pub fn has_table_by_id(&self, table_id: u8) -> bool {
        if table_id > 63 {
            return false;
        }
        (self.valid & (1_u64 << table_id)) != 0
    }

    /// Get the row count for a specific table, zero if not present
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.info.get(table).rows
    }

    /// Get an iterator over all present tables
    pub fn present_tables(&self) -> impl Iterator<Item = TableId> + '_ {
        TableId::iter().filter(|&table| self.has_table(table) && self.row_count(table) > 0)
    }

    /// Get a summary of all present tables with their row counts
    #[must_use]
    pub fn table_summary(&self) -> Vec<TableSummary> {
        self.present_tables()
            .map(|table| TableSummary {
                table,
                rows: self.row_count(table),
            })
            .collect()
    }

    /// Get one row of a table by its 1-based row id
    ///
    /// ## Arguments
    /// * 'table' - The table to read from
    /// * 'row' - The 1-based row id
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for row id 0 or a row id beyond the
    /// table's row count
    pub fn row(&self, table: TableId, row: u32) -> Result<TableRow> {
        let rows = self.row_count(table);
        if row == 0 || row > rows {
            return Err(malformed_error!(
                "Row {} out of range for {:?} with {} rows",
                row,
                table,
                rows
            ));
        }

        let row_size = self.info.row_bytes(table) as usize;
        let mut offset = self.offsets[table as usize] + row_size * (row - 1) as usize;

        TableRow::parse(&self.data, &mut offset, table, row, &self.info)
    }

    /// Iterate over all rows of a table in row id order
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the table is not present
    pub fn rows(&self, table: TableId) -> Result<RowIterator<'_>> {
        if !self.has_table(table) {
            return Err(malformed_error!("{:?} is not present", table));
        }

        Ok(RowIterator {
            header: self,
            table,
            next_row: 1,
        })
    }

    /// Unknown trailing bytes after the schema header of a `#-` stream,
    /// preserved byte-for-byte
    #[must_use]
    pub fn raw_extra(&self) -> &[u8] {
        &self.raw_extra
    }
}

/// Iterator over the rows of one table
pub struct RowIterator<'a> {
    header: &'a TablesHeader,
    table: TableId,
    next_row: u32,
}

impl Iterator for RowIterator<'_> {
    type Item = Result<TableRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_row > self.header.row_count(self.table) {
            return None;
        }

        let row = self.header.row(self.table, self.next_row);
        self.next_row += 1;
        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Writer;

    /// Builds a tables heap with Module, TypeDef and MethodDef (1 row each)
    pub(crate) fn build_minimal_tables() -> Vec<u8> {
        let mut writer = Writer::new();
        writer.write_le::<u32>(0); // reserved
        writer.write_le::<u8>(2); // major
        writer.write_le::<u8>(0); // minor
        writer.write_le::<u8>(0); // heap_sizes, all narrow
        writer.write_le::<u8>(1); // reserved2
        writer.write_le::<u64>(
            (1 << TableId::Module as u8)
                | (1 << TableId::TypeDef as u8)
                | (1 << TableId::MethodDef as u8),
        );
        writer.write_le::<u64>(0); // sorted
        writer.write_le::<u32>(1); // Module rows
        writer.write_le::<u32>(1); // TypeDef rows
        writer.write_le::<u32>(1); // MethodDef rows

        // Module row: Generation, Name, Mvid, EncId, EncBaseId
        writer.write_le::<u16>(0);
        writer.write_le::<u16>(0x0A);
        writer.write_le::<u16>(1);
        writer.write_le::<u16>(0);
        writer.write_le::<u16>(0);

        // TypeDef row: Flags, TypeName, TypeNamespace, Extends, FieldList, MethodList
        writer.write_le::<u32>(0);
        writer.write_le::<u16>(0x01);
        writer.write_le::<u16>(0);
        writer.write_le::<u16>(0);
        writer.write_le::<u16>(1);
        writer.write_le::<u16>(1);

        // MethodDef row: RVA, ImplFlags, Flags, Name, Signature, ParamList
        writer.write_le::<u32>(0x2000);
        writer.write_le::<u16>(0);
        writer.write_le::<u16>(0x0006);
        writer.write_le::<u16>(0x20);
        writer.write_le::<u16>(0x01);
        writer.write_le::<u16>(1);

        writer.into_bytes()
    }

    #[test]
    fn minimal_heap() {
        let header = TablesHeader::from(build_minimal_tables()).unwrap();

        assert_eq!(header.table_count(), 3);
        assert!(header.has_table(TableId::Module));
        assert!(header.has_table_by_id(0x06));
        assert!(!header.has_table(TableId::Field));
        assert_eq!(header.row_count(TableId::Module), 1);

        let module = header.row(TableId::Module, 1).unwrap();
        assert_eq!(module.value("Name").unwrap(), 0x0A);

        let method = header.row(TableId::MethodDef, 1).unwrap();
        assert_eq!(method.value("RVA").unwrap(), 0x2000);
        assert_eq!(method.token().value(), 0x06000001);

        assert!(header.row(TableId::Module, 0).is_err());
        assert!(header.row(TableId::Module, 2).is_err());
        assert!(header.raw_extra().is_empty());

        let summaries = header.table_summary();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].table, TableId::Module);
    }

    #[test]
    fn row_iteration() {
        let header = TablesHeader::from(build_minimal_tables()).unwrap();

        let rows: Result<Vec<_>> = header.rows(TableId::TypeDef).unwrap().collect();
        let rows = rows.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row, 1);

        assert!(header.rows(TableId::Param).is_err());
    }

    #[test]
    fn extra_data_is_preserved() {
        let mut writer = Writer::new();
        writer.write_le::<u32>(0);
        writer.write_le::<u8>(2);
        writer.write_le::<u8>(0);
        writer.write_le::<u8>(HeapSizes::EXTRA_DATA.bits());
        writer.write_le::<u8>(1);
        writer.write_le::<u64>(1 << TableId::Module as u8);
        writer.write_le::<u64>(0);
        writer.write_le::<u32>(1); // Module rows
        writer.write_le::<u32>(0xDEAD_BEEF); // extra data
        for _ in 0..5 {
            writer.write_le::<u16>(0); // Module row
        }

        let header = TablesHeader::from(writer.into_bytes()).unwrap();
        assert_eq!(header.raw_extra(), &[0xEF, 0xBE, 0xAD, 0xDE]);
        assert!(header.row(TableId::Module, 1).is_ok());
    }

    #[test]
    fn undefined_table_id_is_rejected() {
        let mut writer = Writer::new();
        writer.write_le::<u32>(0);
        writer.write_le::<u8>(2);
        writer.write_le::<u8>(0);
        writer.write_le::<u8>(0);
        writer.write_le::<u8>(1);
        writer.write_le::<u64>(1 << 0x30); // Document table, Portable PDB only
        writer.write_le::<u64>(0);
        writer.write_le::<u32>(1);

        assert!(TablesHeader::from(writer.into_bytes()).is_err());
    }

    #[test]
    fn truncated_rows_are_rejected() {
        let mut data = build_minimal_tables();
        data.truncate(data.len() - 4);

        assert!(TablesHeader::from(data).is_err());
    }

    #[test]
    fn widened_coded_index_consumes_four_bytes() {
        // TypeDef with 2^14 rows; MemberRef has no rows, but the synthetic
        // row uses the widened TypeDefOrRef width via TableInfo
        let rows = 1_u32 << 14;

        let mut writer = Writer::new();
        writer.write_le::<u32>(0);
        writer.write_le::<u8>(2);
        writer.write_le::<u8>(0);
        writer.write_le::<u8>(0);
        writer.write_le::<u8>(1);
        writer.write_le::<u64>(1 << TableId::TypeDef as u8);
        writer.write_le::<u64>(0);
        writer.write_le::<u32>(rows);

        // Each TypeDef row: Flags(4) + Name(2) + Namespace(2) + Extends(4, widened)
        //                   + FieldList(2) + MethodList(2) = 16 bytes
        let row_size = 16_usize;
        for _ in 0..rows {
            writer.write_zeros(row_size);
        }

        let data_len = writer.pos();
        let header = TablesHeader::from(writer.into_bytes()).unwrap();

        assert_eq!(header.info.row_bytes(TableId::TypeDef) as usize, row_size);
        assert_eq!(
            header.info.coded_index_bytes(crate::metadata::tables::CodedIndexType::TypeDefOrRef),
            4
        );

        // The parser consumed exactly row_size * row_count bytes: the last row
        // ends at the end of the stream
        let last = header.row(TableId::TypeDef, rows).unwrap();
        assert_eq!(last.row, rows);
        assert_eq!(data_len, 24 + 4 + row_size * rows as usize);
    }
}
