use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::tables::{
        schema::{table_columns, Column, ColumnKind},
        CodedIndex, TableId, TableInfo,
    },
    metadata::token::Token,
    Result,
};

/// One decoded metadata table row: a fixed-width tuple of columns.
///
/// Column values are stored widened to `u32`; the column layout comes from the
/// table's static schema. Heap and table index columns keep their raw index
/// value - resolve them against the owning heaps, or via
/// [`TableRow::coded_index`] for tagged columns.
///
/// # Examples
///
/// ```rust,no_run
/// use pescope::metadata::tables::{TableId, TableRow};
/// # fn get_row() -> TableRow { unimplemented!() }
/// let row: TableRow = get_row();
/// let name_index = row.value("Name")?;
/// println!("row token: {}", row.token());
/// # Ok::<(), pescope::Error>(())
/// ```
pub struct TableRow {
    /// The table this row belongs to
    pub table: TableId,
    /// The 1-based row id
    pub row: u32,
    values: Vec<u32>,
}

impl TableRow {
    /// Parse one row at `offset` within `data`, advancing the offset by exactly
    /// the row's physical width.
    ///
    /// ## Arguments
    /// * 'data' - The tables heap bytes
    /// * 'offset' - Position of the row, advanced past it on success
    /// * 'table' - The table being parsed
    /// * 'row' - The 1-based row id
    /// * 'info' - Column width information for this image
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the row does not fit in `data`
    pub fn parse(
        data: &[u8],
        offset: &mut usize,
        table: TableId,
        row: u32,
        info: &TableInfo,
    ) -> Result<TableRow> {
        let columns = table_columns(table);
        let mut values = Vec::with_capacity(columns.len());

        for column in columns {
            let value = match column.kind {
                ColumnKind::Fixed(1) => u32::from(read_le_at::<u8>(data, offset)?),
                ColumnKind::Fixed(2) => u32::from(read_le_at::<u16>(data, offset)?),
                ColumnKind::Fixed(_) => read_le_at::<u32>(data, offset)?,
                kind => read_le_at_dyn(data, offset, info.column_bytes(kind) == 4)?,
            };
            values.push(value);
        }

        Ok(TableRow { table, row, values })
    }

    /// The static column layout of this row's table
    #[must_use]
    pub fn columns(&self) -> &'static [Column] {
        table_columns(self.table)
    }

    /// The metadata token addressing this row
    #[must_use]
    pub fn token(&self) -> Token {
        Token::from_parts(self.table as u8, self.row)
    }

    /// Raw value of the column with the given name
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the table has no such column
    pub fn value(&self, column: &str) -> Result<u32> {
        match self
            .columns()
            .iter()
            .position(|candidate| candidate.name == column)
        {
            Some(index) => Ok(self.values[index]),
            None => Err(malformed_error!(
                "{:?} has no column named '{}'",
                self.table,
                column
            )),
        }
    }

    /// Raw value of the column at the given position
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the index is past the column count
    pub fn value_at(&self, index: usize) -> Result<u32> {
        self.values
            .get(index)
            .copied()
            .ok_or(crate::Error::OutOfBounds)
    }

    /// Decode the named column as a coded index
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the column is not a coded index column
    pub fn coded_index(&self, column: &str, info: &TableInfo) -> Result<CodedIndex> {
        let index = self
            .columns()
            .iter()
            .position(|candidate| candidate.name == column)
            .ok_or_else(|| {
                malformed_error!("{:?} has no column named '{}'", self.table, column)
            })?;

        match self.columns()[index].kind {
            ColumnKind::CodedIndex(coded_type) => {
                info.decode_coded_index(self.values[index], coded_type)
            }
            _ => Err(malformed_error!(
                "Column '{}' of {:?} is not a coded index",
                column,
                self.table
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_module_row() {
        let info = TableInfo::new(&[(TableId::Module, 1)], false, false, false);

        #[rustfmt::skip]
        let data = [
            0x00, 0x00, // Generation
            0x0A, 0x00, // Name
            0x01, 0x00, // Mvid
            0x00, 0x00, // EncId
            0x00, 0x00, // EncBaseId
        ];

        let mut offset = 0;
        let row = TableRow::parse(&data, &mut offset, TableId::Module, 1, &info).unwrap();

        assert_eq!(offset, 10);
        assert_eq!(row.value("Generation").unwrap(), 0);
        assert_eq!(row.value("Name").unwrap(), 0x0A);
        assert_eq!(row.value("Mvid").unwrap(), 1);
        assert_eq!(row.token().value(), 0x00000001);
        assert!(row.value("NoSuchColumn").is_err());
    }

    #[test]
    fn parse_typedef_row_with_coded_index() {
        let info = TableInfo::new(
            &[(TableId::TypeDef, 2), (TableId::TypeRef, 3)],
            false,
            false,
            false,
        );

        #[rustfmt::skip]
        let data = [
            0x00, 0x00, 0x10, 0x00, // Flags
            0x20, 0x00,             // TypeName
            0x30, 0x00,             // TypeNamespace
            0x05, 0x00,             // Extends = TypeRef row 1 (tag 1, row 1)
            0x01, 0x00,             // FieldList
            0x01, 0x00,             // MethodList
        ];

        let mut offset = 0;
        let row = TableRow::parse(&data, &mut offset, TableId::TypeDef, 1, &info).unwrap();

        assert_eq!(offset, data.len());
        assert_eq!(row.value("Flags").unwrap(), 0x0010_0000);

        let extends = row.coded_index("Extends", &info).unwrap();
        assert_eq!(extends.table, TableId::TypeRef);
        assert_eq!(extends.row, 1);

        assert!(row.coded_index("Flags", &info).is_err());
    }

    #[test]
    fn truncated_row_fails() {
        let info = TableInfo::new(&[(TableId::Module, 1)], false, false, false);
        let data = [0x00, 0x00, 0x0A];

        let mut offset = 0;
        assert!(TableRow::parse(&data, &mut offset, TableId::Module, 1, &info).is_err());
    }
}
