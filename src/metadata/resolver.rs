//! Metadata token resolution against the tables heap.

use crate::{
    metadata::{
        streams::TablesHeader,
        tables::{TableId, TableRow},
        token::Token,
    },
    Result,
};

/// Resolves metadata tokens to their table rows.
///
/// A resolver is a non-owning view over a tables heap; its lifetime is bounded
/// by the [`crate::metadata::NetDirectory`] that owns the heap. Resolution
/// bounds-checks the token's row id; a row id of zero is the NULL reference and
/// resolves to `None`.
///
/// # Examples
///
/// ```rust,no_run
/// use pescope::metadata::{resolver::TokenResolver, token::Token};
/// # fn example(resolver: &TokenResolver) -> pescope::Result<()> {
/// match resolver.resolve(Token::new(0x06000001))? {
///     Some(row) => println!("MethodDef row {}", row.row),
///     None => println!("null token"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct TokenResolver<'a> {
    tables: &'a TablesHeader,
}

impl<'a> TokenResolver<'a> {
    /// Create a resolver over a tables heap
    #[must_use]
    pub fn new(tables: &'a TablesHeader) -> Self {
        TokenResolver { tables }
    }

    /// Resolve a token to its table row.
    ///
    /// ## Arguments
    /// * 'token' - The token to resolve
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an undefined table id or a row id
    /// beyond the target table's row count
    pub fn resolve(&self, token: Token) -> Result<Option<TableRow>> {
        if token.row() == 0 {
            return Ok(None);
        }

        let Some(table) = TableId::from_id(token.table()) else {
            return Err(malformed_error!(
                "Token {} references undefined table {:#04x}",
                token,
                token.table()
            ));
        };

        self.tables.row(table, token.row()).map(Some)
    }

    /// The amount of rows the token's target table holds, zero for undefined tables
    #[must_use]
    pub fn table_size(&self, token: Token) -> u32 {
        match TableId::from_id(token.table()) {
            Some(table) => self.tables.row_count(table),
            None => 0,
        }
    }
}
