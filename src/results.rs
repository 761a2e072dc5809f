use crate::types::RowValues;

/// Native outcome of running one statement
///
/// Read statements fill `column_names` and `rows`; write statements leave them empty and report
/// `rows_affected` and, when the statement assigned a new rowid, `last_insert_rowid`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Column names in result order (empty when no rows were returned)
    pub column_names: Vec<String>,
    /// The rows returned by the query, values in column order
    pub rows: Vec<Vec<RowValues>>,
    /// The number of rows affected (for DML statements)
    pub rows_affected: u64,
    /// Rowid assigned by the statement, if it assigned one
    pub last_insert_rowid: Option<i64>,
}

impl ResultSet {
    /// Result of a statement that produced nothing observable (scripts, DDL).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Result of a read statement.
    ///
    /// Columns are only reported when at least one row came back, so an empty read carries no
    /// column list.
    #[must_use]
    pub fn from_rows(column_names: Vec<String>, rows: Vec<Vec<RowValues>>) -> Self {
        let column_names = if rows.is_empty() {
            Vec::new()
        } else {
            column_names
        };
        Self {
            column_names,
            rows,
            rows_affected: 0,
            last_insert_rowid: None,
        }
    }

    /// Result of a write statement.
    #[must_use]
    pub fn from_changes(rows_affected: u64, last_insert_rowid: Option<i64>) -> Self {
        Self {
            column_names: Vec::new(),
            rows: Vec::new(),
            rows_affected,
            last_insert_rowid,
        }
    }

    /// Get a value by row index and column name
    #[must_use]
    pub fn get(&self, row: usize, column_name: &str) -> Option<&RowValues> {
        let idx = self.column_names.iter().position(|col| col == column_name)?;
        self.rows.get(row)?.get(idx)
    }
}

/// Metadata about a prepared statement that was never run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementDescription {
    /// Parameter names in binding order; anonymous `?` parameters are `None`
    pub params: Vec<Option<String>>,
    /// Result columns as (name, declared type)
    pub columns: Vec<(String, Option<String>)>,
    pub is_explain: bool,
    pub is_readonly: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reads_drop_the_column_list() {
        let rs = ResultSet::from_rows(vec!["id".into()], Vec::new());
        assert!(rs.column_names.is_empty());
        assert_eq!(rs.rows_affected, 0);
        assert_eq!(rs.last_insert_rowid, None);
    }

    #[test]
    fn get_looks_up_by_column_name() {
        let rs = ResultSet::from_rows(
            vec!["id".into(), "v".into()],
            vec![vec![RowValues::Int(1), RowValues::Text("x".into())]],
        );
        assert_eq!(rs.get(0, "v"), Some(&RowValues::Text("x".into())));
        assert_eq!(rs.get(0, "missing"), None);
        assert_eq!(rs.get(1, "id"), None);
    }
}
