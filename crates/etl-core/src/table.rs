use serde::{Deserialize, Serialize};

use crate::error::{EtlError, Result};

/// A single cell of a tabular extract. `None` marks a missing value.
pub type Cell = Option<String>;

/// Storage type of a column in the warehouse.
///
/// Everything read from a delimited-text extract starts out as [`Text`];
/// derived dimension and fact tables declare their column types explicitly
/// so the loader can emit a predictable schema.
///
/// [`Text`]: ColumnType::Text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Date,
}

impl ColumnType {
    /// The SQL type name used in `CREATE TABLE` statements.
    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Date => "DATE",
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

impl Column {
    /// A text column, the default for anything read from an extract.
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ColumnType::Text,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ColumnType::Integer,
        }
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ColumnType::Real,
        }
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ColumnType::Date,
        }
    }
}

/// An in-memory tabular dataset: named columns plus row-major cells.
///
/// This is the shape every extract takes between reading and loading; the
/// column set is whatever the source file (or derivation) produced, not a
/// validated schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build an empty table with the given columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build an empty table whose columns are all text, from header names.
    pub fn with_text_columns<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::new(names.into_iter().map(Column::text).collect())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Position of the named column, or a [`EtlError::MissingColumn`] naming
    /// `table_name` for diagnostics.
    pub fn require_column(&self, table_name: &str, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| EtlError::MissingColumn {
            table: table_name.to_string(),
            column: name.to_string(),
        })
    }

    /// The cell at (`row`, named column), flattened: a missing column or a
    /// `None` cell both come back as `None`.
    pub fn get(&self, row: usize, name: &str) -> Option<&str> {
        let idx = self.column_index(name)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Append a row. The caller is responsible for matching the column count;
    /// the CSV reader pads and truncates before calling this.
    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }
}
