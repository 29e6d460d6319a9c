use std::collections::{HashMap, HashSet};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("table has no header row")]
    MissingHeader,

    #[error("row {row} has {found} cells, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {0} has an empty id")]
    EmptyId(usize),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
}

/// One exported vocabulary entry, keyed by lexeme id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub id: String,
    pub cells: HashMap<String, String>,
}

impl OutputRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: HashMap::new(),
        }
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

/// The persisted vocabulary table: ordered columns, ordered rows.
///
/// Row order is insertion order; nothing here ever sorts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTable {
    pub columns: Vec<String>,
    pub rows: Vec<OutputRow>,
}

impl OutputTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from a header and raw cell rows, the first cell of each
    /// row being its id.
    pub fn from_records(
        columns: Vec<String>,
        records: Vec<Vec<String>>,
    ) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TableError::DuplicateColumn(column.clone()));
            }
        }

        let mut rows = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            if record.len() != columns.len() + 1 {
                return Err(TableError::RaggedRow {
                    row: i + 1,
                    expected: columns.len() + 1,
                    found: record.len(),
                });
            }
            let mut cells = record.into_iter();
            let id = cells.next().unwrap_or_default();
            if id.trim().is_empty() {
                return Err(TableError::EmptyId(i + 1));
            }
            let mut row = OutputRow::new(id);
            for (column, value) in columns.iter().zip(cells) {
                row.set(column.clone(), value);
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ids(&self) -> HashSet<&str> {
        self.rows.iter().map(|r| r.id.as_str()).collect()
    }

    /// Cells of a row in column order, missing cells as empty strings.
    pub fn record(&self, row: &OutputRow) -> Vec<String> {
        std::iter::once(row.id.clone())
            .chain(
                self.columns
                    .iter()
                    .map(|c| row.get(c).unwrap_or_default().to_string()),
            )
            .collect()
    }

    /// Add any columns this table doesn't have yet, after the existing ones.
    pub fn extend_columns<'a>(&mut self, columns: impl IntoIterator<Item = &'a String>) {
        for column in columns {
            if !self.columns.contains(column) {
                self.columns.push(column.clone());
            }
        }
    }
}
