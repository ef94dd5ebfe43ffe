//! Tabular data as produced by the extraction stage.
//!
//! A cell is `Option<String>`: `None` marks a grid position where the
//! detector found no text. Both types serialise to plain nested JSON arrays
//! (`[["Unit", "Rent"], ["101", null]]`), which is exactly what the
//! rent-roll prompt embeds.

use serde::{Deserialize, Serialize};

/// A single cell value as delivered by the extractor.
pub type Cell = Option<String>;

/// One detected table: rows of cells, in reading order.
///
/// Rows are not required to have equal length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedTable {
    pub rows: Vec<Vec<Cell>>,
}

impl ExtractedTable {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<Vec<Cell>>> for ExtractedTable {
    fn from(rows: Vec<Vec<Cell>>) -> Self {
        Self::new(rows)
    }
}

/// All tables of one document, in page order, then in-page detection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableCollection {
    pub tables: Vec<ExtractedTable>,
}

impl TableCollection {
    pub fn new(tables: Vec<ExtractedTable>) -> Self {
        Self { tables }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// `true` when no table was detected; a valid outcome, not an error.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Sum of row counts over every table.
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(ExtractedTable::row_count).sum()
    }

    /// Append the tables detected on the next page.
    pub fn extend_page(&mut self, page_tables: impl IntoIterator<Item = ExtractedTable>) {
        self.tables.extend(page_tables);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExtractedTable> {
        self.tables.iter()
    }

    /// Nested-array JSON text, as embedded in the rent-roll prompt.
    pub fn to_json_text(&self) -> String {
        // Vec<Vec<Vec<Option<String>>>> cannot fail to serialise.
        serde_json::to_string(self).unwrap_or_else(|_| "[]".to_string())
    }
}

impl<'a> IntoIterator for &'a TableCollection {
    type Item = &'a ExtractedTable;
    type IntoIter = std::slice::Iter<'a, ExtractedTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

/// Build a table from string literals; `""` stays an empty string.
#[cfg(test)]
pub(crate) fn table_of(rows: &[&[&str]]) -> ExtractedTable {
    ExtractedTable::new(
        rows.iter()
            .map(|r| r.iter().map(|c| Some(c.to_string())).collect())
            .collect(),
    )
}
