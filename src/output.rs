//! Output types of the two pipelines.
//!
//! * [`RentRollSummary`]: the structured reply of the rent-roll pipeline.
//! * [`MergedTable`] / [`CsvOutcome`]: the flattened grid of the CSV pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Rows of `{key, value, type}` cells describing a rent roll.
///
/// Rows may differ in length: a totals row usually carries fewer keys than
/// a unit row. Top-level fields other than `rentRollSummary` are kept in
/// `extra` and serialised back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentRollSummary {
    pub rent_roll_summary: Vec<Vec<RentRollCell>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RentRollSummary {
    pub fn row_count(&self) -> usize {
        self.rent_roll_summary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rent_roll_summary.is_empty()
    }
}

/// One cell of a rent-roll row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentRollCell {
    /// Column header, or the name of a total (e.g. "Total Annual Revenue").
    pub key: String,
    /// Cell value; currency values keep their leading symbol.
    #[serde(default)]
    pub value: Value,
    /// Value type label, e.g. `string`, `number`, `currency`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Any other fields the model attached to the cell.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Canonical type labels for rent-roll cells.
///
/// The model may emit other labels ("date", "percentage"); those are kept
/// as-is. These are the ones the pipeline infers on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    String,
    Number,
    Currency,
    Boolean,
}

impl CellType {
    pub fn as_str(self) -> &'static str {
        match self {
            CellType::String => "string",
            CellType::Number => "number",
            CellType::Currency => "currency",
            CellType::Boolean => "boolean",
        }
    }

    /// Infer the type label from the shape of a value.
    ///
    /// A leading currency symbol wins over everything else, so `"$1,200"`
    /// is `currency` rather than `number`.
    pub fn infer(value: &Value) -> CellType {
        match value {
            Value::Number(_) => CellType::Number,
            Value::Bool(_) => CellType::Boolean,
            Value::String(s) if has_currency_symbol(s) => CellType::Currency,
            Value::String(s) if looks_numeric(s) => CellType::Number,
            _ => CellType::String,
        }
    }
}

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// `true` for `$1,200`, `-$50`, `($75.00)`.
pub fn has_currency_symbol(s: &str) -> bool {
    let s = s.trim_start().trim_start_matches(['-', '(', '+']).trim_start();
    s.starts_with(CURRENCY_SYMBOLS)
}

fn looks_numeric(s: &str) -> bool {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    !cleaned.is_empty() && cleaned.parse::<f64>().is_ok()
}

/// All extracted tables flattened into one positional grid.
///
/// Every row has exactly `width` cells; `header` is the positional column
/// label `0..width`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedTable {
    pub width: usize,
    pub rows: Vec<Vec<String>>,
}

impl MergedTable {
    pub fn header(&self) -> Vec<String> {
        (0..self.width).map(|i| i.to_string()).collect()
    }
}

/// Result of the CSV pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvOutcome {
    /// The document contained no tables; no CSV is produced.
    NoTables,
    /// Serialised CSV document, header row included.
    Csv {
        body: String,
        tables: usize,
        data_rows: usize,
    },
}

/// Attachment name of the CSV download.
pub const CSV_FILENAME: &str = "tables.csv";

/// Message returned instead of a CSV when no tables are found.
pub const NO_TABLES_MESSAGE: &str = "No tables found in the PDF.";
