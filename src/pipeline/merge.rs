//! Tabular merge: flatten every extracted table into one CSV document.
//!
//! Tables are concatenated row by row in page/detection order and aligned
//! by column **position**, never by header text. The merged width is the
//! widest table; shorter rows are padded with empty cells, so differing
//! column counts never fail. The header row is the positional column index
//! (`0,1,…`) and no index column is written.

use crate::error::PdfTableError;
use crate::output::{CsvOutcome, MergedTable};
use crate::table::{ExtractedTable, TableCollection};
use tracing::debug;

/// Concatenate all tables positionally.
pub fn merge_tables(tables: &TableCollection) -> MergedTable {
    let width = tables
        .iter()
        .map(ExtractedTable::column_count)
        .max()
        .unwrap_or(0);

    let rows = tables
        .iter()
        .flat_map(|table| table.rows.iter())
        .map(|row| {
            let mut cells: Vec<String> =
                row.iter().map(|c| c.clone().unwrap_or_default()).collect();
            cells.resize(width, String::new());
            cells
        })
        .collect();

    MergedTable { width, rows }
}

/// Serialise a merged table as comma-separated text, header row first.
pub fn to_csv(merged: &MergedTable) -> Result<String, PdfTableError> {
    if merged.width == 0 {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(merged.header())
        .map_err(|e| PdfTableError::CsvWrite(e.to_string()))?;
    for row in &merged.rows {
        writer
            .write_record(row)
            .map_err(|e| PdfTableError::CsvWrite(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| PdfTableError::CsvWrite(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| PdfTableError::CsvWrite(e.to_string()))
}

/// Merge and serialise, or report that there was nothing to merge.
///
/// Tables without a single column carry no cells and count as no tables.
pub fn tables_to_csv(tables: &TableCollection) -> Result<CsvOutcome, PdfTableError> {
    let merged = merge_tables(tables);
    if merged.width == 0 {
        return Ok(CsvOutcome::NoTables);
    }

    let body = to_csv(&merged)?;
    debug!(
        "Merged {} table(s) into {} row(s) × {} column(s)",
        tables.len(),
        merged.rows.len(),
        merged.width
    );

    Ok(CsvOutcome::Csv {
        body,
        tables: tables.len(),
        data_rows: merged.rows.len(),
    })
}
