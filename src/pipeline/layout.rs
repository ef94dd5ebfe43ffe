//! Table detection from positioned text (stream-mode heuristic).
//!
//! pdfium gives us text runs with bounding boxes but no notion of a table.
//! The detector rebuilds grids from alignment alone:
//!
//! 1. group runs into visual lines by vertical centre;
//! 2. within a line, join runs separated by less than `min_column_gap`
//!    into one chunk (one cell candidate);
//! 3. consecutive lines with at least `min_columns` chunks form a table
//!    region; any other line ends the region;
//! 4. column bands are the union of overlapping chunk x-extents within the
//!    region, and every chunk lands in the band containing its centre.
//!
//! Positions with no chunk become `None` cells. Coordinates follow PDF
//! convention: `y` grows upwards, so the first row has the largest `top`.

use crate::config::LayoutConfig;
use crate::table::{Cell, ExtractedTable};

/// A run of text with its bounding box in page points.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self {
            text: text.into(),
            left,
            right,
            top,
            bottom,
        }
    }

    fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

#[derive(Debug, Clone)]
struct Chunk {
    text: String,
    left: f32,
    right: f32,
}

impl Chunk {
    fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }
}

/// Detect every table on one page, top to bottom.
pub fn detect_tables(spans: &[TextSpan], config: &LayoutConfig) -> Vec<ExtractedTable> {
    let lines = group_lines(spans, config);

    let mut tables = Vec::new();
    let mut region: Vec<Vec<Chunk>> = Vec::new();

    for line in lines {
        if line.len() >= config.min_columns {
            region.push(line);
            continue;
        }
        flush_region(&mut region, config, &mut tables);
    }
    flush_region(&mut region, config, &mut tables);

    tables
}

fn flush_region(
    region: &mut Vec<Vec<Chunk>>,
    config: &LayoutConfig,
    out: &mut Vec<ExtractedTable>,
) {
    if region.len() >= config.min_rows {
        if let Some(table) = build_grid(region, config) {
            out.push(table);
        }
    }
    region.clear();
}

/// Group spans into lines (top to bottom), each line as merged chunks (left to right).
fn group_lines(spans: &[TextSpan], config: &LayoutConfig) -> Vec<Vec<Chunk>> {
    let mut sorted: Vec<&TextSpan> = spans.iter().filter(|s| !s.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| {
        b.center_y()
            .total_cmp(&a.center_y())
            .then(a.left.total_cmp(&b.left))
    });

    let mut lines: Vec<Vec<&TextSpan>> = Vec::new();
    let mut line_y = f32::NAN;
    for span in sorted {
        match lines.last_mut() {
            Some(line) if (span.center_y() - line_y).abs() <= config.y_tolerance => line.push(span),
            _ => {
                line_y = span.center_y();
                lines.push(vec![span]);
            }
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.left.total_cmp(&b.left));
            merge_chunks(&line, config.min_column_gap)
        })
        .collect()
}

fn merge_chunks(line: &[&TextSpan], min_gap: f32) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    for span in line {
        let text = span.text.trim();
        match chunks.last_mut() {
            Some(chunk) if span.left - chunk.right < min_gap => {
                // Touching runs are pieces of one word.
                if span.left - chunk.right >= 1.0 {
                    chunk.text.push(' ');
                }
                chunk.text.push_str(text);
                chunk.right = chunk.right.max(span.right);
            }
            _ => chunks.push(Chunk {
                text: text.to_string(),
                left: span.left,
                right: span.right,
            }),
        }
    }
    chunks
}

fn build_grid(region: &[Vec<Chunk>], config: &LayoutConfig) -> Option<ExtractedTable> {
    let bands = column_bands(region);
    if bands.len() < config.min_columns {
        return None;
    }

    let rows = region
        .iter()
        .map(|line| {
            let mut row: Vec<Cell> = vec![None; bands.len()];
            for chunk in line {
                let col = band_for(&bands, chunk.center_x());
                if let Some(existing) = &mut row[col] {
                    existing.push(' ');
                    existing.push_str(&chunk.text);
                } else {
                    row[col] = Some(chunk.text.clone());
                }
            }
            row
        })
        .collect();

    Some(ExtractedTable::new(rows))
}

/// Union of overlapping chunk extents, left to right.
fn column_bands(region: &[Vec<Chunk>]) -> Vec<(f32, f32)> {
    let mut extents: Vec<(f32, f32)> = region
        .iter()
        .flatten()
        .map(|c| (c.left, c.right))
        .collect();
    extents.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut bands: Vec<(f32, f32)> = Vec::new();
    for (left, right) in extents {
        match bands.last_mut() {
            Some(band) if left <= band.1 => band.1 = band.1.max(right),
            _ => bands.push((left, right)),
        }
    }
    bands
}

fn band_for(bands: &[(f32, f32)], x: f32) -> usize {
    bands
        .iter()
        .position(|&(l, r)| x >= l && x <= r)
        .unwrap_or_else(|| {
            bands
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| band_distance(**a, x).total_cmp(&band_distance(**b, x)))
                .map(|(i, _)| i)
                .unwrap_or(0)
        })
}

fn band_distance((l, r): (f32, f32), x: f32) -> f32 {
    if x < l {
        l - x
    } else {
        x - r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One span per cell; `y` is the top edge, text 10pt tall.
    fn row(y: f32, cells: &[(&str, f32, f32)]) -> Vec<TextSpan> {
        cells
            .iter()
            .map(|(t, l, r)| TextSpan::new(*t, *l, *r, y, y - 10.0))
            .collect()
    }

    fn texts(table: &ExtractedTable) -> Vec<Vec<Option<&str>>> {
        table
            .rows
            .iter()
            .map(|r| r.iter().map(|c| c.as_deref()).collect())
            .collect()
    }

    #[test]
    fn detects_simple_grid() {
        let mut spans = Vec::new();
        spans.extend(row(700.0, &[("Unit", 50.0, 80.0), ("Rent", 200.0, 230.0)]));
        spans.extend(row(685.0, &[("101", 50.0, 70.0), ("$1,200", 200.0, 240.0)]));
        spans.extend(row(670.0, &[("102", 50.0, 70.0), ("$950", 205.0, 235.0)]));

        let tables = detect_tables(&spans, &LayoutConfig::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(
            texts(&tables[0]),
            vec![
                vec![Some("Unit"), Some("Rent")],
                vec![Some("101"), Some("$1,200")],
                vec![Some("102"), Some("$950")],
            ]
        );
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut spans = Vec::new();
        spans.extend(row(670.0, &[("102", 50.0, 70.0), ("$950", 205.0, 235.0)]));
        spans.extend(row(700.0, &[("Rent", 200.0, 230.0), ("Unit", 50.0, 80.0)]));
        spans.extend(row(685.0, &[("$1,200", 200.0, 240.0), ("101", 50.0, 70.0)]));

        let tables = detect_tables(&spans, &LayoutConfig::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0][0].as_deref(), Some("Unit"));
        assert_eq!(tables[0].rows[2][1].as_deref(), Some("$950"));
    }

    #[test]
    fn paragraph_line_splits_tables() {
        let mut spans = Vec::new();
        spans.extend(row(700.0, &[("A", 50.0, 60.0), ("B", 200.0, 210.0)]));
        spans.extend(row(685.0, &[("1", 50.0, 60.0), ("2", 200.0, 210.0)]));
        spans.extend(row(650.0, &[("Some running paragraph text", 50.0, 300.0)]));
        spans.extend(row(600.0, &[("C", 50.0, 60.0), ("D", 200.0, 210.0)]));
        spans.extend(row(585.0, &[("3", 50.0, 60.0), ("4", 200.0, 210.0)]));
        spans.extend(row(570.0, &[("5", 50.0, 60.0), ("6", 200.0, 210.0)]));

        let tables = detect_tables(&spans, &LayoutConfig::default());
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].row_count(), 2);
        assert_eq!(tables[1].row_count(), 3);
        assert_eq!(tables[1].rows[0][0].as_deref(), Some("C"));
    }

    #[test]
    fn missing_cell_becomes_none() {
        let mut spans = Vec::new();
        spans.extend(row(
            700.0,
            &[
                ("Unit", 50.0, 80.0),
                ("Tenant", 120.0, 160.0),
                ("Rent", 200.0, 230.0),
            ],
        ));
        spans.extend(row(685.0, &[("101", 50.0, 70.0), ("$1,200", 200.0, 240.0)]));

        let tables = detect_tables(&spans, &LayoutConfig::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(texts(&tables[0])[1], vec![Some("101"), None, Some("$1,200")]);
    }

    #[test]
    fn close_runs_merge_into_one_cell() {
        let mut spans = Vec::new();
        spans.extend(row(
            700.0,
            &[
                ("Monthly", 50.0, 90.0),
                ("Rent", 93.0, 115.0),
                ("Unit", 200.0, 230.0),
            ],
        ));
        spans.extend(row(685.0, &[("$1,200", 50.0, 90.0), ("101", 200.0, 220.0)]));

        let tables = detect_tables(&spans, &LayoutConfig::default());
        assert_eq!(tables[0].rows[0][0].as_deref(), Some("Monthly Rent"));
        assert_eq!(tables[0].column_count(), 2);
    }

    #[test]
    fn single_row_is_not_a_table() {
        let spans = row(700.0, &[("A", 50.0, 60.0), ("B", 200.0, 210.0)]);
        assert!(detect_tables(&spans, &LayoutConfig::default()).is_empty());
    }

    #[test]
    fn blank_spans_are_ignored() {
        let mut spans = row(700.0, &[("   ", 50.0, 60.0), ("\n", 200.0, 210.0)]);
        spans.extend(row(685.0, &[("", 50.0, 60.0)]));
        assert!(detect_tables(&spans, &LayoutConfig::default()).is_empty());
        assert!(detect_tables(&[], &LayoutConfig::default()).is_empty());
    }
}
