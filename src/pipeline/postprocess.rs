//! Post-processing: turn a raw model reply into a validated [`RentRollSummary`].
//!
//! Even well-prompted models wrap JSON in ```` ```json ```` fences, prepend
//! a byte-order mark or leave line breaks inside cell values. These
//! deterministic rules repair those quirks without touching content, then
//! the reply must deserialise into the rent-roll shape or it is rejected.
//!
//! ## Rule Order
//!
//! 1. Strip invisible Unicode (BOM, zero-width spaces)
//! 2. Strip outer code fences
//! 3. Parse JSON; accept `{"rentRollSummary": [...]}` or a bare array of rows
//! 4. Normalise cells: collapse whitespace in keys and string values,
//!    lowercase type labels, force `currency` on values with a leading
//!    currency symbol, infer missing types

use crate::output::{has_currency_symbol, CellType, RentRollCell, RentRollSummary};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Parse and validate a model reply.
///
/// The error is a human-readable reason, fed back to the model on retry.
pub fn parse_rent_roll(reply: &str) -> Result<RentRollSummary, String> {
    let s = remove_invisible_chars(reply);
    let s = strip_code_fences(&s);
    let s = s.trim();
    if s.is_empty() {
        return Err("reply is empty".to_string());
    }

    let value: Value = serde_json::from_str(s).map_err(|e| format!("not valid JSON: {e}"))?;

    let mut summary = match value {
        Value::Object(_) => serde_json::from_value::<RentRollSummary>(value)
            .map_err(|e| format!("unexpected JSON shape: {e}"))?,
        Value::Array(_) => RentRollSummary {
            rent_roll_summary: serde_json::from_value(value)
                .map_err(|e| format!("unexpected JSON shape: {e}"))?,
            extra: Default::default(),
        },
        other => {
            return Err(format!(
                "expected a JSON object with rentRollSummary, got {}",
                json_kind(&other)
            ))
        }
    };

    normalise_cells(&mut summary);
    Ok(summary)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Rule 1: Strip invisible Unicode ─────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '\u{FEFF}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}'))
        .collect()
}

// ── Rule 2: Strip outer code fences ─────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?```\s*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 4: Normalise cells ─────────────────────────────────────────────────

static RE_WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_whitespace(s: &str) -> String {
    RE_WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

fn normalise_cells(summary: &mut RentRollSummary) {
    for cell in summary.rent_roll_summary.iter_mut().flatten() {
        normalise_cell(cell);
    }
}

fn normalise_cell(cell: &mut RentRollCell) {
    cell.key = collapse_whitespace(&cell.key);
    if let Value::String(s) = &cell.value {
        cell.value = Value::String(collapse_whitespace(s));
    }

    cell.kind = cell.kind.trim().to_lowercase();
    let is_currency = matches!(&cell.value, Value::String(s) if has_currency_symbol(s));
    if is_currency {
        cell.kind = CellType::Currency.as_str().to_string();
    } else if cell.kind.is_empty() {
        cell.kind = CellType::infer(&cell.value).as_str().to_string();
    }
}
