use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{LedgerError, Result};
use crate::models::{parse_date, Record, TxnType};

pub const HEADER: [&str; 7] = [
    "id",
    "date",
    "category",
    "description",
    "amount",
    "type",
    "created_at",
];

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: Option<i64>,
    date: String,
    category: &'a str,
    description: &'a str,
    amount: String,
    #[serde(rename = "type")]
    kind: &'static str,
    created_at: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImportRow {
    #[serde(default)]
    id: Option<i64>,
    date: String,
    category: String,
    description: String,
    amount: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    created_at: Option<String>,
}

/// Header row plus one row per record. Dates are `YYYY-MM-DD`, amounts plain decimals.
pub fn to_delimited_text(records: &[Record]) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(HEADER)?;
    for r in records {
        wtr.serialize(ExportRow {
            id: r.id,
            date: r.date.format("%Y-%m-%d").to_string(),
            category: &r.category,
            description: &r.description,
            amount: r.amount.to_string(),
            kind: r.kind.as_str(),
            created_at: &r.created_at,
        })?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| LedgerError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| LedgerError::corrupt("export", e.to_string()))
}

/// Parse text produced by [`to_delimited_text`]. `id` and `created_at` columns
/// are optional; every row must describe a valid record.
pub fn from_delimited_text(text: &str) -> Result<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for (i, row) in rdr.deserialize::<ImportRow>().enumerate() {
        // header is line 1
        let line = i + 2;
        let row = row?;
        let record = Record {
            id: row.id,
            date: parse_date(&row.date).map_err(|e| at_line(line, e))?,
            category: row.category,
            description: row.description,
            amount: parse_decimal(&row.amount).map_err(|e| at_line(line, e))?,
            kind: TxnType::parse(&row.kind).map_err(|e| at_line(line, e))?,
            created_at: row.created_at.unwrap_or_default(),
        };
        record.validate().map_err(|e| at_line(line, e))?;
        records.push(record);
    }
    Ok(records)
}

fn at_line(line: usize, err: LedgerError) -> LedgerError {
    match err {
        LedgerError::Validation { field, reason } => LedgerError::Validation {
            field,
            reason: format!("line {line}: {reason}"),
        },
        other => other,
    }
}

/// Accepts "$1,234.50" style amounts from spreadsheet round-trips.
fn parse_decimal(s: &str) -> Result<Decimal> {
    let cleaned = s.replace(['$', ','], "");
    let cleaned = cleaned.trim();
    Decimal::from_str(cleaned)
        .map_err(|_| LedgerError::validation("amount", format!("'{s}' is not a number")))
}

#[cfg(test)]
#[path = "delimited_tests.rs"]
mod tests;
