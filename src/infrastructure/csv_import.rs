//! Reading exported history spreadsheets back in
//!
//! Expects the export layout: `Search Term`, `Sell Through Rate` (`NN%` or
//! `NN`) and `Sold Count` columns. Unusable rows are collected with their line
//! number instead of failing the file.

use std::path::Path;
use thiserror::Error;

use crate::domain::count::parse_count;
use crate::domain::search::SearchTerm;
use crate::infrastructure::csv_export::EXPORT_HEADERS;

/// One usable spreadsheet row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub line: u64,
    pub search_term: SearchTerm,
    pub sell_through_percentage: u32,
    pub sold_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryCsv {
    pub rows: Vec<SummaryRow>,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("missing required columns {missing:?} (found {found:?})")]
    MissingColumns { missing: Vec<String>, found: Vec<String> },

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("import I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

fn parse_rate(raw: &str) -> Option<u32> {
    raw.trim().trim_end_matches('%').trim().parse().ok()
}

/// Parse exported CSV text
pub fn parse_history_csv(content: &str) -> Result<SummaryCsv, ImportError> {
    let content = content.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let [term_header, rate_header, sold_header] = EXPORT_HEADERS;
    let (Some(term_col), Some(rate_col), Some(sold_col)) = (column(term_header), column(rate_header), column(sold_header))
    else {
        return Err(ImportError::MissingColumns {
            missing: EXPORT_HEADERS
                .iter()
                .filter(|name| column(*name).is_none())
                .map(|name| (*name).to_string())
                .collect(),
            found: headers.iter().map(str::to_string).collect(),
        });
    };

    let mut parsed = SummaryCsv::default();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);
        let cell = |index: usize| record.get(index).unwrap_or_default();

        let term = cell(term_col);
        if term.is_empty() {
            parsed.rejected.push(RejectedRow { line, reason: "empty search term".to_string() });
            continue;
        }

        match (parse_rate(cell(rate_col)), parse_count(cell(sold_col))) {
            (Some(sell_through_percentage), Ok(sold_count)) => parsed.rows.push(SummaryRow {
                line,
                search_term: SearchTerm::from(term),
                sell_through_percentage,
                sold_count,
            }),
            _ => parsed.rejected.push(RejectedRow { line, reason: format!("invalid number in '{term}'") }),
        }
    }

    Ok(parsed)
}

pub async fn read_history_csv(path: &Path) -> Result<SummaryCsv, ImportError> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_history_csv(&content)
}
