//! CSV export of the search history
//!
//! Spreadsheet-friendly output: UTF-8 BOM, every field quoted, `\n` line
//! endings, the rate rendered as `NN%`.

use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::domain::history::HistoryCollection;

pub const EXPORT_HEADERS: [&str; 3] = ["Search Term", "Sell Through Rate", "Sold Count"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No data to download")]
    NoData,

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("export I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Write the history as CSV rows in history order
pub fn write_history_csv<W: Write>(history: &HistoryCollection, mut out: W) -> Result<(), ExportError> {
    if history.is_empty() {
        return Err(ExportError::NoData);
    }

    out.write_all(UTF8_BOM)?;

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    writer.write_record(EXPORT_HEADERS)?;
    for result in history {
        let rate = format!("{}%", result.sell_through_percentage);
        let sold = result.sold_count.to_string();
        writer.write_record([result.search_term.as_str(), rate.as_str(), sold.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Render the export into a string
pub fn history_csv_string(history: &HistoryCollection) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_history_csv(history, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Write the export to a file, creating parent directories; returns rows written
pub async fn export_history_to_file(history: &HistoryCollection, path: &Path) -> Result<usize, ExportError> {
    let content = {
        let mut buffer = Vec::new();
        write_history_csv(history, &mut buffer)?;
        buffer
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;

    tracing::info!("📄 Exported {} rows to {:?}", history.len(), path);
    Ok(history.len())
}
