//! Reviewing, exporting and pruning stored history

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::warn;

use crate::commands::AppContext;
use crate::domain::history::HistoryStats;
use crate::domain::search::{SearchResult, SearchTerm};
use crate::infrastructure::csv_export::export_history_to_file;
use crate::infrastructure::csv_import::read_history_csv;

/// Stored history, highest sell-through first
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReport {
    pub stats: HistoryStats,
    pub ranked: Vec<SearchResult>,
}

pub async fn history_report(ctx: &AppContext) -> Result<HistoryReport> {
    let history = ctx.history_store()?.load().await?;
    Ok(HistoryReport { stats: history.stats(), ranked: history.sorted_by_sell_through_desc() })
}

/// Plain-text table of a report
pub fn format_report(report: &HistoryReport) -> String {
    let mut out = String::new();

    if report.ranked.is_empty() {
        out.push_str("No search history yet\n");
        return out;
    }

    let width = report
        .ranked
        .iter()
        .map(|r| r.search_term.as_str().chars().count())
        .max()
        .unwrap_or(0)
        .max("Search Term".len());

    let _ = writeln!(out, "{:<width$}  {:>6}  {:>8}  {:>8}", "Search Term", "Rate", "Sold", "Live");
    for result in &report.ranked {
        let _ = writeln!(
            out,
            "{:<width$}  {:>5}%  {:>8}  {:>8}",
            result.search_term.as_str(),
            result.sell_through_percentage,
            result.sold_count,
            result.live_count
        );
    }

    if let Some(average) = report.stats.average_percentage {
        let _ = writeln!(out, "\nAverage sell-through: {}% over {} searches", average, report.stats.entries);
    }
    out
}

/// Export to `output`, or the configured default path; returns the path written
pub async fn export_history(ctx: &AppContext, output: Option<PathBuf>) -> Result<PathBuf> {
    let history = ctx.history_store()?.load().await?;
    let path = match output {
        Some(path) => path,
        None => ctx.config.storage.default_export_path()?,
    };
    export_history_to_file(&history, &path).await?;
    Ok(path)
}

/// Outcome of importing one CSV file
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileImport {
    pub path: PathBuf,
    pub added: usize,
    pub duplicates: usize,
    pub rejected: usize,
    /// Set when the file could not be read at all
    pub error: Option<String>,
}

/// Merge exported CSV files into the history. Terms already stored, or seen
/// earlier in the import, are skipped; an unreadable file is reported and the
/// rest still imported.
pub async fn import_history(ctx: &AppContext, paths: &[PathBuf]) -> Result<Vec<FileImport>> {
    let store = ctx.history_store()?;
    let mut imports = Vec::with_capacity(paths.len());

    for path in paths {
        let parsed = match read_history_csv(path).await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("⚠️  Skipping {:?}: {}", path, e);
                imports.push(FileImport { path: path.clone(), error: Some(e.to_string()), ..FileImport::default() });
                continue;
            }
        };

        for rejected in &parsed.rejected {
            warn!("⚠️  {:?} line {}: {}", path, rejected.line, rejected.reason);
        }

        let now = Utc::now();
        let results = parsed
            .rows
            .into_iter()
            .map(|row| SearchResult::from_summary(row.search_term, row.sell_through_percentage, row.sold_count, now))
            .collect();
        let counts = store.add_new(results).await?;

        imports.push(FileImport {
            path: path.clone(),
            added: counts.added,
            duplicates: counts.duplicates,
            rejected: parsed.rejected.len(),
            error: None,
        });
    }

    Ok(imports)
}

/// One line per imported file
pub fn format_imports(imports: &[FileImport]) -> String {
    let mut out = String::new();
    for import in imports {
        let _ = match &import.error {
            Some(error) => writeln!(out, "{}: skipped ({})", import.path.display(), error),
            None => writeln!(
                out,
                "{}: added {}, duplicates {}, invalid rows {}",
                import.path.display(),
                import.added,
                import.duplicates,
                import.rejected
            ),
        };
    }
    out
}

pub async fn remove_entry(ctx: &AppContext, search_term: &str) -> Result<bool> {
    ctx.history_store()?.remove(&SearchTerm::from(search_term)).await
}

pub async fn clear_history(ctx: &AppContext) -> Result<()> {
    ctx.history_store()?.clear().await
}
