//! Loading the item list for a run from a file
//!
//! Supported inputs, picked by extension and content:
//! - `search.json` style object (`baseUrl`, `soldParams`, `liveParams`, `cars`/`items`/`car`)
//! - JSON array of strings
//! - JSON array of vehicles `{ "year", "make", "model" }`
//! - CSV with `Year`, `Make`, `Model` columns, or an `Item` column
//! - plain text, one item per line

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::path::Path;
use tracing::info;

use crate::domain::search::SearchConfig;

/// Items plus any search URL overrides the file carried
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchInput {
    pub items: Vec<String>,
    pub base_url: Option<String>,
    pub sold_query_params: Option<String>,
    pub live_query_params: Option<String>,
}

impl SearchInput {
    pub fn from_items(items: Vec<String>) -> Self {
        Self { items: clean_items(items), ..Self::default() }
    }

    /// Apply overrides and items on top of a config built from app settings
    pub fn apply_to(self, config: &mut SearchConfig) {
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(sold) = self.sold_query_params {
            config.sold_query_params = sold;
        }
        if let Some(live) = self.live_query_params {
            config.live_query_params = live;
        }
        config.items = self.items;
    }
}

/// Trim items and drop blanks, keeping order
fn clean_items<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `"year make model"` from a vehicle record, skipping missing parts
fn vehicle_name(fields: [Option<String>; 3]) -> String {
    fields
        .into_iter()
        .flatten()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn item_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Object(obj) => {
            let field = |key: &str| obj.get(key).and_then(value_text);
            Some(vehicle_name([field("year"), field("make"), field("model")]))
        }
        other => value_text(other),
    }
}

fn items_from_array(values: &[Value]) -> Vec<String> {
    clean_items(values.iter().filter_map(item_from_value))
}

fn optional_string(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| obj.get(*key).and_then(Value::as_str).map(str::to_string))
}

/// Parse JSON input text
pub fn parse_json_input(content: &str) -> Result<SearchInput> {
    let value: Value = serde_json::from_str(content).context("Items file is not valid JSON")?;

    match value {
        Value::Array(values) => Ok(SearchInput::from_items(items_from_array(&values))),
        Value::Object(obj) => {
            let items = match ["items", "cars"].iter().find_map(|key| obj.get(*key)) {
                Some(Value::Array(values)) => items_from_array(values),
                Some(other) => clean_items(item_from_value(other)),
                None => clean_items(optional_string(&obj, &["car", "item"])),
            };

            Ok(SearchInput {
                items,
                base_url: optional_string(&obj, &["baseUrl", "base_url"]),
                sold_query_params: optional_string(&obj, &["soldParams", "soldQueryParams", "sold_query_params"]),
                live_query_params: optional_string(&obj, &["liveParams", "liveQueryParams", "live_query_params"]),
            })
        }
        _ => bail!("Items JSON must be an array or an object"),
    }
}

/// Parse CSV input text with a header row
pub fn parse_csv_input(content: &str) -> Result<SearchInput> {
    let content = content.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_reader(content.as_bytes());

    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let (year, make, model, item) = (column("year"), column("make"), column("model"), column("item"));
    if item.is_none() && make.is_none() && model.is_none() {
        bail!("CSV needs an Item column or Year/Make/Model columns");
    }

    let mut items = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to read CSV record")?;
        let cell = |index: Option<usize>| index.and_then(|i| record.get(i)).map(str::to_string);

        let name = match item {
            Some(index) => cell(Some(index)).unwrap_or_default(),
            None => vehicle_name([cell(year), cell(make), cell(model)]),
        };
        items.push(name);
    }

    Ok(SearchInput::from_items(items))
}

/// Parse one item per line
pub fn parse_text_input(content: &str) -> SearchInput {
    SearchInput::from_items(content.lines().map(str::to_string).collect())
}

/// Load a search input file, choosing the parser from the extension
pub async fn load_search_input(path: &Path) -> Result<SearchInput> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read items file {:?}", path))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let input = match extension.as_str() {
        "json" => parse_json_input(&content)?,
        "csv" => parse_csv_input(&content)?,
        _ => parse_text_input(&content),
    };

    info!("📋 Loaded {} items from {:?}", input.items.len(), path);
    Ok(input)
}
