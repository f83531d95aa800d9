//! Search configuration, search terms and per-search results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default query key the search phrase is bound to
pub const DEFAULT_KEYWORD_PARAM: &str = "_nkw";

fn default_keyword_param() -> String {
    DEFAULT_KEYWORD_PARAM.to_string()
}

/// Where and what to search for during one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    /// Search page URL, e.g. `https://www.ebay.com/sch/i.html?`
    pub base_url: String,

    /// Query parameters selecting completed/sold listings
    #[serde(alias = "soldParams")]
    pub sold_query_params: String,

    /// Query parameters selecting live listings
    #[serde(alias = "liveParams")]
    pub live_query_params: String,

    /// Query key for the URL-encoded search phrase
    #[serde(default = "default_keyword_param")]
    pub keyword_param: String,

    /// Items searched in order, one search term each
    #[serde(default, alias = "cars")]
    pub items: Vec<String>,
}

impl SearchConfig {
    pub fn new(
        base_url: impl Into<String>,
        sold_query_params: impl Into<String>,
        live_query_params: impl Into<String>,
        items: Vec<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            sold_query_params: sold_query_params.into(),
            live_query_params: live_query_params.into(),
            keyword_param: default_keyword_param(),
            items,
        }
    }

    /// URL of the sold-listings page for a search term
    pub fn sold_url(&self, term: &SearchTerm) -> String {
        self.search_url(term, &self.sold_query_params)
    }

    /// URL of the live-listings page for a search term
    pub fn live_url(&self, term: &SearchTerm) -> String {
        self.search_url(term, &self.live_query_params)
    }

    fn search_url(&self, term: &SearchTerm, params: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(term.as_str().as_bytes()).collect();

        let separator = if self.base_url.ends_with('?') || self.base_url.ends_with('&') {
            ""
        } else if self.base_url.contains('?') {
            "&"
        } else {
            "?"
        };

        let params = params.trim_start_matches(['&', '?']);
        if params.is_empty() {
            format!("{}{}{}={}", self.base_url, separator, self.keyword_param, encoded)
        } else {
            format!("{}{}{}={}&{}", self.base_url, separator, self.keyword_param, encoded, params)
        }
    }
}

/// `item + " " + qualifier`; the key results are deduplicated on
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchTerm(String);

impl SearchTerm {
    pub fn new(item: &str, qualifier: &str) -> Self {
        Self(format!("{item} {qualifier}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SearchTerm {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Sold listings as a rounded percentage of live listings.
///
/// Zero when there are no live listings. Not capped, so more sold than live
/// listings yields a value above 100. Rounds half up without floating point.
pub fn sell_through_percentage(sold_count: u64, live_count: u64) -> u32 {
    if live_count == 0 {
        return 0;
    }
    let sold = u128::from(sold_count);
    let live = u128::from(live_count);
    let rounded = (200 * sold + live) / (2 * live);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Sold/live counts for one search term at one point in time.
///
/// Rows that only carry `searchTerm`, `percentage` and `soldCount` (imported
/// spreadsheets) leave the item, qualifier, live count and timestamp empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default, alias = "car")]
    pub item: String,

    #[serde(default, alias = "part")]
    pub qualifier: String,

    pub search_term: SearchTerm,

    #[serde(alias = "percentage")]
    pub sell_through_percentage: u32,

    pub sold_count: u64,

    #[serde(default)]
    pub live_count: u64,

    #[serde(default)]
    pub timestamp: DateTime<Utc>,
}

impl SearchResult {
    /// Build a result; the search term and percentage are derived
    pub fn new(item: &str, qualifier: &str, sold_count: u64, live_count: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            item: item.to_string(),
            qualifier: qualifier.to_string(),
            search_term: SearchTerm::new(item, qualifier),
            sell_through_percentage: sell_through_percentage(sold_count, live_count),
            sold_count,
            live_count,
            timestamp,
        }
    }

    /// Result known only by its term, rate and sold count
    pub fn from_summary(
        search_term: SearchTerm,
        sell_through_percentage: u32,
        sold_count: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            item: String::new(),
            qualifier: String::new(),
            search_term,
            sell_through_percentage,
            sold_count,
            live_count: 0,
            timestamp,
        }
    }

    /// Same search outcome, ignoring when it was recorded
    pub fn same_counts_as(&self, other: &Self) -> bool {
        self.search_term == other.search_term
            && self.item == other.item
            && self.qualifier == other.qualifier
            && self.sold_count == other.sold_count
            && self.live_count == other.live_count
            && self.sell_through_percentage == other.sell_through_percentage
    }
}
