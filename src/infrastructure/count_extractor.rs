//! HTML count extraction with `scraper`

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::domain::count::{CountExtractor, ExtractionMiss, ExtractionResult, normalize_count_text};

/// Configured count selector that is not valid CSS
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid count selector '{selector}': {reason}")]
pub struct InvalidCountSelector {
    pub selector: String,
    pub reason: String,
}

/// Reads the text of the first child element of the first element matching a
/// heading selector, e.g. `<h1 class="srp-controls__count-heading"><span>1,234</span> results</h1>`.
#[derive(Debug, Clone)]
pub struct HeadingCountExtractor {
    selector: Selector,
}

impl HeadingCountExtractor {
    pub fn try_new(selector: &str) -> Result<Self, InvalidCountSelector> {
        Selector::parse(selector).map(|parsed| Self { selector: parsed }).map_err(|e| InvalidCountSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })
    }
}

impl CountExtractor for HeadingCountExtractor {
    fn extract(&self, page_html: &str) -> ExtractionResult {
        let document = Html::parse_document(page_html);

        let heading = document.select(&self.selector).next().ok_or(ExtractionMiss::HeadingNotFound)?;

        let first_child = heading
            .children()
            .find_map(ElementRef::wrap)
            .ok_or(ExtractionMiss::FirstChildNotFound)?;

        let text: String = first_child.text().collect();
        Ok(normalize_count_text(&text))
    }
}
