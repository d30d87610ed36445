// Small helpers over scraper's element API shared by the page parsers.

use chrono::NaiveDate;
use scraper::{ElementRef, Selector};

use crate::decode::clean_text;
use crate::error::ScrapeError;

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%a %m/%d/%Y", "%b %d, %Y"];

pub(crate) fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::InvalidSelector {
        css: css.to_string(),
        message: e.to_string(),
    })
}

/// All text under `el`, cleaned.
pub(crate) fn text_of(el: &ElementRef) -> String {
    clean_text(&el.text().collect::<String>())
}

pub(crate) fn has_class(el: &ElementRef, class: &str) -> bool {
    el.value().classes().any(|c| c.eq_ignore_ascii_case(class))
}

/// A counting-stat cell. Blank and dash cells count as zero.
pub(crate) fn parse_count(url: &str, stage: &str, text: &str) -> Result<u32, ScrapeError> {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return Ok(0);
    }
    text.parse()
        .map_err(|_| ScrapeError::page_format(url, format!("{stage} (`{text}` is not a count)")))
}

pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}
