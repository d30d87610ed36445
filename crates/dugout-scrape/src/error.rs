// Errors raised while fetching and parsing league pages.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The page could not be served right now (unreachable, 5xx, timed out,
    /// or flagged under maintenance). Safe to retry later.
    #[error("source unavailable: {url}: {reason}")]
    SourceUnavailable { url: String, reason: String },

    /// The page was served but does not have the expected structure.
    #[error("unexpected page format at {url} while reading {stage}")]
    PageFormat { url: String, stage: String },

    /// A result page for a final game lacks a required section.
    #[error("result page {url} is missing its {section} section")]
    MissingSection { url: String, section: String },

    #[error("page not found: {url}")]
    NotFound { url: String },

    /// The server refused the request outright (403, 401, ...). Retrying
    /// will not help, but the rest of the season can still be read.
    #[error("request for {url} refused with HTTP {status}")]
    Rejected { url: String, status: u16 },

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        source: reqwest::Error,
    },

    #[error("invalid selector `{css}`: {message}")]
    InvalidSelector { css: String, message: String },
}

impl ScrapeError {
    pub(crate) fn page_format(url: &str, stage: impl Into<String>) -> Self {
        ScrapeError::PageFormat {
            url: url.to_string(),
            stage: stage.into(),
        }
    }

    pub(crate) fn missing(url: &str, section: impl Into<String>) -> Self {
        ScrapeError::MissingSection {
            url: url.to_string(),
            section: section.into(),
        }
    }

    /// Whether another attempt could succeed without anyone changing the
    /// parser.
    pub fn is_transient(&self) -> bool {
        match self {
            ScrapeError::SourceUnavailable { .. } => true,
            ScrapeError::Fetch { source, .. } => {
                source.is_timeout()
                    || source.is_connect()
                    || source.status().is_some_and(|s| s.is_server_error())
            }
            _ => false,
        }
    }

    /// Whether a pass should skip the league or game this error came from
    /// rather than abort.
    pub fn is_skippable(&self) -> bool {
        self.is_transient()
            || matches!(
                self,
                ScrapeError::NotFound { .. } | ScrapeError::Rejected { .. }
            )
    }
}
