// PageSource: where schedule and result pages come from.
//
// The pipeline only ever sees page bodies as strings; parsing happens
// synchronously in the builders.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::error::ScrapeError;

#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the body of `url`.
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Live source backed by a shared reqwest client.
pub struct HttpPageSource {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpPageSource {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { http, timeout })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let request = async {
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|source| ScrapeError::Fetch {
                    url: url.to_string(),
                    source,
                })?;

            if let Some(err) = status_error(url, response.status()) {
                return Err(err);
            }

            let body = response
                .text()
                .await
                .map_err(|source| ScrapeError::Fetch {
                    url: url.to_string(),
                    source,
                })?;
            debug!(url, bytes = body.len(), "fetched page");
            Ok(body)
        };

        // The client timeout covers each request; this bounds the body read too.
        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(ScrapeError::SourceUnavailable {
                url: url.to_string(),
                reason: format!("timed out after {}s", self.timeout.as_secs()),
            }),
        }
    }
}

/// Map a non-success status to the error a pass understands. Throttling and
/// server trouble are retried; other refusals skip the page.
pub fn status_error(url: &str, status: StatusCode) -> Option<ScrapeError> {
    if status.is_success() {
        return None;
    }
    let url = url.to_string();
    let err = match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => ScrapeError::NotFound { url },
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            ScrapeError::SourceUnavailable {
                url,
                reason: format!("HTTP {status}"),
            }
        }
        s if s.is_server_error() => ScrapeError::SourceUnavailable {
            url,
            reason: format!("HTTP {status}"),
        },
        s => ScrapeError::Rejected {
            url,
            status: s.as_u16(),
        },
    };
    Some(err)
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Serves pages from memory. Used by tests and for replaying saved pages.
#[derive(Debug, Default)]
pub struct StaticPageSource {
    pages: HashMap<String, String>,
    down: HashSet<String>,
    statuses: HashMap<String, StatusCode>,
    requests: Mutex<Vec<String>>,
}

impl StaticPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(url, body);
        self
    }

    /// Add or replace a page.
    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<String>) {
        let url = url.into();
        self.down.remove(&url);
        self.statuses.remove(&url);
        self.pages.insert(url, body.into());
    }

    /// Make `url` answer as a server returning `status` would.
    pub fn respond_with(&mut self, url: impl Into<String>, status: StatusCode) {
        self.statuses.insert(url.into(), status);
    }

    /// Make `url` answer with SourceUnavailable until it is inserted again.
    pub fn take_down(&mut self, url: impl Into<String>) {
        self.down.insert(url.into());
    }

    /// How many times `url` has been requested.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .map(|r| r.iter().filter(|u| u.as_str() == url).count())
            .unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl PageSource for StaticPageSource {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        if self.down.contains(url) {
            return Err(ScrapeError::SourceUnavailable {
                url: url.to_string(),
                reason: "offline".into(),
            });
        }
        if let Some(err) = self.statuses.get(url).and_then(|s| status_error(url, *s)) {
            return Err(err);
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::NotFound {
                url: url.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_source_serves_and_counts() {
        let mut source = StaticPageSource::new().with_page("https://a.example/1", "<p>hi</p>");
        assert_eq!(source.fetch("https://a.example/1").await.unwrap(), "<p>hi</p>");
        assert!(matches!(
            source.fetch("https://a.example/2").await,
            Err(ScrapeError::NotFound { .. })
        ));

        source.take_down("https://a.example/1");
        let err = source.fetch("https://a.example/1").await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(source.request_count("https://a.example/1"), 2);
        assert_eq!(source.total_requests(), 3);
    }

    #[test]
    fn status_codes_map_to_pass_behavior() {
        let url = "https://league.example/r/1";
        assert!(status_error(url, StatusCode::OK).is_none());
        for code in [
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::REQUEST_TIMEOUT,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let err = status_error(url, code).unwrap();
            assert!(err.is_transient(), "{code} should be retried");
        }
        assert!(matches!(
            status_error(url, StatusCode::NOT_FOUND),
            Some(ScrapeError::NotFound { .. })
        ));
        let refused = status_error(url, StatusCode::FORBIDDEN).unwrap();
        assert!(matches!(refused, ScrapeError::Rejected { status: 403, .. }));
        assert!(!refused.is_transient());
        assert!(refused.is_skippable());
    }
}
