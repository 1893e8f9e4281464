//! Error type shared by every scraper.
//!
//! None of the scrapers retry or recover: each variant here is fatal for the
//! command that produced it and ends up as a non-zero exit from `main`.

use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong while fetching, parsing or driving a page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Transport or body-decoding failure from the HTTP client.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A CSS selector that `scraper` refused to parse.
    #[error("invalid css selector `{0}`")]
    Selector(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The browser never rendered a matching element within the wait bound.
    #[error("timed out after {waited:?} waiting for `{selector}`")]
    Timeout { selector: String, waited: Duration },

    /// Navigation did not finish loading within the page-load bound.
    #[error("timed out after {waited:?} loading {url}")]
    PageLoadTimeout { url: String, waited: Duration },

    /// Launch, navigation or CDP failure inside the browser driver.
    #[error("browser error: {0}")]
    Browser(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<chromiumoxide::error::CdpError> for ScrapeError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        ScrapeError::Browser(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
