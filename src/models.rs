//! Data models for scraped output.
//!
//! - [`Heading`]: one `h1`..`h6` element pulled from a fetched page
//! - [`ImageItem`]: the single record the image spider yields per page
//! - [`BrowserText`]: the text the browser waited for

use serde::{Deserialize, Serialize};

/// A heading element and its text content.
///
/// `text` is every descendant text node concatenated as-is. Nothing is
/// trimmed or joined with separators, so `<h2>Foo<span>[edit]</span></h2>`
/// becomes `"Foo[edit]"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Heading {
    /// Heading level, `1` for `h1` and so on.
    pub level: u8,
    /// Raw text content of the element.
    pub text: String,
}

/// The record yielded by the image spider for one downloaded page.
///
/// Serializes as `{"image_urls": [...]}`, with the URLs in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageItem {
    pub image_urls: Vec<String>,
}

/// Result of waiting for an element in a live browser page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BrowserText {
    /// The page the browser navigated to.
    pub url: String,
    /// The selector that was waited on.
    pub selector: String,
    /// Rendered text of the first matching element.
    pub text: String,
}
