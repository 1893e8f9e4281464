//! Page scrapers.
//!
//! Each scraper is a short, linear fetch-select-emit procedure. They share
//! the HTTP client and error type but nothing else.
//!
//! | Command | Module | Method | Output |
//! |---------|--------|--------|--------|
//! | `headings` | [`headings`] | HTTP + HTML parsing | heading text, one per line |
//! | `spider` | [`spider`] | HTTP + spider callback | `{"image_urls": [...]}` per page |
//! | `browser` | [`browser`] | headless Chromium via CDP | first heading's rendered text |
//!
//! None of them retry, and the HTTP scrapers do not follow links.

pub mod browser;
pub mod headings;
pub mod spider;
