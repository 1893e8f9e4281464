//! Output writers for scraped items.
//!
//! - [`json`]: JSON lines for stdout and JSON array feed files
//!
//! ```text
//! feeds/
//! └── myspider_2025-05-06.json   # when --output names a directory
//! ```

pub mod json;
