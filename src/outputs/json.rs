//! JSON output for spider items.
//!
//! Items go to stdout as JSON lines. A feed file, when requested, holds the
//! same items as one pretty-printed JSON array.

use crate::error::Result;
use crate::utils::ensure_parent_dir;
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Serialize each item as one compact JSON object per line.
pub fn to_json_lines<T: Serialize>(items: &[T]) -> Result<String> {
    let mut out = String::new();
    for item in items {
        out.push_str(&serde_json::to_string(item)?);
        out.push('\n');
    }
    Ok(out)
}

/// Resolve where the feed goes.
///
/// An existing directory, or a path written with a trailing separator, gets
/// a dated file name: `{dir}/{spider}_{YYYY-MM-DD}.json`.
pub async fn feed_path(output: &Path, spider_name: &str) -> PathBuf {
    let is_dir = fs::metadata(output).await.is_ok_and(|m| m.is_dir());
    let looks_like_dir = is_dir
        || output
            .as_os_str()
            .to_string_lossy()
            .ends_with(std::path::MAIN_SEPARATOR);
    if looks_like_dir {
        let date = Local::now().date_naive();
        output.join(format!("{spider_name}_{date}.json"))
    } else {
        output.to_path_buf()
    }
}

/// Write `items` as a JSON array to `path`, creating parent directories.
///
/// # Arguments
///
/// * `items` - Items to serialize, written in the given order
/// * `path` - Destination file; an existing file is overwritten
///
/// # Returns
///
/// `Ok(())` on success, or an error if serialization, directory creation or
/// the write fails.
///
/// # Examples
///
/// ```ignore
/// let path = feed_path(Path::new("./feeds/"), "myspider").await;
/// write_feed(&outcome.items, &path).await?;
/// ```
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_feed<T: Serialize>(items: &[T], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(items)?;
    ensure_parent_dir(path).await?;
    fs::write(path, json).await?;
    info!(count = items.len(), "Wrote JSON feed");
    Ok(())
}
