//! Helpers shared by the scrapers: the HTTP client, body decoding, log
//! previews and output paths.

use crate::error::Result;
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use reqwest::header::CONTENT_TYPE;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, instrument};

/// Build the HTTP client used by the `headings` and `spider` commands.
///
/// Redirects follow reqwest's default policy. There is no retry layer: a
/// failed request is returned to the caller as-is.
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()?;
    debug!(user_agent, ?timeout, "Built HTTP client");
    Ok(client)
}

/// How far into the document to look for a `<meta>` charset declaration.
const META_PRESCAN_BYTES: usize = 4096;

/// Matches both `<meta charset="x">` and
/// `<meta http-equiv="Content-Type" content="text/html; charset=x">`.
static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i-u)<meta\b[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
        .expect("meta charset pattern is valid")
});

/// Charset named by a `Content-Type` header value, if any.
pub fn header_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
    })
}

/// Charset declared by a `<meta>` tag near the start of the document.
pub fn meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(META_PRESCAN_BYTES)];
    let label = META_CHARSET.captures(head)?.get(1)?;
    Encoding::for_label(label.as_bytes())
}

/// Decode an HTML body to text.
///
/// The encoding is picked in this order: a byte-order mark, the charset in
/// the `Content-Type` header, a `<meta>` declaration in the markup, then
/// UTF-8. Malformed sequences become U+FFFD rather than failing.
///
/// # Arguments
///
/// * `body` - Raw response bytes
/// * `content_type` - The response's `Content-Type` header, if present
///
/// # Returns
///
/// The decoded document text.
///
/// # Examples
///
/// ```ignore
/// let text = decode_html(b"<meta charset=\"windows-1252\">Caf\xe9", Some("text/html"));
/// assert!(text.ends_with("Café"));
/// ```
pub fn decode_html(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(header_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| meta_charset(body))
        .unwrap_or(UTF_8);
    let (text, used, had_errors) = encoding.decode(body);
    debug!(encoding = used.name(), had_errors, "Decoded body");
    text.into_owned()
}

/// Decode a reqwest response body with [`decode_html`].
pub async fn response_text(response: reqwest::Response) -> Result<String> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().await?;
    Ok(decode_html(&bytes, content_type.as_deref()))
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (backing off to a char
/// boundary) with `"…(+N bytes)"` appended.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Create the parent directory of `path` if it has one and it is missing.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.ends_with("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte_boundary() {
        // 'é' is two bytes; cutting at 1 must back off to 0
        let result = truncate_for_log("éé", 1);
        assert_eq!(result, "…(+4 bytes)");
    }

    #[test]
    fn test_header_charset() {
        assert_eq!(header_charset("text/html; charset=ISO-8859-1"), Some("ISO-8859-1"));
        assert_eq!(header_charset("text/html;Charset=\"utf-8\""), Some("utf-8"));
        assert_eq!(header_charset("text/html"), None);
    }

    #[test]
    fn test_meta_charset_forms() {
        let short = b"<html><head><meta charset=\"windows-1252\"></head>";
        assert_eq!(meta_charset(short), Some(encoding_rs::WINDOWS_1252));

        let http_equiv = b"<META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=shift_jis\">";
        assert_eq!(meta_charset(http_equiv), Some(encoding_rs::SHIFT_JIS));

        assert_eq!(meta_charset(b"<meta name=\"viewport\">"), None);
    }

    #[test]
    fn test_decode_html_uses_meta_when_header_is_silent() {
        let body = b"<meta charset=\"windows-1252\"><h1>Caf\xe9</h1>";
        let text = decode_html(body, Some("text/html"));
        assert!(text.contains("Café"));
    }

    #[test]
    fn test_decode_html_header_wins_over_meta() {
        let body = b"<meta charset=\"utf-8\"><h1>Caf\xe9</h1>";
        let text = decode_html(body, Some("text/html; charset=iso-8859-1"));
        assert!(text.contains("Café"));
    }

    #[test]
    fn test_decode_html_defaults_to_utf8() {
        let text = decode_html("<h1>Café</h1>".as_bytes(), None);
        assert_eq!(text, "<h1>Café</h1>");
    }

    #[test]
    fn test_build_client() {
        assert!(build_client("page_scrape/test", Duration::from_secs(5)).is_ok());
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/feed.json");
        ensure_parent_dir(&target).await.unwrap();
        assert!(dir.path().join("a/b").is_dir());
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_bare_filename() {
        ensure_parent_dir(Path::new("feed.json")).await.unwrap();
    }
}
