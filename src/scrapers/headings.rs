//! Heading extraction over plain HTTP.
//!
//! Fetches one page, parses it with `scraper` and collects every heading
//! element of the configured levels (`h1`-`h3` by default) in document
//! order.

use crate::cli::OutputFormat;
use crate::error::{Result, ScrapeError};
use crate::models::Heading;
use crate::utils::{response_text, truncate_for_log};
use itertools::Itertools;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};

/// Build the grouped selector for the given levels, e.g. `"h1, h2, h3"`.
pub fn heading_selector(levels: &[u8]) -> String {
    levels.iter().map(|l| format!("h{l}")).join(", ")
}

/// Extract headings from an HTML document.
///
/// Elements are returned in document order regardless of level, so an `h3`
/// that precedes an `h1` in the markup comes first.
pub fn extract_headings(html: &str, levels: &[u8]) -> Result<Vec<Heading>> {
    let css = heading_selector(levels);
    let selector = Selector::parse(&css).map_err(|_| ScrapeError::Selector(css.clone()))?;
    let document = Html::parse_document(html);

    let headings = document
        .select(&selector)
        .filter_map(|element| {
            let level = element.value().name().strip_prefix('h')?.parse::<u8>().ok()?;
            Some(Heading {
                level,
                text: element.text().collect::<String>(),
            })
        })
        .collect::<Vec<_>>();

    Ok(headings)
}

/// Fetch `url` and extract its headings.
///
/// The response status is not checked: an error page is parsed like any
/// other body. The body is decoded from bytes, honouring the header charset
/// first and a `<meta>` charset second (see [`crate::utils::decode_html`]).
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `url` - Page to fetch
/// * `levels` - Heading levels to keep, e.g. `[1, 2, 3]`
///
/// # Returns
///
/// The headings in document order, or an error if the request fails.
///
/// # Examples
///
/// ```ignore
/// let headings = scrape_headings(&client, "https://en.wikipedia.org/wiki/Website", &[1, 2, 3]).await?;
/// ```
#[instrument(level = "info", skip(client, levels))]
pub async fn scrape_headings(client: &Client, url: &str, levels: &[u8]) -> Result<Vec<Heading>> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        warn!(%status, "Non-success status; parsing body anyway");
    }

    let body = response_text(response).await?;
    debug!(bytes = body.len(), preview = %truncate_for_log(&body, 200), "Fetched page");

    let headings = extract_headings(&body, levels)?;
    for heading in &headings {
        debug!(level = heading.level, text = %heading.text.trim(), "Heading");
    }
    info!(count = headings.len(), "Extracted headings");
    Ok(headings)
}

/// Render headings for stdout.
///
/// `Text` puts each heading's raw text on its own line; `Json` is a pretty
/// JSON array of `{level, text}` objects followed by a newline.
pub fn render_headings(headings: &[Heading], format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Text => {
            for heading in headings {
                out.push_str(&heading.text);
                out.push('\n');
            }
        }
        OutputFormat::Json => {
            out.push_str(&serde_json::to_string_pretty(headings)?);
            out.push('\n');
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Website</title></head>
<body>
  <h1 id="firstHeading"><span>Website</span></h1>
  <p>intro</p>
  <h2>History<span class="edit">[edit]</span></h2>
  <h4>Ignored</h4>
  <div><h3>Static website</h3></div>
  <h2>See also</h2>
</body></html>"#;

    fn texts(headings: &[Heading]) -> Vec<&str> {
        headings.iter().map(|h| h.text.as_str()).collect()
    }

    #[test]
    fn test_heading_selector() {
        assert_eq!(heading_selector(&[1, 2, 3]), "h1, h2, h3");
        assert_eq!(heading_selector(&[4]), "h4");
    }

    #[test]
    fn test_extract_headings_document_order() {
        let headings = extract_headings(PAGE, &[1, 2, 3]).unwrap();
        assert_eq!(
            texts(&headings),
            vec!["Website", "History[edit]", "Static website", "See also"]
        );
        let levels: Vec<u8> = headings.iter().map(|h| h.level).collect();
        assert_eq!(levels, vec![1, 2, 3, 2]);
    }

    #[test]
    fn test_extract_headings_interleaved_levels() {
        let html = "<h3>c</h3><h1>a</h1><h2>b</h2>";
        let headings = extract_headings(html, &[1, 2, 3]).unwrap();
        assert_eq!(texts(&headings), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_extract_headings_keeps_whitespace() {
        let html = "<h1>\n  Spaced  \n</h1>";
        let headings = extract_headings(html, &[1]).unwrap();
        assert_eq!(headings[0].text, "\n  Spaced  \n");
    }

    #[test]
    fn test_extract_headings_none() {
        let headings = extract_headings("<p>no headings</p>", &[1, 2, 3]).unwrap();
        assert!(headings.is_empty());
    }

    #[tokio::test]
    async fn test_scrape_headings_from_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Website"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let client = crate::utils::build_client("test", Duration::from_secs(5)).unwrap();
        let url = format!("{}/wiki/Website", server.uri());
        let headings = scrape_headings(&client, &url, &[1, 2, 3]).await.unwrap();
        assert_eq!(
            texts(&headings),
            vec!["Website", "History[edit]", "Static website", "See also"]
        );
    }

    #[tokio::test]
    async fn test_scrape_headings_parses_error_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<h1>Not Found</h1>"))
            .mount(&server)
            .await;

        let client = crate::utils::build_client("test", Duration::from_secs(5)).unwrap();
        let headings = scrape_headings(&client, &server.uri(), &[1, 2, 3]).await.unwrap();
        assert_eq!(texts(&headings), vec!["Not Found"]);
    }

    #[tokio::test]
    async fn test_scrape_headings_honours_meta_charset() {
        let server = MockServer::start().await;
        let body = b"<html><head><meta charset=\"windows-1252\"></head><body><h1>Caf\xe9</h1></body></html>";
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_vec(), "text/html"))
            .mount(&server)
            .await;

        let client = crate::utils::build_client("test", Duration::from_secs(5)).unwrap();
        let headings = scrape_headings(&client, &server.uri(), &[1, 2, 3]).await.unwrap();
        assert_eq!(texts(&headings), vec!["Café"]);
    }

    #[test]
    fn test_render_headings_text() {
        let headings = extract_headings(PAGE, &[1, 2, 3]).unwrap();
        let out = render_headings(&headings, OutputFormat::Text).unwrap();
        assert_eq!(out, "Website\nHistory[edit]\nStatic website\nSee also\n");
    }

    #[test]
    fn test_render_headings_json() {
        let headings = extract_headings("<h1>A</h1><h3>C</h3>", &[1, 2, 3]).unwrap();
        let out = render_headings(&headings, OutputFormat::Json).unwrap();
        assert!(out.ends_with('\n'));
        let back: Vec<Heading> = serde_json::from_str(&out).unwrap();
        assert_eq!(
            back,
            vec![
                Heading { level: 1, text: "A".to_string() },
                Heading { level: 3, text: "C".to_string() },
            ]
        );
    }

    #[test]
    fn test_render_headings_empty() {
        assert_eq!(render_headings(&[], OutputFormat::Text).unwrap(), "");
        assert_eq!(render_headings(&[], OutputFormat::Json).unwrap(), "[]\n");
    }

    #[tokio::test]
    async fn test_scrape_headings_connection_refused() {
        let client = crate::utils::build_client("test", Duration::from_secs(2)).unwrap();
        let err = scrape_headings(&client, "http://127.0.0.1:9/", &[1]).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Http(_)));
    }
}
