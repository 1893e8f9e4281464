//! Single-page spider that collects image URLs.
//!
//! A [`Spider`] names its start pages and turns each downloaded [`Response`]
//! into items. The [`Crawler`] is the smallest runner that can drive one:
//! it downloads every start URL once, in order, and hands the response to
//! [`Spider::parse`]. It never follows links, deduplicates or schedules.

use crate::error::{Result, ScrapeError};
use crate::models::ImageItem;
use crate::utils::response_text;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// A downloaded page handed to [`Spider::parse`].
#[derive(Debug, Clone)]
pub struct Response {
    /// Final URL after redirects.
    pub url: Url,
    pub status: u16,
    pub body: String,
}

impl Response {
    /// Values of `attr` on every element matching `selector`, in document
    /// order. Elements without the attribute are skipped.
    pub fn css_attr(&self, selector: &str, attr: &str) -> Result<Vec<String>> {
        let parsed =
            Selector::parse(selector).map_err(|_| ScrapeError::Selector(selector.to_string()))?;
        Ok(self.select_attr(&parsed, attr))
    }

    /// Same as [`Response::css_attr`] with an already parsed selector.
    pub fn select_attr(&self, selector: &Selector, attr: &str) -> Vec<String> {
        let document = Html::parse_document(&self.body);
        document
            .select(selector)
            .filter_map(|el| el.value().attr(attr))
            .map(str::to_string)
            .collect()
    }
}

/// Callback side of a crawl: where to start and how to read a page.
pub trait Spider {
    type Item;

    fn name(&self) -> &str;

    fn start_urls(&self) -> &[Url];

    /// Extract items from one downloaded page.
    fn parse(&self, response: &Response) -> Result<Vec<Self::Item>>;
}

/// Yields one [`ImageItem`] holding every `img` `src` on the page.
#[derive(Debug, Clone)]
pub struct ImageSpider {
    name: String,
    start_urls: Vec<Url>,
    absolute: bool,
}

impl ImageSpider {
    /// Build the spider, rejecting start URLs that do not parse.
    pub fn new(name: impl Into<String>, start_urls: &[String]) -> Result<Self> {
        let start_urls = start_urls
            .iter()
            .map(|u| Url::parse(u))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.into(),
            start_urls,
            absolute: false,
        })
    }

    /// Resolve relative `src` values against the page URL.
    pub fn absolute(mut self, absolute: bool) -> Self {
        self.absolute = absolute;
        self
    }
}

impl Spider for ImageSpider {
    type Item = ImageItem;

    fn name(&self) -> &str {
        &self.name
    }

    fn start_urls(&self) -> &[Url] {
        &self.start_urls
    }

    fn parse(&self, response: &Response) -> Result<Vec<ImageItem>> {
        let mut image_urls = response.css_attr("img", "src")?;
        if self.absolute {
            // unresolvable values stay as written
            image_urls = image_urls
                .into_iter()
                .map(|src| match response.url.join(&src) {
                    Ok(resolved) => resolved.to_string(),
                    Err(_) => src,
                })
                .collect();
        }
        debug!(
            url = %response.url,
            status = response.status,
            count = image_urls.len(),
            "Parsed image URLs"
        );
        Ok(vec![ImageItem { image_urls }])
    }
}

/// Items and counters from one crawl.
#[derive(Debug)]
pub struct CrawlOutcome<T> {
    pub items: Vec<T>,
    /// Pages that were downloaded and parsed.
    pub pages_crawled: usize,
    /// Start URLs that failed to download, returned non-2xx or failed to parse.
    pub failures: usize,
}

impl<T> CrawlOutcome<T> {
    /// True when there was at least one start URL and none of them produced
    /// a parsed page.
    pub fn all_failed(&self) -> bool {
        self.pages_crawled == 0 && self.failures > 0
    }
}

/// Downloads start pages and feeds them to a spider.
#[derive(Debug, Clone)]
pub struct Crawler {
    client: Client,
}

impl Crawler {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Download one page. Non-2xx responses come back as `Ok(None)`.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch(&self, url: &Url) -> Result<Option<Response>> {
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        let final_url = resp.url().clone();
        if !status.is_success() {
            warn!(%status, "Ignoring non-success response");
            return Ok(None);
        }
        let body = response_text(resp).await?;
        debug!(bytes = body.len(), "Downloaded page");
        Ok(Some(Response {
            url: final_url,
            status: status.as_u16(),
            body,
        }))
    }

    /// Run `spider` over its start URLs, one page at a time.
    ///
    /// Per-page failures are logged and counted, not returned, so one bad
    /// start URL does not discard items already collected.
    ///
    /// # Arguments
    ///
    /// * `spider` - Supplies the start URLs and the parse callback
    ///
    /// # Returns
    ///
    /// A [`CrawlOutcome`] with every item from every parsed page, in start
    /// URL order, plus page and failure counts.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let spider = ImageSpider::new("myspider", &["https://www.remnantrva.com/about".into()])?;
    /// let outcome = Crawler::new(client).crawl(&spider).await;
    /// if outcome.all_failed() { /* nothing was reachable */ }
    /// ```
    #[instrument(level = "info", skip_all, fields(spider = spider.name()))]
    pub async fn crawl<S: Spider>(&self, spider: &S) -> CrawlOutcome<S::Item> {
        let results: Vec<Option<Vec<S::Item>>> = stream::iter(spider.start_urls())
            .then(|url| async move {
                match self.fetch(url).await {
                    Ok(Some(response)) => match spider.parse(&response) {
                        Ok(items) => Some(items),
                        Err(e) => {
                            error!(error = %e, %url, "Spider parse failed");
                            None
                        }
                    },
                    Ok(None) => None,
                    Err(e) => {
                        error!(error = %e, %url, "Download failed");
                        None
                    }
                }
            })
            .collect()
            .await;

        let failures = results.iter().filter(|r| r.is_none()).count();
        let pages_crawled = results.len() - failures;
        let items = results.into_iter().flatten().flatten().collect::<Vec<_>>();

        info!(
            pages_crawled,
            failures,
            items = items.len(),
            "Crawl finished"
        );
        CrawlOutcome {
            items,
            pages_crawled,
            failures,
        }
    }
}
