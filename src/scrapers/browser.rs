//! Browser-driven extraction.
//!
//! Opens a page in a real (headless) Chromium, waits a bounded time for an
//! element to be present, reads its rendered text and shuts the browser
//! down.
//!
//! The waiting logic only talks to a [`PageDriver`], so it can be exercised
//! without a browser; [`ChromiumDriver`] is the CDP-backed implementation.

use crate::config::BrowserSettings;
use crate::error::{Result, ScrapeError};
use crate::models::BrowserText;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

/// the handful of browser operations a page wait needs.
pub trait PageDriver {
    /// Navigate to `url` and wait for the page load.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Text of the first element matching `selector`, or `None` if no such
    /// element is present yet. An element with no text yields `Some("")`.
    ///
    /// Text is the element's rendered `innerText` with surrounding whitespace
    /// trimmed. For an element that is not rendered (e.g. `display: none`)
    /// the browser falls back to its raw `textContent`, so hidden text is not
    /// filtered out.
    async fn first_text(&mut self, selector: &str) -> Result<Option<String>>;

    /// Terminate the browser. Further calls are no-ops.
    async fn quit(&mut self) -> Result<()>;
}

/// How long and how often to look for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Upper bound on the whole wait, including stalled driver calls.
    pub timeout: Duration,
    /// Delay between two lookups.
    pub poll: Duration,
    /// Upper bound on the initial navigation, before the element wait.
    pub page_load: Duration,
}

impl WaitPolicy {
    pub fn from_settings(settings: &BrowserSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.wait_secs),
            poll: Duration::from_millis(settings.poll_millis),
            page_load: Duration::from_secs(settings.page_load_secs),
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll: Duration::from_millis(500),
            page_load: Duration::from_secs(300),
        }
    }
}

/// Poll `driver` until `selector` is present and return its text.
///
/// Returns [`ScrapeError::Timeout`] once `policy.timeout` has elapsed. Any
/// other driver error aborts the wait immediately.
///
/// # Arguments
///
/// * `driver` - Browser with a page already open
/// * `selector` - CSS selector to wait for, e.g. `"h1, h2, h3"`
/// * `policy` - Wait bound and polling interval; `page_load` is not used here
///
/// # Returns
///
/// The text of the first matching element once one is present.
///
/// # Examples
///
/// ```ignore
/// let text = wait_for_text(&mut driver, "h1, h2, h3", WaitPolicy::default()).await?;
/// ```
#[instrument(level = "info", skip(driver))]
pub async fn wait_for_text<D: PageDriver>(
    driver: &mut D,
    selector: &str,
    policy: WaitPolicy,
) -> Result<String> {
    let started = Instant::now();
    let polling = async {
        let mut attempts = 0usize;
        loop {
            attempts += 1;
            if let Some(text) = driver.first_text(selector).await? {
                debug!(attempts, "Element present");
                return Ok::<_, ScrapeError>(text);
            }
            sleep(policy.poll).await;
        }
    };

    match timeout(policy.timeout, polling).await {
        Ok(result) => {
            if result.is_ok() {
                info!(elapsed_ms = started.elapsed().as_millis() as u64, "Found element");
            }
            result
        }
        Err(_) => {
            warn!(timeout = ?policy.timeout, "Gave up waiting for element");
            Err(ScrapeError::Timeout {
                selector: selector.to_string(),
                waited: policy.timeout,
            })
        }
    }
}

/// Navigate, wait for `selector`, then quit the browser.
///
/// Navigation is bounded by `policy.page_load` and the element wait by
/// `policy.timeout`. The browser is shut down whether or not either step
/// succeeded; their error takes precedence over a shutdown error.
///
/// # Arguments
///
/// * `driver` - A launched browser; it is quit before returning
/// * `url` - Page to open
/// * `selector` - CSS selector to wait for
/// * `policy` - Page-load and element-wait bounds
///
/// # Returns
///
/// A [`BrowserText`] with the first matching element's text, or
/// [`ScrapeError::PageLoadTimeout`], [`ScrapeError::Timeout`] or a driver
/// error.
///
/// # Examples
///
/// ```ignore
/// let mut driver = ChromiumDriver::launch(&settings).await?;
/// let found = visit_and_wait(&mut driver, "https://www.remnantrva.com/", "h1, h2, h3", WaitPolicy::default()).await?;
/// println!("{}", found.text);
/// ```
#[instrument(level = "info", skip(driver, policy))]
pub async fn visit_and_wait<D: PageDriver>(
    driver: &mut D,
    url: &str,
    selector: &str,
    policy: WaitPolicy,
) -> Result<BrowserText> {
    let waited = async {
        match timeout(policy.page_load, driver.goto(url)).await {
            Ok(loaded) => loaded?,
            Err(_) => {
                warn!(page_load = ?policy.page_load, "Gave up waiting for page load");
                return Err(ScrapeError::PageLoadTimeout {
                    url: url.to_string(),
                    waited: policy.page_load,
                });
            }
        }
        wait_for_text(&mut *driver, selector, policy).await
    }
    .await;

    let closed = driver.quit().await;
    if let Err(e) = &closed {
        warn!(error = %e, "Browser shutdown failed");
    }

    let text = waited?;
    closed?;
    Ok(BrowserText {
        url: url.to_string(),
        selector: selector.to_string(),
        text,
    })
}

/// [`PageDriver`] over a Chromium process controlled through CDP.
pub struct ChromiumDriver {
    browser: Browser,
    handler: Option<JoinHandle<()>>,
    page: Option<Page>,
    closed: bool,
}

impl ChromiumDriver {
    /// Launch Chromium according to `settings`.
    ///
    /// Without `chrome_path` the executable is autodetected by chromiumoxide.
    #[instrument(level = "info", skip_all, fields(headless = settings.headless))]
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &settings.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(ScrapeError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;

        // CDP events must be drained for any command to complete
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler stopped");
                    break;
                }
            }
        });

        info!("Browser launched");
        Ok(Self {
            browser,
            handler: Some(handler),
            page: None,
            closed: false,
        })
    }
}

impl PageDriver for ChromiumDriver {
    #[instrument(level = "info", skip(self))]
    async fn goto(&mut self, url: &str) -> Result<()> {
        let page = self.browser.new_page(url).await?;
        debug!("Page loaded");
        self.page = Some(page);
        Ok(())
    }

    async fn first_text(&mut self, selector: &str) -> Result<Option<String>> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| ScrapeError::Browser("no page open".to_string()))?;

        let elements = page.find_elements(selector).await?;
        match elements.into_iter().next() {
            Some(element) => Ok(Some(visible_text(element.inner_text().await?))),
            None => Ok(None),
        }
    }

    #[instrument(level = "info", skip(self))]
    async fn quit(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.page = None;

        self.browser.close().await?;
        self.browser.wait().await?;
        if let Some(handler) = self.handler.take() {
            if let Err(e) = handler.await {
                warn!(error = %e, "CDP handler task failed");
            }
        }
        info!("Browser closed");
        Ok(())
    }
}

/// Trim `innerText` the way WebDriver reports element text.
fn visible_text(inner_text: Option<String>) -> String {
    inner_text
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}
