//! Runtime configuration.
//!
//! Settings are layered: built-in defaults (the stock target pages),
//! then an optional YAML file, then whatever flags or environment variables
//! were given on the command line.
//!
//! ```yaml
//! user_agent: "page_scrape/0.1.0"
//! request_timeout_secs: 30
//! headings:
//!   url: https://en.wikipedia.org/wiki/Website
//!   levels: [1, 2, 3]
//! spider:
//!   name: myspider
//!   start_urls:
//!     - https://www.remnantrva.com/about
//! browser:
//!   url: https://www.remnantrva.com/
//!   selector: "h1, h2, h3"
//!   wait_secs: 10
//!   page_load_secs: 300
//! ```

use crate::cli::{Cli, Command};
use crate::error::{Result, ScrapeError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const DEFAULT_HEADINGS_URL: &str = "https://en.wikipedia.org/wiki/Website";
pub const DEFAULT_SPIDER_NAME: &str = "myspider";
pub const DEFAULT_SPIDER_URL: &str = "https://www.remnantrva.com/about";
pub const DEFAULT_BROWSER_URL: &str = "https://www.remnantrva.com/";
pub const DEFAULT_BROWSER_SELECTOR: &str = "h1, h2, h3";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `User-Agent` header sent by the HTTP client.
    pub user_agent: String,
    /// Whole-request timeout for the HTTP client, in seconds.
    pub request_timeout_secs: u64,
    pub headings: HeadingsSettings,
    pub spider: SpiderSettings,
    pub browser: BrowserSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeadingsSettings {
    pub url: String,
    /// Heading levels to extract, `1..=6`.
    pub levels: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpiderSettings {
    pub name: String,
    pub start_urls: Vec<String>,
    /// Resolve relative `src` values against the page URL.
    pub absolute: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowserSettings {
    pub url: String,
    pub selector: String,
    pub wait_secs: u64,
    pub poll_millis: u64,
    /// Upper bound on navigation before the element wait starts.
    pub page_load_secs: u64,
    /// Explicit Chromium/Chrome executable; autodetected when unset.
    pub chrome_path: Option<String>,
    pub headless: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 30,
            headings: HeadingsSettings::default(),
            spider: SpiderSettings::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl Default for HeadingsSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_HEADINGS_URL.to_string(),
            levels: vec![1, 2, 3],
        }
    }
}

impl Default for SpiderSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_SPIDER_NAME.to_string(),
            start_urls: vec![DEFAULT_SPIDER_URL.to_string()],
            absolute: false,
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_BROWSER_URL.to_string(),
            selector: DEFAULT_BROWSER_SELECTOR.to_string(),
            wait_secs: 10,
            poll_millis: 500,
            page_load_secs: 300,
            chrome_path: None,
            headless: true,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            None => {
                debug!("No config file given; using defaults");
                Config::default()
            }
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    ScrapeError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                let config = Self::from_yaml(&raw)
                    .map_err(|e| ScrapeError::Config(format!("{}: {e}", path.display())))?;
                info!(path = %path.display(), "Loaded configuration");
                config
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document. An empty document yields the defaults.
    pub fn from_yaml(raw: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Layer command-line flags (and their environment fallbacks) on top.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(ua) = &cli.user_agent {
            self.user_agent = ua.clone();
        }
        if let Some(secs) = cli.timeout_secs {
            self.request_timeout_secs = secs;
        }

        match &cli.command {
            Command::Headings(args) => {
                if let Some(url) = &args.url {
                    self.headings.url = url.clone();
                }
            }
            Command::Spider(args) => {
                if !args.urls.is_empty() {
                    self.spider.start_urls = args.urls.clone();
                }
                if args.absolute {
                    self.spider.absolute = true;
                }
            }
            Command::Browser(args) => {
                if let Some(url) = &args.url {
                    self.browser.url = url.clone();
                }
                if let Some(selector) = &args.selector {
                    self.browser.selector = selector.clone();
                }
                if let Some(secs) = args.wait_secs {
                    self.browser.wait_secs = secs;
                }
                if let Some(path) = &args.chrome {
                    self.browser.chrome_path = Some(path.clone());
                }
                if args.headful {
                    self.browser.headless = false;
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.headings.levels.is_empty() {
            return Err(ScrapeError::Config("headings.levels must not be empty".into()));
        }
        if let Some(bad) = self.headings.levels.iter().find(|l| !(1..=6).contains(*l)) {
            return Err(ScrapeError::Config(format!(
                "headings.levels: {bad} is not a heading level (1-6)"
            )));
        }
        if self.browser.poll_millis == 0 {
            return Err(ScrapeError::Config("browser.poll_millis must be positive".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_defaults_match_stock_targets() {
        let config = Config::default();
        assert_eq!(config.headings.url, "https://en.wikipedia.org/wiki/Website");
        assert_eq!(config.headings.levels, vec![1, 2, 3]);
        assert_eq!(config.spider.name, "myspider");
        assert_eq!(config.spider.start_urls, vec!["https://www.remnantrva.com/about"]);
        assert_eq!(config.browser.url, "https://www.remnantrva.com/");
        assert_eq!(config.browser.selector, "h1, h2, h3");
        assert_eq!(config.browser.wait_secs, 10);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = Config::from_yaml("browser:\n  wait_secs: 3\n").unwrap();
        assert_eq!(config.browser.wait_secs, 3);
        assert_eq!(config.browser.selector, "h1, h2, h3");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = Config::from_yaml("  \n").unwrap();
        assert_eq!(config.spider.name, "myspider");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::from_yaml("headingz:\n  url: x\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "user_agent: test-agent\nheadings:\n  levels: [2]").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.headings.levels, vec![2]);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = Config::load(Some(Path::new("/nonexistent/page_scrape.yaml"))).unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }

    #[test]
    fn test_invalid_level_rejected() {
        let config = Config::from_yaml("headings:\n  levels: [1, 7]\n").unwrap();
        assert!(matches!(config.validate(), Err(ScrapeError::Config(_))));
    }

    #[test]
    fn test_overrides_for_browser() {
        let cli = Cli::parse_from([
            "page_scrape",
            "--user-agent",
            "ua/1",
            "browser",
            "--url",
            "https://example.org/",
            "--wait-secs",
            "2",
            "--headful",
        ]);
        let mut config = Config::default();
        config.apply_overrides(&cli);
        assert_eq!(config.user_agent, "ua/1");
        assert_eq!(config.browser.url, "https://example.org/");
        assert_eq!(config.browser.wait_secs, 2);
        assert!(!config.browser.headless);
        assert_eq!(config.headings.url, DEFAULT_HEADINGS_URL);
    }

    #[test]
    fn test_spider_urls_replace_defaults() {
        let cli = Cli::parse_from([
            "page_scrape",
            "spider",
            "--url",
            "https://a.example/",
            "--url",
            "https://b.example/",
        ]);
        let mut config = Config::default();
        config.apply_overrides(&cli);
        assert_eq!(
            config.spider.start_urls,
            vec!["https://a.example/", "https://b.example/"]
        );
    }
}
