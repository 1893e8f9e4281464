//! Command-line interface definitions for page_scrape.
//!
//! Every option that is not given falls back to the YAML config file and
//! then to the built-in defaults, see [`crate::config`].

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for page_scrape.
///
/// # Examples
///
/// ```sh
/// # Print the h1-h3 headings of the default page
/// page_scrape headings
///
/// # Run the image spider and keep a JSON feed
/// page_scrape spider --url https://example.org/ --output ./feeds/
///
/// # Wait up to 5 seconds for a heading in a headless browser
/// page_scrape browser --url https://example.org/ --wait-secs 5
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "PAGE_SCRAPE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// User-Agent header for HTTP requests
    #[arg(long, env = "PAGE_SCRAPE_USER_AGENT", global = true)]
    pub user_agent: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "PAGE_SCRAPE_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a page and print the text of its h1-h3 headings
    Headings(HeadingsArgs),
    /// Crawl start pages and yield the `src` of every image
    Spider(SpiderArgs),
    /// Open a page in a headless browser and print the first heading
    Browser(BrowserArgs),
}

#[derive(Args, Debug)]
pub struct HeadingsArgs {
    /// Page to fetch
    #[arg(short, long)]
    pub url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct SpiderArgs {
    /// Start URL (repeatable)
    #[arg(short, long = "url")]
    pub urls: Vec<String>,

    /// Also write the items as a JSON feed to this file or directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Resolve relative image URLs against the page URL
    #[arg(long)]
    pub absolute: bool,
}

#[derive(Args, Debug)]
pub struct BrowserArgs {
    /// Page to open
    #[arg(short, long)]
    pub url: Option<String>,

    /// CSS selector to wait for
    #[arg(short, long)]
    pub selector: Option<String>,

    /// Maximum seconds to wait for the selector
    #[arg(short, long)]
    pub wait_secs: Option<u64>,

    /// Chromium/Chrome executable to launch
    #[arg(long, env = "CHROME")]
    pub chrome: Option<String>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headful: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// One heading per line
    Text,
    /// A JSON array of `{level, text}` objects
    Json,
}
