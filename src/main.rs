//! # page_scrape
//!
//! Three small scrapers behind one command line:
//!
//! - `headings`: fetch a page over HTTP and print the text of every `h1`-`h3`
//! - `spider`: crawl start pages and yield one `{"image_urls": [...]}` record each
//! - `browser`: open a page in headless Chromium, wait for the first heading
//!   and print its text
//!
//! ## Usage
//!
//! ```sh
//! page_scrape headings --url https://en.wikipedia.org/wiki/Website
//! page_scrape spider --output ./feeds/
//! page_scrape browser --wait-secs 10
//! ```
//!
//! Scraped output goes to stdout; logs go to stderr and are filtered with
//! `RUST_LOG` (default `info`).

use clap::Parser;
use std::error::Error;
use std::io::Write;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cli::{Cli, Command, HeadingsArgs, SpiderArgs};
use config::Config;
use outputs::json;
use scrapers::browser::{self, ChromiumDriver, WaitPolicy};
use scrapers::headings::{render_headings, scrape_headings};
use scrapers::spider::{Crawler, ImageSpider, Spider};
use utils::build_client;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref())?;
    config.apply_overrides(&args);

    let outcome = match &args.command {
        Command::Headings(cmd) => run_headings(&config, cmd).await,
        Command::Spider(cmd) => run_spider(&config, cmd).await,
        Command::Browser(_) => run_browser(&config).await,
    };

    let elapsed = start_time.elapsed();
    match &outcome {
        Ok(()) => info!(?elapsed, "Execution complete"),
        Err(e) => error!(?elapsed, error = %e, "Execution failed"),
    }
    outcome
}

#[instrument(level = "info", skip_all)]
async fn run_headings(config: &Config, cmd: &HeadingsArgs) -> Result<(), Box<dyn Error>> {
    let client = build_client(&config.user_agent, config.request_timeout())?;
    let headings = scrape_headings(&client, &config.headings.url, &config.headings.levels).await?;

    std::io::stdout()
        .lock()
        .write_all(render_headings(&headings, cmd.format)?.as_bytes())?;
    Ok(())
}

#[instrument(level = "info", skip_all)]
async fn run_spider(config: &Config, cmd: &SpiderArgs) -> Result<(), Box<dyn Error>> {
    let client = build_client(&config.user_agent, config.request_timeout())?;
    let spider = ImageSpider::new(&config.spider.name, &config.spider.start_urls)?
        .absolute(config.spider.absolute);

    let outcome = Crawler::new(client).crawl(&spider).await;
    if outcome.all_failed() {
        return Err(format!("{}: every start URL failed", spider.name()).into());
    }

    std::io::stdout()
        .lock()
        .write_all(json::to_json_lines(&outcome.items)?.as_bytes())?;

    if let Some(output) = &cmd.output {
        let path = json::feed_path(output, spider.name()).await;
        json::write_feed(&outcome.items, &path).await?;
    }
    Ok(())
}

#[instrument(level = "info", skip_all)]
async fn run_browser(config: &Config) -> Result<(), Box<dyn Error>> {
    let settings = &config.browser;
    let mut driver = ChromiumDriver::launch(settings).await?;
    let found = browser::visit_and_wait(
        &mut driver,
        &settings.url,
        &settings.selector,
        WaitPolicy::from_settings(settings),
    )
    .await?;
    info!(url = %found.url, selector = %found.selector, "Browser wait finished");

    writeln!(std::io::stdout().lock(), "{}", found.text)?;
    Ok(())
}
