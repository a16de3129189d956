//! Crawler module for walking the store directory
//!
//! This module contains the core scraping logic, including:
//! - Directory and store page extraction with layout fallback
//! - Bounded retries with randomized backoff
//! - Concurrency limiting for city page fetches
//! - Overall state → city → store orchestration

mod extractor;
mod limiter;
mod retry;
mod walker;

pub use extractor::{
    extract_listing, extract_stores, store_name_from_info, StoreLayout, StoreListing,
    CITY_LINK_SELECTOR, STATE_LINK_SELECTOR, STORE_INFO_SELECTOR, STORE_TITLE_SELECTOR,
};
pub use limiter::ConcurrencyLimiter;
pub use retry::{Backoff, RetryPolicy, StepOutcome};
pub use walker::{WalkSummary, Walker};

use crate::browser::{self, BrowserSession, HumanEmulation, NoStealth, PagePool, Stealth};
use crate::config::{BrowserConfig, Config};
use crate::output::ResultAccumulator;
use crate::WalkerError;
use std::sync::Arc;

/// Runs a complete scrape
///
/// This is the main entry point. It will:
/// 1. Launch the configured browser driver
/// 2. Open one page per concurrent slot
/// 3. Walk states, cities and stores, persisting after every state
/// 4. Persist once more and shut the browser down
///
/// # Arguments
///
/// * `config` - The validated configuration
///
/// # Returns
///
/// * `Ok(WalkSummary)` - The walk finished
/// * `Err(WalkerError)` - The browser failed to start, the root page had no
///   states, or output could not be written
pub async fn scrape(config: Config) -> Result<WalkSummary, WalkerError> {
    let session = browser::launch(&config.browser).await?;
    tracing::info!("Launched {} driver", config.browser.driver);

    let stealth = stealth_for(&config.browser);
    scrape_with(&config, session, stealth).await
}

/// Runs a scrape on an already launched session
///
/// The session is shut down whether or not the walk succeeds.
pub async fn scrape_with(
    config: &Config,
    session: Box<dyn BrowserSession>,
    stealth: Arc<dyn Stealth>,
) -> Result<WalkSummary, WalkerError> {
    let result = walk(config, session.as_ref(), stealth).await;

    if let Err(e) = session.shutdown().await {
        tracing::warn!("Failed to shut down browser cleanly: {}", e);
    }

    result
}

async fn walk(
    config: &Config,
    session: &dyn BrowserSession,
    stealth: Arc<dyn Stealth>,
) -> Result<WalkSummary, WalkerError> {
    let pages = PagePool::open(session, config.crawler.max_concurrent as usize).await?;
    let walker = Walker::new(config, pages, stealth);
    let mut results = ResultAccumulator::from_config(&config.output);

    let summary = walker.run(&mut results).await?;
    results.persist()?;

    tracing::info!(
        "Scraping completed. Total records: {} ({} states, {} cities, {} failed)",
        summary.records,
        summary.states,
        summary.cities,
        summary.failed_cities
    );
    Ok(summary)
}

/// Human emulation when enabled, otherwise nothing
pub fn stealth_for(config: &BrowserConfig) -> Arc<dyn Stealth> {
    if config.human_emulation {
        Arc::new(HumanEmulation::default())
    } else {
        Arc::new(NoStealth)
    }
}
