//! Hierarchy walker - state → city → store orchestration
//!
//! The walk runs three levels in order:
//! - Level 1: the root directory page yields the states (fatal if empty)
//! - Level 2: each state page yields its cities (empty on failure)
//! - Level 3: city pages are fetched in bounded concurrent batches
//!
//! After every state the collected records are handed to the result
//! accumulator and persisted, so an interrupted run keeps finished states.

use crate::browser::{Anchor, DriverResult, PageDriver, PagePool, Stealth, WaitUntil};
use crate::config::Config;
use crate::crawler::extractor::{
    extract_listing, extract_stores, CITY_LINK_SELECTOR, STATE_LINK_SELECTOR,
};
use crate::crawler::limiter::ConcurrencyLimiter;
use crate::crawler::retry::{RetryPolicy, StepOutcome};
use crate::model::{CityRef, StateRef, StoreRecord};
use crate::output::ResultAccumulator;
use crate::WalkerError;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Characters of page markup logged after a failed city attempt
const CONTENT_SNIPPET_CHARS: usize = 500;

/// Counters for one completed walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// States processed
    pub states: usize,
    /// Cities listed across all states
    pub cities: usize,
    /// Records kept (cities with at least one store)
    pub records: usize,
    /// Cities dropped because of an unrecoverable error
    pub failed_cities: usize,
}

/// Walks the directory with a fixed pool of pages
pub struct Walker {
    root_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    limiter: ConcurrencyLimiter,
    pages: PagePool,
    stealth: Arc<dyn Stealth>,
}

impl Walker {
    /// Creates a walker over `pages`
    ///
    /// The concurrency limit is capped at the pool size so that no two
    /// concurrent fetches ever share a page.
    pub fn new(config: &Config, pages: PagePool, stealth: Arc<dyn Stealth>) -> Self {
        let requested = config.crawler.max_concurrent as usize;
        if requested > pages.size() {
            tracing::warn!(
                "max-concurrent {} exceeds {} open pages; limiting to {}",
                requested,
                pages.size(),
                pages.size()
            );
        }

        Self {
            root_url: config.target.root_url.clone(),
            timeout: config.browser.timeout(),
            retry: RetryPolicy::from_config(&config.crawler),
            limiter: ConcurrencyLimiter::new(requested.min(pages.size())),
            pages,
            stealth,
        }
    }

    /// Runs the full walk, appending and persisting records after each state
    ///
    /// # Returns
    ///
    /// * `Ok(WalkSummary)` - Every state was visited (some may have yielded nothing)
    /// * `Err(WalkerError::NoStates)` - The root page produced no states
    /// * `Err(WalkerError)` - A fatal root failure or a persistence failure
    pub async fn run(&self, results: &mut ResultAccumulator) -> Result<WalkSummary, WalkerError> {
        let page = self.pages.primary().ok_or(WalkerError::NoPages)?;

        let states = self.fetch_states(page).await?;
        if states.is_empty() {
            tracing::error!("No state URLs found, exiting");
            return Err(WalkerError::NoStates {
                url: self.root_url.clone(),
            });
        }
        tracing::info!("Found {} state URLs", states.len());

        let mut summary = WalkSummary::default();
        for state in &states {
            let records = self.process_state(page, state, &mut summary).await;
            summary.states += 1;

            results.extend(records);
            results.persist()?;

            tracing::info!(
                "Processed state {}, total records: {}",
                state.name,
                results.len()
            );
        }

        // Walk finished; no further city fetch may start
        self.limiter.close();

        summary.records = results.len();
        Ok(summary)
    }

    /// Level 1: state links from the root directory
    async fn fetch_states(&self, page: &dyn PageDriver) -> Result<Vec<StateRef>, WalkerError> {
        let root = self.root_url.as_str();
        let anchors = self
            .retry
            .run("state URLs", Vec::new(), move || async move {
                StepOutcome::from(self.load_listing(page, root, STATE_LINK_SELECTOR).await)
            })
            .await?;

        Ok(anchors.into_iter().map(StateRef::from).collect())
    }

    /// Level 2: city links from one state page
    ///
    /// Any failure leaves the state with no cities; the walk moves on.
    async fn fetch_cities(&self, page: &dyn PageDriver, state: &StateRef) -> Vec<CityRef> {
        let target = format!("cities at {}", state.url);
        let result = self
            .retry
            .run(&target, Vec::new(), move || async move {
                StepOutcome::from(self.load_listing(page, &state.url, CITY_LINK_SELECTOR).await)
            })
            .await;

        match result {
            Ok(anchors) => {
                let cities: Vec<CityRef> = anchors
                    .into_iter()
                    .map(|a| CityRef::from_anchor(a, state))
                    .collect();
                tracing::info!("Fetched {} cities from {}", cities.len(), state.url);
                cities
            }
            Err(e) => {
                tracing::error!("Skipping state {}: {}", state.name, e);
                Vec::new()
            }
        }
    }

    /// Level 3 for one state: city pages in sequential batches
    async fn process_state(
        &self,
        page: &dyn PageDriver,
        state: &StateRef,
        summary: &mut WalkSummary,
    ) -> Vec<StoreRecord> {
        let cities = self.fetch_cities(page, state).await;
        summary.cities += cities.len();

        let mut records = Vec::new();
        for batch in self.limiter.batches(&cities) {
            let tasks = batch
                .iter()
                .zip(self.pages.iter())
                .map(|(city, page)| self.limiter.run(self.stores_in_city(page, city)));

            let results = join_all(tasks).await;

            for (city, result) in batch.iter().zip(results) {
                match result {
                    Ok(record) if record.is_empty() => {
                        tracing::debug!("No stores for {}, {}; dropping", city.name, city.state);
                    }
                    Ok(record) => records.push(record),
                    Err(e) => {
                        tracing::error!("Error in city batch for {}, {}: {}", city.name, city.state, e);
                        summary.failed_cities += 1;
                    }
                }
            }

            tokio::time::sleep(self.retry.backoff().sample()).await;
        }

        records
    }

    /// Store record for one city; empty if every attempt failed
    async fn stores_in_city(
        &self,
        page: &dyn PageDriver,
        city: &CityRef,
    ) -> Result<StoreRecord, WalkerError> {
        let target = format!("{}, {}", city.name, city.state);
        let stores = self
            .retry
            .run(&target, String::new(), move || async move {
                StepOutcome::from(self.store_attempt(page, city).await)
            })
            .await?;

        Ok(StoreRecord::for_city(city, stores))
    }

    /// One attempt at a city page; logs a markup snippet when it fails
    async fn store_attempt(&self, page: &dyn PageDriver, city: &CityRef) -> DriverResult<String> {
        let result = self.read_city_page(page, city).await;
        if result.is_err() {
            log_page_snippet(page, &city.url).await;
        }
        result
    }

    async fn read_city_page(&self, page: &dyn PageDriver, city: &CityRef) -> DriverResult<String> {
        if let Err(e) = page
            .goto(&city.url, WaitUntil::DomContentLoaded, self.timeout)
            .await
        {
            tracing::debug!("Fallback to network idle for {}: {}", city.url, e);
            page.goto(&city.url, WaitUntil::NetworkIdle, self.timeout)
                .await?;
        }

        self.stealth.emulate(page).await?;

        let listing = extract_stores(page, self.timeout).await?;
        tracing::info!(
            "Fetched {} stores for {}, {} using {} layout",
            listing.names.len(),
            city.name,
            city.state,
            listing.layout.as_str()
        );
        Ok(listing.joined())
    }

    async fn load_listing(
        &self,
        page: &dyn PageDriver,
        url: &str,
        selector: &str,
    ) -> DriverResult<Vec<Anchor>> {
        page.goto(url, WaitUntil::DomContentLoaded, self.timeout)
            .await?;
        extract_listing(page, selector, self.timeout).await
    }
}

async fn log_page_snippet(page: &dyn PageDriver, url: &str) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    match page.content().await {
        Ok(content) => {
            let snippet: String = content.chars().take(CONTENT_SNIPPET_CHARS).collect();
            tracing::debug!("Store page content for {}:\n{}...", url, snippet);
        }
        Err(e) => tracing::debug!("Failed to get store page content: {}", e),
    }
}
