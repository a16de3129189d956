//! Browser automation seam
//!
//! The walker never talks to a browser directly. It drives pages through
//! the [`PageDriver`] trait, which has two implementations:
//!
//! - `ChromiumSession`: a real Chromium instance over the DevTools protocol
//! - `MarkupSession`: raw HTML fetched over HTTP and queried with CSS selectors
//!
//! This module also owns the page pool that pins one page to each
//! concurrent slot, and the human-emulation behaviour applied before
//! city page attempts.

mod chromium;
mod markup;
mod stealth;

pub use chromium::ChromiumSession;
pub use markup::{MarkupPage, MarkupSession};
pub use stealth::{HumanEmulation, NoStealth, Stealth};

use crate::config::{BrowserConfig, DriverKind};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a page driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Timed out after {timeout:?} waiting for {what}")]
    Timeout { what: String, timeout: Duration },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),

    #[error("Unexpected script result: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("No document loaded")]
    NoDocument,
}

impl DriverError {
    /// Navigation and timeout class failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DriverError::Timeout { .. } | DriverError::Navigation { .. } | DriverError::Script(_)
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout { .. })
    }
}

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Load condition to wait for after navigating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    DomContentLoaded,
    NetworkIdle,
}

/// A link extracted from a directory page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Anchor {
    /// Absolute URL
    pub href: String,
    /// Trimmed link text
    pub text: String,
}

/// Inner size of the page's window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// One browser tab (or equivalent) that can be navigated and queried
///
/// A single page must never be navigated by two tasks at once; the
/// [`PagePool`] hands each concurrent slot its own page.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigates to `url`, waiting for `wait` within `timeout`
    async fn goto(&self, url: &str, wait: WaitUntil, timeout: Duration) -> DriverResult<()>;

    /// Waits until at least one element matches `selector`
    async fn wait_for(&self, selector: &str, timeout: Duration) -> DriverResult<()>;

    /// Href and trimmed text of every anchor matching `selector`, in DOM order
    async fn anchors(&self, selector: &str) -> DriverResult<Vec<Anchor>>;

    /// Trimmed text of the first child node of every match, in DOM order
    async fn first_texts(&self, selector: &str) -> DriverResult<Vec<String>>;

    /// Inner markup of every match, in DOM order
    async fn inner_html(&self, selector: &str) -> DriverResult<Vec<String>>;

    async fn viewport(&self) -> DriverResult<Viewport>;

    async fn scroll_by(&self, dy: i64) -> DriverResult<()>;

    async fn move_pointer(&self, x: f64, y: f64) -> DriverResult<()>;

    /// Serialized markup of the current document
    async fn content(&self) -> DriverResult<String>;
}

/// A running browser that hands out pages
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn open_page(&self) -> DriverResult<Arc<dyn PageDriver>>;

    /// Closes the browser and releases every page it opened
    async fn shutdown(self: Box<Self>) -> DriverResult<()>;
}

/// Launches the session selected by `config.driver`
///
/// One identity string is drawn from `config.user_agents` for the whole run.
pub async fn launch(config: &BrowserConfig) -> DriverResult<Box<dyn BrowserSession>> {
    let user_agent = pick_user_agent(&config.user_agents)?;
    tracing::debug!("Using user agent: {}", user_agent);

    match config.driver {
        DriverKind::Chromium => {
            let session = ChromiumSession::launch(config, user_agent).await?;
            Ok(Box::new(session))
        }
        DriverKind::Markup => {
            let session = MarkupSession::new(config, user_agent)?;
            Ok(Box::new(session))
        }
    }
}

/// Picks one identity string at random
pub fn pick_user_agent(user_agents: &[String]) -> DriverResult<String> {
    user_agents
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| DriverError::Launch("no user agents configured".to_string()))
}

/// Fixed set of pages, one per concurrent slot
pub struct PagePool {
    pages: Vec<Arc<dyn PageDriver>>,
}

impl PagePool {
    /// Opens `size` pages on `session`
    pub async fn open(session: &dyn BrowserSession, size: usize) -> DriverResult<Self> {
        let mut pages = Vec::with_capacity(size);
        for _ in 0..size.max(1) {
            pages.push(session.open_page().await?);
        }
        tracing::debug!("Opened {} browser pages", pages.len());
        Ok(Self { pages })
    }

    /// Wraps already opened pages
    pub fn from_pages(pages: Vec<Arc<dyn PageDriver>>) -> Self {
        Self { pages }
    }

    /// Page used for sequential (directory-level) fetches
    pub fn primary(&self) -> Option<&dyn PageDriver> {
        self.pages.first().map(|p| p.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn PageDriver> {
        self.pages.iter().map(|p| p.as_ref())
    }

    /// Number of pages, which is also the number of concurrent slots
    pub fn size(&self) -> usize {
        self.pages.len()
    }
}
