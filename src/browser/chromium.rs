//! Chromium driver over the DevTools protocol
//!
//! All DOM access goes through small `querySelectorAll` expressions whose
//! results come back by value and are decoded with serde. Waits poll a
//! probe expression until it reports a match or the timeout elapses.

use crate::browser::{
    Anchor, BrowserSession, DriverError, DriverResult, PageDriver, Viewport, WaitUntil,
};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::handler::viewport::Viewport as ChromeViewport;
use chromiumoxide::layout::Point;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Interval between DOM probes while waiting
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Quiet period after the document completes before treating the network as idle
///
/// An approximation: `Page::goto` already waits for the navigation to finish,
/// so `WaitUntil::NetworkIdle` only adds a `readyState === 'complete'` poll
/// and this pause. There is no in-flight request tracking, and falling back
/// from `DomContentLoaded` amounts to reloading with a short extra wait.
const NETWORK_IDLE_GRACE: Duration = Duration::from_millis(500);

/// A launched Chromium process and its protocol event loop
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launches Chromium with the given identity and a fixed viewport
    ///
    /// # Arguments
    ///
    /// * `config` - Browser settings (headless mode, viewport, timeout)
    /// * `user_agent` - Identity string for every page in this session
    pub async fn launch(config: &BrowserConfig, user_agent: String) -> DriverResult<Self> {
        let mut builder = ChromeConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .viewport(ChromeViewport {
                width: config.viewport_width,
                height: config.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            })
            .request_timeout(config.timeout())
            .arg(format!("--user-agent={}", user_agent));

        if !config.headless {
            builder = builder.with_head();
        }

        let chrome_config = builder.build().map_err(DriverError::Launch)?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser protocol event error: {}", e);
                }
            }
        });

        tracing::info!(
            "Launched Chromium ({}, {}x{})",
            if config.headless { "headless" } else { "headed" },
            config.viewport_width,
            config.viewport_height
        );

        Ok(Self { browser, handler })
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn open_page(&self) -> DriverResult<Arc<dyn PageDriver>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;
        Ok(Arc::new(ChromiumPage { page }))
    }

    async fn shutdown(self: Box<Self>) -> DriverResult<()> {
        let ChromiumSession {
            mut browser,
            handler,
        } = *self;

        let closed = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| DriverError::Launch(e.to_string()));
        if let Err(e) = browser.wait().await {
            tracing::debug!("Failed waiting for browser exit: {}", e);
        }
        handler.abort();
        closed
    }
}

/// One Chromium tab
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    /// Evaluates `expression` and decodes its by-value result
    async fn evaluate_value<T: DeserializeOwned>(&self, expression: String) -> DriverResult<T> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .return_by_value(true)
            .build()
            .map_err(DriverError::Script)?;

        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| DriverError::Script(e.to_string()))?;

        Ok(result.into_value()?)
    }

    /// Re-evaluates a boolean probe until it holds or `timeout` elapses
    async fn poll_until(&self, probe: String, what: &str, timeout: Duration) -> DriverResult<()> {
        let wait = async {
            loop {
                if self.evaluate_value::<bool>(probe.clone()).await? {
                    return Ok::<(), DriverError>(());
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| DriverError::Timeout {
                what: what.to_string(),
                timeout,
            })?
    }
}

/// `document.querySelectorAll(...)` call with the selector quoted as a JS string
fn query_all(selector: &str) -> DriverResult<String> {
    let quoted = serde_json::to_string(selector)?;
    Ok(format!("Array.from(document.querySelectorAll({}))", quoted))
}

/// Drops anchors the browser resolved to no href, logging each one
fn with_href(anchors: Vec<Anchor>) -> Vec<Anchor> {
    anchors
        .into_iter()
        .filter(|a| {
            if a.href.is_empty() {
                tracing::debug!("Dropping anchor '{}' without href", a.text);
                false
            } else {
                true
            }
        })
        .collect()
}

#[async_trait]
impl PageDriver for ChromiumPage {
    async fn goto(&self, url: &str, wait: WaitUntil, timeout: Duration) -> DriverResult<()> {
        let navigation = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| DriverError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

            if wait == WaitUntil::NetworkIdle {
                self.poll_until(
                    "document.readyState === 'complete'".to_string(),
                    "document to complete",
                    timeout,
                )
                .await?;
                tokio::time::sleep(NETWORK_IDLE_GRACE).await;
            }

            Ok::<(), DriverError>(())
        };

        tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| DriverError::Timeout {
                what: format!("navigation to {}", url),
                timeout,
            })?
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> DriverResult<()> {
        let probe = format!("{}.length > 0", query_all(selector)?);
        self.poll_until(probe, selector, timeout).await
    }

    async fn anchors(&self, selector: &str) -> DriverResult<Vec<Anchor>> {
        let expression = format!(
            "{}.map(el => ({{ href: el.href || '', text: (el.textContent || '').trim() }}))",
            query_all(selector)?
        );
        let anchors: Vec<Anchor> = self.evaluate_value(expression).await?;
        Ok(with_href(anchors))
    }

    async fn first_texts(&self, selector: &str) -> DriverResult<Vec<String>> {
        let expression = format!(
            "{}.map(el => el.childNodes.length ? (el.childNodes[0].textContent || '').trim() : '')",
            query_all(selector)?
        );
        self.evaluate_value(expression).await
    }

    async fn inner_html(&self, selector: &str) -> DriverResult<Vec<String>> {
        let expression = format!("{}.map(el => el.innerHTML)", query_all(selector)?);
        self.evaluate_value(expression).await
    }

    async fn viewport(&self) -> DriverResult<Viewport> {
        self.evaluate_value(
            "({ width: window.innerWidth, height: window.innerHeight })".to_string(),
        )
        .await
    }

    async fn scroll_by(&self, dy: i64) -> DriverResult<()> {
        self.evaluate_value::<bool>(format!("window.scrollBy(0, {}), true", dy))
            .await
            .map(|_| ())
    }

    async fn move_pointer(&self, x: f64, y: f64) -> DriverResult<()> {
        self.page
            .move_mouse(Point { x, y })
            .await
            .map(|_| ())
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    async fn content(&self) -> DriverResult<String> {
        self.page
            .content()
            .await
            .map_err(|e| DriverError::Script(e.to_string()))
    }
}
