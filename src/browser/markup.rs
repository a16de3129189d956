//! Static markup driver
//!
//! Fetches pages over plain HTTP and answers DOM queries against the
//! returned HTML. No scripts run, so this only works for pages whose
//! listings are present in the served markup (static mirrors, fixtures).
//! Because the document never changes after loading, a wait on a selector
//! that is not present fails immediately with a timeout.

use crate::browser::{
    Anchor, BrowserSession, DriverError, DriverResult, PageDriver, Viewport, WaitUntil,
};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Builds the HTTP client shared by every markup page
///
/// # Arguments
///
/// * `user_agent` - Identity string sent with every request
/// * `timeout` - Overall request timeout
fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Session that hands out HTTP-backed pages
pub struct MarkupSession {
    client: Client,
    viewport: Viewport,
}

impl MarkupSession {
    pub fn new(config: &BrowserConfig, user_agent: String) -> DriverResult<Self> {
        let client = build_http_client(&user_agent, config.timeout())
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        Ok(Self {
            client,
            viewport: Viewport {
                width: config.viewport_width,
                height: config.viewport_height,
            },
        })
    }
}

#[async_trait]
impl BrowserSession for MarkupSession {
    async fn open_page(&self) -> DriverResult<Arc<dyn PageDriver>> {
        Ok(Arc::new(MarkupPage {
            client: self.client.clone(),
            viewport: self.viewport,
            document: Mutex::new(None),
        }))
    }

    async fn shutdown(self: Box<Self>) -> DriverResult<()> {
        Ok(())
    }
}

/// Last loaded document
#[derive(Debug, Clone)]
struct Document {
    url: Url,
    html: String,
}

/// A page backed by a single HTTP GET per navigation
pub struct MarkupPage {
    client: Client,
    viewport: Viewport,
    document: Mutex<Option<Document>>,
}

impl MarkupPage {
    /// Creates a page with `html` already loaded as if fetched from `url`
    pub fn from_html(url: &str, html: &str) -> DriverResult<Self> {
        let url = Url::parse(url).map_err(|e| DriverError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            client: Client::new(),
            viewport: Viewport {
                width: 1280,
                height: 800,
            },
            document: Mutex::new(Some(Document {
                url,
                html: html.to_string(),
            })),
        })
    }

    /// Runs `f` against the parsed current document
    fn with_document<T>(&self, f: impl FnOnce(&Url, &Html) -> DriverResult<T>) -> DriverResult<T> {
        let guard = self.document.lock().unwrap_or_else(|e| e.into_inner());
        let document = guard.as_ref().ok_or(DriverError::NoDocument)?;
        let html = Html::parse_document(&document.html);
        f(&document.url, &html)
    }
}

#[async_trait]
impl PageDriver for MarkupPage {
    async fn goto(&self, url: &str, _wait: WaitUntil, timeout: Duration) -> DriverResult<()> {
        let navigation_error = |message: String| DriverError::Navigation {
            url: url.to_string(),
            message,
        };

        let response = tokio::time::timeout(timeout, self.client.get(url).send())
            .await
            .map_err(|_| DriverError::Timeout {
                what: format!("navigation to {}", url),
                timeout,
            })?
            .map_err(|e| {
                if e.is_timeout() {
                    DriverError::Timeout {
                        what: format!("navigation to {}", url),
                        timeout,
                    }
                } else {
                    navigation_error(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(navigation_error(format!("HTTP {}", status.as_u16())));
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;

        tracing::trace!("Loaded {} ({} bytes)", final_url, html.len());

        let mut guard = self.document.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Document {
            url: final_url,
            html,
        });
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> DriverResult<()> {
        let found = self.with_document(|_, html| {
            let selector = parse_selector(selector)?;
            Ok(html.select(&selector).next().is_some())
        })?;

        if found {
            Ok(())
        } else {
            Err(DriverError::Timeout {
                what: selector.to_string(),
                timeout,
            })
        }
    }

    async fn anchors(&self, selector: &str) -> DriverResult<Vec<Anchor>> {
        self.with_document(|base_url, html| {
            let selector = parse_selector(selector)?;
            Ok(html
                .select(&selector)
                .filter_map(|element| {
                    let text = element.text().collect::<String>().trim().to_string();
                    let raw = element.value().attr("href").unwrap_or_default();
                    match resolve_link(raw, base_url) {
                        Some(href) => Some(Anchor { href, text }),
                        None => {
                            tracing::debug!("Dropping anchor '{}' with href '{}'", text, raw);
                            None
                        }
                    }
                })
                .collect())
        })
    }

    async fn first_texts(&self, selector: &str) -> DriverResult<Vec<String>> {
        self.with_document(|_, html| {
            let selector = parse_selector(selector)?;
            Ok(html.select(&selector).map(first_child_text).collect())
        })
    }

    async fn inner_html(&self, selector: &str) -> DriverResult<Vec<String>> {
        self.with_document(|_, html| {
            let selector = parse_selector(selector)?;
            Ok(html.select(&selector).map(|e| e.inner_html()).collect())
        })
    }

    async fn viewport(&self) -> DriverResult<Viewport> {
        Ok(self.viewport)
    }

    async fn scroll_by(&self, dy: i64) -> DriverResult<()> {
        tracing::trace!("Ignoring scroll by {}px on static page", dy);
        Ok(())
    }

    async fn move_pointer(&self, x: f64, y: f64) -> DriverResult<()> {
        tracing::trace!("Ignoring pointer move to ({:.0}, {:.0}) on static page", x, y);
        Ok(())
    }

    async fn content(&self) -> DriverResult<String> {
        let guard = self.document.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .as_ref()
            .map(|d| d.html.clone())
            .ok_or(DriverError::NoDocument)
    }
}

fn parse_selector(selector: &str) -> DriverResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| DriverError::InvalidSelector(format!("{}: {:?}", selector, e)))
}

/// Text of an element's first child node, trimmed
fn first_child_text(element: ElementRef<'_>) -> String {
    let Some(node) = element.first_child() else {
        return String::new();
    };

    let text = match node.value() {
        Node::Text(text) => (&**text).to_string(),
        Node::Element(_) => ElementRef::wrap(node)
            .map(|e| e.text().collect::<String>())
            .unwrap_or_default(),
        _ => String::new(),
    };

    text.trim().to_string()
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
