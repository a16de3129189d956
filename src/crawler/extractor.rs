//! Page extraction for the store directory
//!
//! Directory pages (root and state level) list plain anchors. City pages
//! render their stores in one of two layouts, and nothing on the page says
//! which one; every attempt tries the store card titles first and falls
//! back to the store info spans.

use crate::browser::{Anchor, DriverResult, PageDriver};
use crate::model::join_store_names;
use std::time::Duration;

/// State links on the root directory page
pub const STATE_LINK_SELECTOR: &str = "div.view_stateName__CzKvV a.view_stateNameLink__qdJ1N";

/// City links on a state directory page
pub const CITY_LINK_SELECTOR: &str = "div.view_cityName__vSrti a.view_cityNameLink__O_Xez";

/// Primary city page layout: one heading per store card
pub const STORE_TITLE_SELECTOR: &str = "h3.styles_storeCardTitle__VFoDj";

/// Secondary city page layout: address block with the name after a line break
pub const STORE_INFO_SELECTOR: &str = "span.styles_storeInfo__duma6";

/// Line-break marker in serialized store info markup
const LINE_BREAK: &str = "<br>";

/// Which markup a city page's stores were read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreLayout {
    StoreCards,
    StoreInfo,
}

impl StoreLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreLayout::StoreCards => "store card",
            StoreLayout::StoreInfo => "store info",
        }
    }
}

/// Store names read from one city page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreListing {
    pub layout: StoreLayout,
    pub names: Vec<String>,
}

impl StoreListing {
    /// Names joined into the `Stores` column value
    pub fn joined(&self) -> String {
        join_store_names(&self.names)
    }
}

/// Waits for `selector` and returns every matching anchor in DOM order
///
/// Fails with a timeout if nothing matches within `timeout`.
pub async fn extract_listing(
    page: &dyn PageDriver,
    selector: &str,
    timeout: Duration,
) -> DriverResult<Vec<Anchor>> {
    page.wait_for(selector, timeout).await?;
    page.anchors(selector).await
}

/// Reads the stores on a loaded city page
///
/// 1. Store card titles: first text node of each heading. Returned only if
///    at least one name is non-empty.
/// 2. Store info spans: the segment after the first line break, cut at the
///    first comma. Returned whenever the spans exist, even if every name
///    comes out empty.
///
/// If neither layout appears, the timeout from the second wait is returned
/// so the retry policy can try the page again.
pub async fn extract_stores(page: &dyn PageDriver, timeout: Duration) -> DriverResult<StoreListing> {
    match page.wait_for(STORE_TITLE_SELECTOR, timeout).await {
        Ok(()) => {
            let names = non_empty(page.first_texts(STORE_TITLE_SELECTOR).await?);
            if !names.is_empty() {
                return Ok(StoreListing {
                    layout: StoreLayout::StoreCards,
                    names,
                });
            }
            tracing::debug!("Store card titles present but empty, trying store info");
        }
        Err(e) if e.is_timeout() => {
            tracing::debug!("No store card titles found, trying store info");
        }
        Err(e) => return Err(e),
    }

    page.wait_for(STORE_INFO_SELECTOR, timeout).await?;
    let names = page
        .inner_html(STORE_INFO_SELECTOR)
        .await?
        .iter()
        .filter_map(|markup| store_name_from_info(markup))
        .collect();

    Ok(StoreListing {
        layout: StoreLayout::StoreInfo,
        names,
    })
}

/// Extracts a store name from store info markup
///
/// `"Target<br>Easton Town Center, 4000 Morse Rd"` yields `"Easton Town Center"`.
pub fn store_name_from_info(markup: &str) -> Option<String> {
    let segment = markup.split(LINE_BREAK).nth(1)?.trim();
    let name = segment.split(',').next().unwrap_or_default().trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn non_empty(names: Vec<String>) -> Vec<String> {
    names.into_iter().filter(|n| !n.is_empty()).collect()
}
