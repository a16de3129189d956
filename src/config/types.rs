use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure for Store-Walker
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Site to walk
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// URL of the top-level (state) directory page
    #[serde(rename = "root-url", default = "default_root_url")]
    pub root_url: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            root_url: default_root_url(),
        }
    }
}

/// Which page driver backs the browser session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Headless (or visible) Chromium over the DevTools protocol
    #[default]
    Chromium,
    /// Raw HTML fetched over HTTP, no script execution
    Markup,
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverKind::Chromium => write!(f, "chromium"),
            DriverKind::Markup => write!(f, "markup"),
        }
    }
}

impl FromStr for DriverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" => Ok(DriverKind::Chromium),
            "markup" => Ok(DriverKind::Markup),
            other => Err(format!(
                "unknown driver '{}', expected 'chromium' or 'markup'",
                other
            )),
        }
    }
}

/// Browser session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub driver: DriverKind,

    /// Run without a visible window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Budget for every navigation and every DOM wait (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(rename = "viewport-width", default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(rename = "viewport-height", default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Pause, scroll and move the pointer before each city attempt
    #[serde(rename = "human-emulation", default = "default_true")]
    pub human_emulation: bool,

    /// Identity strings; one is picked at random per run
    #[serde(rename = "user-agents", default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

impl BrowserConfig {
    /// Per-operation timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            driver: DriverKind::default(),
            headless: true,
            timeout_ms: default_timeout_ms(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            human_emulation: true,
            user_agents: default_user_agents(),
        }
    }
}

/// Crawl pacing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of city pages fetched at once (also the batch size)
    #[serde(rename = "max-concurrent", default = "default_max_concurrent")]
    pub max_concurrent: u32,

    /// Attempts per directory or city page before giving up
    #[serde(rename = "retry-attempts", default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Lower bound of the randomized backoff (seconds)
    #[serde(rename = "backoff-min-secs", default = "default_backoff_min_secs")]
    pub backoff_min_secs: f64,

    /// Upper bound of the randomized backoff (seconds)
    #[serde(rename = "backoff-max-secs", default = "default_backoff_max_secs")]
    pub backoff_max_secs: f64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            retry_attempts: default_retry_attempts(),
            backoff_min_secs: default_backoff_min_secs(),
            backoff_max_secs: default_backoff_max_secs(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV output file
    #[serde(rename = "csv-path", default = "default_csv_path")]
    pub csv_path: String,

    /// Path to the JSON output file
    #[serde(rename = "json-path", default = "default_json_path")]
    pub json_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            json_path: default_json_path(),
        }
    }
}

fn default_root_url() -> String {
    "https://www.target.com/store-locator/store-directory".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    180_000
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    800
}

fn default_user_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36".to_string(),
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.2 Safari/605.1.15".to_string(),
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/115.0".to_string(),
    ]
}

fn default_max_concurrent() -> u32 {
    2
}

fn default_retry_attempts() -> u32 {
    5
}

fn default_backoff_min_secs() -> f64 {
    5.0
}

fn default_backoff_max_secs() -> f64 {
    8.0
}

fn default_csv_path() -> String {
    "target_stores_by_city.csv".to_string()
}

fn default_json_path() -> String {
    "target_stores_by_city.json".to_string()
}
