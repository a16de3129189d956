//! Store-Walker: a browser-driven store directory scraper
//!
//! This crate walks a three-level store directory (state → city → store),
//! extracting store listings from each city page and persisting them as
//! CSV and JSON after every completed state.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod model;
pub mod output;

use thiserror::Error;

/// Main error type for Store-Walker operations
#[derive(Debug, Error)]
pub enum WalkerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Driver(#[from] browser::DriverError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("No states found at {url}")]
    NoStates { url: String },

    #[error("No browser pages available")]
    NoPages,

    #[error("Concurrency limiter closed")]
    LimiterClosed,

    #[error("Unrecoverable failure for {target}: {source}")]
    Fatal {
        target: String,
        source: browser::DriverError,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Store-Walker operations
pub type Result<T> = std::result::Result<T, WalkerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{scrape, WalkSummary};
pub use model::{CityRef, StateRef, StoreRecord};
