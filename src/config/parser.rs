use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigResult;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Missing sections and keys fall back to their defaults.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - The validated configuration
/// * `Err(ConfigError)` - The file could not be loaded
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use store_walker::config::load_config;
///
/// let config = load_config(Path::new("walker.toml")).unwrap();
/// println!("Root: {}", config.target.root_url);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so output files can be traced back to the settings
/// that produced them.
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    Ok(content_hash(&content))
}

/// Loads a configuration and returns both the config and the hash of the
/// exact text it was parsed from
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, content_hash(&content)))
}

fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriverKind;
    use crate::ConfigError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[target]
root-url = "https://example.com/store-directory"

[browser]
driver = "markup"
headless = false
timeout-ms = 5000
viewport-width = 1024
viewport-height = 768
human-emulation = false
user-agents = ["TestAgent/1.0"]

[crawler]
max-concurrent = 3
retry-attempts = 2
backoff-min-secs = 0.5
backoff-max-secs = 1.5

[output]
csv-path = "./stores.csv"
json-path = "./stores.json"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.target.root_url, "https://example.com/store-directory");
        assert_eq!(config.browser.driver, DriverKind::Markup);
        assert!(!config.browser.headless);
        assert_eq!(config.browser.timeout_ms, 5000);
        assert_eq!(config.browser.user_agents, vec!["TestAgent/1.0"]);
        assert_eq!(config.crawler.max_concurrent, 3);
        assert_eq!(config.crawler.retry_attempts, 2);
        assert_eq!(config.output.csv_path, "./stores.csv");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(
            config.target.root_url,
            "https://www.target.com/store-locator/store-directory"
        );
        assert_eq!(config.crawler.max_concurrent, 2);
        assert_eq!(config.crawler.backoff_min_secs, 5.0);
        assert_eq!(config.crawler.backoff_max_secs, 8.0);
        assert_eq!(config.output.json_path, "target_stores_by_city.json");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = parse_config("[crawler]\nretry-attempts = 1\n").unwrap();

        assert_eq!(config.crawler.retry_attempts, 1);
        assert_eq!(config.crawler.max_concurrent, 2);
        assert_eq!(config.browser.viewport_width, 1280);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/walker.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let result = parse_config("this is not valid TOML {{{");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_driver_rejected() {
        let result = parse_config("[browser]\ndriver = \"firefox\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_error() {
        let result = parse_config("[crawler]\nmax-concurrent = 0\n");
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_hash_matches_loaded_text() {
        let file = create_temp_config("[crawler]\nretry-attempts = 3\n");

        let (config, hash) = load_config_with_hash(file.path()).unwrap();

        assert_eq!(config.crawler.retry_attempts, 3);
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
