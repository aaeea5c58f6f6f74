//! Configuration data model and validation

use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// GitHub personal access token (required by the GraphQL client)
    #[serde(default)]
    pub github_token: Option<String>,

    /// Base URL of the REST API
    #[serde(default = "default_rest_base_url")]
    pub rest_base_url: String,

    /// Endpoint of the GraphQL API
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,

    /// Paired repetitions per treatment
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,

    /// Shuffle the treatment order once per run
    #[serde(default = "default_randomize")]
    pub randomize: bool,

    /// Pause after every invocation
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// Directory receiving the measurement artifacts
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: None,
            rest_base_url: default_rest_base_url(),
            graphql_url: default_graphql_url(),
            repetitions: default_repetitions(),
            randomize: default_randomize(),
            request_delay_ms: default_request_delay_ms(),
            timeout_seconds: default_timeout_secs(),
            results_dir: default_results_dir(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Get the inter-request delay as Duration
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Token with all but the first and last four characters hidden
    pub fn masked_token(&self) -> Option<String> {
        self.github_token.as_deref().map(mask_token)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("REST base URL", &self.rest_base_url), ("GraphQL URL", &self.graphql_url)] {
            if value.is_empty() {
                return Err(AppError::config(format!("{} cannot be empty", name)));
            }

            match url::Url::parse(value) {
                Ok(parsed) => {
                    if parsed.scheme() != "https" && parsed.scheme() != "http" {
                        return Err(AppError::config(format!("{} must use HTTP(S): {}", name, value)));
                    }
                }
                Err(e) => {
                    return Err(AppError::config(format!("Invalid {} '{}': {}", name, value, e)));
                }
            }
        }

        if let Some(token) = &self.github_token {
            if token.trim().is_empty() {
                return Err(AppError::config("GitHub token cannot be blank"));
            }
        }

        if self.repetitions == 0 {
            return Err(AppError::config("Repetitions must be greater than 0"));
        }

        if self.repetitions > 1000 {
            return Err(AppError::config("Repetitions cannot exceed 1000"));
        }

        if self.request_delay_ms > 60_000 {
            return Err(AppError::config("Request delay cannot exceed 60000 ms"));
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.timeout_seconds > 300 {
            return Err(AppError::config("Timeout cannot exceed 300 seconds"));
        }

        if self.results_dir.as_os_str().is_empty() {
            return Err(AppError::config("Results directory cannot be empty"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        self.merge_from_source(|key| std::env::var(key).ok())
    }

    /// Merge values from an arbitrary key lookup (environment, .env map, ...)
    pub fn merge_from_source<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("GITHUB_TOKEN") {
            let token = token.trim().to_string();
            if !token.is_empty() {
                self.github_token = Some(token);
            }
        }

        if let Some(url) = lookup("REST_BASE_URL") {
            self.rest_base_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(url) = lookup("GRAPHQL_URL") {
            self.graphql_url = url.trim().to_string();
        }

        if let Some(repetitions) = lookup("REPETITIONS") {
            self.repetitions = repetitions.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid REPETITIONS value '{}': {}", repetitions, e)))?;
        }

        if let Some(randomize) = lookup("RANDOMIZE") {
            self.randomize = parse_flag(&randomize)
                .ok_or_else(|| AppError::config(format!("Invalid RANDOMIZE value '{}'", randomize)))?;
        }

        if let Some(delay) = lookup("REQUEST_DELAY_MS") {
            self.request_delay_ms = delay.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid REQUEST_DELAY_MS value '{}': {}", delay, e)))?;
        }

        if let Some(timeout) = lookup("TIMEOUT_SECONDS") {
            self.timeout_seconds = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Some(dir) = lookup("RESULTS_DIR") {
            self.results_dir = PathBuf::from(dir.trim());
        }

        if let Some(enable_color) = lookup("ENABLE_COLOR") {
            self.enable_color = parse_flag(&enable_color)
                .ok_or_else(|| AppError::config(format!("Invalid ENABLE_COLOR value '{}'", enable_color)))?;
        }

        Ok(())
    }
}

/// Accepts the usual spellings of a boolean flag
pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

// Default value functions for serde
fn default_rest_base_url() -> String {
    crate::defaults::DEFAULT_REST_BASE_URL.to_string()
}

fn default_graphql_url() -> String {
    crate::defaults::DEFAULT_GRAPHQL_URL.to_string()
}

fn default_repetitions() -> u32 {
    crate::defaults::DEFAULT_REPETITIONS
}

fn default_randomize() -> bool {
    crate::defaults::DEFAULT_RANDOMIZE
}

fn default_request_delay_ms() -> u64 {
    crate::defaults::DEFAULT_REQUEST_DELAY.as_millis() as u64
}

fn default_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TIMEOUT.as_secs()
}

fn default_results_dir() -> PathBuf {
    PathBuf::from(crate::defaults::DEFAULT_RESULTS_DIR)
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.repetitions, 30);
        assert!(config.randomize);
        assert_eq!(config.request_delay(), Duration::from_secs(1));
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_rest_url() {
        let mut config = Config::default();
        config.rest_base_url = "not-a-url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_http_graphql_url_invalid() {
        let mut config = Config::default();
        config.graphql_url = "ftp://api.github.com/graphql".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_repetition_bounds() {
        let mut config = Config::default();
        config.repetitions = 0;
        assert!(config.validate().is_err());
        config.repetitions = 1001;
        assert!(config.validate().is_err());
        config.repetitions = 1000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_delay_and_timeout_bounds() {
        let mut config = Config::default();
        config.request_delay_ms = 60_001;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timeout_seconds = 0;
        assert!(config.validate().is_err());
        config.timeout_seconds = 301;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_from_source() {
        let mut config = Config::default();
        config
            .merge_from_source(lookup_from(&[
                ("GITHUB_TOKEN", " ghp_abcdefghijklmnop "),
                ("REPETITIONS", "5"),
                ("RANDOMIZE", "no"),
                ("REQUEST_DELAY_MS", "0"),
                ("REST_BASE_URL", "http://localhost:8080/"),
                ("RESULTS_DIR", "out"),
            ]))
            .unwrap();

        assert_eq!(config.github_token.as_deref(), Some("ghp_abcdefghijklmnop"));
        assert_eq!(config.repetitions, 5);
        assert!(!config.randomize);
        assert_eq!(config.request_delay_ms, 0);
        assert_eq!(config.rest_base_url, "http://localhost:8080");
        assert_eq!(config.results_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_merge_rejects_garbage() {
        let mut config = Config::default();
        let result = config.merge_from_source(lookup_from(&[("REPETITIONS", "many")]));
        assert!(result.is_err());

        let mut config = Config::default();
        let result = config.merge_from_source(lookup_from(&[("ENABLE_COLOR", "maybe")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_token_is_ignored_on_merge() {
        let mut config = Config::default();
        config.merge_from_source(lookup_from(&[("GITHUB_TOKEN", "   ")])).unwrap();
        assert!(config.github_token.is_none());
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("ghp_1234567890abcd"), "ghp_...abcd");
        assert_eq!(mask_token("short"), "*****");
        let mut config = Config::default();
        config.github_token = Some("ghp_1234567890abcd".to_string());
        assert_eq!(config.masked_token().as_deref(), Some("ghp_...abcd"));
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let config: Config = serde_json::from_str(r#"{"repetitions": 3}"#).unwrap();
        assert_eq!(config.repetitions, 3);
        assert_eq!(config.rest_base_url, crate::defaults::DEFAULT_REST_BASE_URL);
    }
}
