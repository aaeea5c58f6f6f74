//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::models::config::parse_flag;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists. Variables already present in the
    /// process environment are left untouched.
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# API Paradigm Experiment Configuration
#
# Values here are used as defaults and can be overridden by real
# environment variables and command-line arguments.

# GitHub personal access token (required for the GraphQL client)
# GITHUB_TOKEN=ghp_xxxxxxxxxxxxxxxxxxxx

# API endpoints
# REST_BASE_URL=https://api.github.com
# GRAPHQL_URL=https://api.github.com/graphql

# Paired repetitions per treatment (1-1000)
# REPETITIONS=30

# Shuffle the treatment order once per run (true/false)
# RANDOMIZE=true

# Pause after every invocation in milliseconds (0-60000)
# REQUEST_DELAY_MS=1000

# Request timeout in seconds (1-300)
# TIMEOUT_SECONDS=30

# Directory receiving measurement artifacts
# RESULTS_DIR=results

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#.to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        let content = Self::create_example_env_content();
        std::fs::write(path, content)
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))?;

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "GITHUB_TOKEN" => {
                if value.is_empty() {
                    return Err(AppError::config("GITHUB_TOKEN is set but empty"));
                }
            }
            "REST_BASE_URL" | "GRAPHQL_URL" => {
                url::Url::parse(value)
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            "REPETITIONS" => {
                let n: u32 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid REPETITIONS value '{}': {}", value, e)))?;
                if n == 0 || n > 1000 {
                    return Err(AppError::config(format!("REPETITIONS must be between 1 and 1000, got: {}", n)));
                }
            }
            "REQUEST_DELAY_MS" => {
                let ms: u64 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid REQUEST_DELAY_MS value '{}': {}", value, e)))?;
                if ms > 60_000 {
                    return Err(AppError::config(format!("REQUEST_DELAY_MS cannot exceed 60000, got: {}", ms)));
                }
            }
            "TIMEOUT_SECONDS" => {
                let timeout: u64 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid TIMEOUT_SECONDS value '{}': {}", value, e)))?;
                if timeout == 0 || timeout > 300 {
                    return Err(AppError::config(format!("TIMEOUT_SECONDS must be between 1 and 300, got: {}", timeout)));
                }
            }
            "RANDOMIZE" | "ENABLE_COLOR" => {
                if parse_flag(value).is_none() {
                    return Err(AppError::config(format!("Invalid {} value '{}'", key, value)));
                }
            }
            "RESULTS_DIR" => {
                if value.is_empty() {
                    return Err(AppError::config("RESULTS_DIR cannot be empty"));
                }
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("GITHUB_TOKEN", "GitHub personal access token", "ghp_xxxxxxxxxxxxxxxxxxxx"),
            ("REST_BASE_URL", "Base URL of the REST API", "https://api.github.com"),
            ("GRAPHQL_URL", "GraphQL endpoint", "https://api.github.com/graphql"),
            ("REPETITIONS", "Paired repetitions per treatment (1-1000)", "30"),
            ("RANDOMIZE", "Shuffle the treatment order", "true"),
            ("REQUEST_DELAY_MS", "Pause after each invocation (0-60000 ms)", "1000"),
            ("TIMEOUT_SECONDS", "Request timeout in seconds (1-300)", "30"),
            ("RESULTS_DIR", "Directory for measurement artifacts", "results"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<18} {}\n", var, description));
            help.push_str(&format!("  {:<18} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(var_name, _, _)| {
                let value = std::env::var(var_name).ok()?;
                Self::validate_env_var(var_name, &value)
                    .err()
                    .map(|e| format!("Warning: {}", e))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_env_manager_create_example_content() {
        let content = EnvManager::create_example_env_content();

        for (var, _, _) in EnvManager::get_supported_env_vars() {
            assert!(content.contains(&format!("{}=", var)), "missing {}", var);
        }
    }

    #[test]
    fn test_env_manager_save_example_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let result = EnvManager::save_example_env_file(temp_file.path());

        assert!(result.is_ok());

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("API Paradigm Experiment Configuration"));
    }

    #[test]
    fn test_env_manager_validate_env_var() {
        assert!(EnvManager::validate_env_var("GITHUB_TOKEN", "ghp_abc").is_ok());
        assert!(EnvManager::validate_env_var("REST_BASE_URL", "https://api.github.com").is_ok());
        assert!(EnvManager::validate_env_var("REPETITIONS", "30").is_ok());
        assert!(EnvManager::validate_env_var("RANDOMIZE", "false").is_ok());
        assert!(EnvManager::validate_env_var("REQUEST_DELAY_MS", "0").is_ok());
        assert!(EnvManager::validate_env_var("TIMEOUT_SECONDS", "30").is_ok());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "1").is_ok());

        assert!(EnvManager::validate_env_var("GITHUB_TOKEN", "  ").is_err());
        assert!(EnvManager::validate_env_var("GRAPHQL_URL", "not-a-url").is_err());
        assert!(EnvManager::validate_env_var("REPETITIONS", "0").is_err());
        assert!(EnvManager::validate_env_var("REPETITIONS", "1001").is_err());
        assert!(EnvManager::validate_env_var("REQUEST_DELAY_MS", "60001").is_err());
        assert!(EnvManager::validate_env_var("TIMEOUT_SECONDS", "301").is_err());
        assert!(EnvManager::validate_env_var("RANDOMIZE", "sometimes").is_err());
        assert!(EnvManager::validate_env_var("UNRELATED", "anything").is_ok());
    }

    #[test]
    fn test_display_env_help() {
        let help = EnvManager::display_env_help();

        assert!(help.contains("Supported Environment Variables:"));
        assert!(help.contains("GITHUB_TOKEN"));
        assert!(help.contains("Configuration Priority"));
    }

    #[test]
    fn test_missing_env_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = EnvManager::load_env_file_from(&dir.path().join(".env"), false);
        assert!(result.is_ok());
    }
}
