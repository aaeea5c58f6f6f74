//! Configuration validation rules and the environment setup check

use crate::{
    error::{AppError, Result},
    models::Config,
};
use std::time::{Duration, Instant};

/// Configuration validator with advisory rules on top of `Config::validate`
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration with comprehensive checks
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        config.validate()?;

        warnings.extend(Self::validate_credentials(config));
        warnings.extend(Self::validate_endpoints(config)?);
        warnings.extend(Self::validate_experiment_settings(config));

        Ok(warnings)
    }

    fn validate_credentials(config: &Config) -> Vec<ValidationWarning> {
        match &config.github_token {
            None => vec![ValidationWarning::new(
                ValidationLevel::Error,
                "GITHUB_TOKEN is not set; the GraphQL client cannot be created".to_string(),
            )],
            Some(token) if token.len() < 20 => vec![ValidationWarning::new(
                ValidationLevel::Warning,
                "GITHUB_TOKEN looks too short to be a personal access token".to_string(),
            )],
            Some(_) => Vec::new(),
        }
    }

    fn validate_endpoints(config: &Config) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        for (name, value) in [("REST base URL", &config.rest_base_url), ("GraphQL URL", &config.graphql_url)] {
            let parsed = url::Url::parse(value)
                .map_err(|e| AppError::config(format!("Invalid {} '{}': {}", name, value, e)))?;

            if parsed.scheme() == "http" {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("{} '{}' uses HTTP; the token would be sent in clear text", name, value),
                ));
            }

            if parsed.query().is_some() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("{} '{}' has query parameters that will be sent with every request", name, value),
                ));
            }
        }

        Ok(warnings)
    }

    fn validate_experiment_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.repetitions < 3 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "{} repetition(s) per treatment is below the 3 samples the normality test needs",
                    config.repetitions
                ),
            ));
        }

        if config.request_delay_ms == 0 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "No delay between requests; the API rate limit may turn invocations into failures".to_string(),
            ));
        }

        let estimate = estimated_run_time(config);
        if estimate > Duration::from_secs(3600) {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("The run will take at least {} minutes", estimate.as_secs() / 60),
            ));
        }

        warnings
    }
}

/// Lower bound of the run length: 8 invocations per repetition, each followed by the delay
pub fn estimated_run_time(config: &Config) -> Duration {
    config.request_delay() * (8 * config.repetitions)
}

/// Validation warning levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        if use_color {
            use colored::Colorize;
            let tag = match self.level {
                ValidationLevel::Info => self.level.as_str().blue(),
                ValidationLevel::Warning => self.level.as_str().yellow(),
                ValidationLevel::Error => self.level.as_str().red().bold(),
            };
            format!("[{}] {}", tag, self.message)
        } else {
            format!("[{}] {}", self.level.as_str(), self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}

/// Outcome of one setup check
#[derive(Debug, Clone)]
pub enum CheckResult {
    Passed { detail: String },
    Failed { error: String },
}

impl CheckResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }
}

/// Setup check report printed by `apx check`
#[derive(Debug, Clone)]
pub struct SetupReport {
    pub token: CheckResult,
    pub rest_api: CheckResult,
    pub rate_limit: Option<u64>,
}

impl SetupReport {
    pub fn all_successful(&self) -> bool {
        self.token.is_success() && self.rest_api.is_success()
    }

    pub fn format(&self, use_color: bool) -> String {
        use colored::Colorize;

        let line = |name: &str, result: &CheckResult| -> String {
            let (mark, text) = match result {
                CheckResult::Passed { detail } => ("OK", detail.as_str()),
                CheckResult::Failed { error } => ("FAIL", error.as_str()),
            };
            let mark = match (use_color, result.is_success()) {
                (true, true) => mark.green().bold().to_string(),
                (true, false) => mark.red().bold().to_string(),
                (false, _) => mark.to_string(),
            };
            format!("  [{}] {:<10} {}", mark, name, text)
        };

        let mut out = vec!["Setup check:".to_string(), line("token", &self.token), line("rest api", &self.rest_api)];
        if let Some(limit) = self.rate_limit {
            out.push(format!("  Rate limit: {} requests/hour", limit));
        }
        out.push(if self.all_successful() {
            "Environment is ready for `apx run`.".to_string()
        } else {
            "Fix the failed checks before running the experiment.".to_string()
        });
        out.join("\n")
    }
}

/// Check token presence and REST API reachability
pub async fn check_setup(config: &Config) -> Result<SetupReport> {
    let token = match config.masked_token() {
        Some(masked) => CheckResult::Passed { detail: format!("GITHUB_TOKEN found ({})", masked) },
        None => CheckResult::Failed { error: "GITHUB_TOKEN is not set".to_string() },
    };

    let client = reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(crate::defaults::USER_AGENT)
        .build()
        .map_err(|e| AppError::config(format!("Failed to build HTTP client: {}", e)))?;

    let mut request = client.get(&config.rest_base_url);
    if let Some(token) = &config.github_token {
        request = request.header(reqwest::header::AUTHORIZATION, format!("token {}", token));
    }

    let start = Instant::now();
    let (rest_api, rate_limit) = match request.send().await {
        Ok(response) => {
            let elapsed = start.elapsed();
            let rate_limit = response
                .headers()
                .get("X-RateLimit-Limit")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let status = response.status();
            if status.is_success() {
                (
                    CheckResult::Passed {
                        detail: format!("{} answered {} in {}ms", config.rest_base_url, status.as_u16(), elapsed.as_millis()),
                    },
                    rate_limit,
                )
            } else {
                (
                    CheckResult::Failed { error: format!("{} answered {}", config.rest_base_url, status) },
                    rate_limit,
                )
            }
        }
        Err(e) => (CheckResult::Failed { error: e.to_string() }, None),
    };

    Ok(SetupReport { token, rest_api, rate_limit })
}
