//! Error handling for the API paradigm experiment

use thiserror::Error;

/// Custom error types for the experiment harness and analyzer
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/transport failure on a single invocation
    #[error("Transport error: {0}")]
    Transport(String),

    /// Well-formed response carrying an embedded error payload
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Failure that escaped an entire treatment loop
    #[error("Treatment '{treatment}' aborted: {message}")]
    TreatmentFatal { treatment: String, message: String },

    /// No measurement file could be resolved for analysis
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    /// Too few samples for a statistical check (non-fatal, the check is skipped)
    #[error("Insufficient samples: need at least {needed}, got {got}")]
    InsufficientSample { needed: usize, got: usize },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (CSV rows, JSON, URLs, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Authentication/authorization errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Statistics calculation errors
    #[error("Statistics error: {0}")]
    Statistics(String),

    /// The run was interrupted by the user
    #[error("Interrupted: {0}")]
    Interrupted(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new protocol (embedded error payload) error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol(message.into())
    }

    /// Create a new treatment-fatal error
    pub fn treatment_fatal<T: Into<String>, S: Into<String>>(treatment: T, message: S) -> Self {
        Self::TreatmentFatal {
            treatment: treatment.into(),
            message: message.into(),
        }
    }

    /// Create a new dataset-not-found error
    pub fn dataset_not_found<S: Into<String>>(message: S) -> Self {
        Self::DatasetNotFound(message.into())
    }

    /// Create a new insufficient-sample error
    pub fn insufficient_sample(needed: usize, got: usize) -> Self {
        Self::InsufficientSample { needed, got }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth(message.into())
    }

    /// Create a new statistics error
    pub fn statistics<S: Into<String>>(message: S) -> Self {
        Self::Statistics(message.into())
    }

    /// Create a new interruption error
    pub fn interrupted<S: Into<String>>(message: S) -> Self {
        Self::Interrupted(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Transport(_) => "TRANSPORT",
            Self::Protocol(_) => "PROTOCOL",
            Self::TreatmentFatal { .. } => "TREATMENT",
            Self::DatasetNotFound(_) => "DATASET",
            Self::InsufficientSample { .. } => "SAMPLE",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Auth(_) => "AUTH",
            Self::Statistics(_) => "STATS",
            Self::Interrupted(_) => "INTERRUPTED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Invocation-level failure that the scheduler turns into a failed measurement
    pub fn is_invocation_failure(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Protocol(_))
    }

    /// Check if error is recoverable (the run or pipeline can continue)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Protocol(_) | Self::InsufficientSample { .. } => true,
            Self::TreatmentFatal { .. } => true,
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) | Self::Auth(_) => false,
            Self::DatasetNotFound(_) | Self::Io(_) | Self::Statistics(_) => false,
            Self::Interrupted(_) | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file, environment variables or command line arguments.", msg)
            }
            Self::Transport(msg) => {
                format!("Request failed: {}\n\nSuggestion: Check your internet connection and the API base URLs.", msg)
            }
            Self::Protocol(msg) => {
                format!("The API answered with an error: {}\n\nSuggestion: Check the query and your token scopes.", msg)
            }
            Self::TreatmentFatal { treatment, message } => {
                format!("Treatment '{}' was abandoned: {}\n\nSuggestion: The remaining treatments still ran; inspect the partial results.", treatment, message)
            }
            Self::DatasetNotFound(msg) => {
                format!("No measurement data: {}\n\nSuggestion: Run the experiment first with `apx run`, or pass a file path to `apx analyze`.", msg)
            }
            Self::InsufficientSample { needed, got } => {
                format!("Only {} samples available, {} required.\n\nSuggestion: Increase the number of repetitions.", got, needed)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Check the format of your configuration values.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check file permissions and disk space.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check that the measurement file was produced by this tool.", msg)
            }
            Self::Auth(msg) => {
                format!("Authentication failed: {}\n\nSuggestion: Set GITHUB_TOKEN in the environment or in a .env file.", msg)
            }
            Self::Statistics(msg) => {
                format!("Statistics calculation failed: {}\n\nSuggestion: This may indicate insufficient or invalid measurement data.", msg)
            }
            Self::Interrupted(msg) => {
                format!("Run interrupted: {}\n\nPartial results were saved.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) | Self::DatasetNotFound(_) => 1,
            Self::Transport(_) | Self::Protocol(_) => 2,
            Self::Auth(_) => 4,
            Self::Io(_) => 5,
            Self::TreatmentFatal { .. } | Self::Statistics(_) | Self::InsufficientSample { .. } => 6,
            Self::Interrupted(_) => 130,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) | Self::DatasetNotFound(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Transport(_) | Self::Protocol(_) | Self::TreatmentFatal { .. } => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Auth(_) => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Io(_) | Self::Statistics(_) | Self::InsufficientSample { .. } | Self::Interrupted(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Self::auth(error.to_string());
            }
        }
        Self::transport(error.to_string())
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::parse(format!("Float parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(error: chrono::ParseError) -> Self {
        Self::parse(format!("Timestamp parse error: {}", error))
    }
}

// Anyhow integration
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let original_error = e.into();
            let context = f();
            match original_error {
                // keep the category so exit codes stay meaningful
                AppError::Io(msg) => AppError::io(format!("{}: {}", context, msg)),
                AppError::Parse(msg) => AppError::parse(format!("{}: {}", context, msg)),
                other => AppError::internal(format!("{}: {}", context, other)),
            }
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

/// Error reporter for structured error logging and user feedback
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());
        }
    }

    /// Get formatted error summary grouped by category
    pub fn format_error_summary(&self, errors: &[AppError]) -> String {
        if errors.is_empty() {
            return "No errors".to_string();
        }

        let mut summary = format!("Found {} error(s):", errors.len());

        let mut error_groups: std::collections::BTreeMap<&'static str, Vec<&AppError>> =
            std::collections::BTreeMap::new();
        for error in errors {
            error_groups.entry(error.category()).or_default().push(error);
        }

        for (category, group_errors) in error_groups {
            summary.push_str(&format!("\n  {}: {} error(s)", category, group_errors.len()));
            if self.verbose {
                for error in group_errors {
                    summary.push_str(&format!("\n    - {}", error));
                }
            }
        }

        summary
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}
