//! API Paradigm Experiment
//!
//! A controlled experiment comparing a resource-oriented API (REST) with a
//! query-oriented API (GraphQL) across four query shapes. The harness
//! collects paired latency and payload measurements; the analysis pipeline
//! evaluates them with descriptive statistics, diagnostics, one-sided
//! hypothesis tests and a two-way ANOVA.

pub mod analysis;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod harness;
pub mod logging;
pub mod models;
pub mod output;
pub mod stats;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use analysis::{AnalysisArtifacts, Analyzer, Dataset};
pub use client::{ApiClient, ClientSession, GraphQlClient, Invocation, RestClient, Subject};
pub use error::{AppError, Result};
pub use harness::{ErrorPolicy, RunReport, Scheduler, SchedulerConfig, Treatment};
pub use models::{Config, Measurement, ResultSet};
pub use store::ResultStore;
pub use types::{ApiType, Metric, QueryType, RunOutcome};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_REPETITIONS: u32 = 30;
    pub const DEFAULT_RANDOMIZE: bool = true;
    pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(1);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_RESULTS_DIR: &str = "results";
    pub const DEFAULT_REST_BASE_URL: &str = "https://api.github.com";
    pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    pub const USER_AGENT: &str = concat!("api-paradigm-experiment/", env!("CARGO_PKG_VERSION"));

    /// Threshold for every significance decision of the analysis
    pub const SIGNIFICANCE_LEVEL: f64 = 0.05;
}
