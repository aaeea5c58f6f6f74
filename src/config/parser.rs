//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::{Cli, Command},
    config::env::EnvManager,
    error::Result,
    models::Config,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        // .env values land in the process environment without overriding it
        EnvManager::load_env_file(self.cli.debug)?;

        self.build_from(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an explicit variable lookup
    pub fn build_from<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        config.merge_from_source(lookup)?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        if self.cli.no_color {
            config.enable_color = false;
        }

        // CLI-only flags
        config.verbose = self.cli.verbose || self.cli.debug;
        config.debug = self.cli.debug;

        match &self.cli.command {
            Command::Run(args) => {
                if let Some(n) = args.repetitions {
                    config.repetitions = n;
                }
                if args.no_randomize {
                    config.randomize = false;
                }
                if let Some(ms) = args.delay_ms {
                    config.request_delay_ms = ms;
                }
                if let Some(dir) = &args.results_dir {
                    config.results_dir = dir.clone();
                }
            }
            Command::Analyze(args) => {
                if let Some(dir) = &args.results_dir {
                    config.results_dir = dir.clone();
                }
            }
            Command::Check => {}
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!(
        "GitHub Token: {}",
        config.masked_token().unwrap_or_else(|| "(not set)".to_string())
    ));
    summary.push(format!("REST Base URL: {}", config.rest_base_url));
    summary.push(format!("GraphQL URL: {}", config.graphql_url));
    summary.push(format!("Repetitions: {}", config.repetitions));
    summary.push(format!("Randomize: {}", config.randomize));
    summary.push(format!("Request Delay: {}ms", config.request_delay_ms));
    summary.push(format!("Timeout: {}s", config.timeout_seconds));
    summary.push(format!("Results Dir: {}", config.results_dir.display()));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
