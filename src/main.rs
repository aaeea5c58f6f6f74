//! API Paradigm Experiment - Main CLI Application
//!
//! Runs the paired REST/GraphQL measurement experiment, analyzes persisted
//! measurement files and validates the local setup.

use api_paradigm_experiment::{
    analysis::{Analyzer, Dataset},
    cli::{AnalyzeArgs, Cli, Command},
    client::{ClientSession, GraphQlClient, RestClient},
    config::{check_setup, display_config_summary, load_config, validate_config, validation::estimated_run_time},
    error::{AppError, ErrorReporter, Result},
    harness::{RunResolution, Scheduler, SchedulerConfig, Treatment},
    logging::LoggerFactory,
    models::{Config, ResultSet},
    output::ConsoleFormatter,
    store::{self, ResultStore},
    PKG_NAME, VERSION,
};
use clap::Parser;
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose || cli.debug);

    match run_application(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            reporter.report_error(&e);
            print_error_suggestions(&e);
            process::exit(e.exit_code());
        }
    }
}

/// Main application logic; returns the process exit code
async fn run_application(cli: Cli) -> Result<i32> {
    if cli.debug {
        println!("{} v{}", PKG_NAME, VERSION);
        println!("{}", cli.get_config_summary());
    }

    let config = load_config(cli.clone())?;

    if config.debug {
        println!("Configuration loaded successfully:");
        println!("{}", display_config_summary(&config));
        println!();
    }

    let factory = LoggerFactory::new(config.clone());

    match cli.command {
        Command::Run(_) => run_experiment(&config, &factory).await,
        Command::Analyze(args) => run_analysis(&config, args, &factory).await,
        Command::Check => run_check(&config).await,
    }
}

async fn run_experiment(config: &Config, factory: &LoggerFactory) -> Result<i32> {
    for warning in validate_config(config)? {
        eprintln!("{}", warning.format(config.enable_color));
    }
    if config.verbose {
        println!("Estimated duration: ~{}s", estimated_run_time(config).as_secs());
    }

    let mut rest = ClientSession::new(Box::new(RestClient::new(config)?));
    let mut graphql = ClientSession::new(Box::new(GraphQlClient::new(config)?));

    let error_logger = factory.create_error_logger();
    let mut scheduler = Scheduler::new(
        SchedulerConfig::from_config(config),
        factory.create_experiment_logger(),
        factory.create_error_logger(),
    );
    let treatments = Treatment::standard_set();
    let mut results = ResultSet::new();

    let outcome = {
        let rest_client = rest.client()?;
        let graphql_client = graphql.client()?;
        let run = scheduler.run(&treatments, rest_client, graphql_client, &mut results);

        // Dropping `run` abandons the in-flight invocation; recorded results stay
        tokio::select! {
            report = run => report,
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => Err(AppError::interrupted("Run interrupted by user")),
                Err(e) => Err(AppError::internal(format!("Cannot listen for Ctrl-C: {}", e))),
            },
        }
    };

    let resolution = RunResolution::from_result(outcome);

    let flushed = ResultStore::new(&config.results_dir).flush(&results, resolution.outcome);
    rest.close();
    graphql.close();
    let files = flushed?;

    if let Some(e) = &resolution.failure {
        let csv = files.csv.display().to_string();
        error_logger.log_top_level(e, Some(csv.as_str())).await;
    }

    let formatter = ConsoleFormatter::new(config.enable_color);
    println!("{}", formatter.format_run(resolution.outcome, resolution.report.as_ref(), &files));

    Ok(resolution.exit_code())
}

async fn run_analysis(config: &Config, args: AnalyzeArgs, factory: &LoggerFactory) -> Result<i32> {
    let data_file = match args.data_file {
        Some(path) => path,
        None => store::find_latest(&config.results_dir)?,
    };
    let output_dir = args.output_dir.unwrap_or_else(|| config.results_dir.clone());

    if config.verbose {
        println!("Analyzing {}", data_file.display());
    }

    let dataset = Dataset::load(&data_file)?;
    let artifacts = Analyzer::new(output_dir, factory.create_performance_logger())
        .run(&dataset)
        .await?;

    let formatter = ConsoleFormatter::new(config.enable_color);
    println!("{}", formatter.format_analysis(&artifacts));
    Ok(0)
}

async fn run_check(config: &Config) -> Result<i32> {
    let report = check_setup(config).await?;
    println!("{}", report.format(config.enable_color));
    Ok(if report.all_successful() { 0 } else { 1 })
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Set GITHUB_TOKEN in the environment or a .env file");
            eprintln!("  - Verify URL formats (must start with http:// or https://)");
            eprintln!("  - Run `apx check` to validate the setup");
        }
        AppError::DatasetNotFound(_) => {
            eprintln!();
            eprintln!("Dataset help:");
            eprintln!("  - Pass a measurement file: apx analyze results/experiment_<stamp>.csv");
            eprintln!("  - Or run `apx run` first to produce one");
        }
        _ => {}
    }
}
