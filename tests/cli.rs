//! Binary-level CLI tests: exit codes and produced files

use api_paradigm_experiment::{
    models::{Measurement, ResultSet},
    store::{CsvTable, ResultStore},
    types::{ApiType, QueryType, RunOutcome},
};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Command isolated from the caller's environment and `.env`
fn create_test_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("apx").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("GITHUB_TOKEN")
        .env_remove("RESULTS_DIR")
        .env_remove("REST_BASE_URL")
        .env_remove("GRAPHQL_URL")
        .env("NO_COLOR", "1");
    cmd
}

fn write_dataset(dir: &TempDir) -> std::path::PathBuf {
    let mut results = ResultSet::new();
    for ms in [100, 110, 120, 130] {
        results.push(Measurement::success(ApiType::Rest, QueryType::Simple, "get_user", Duration::from_millis(ms), 1000));
        results.push(Measurement::success(ApiType::GraphQl, QueryType::Simple, "get_user", Duration::from_millis(ms - 30), 400));
    }
    ResultStore::new(dir.path().join("results"))
        .flush(&results, RunOutcome::Completed)
        .unwrap()
        .csv
}

#[test]
fn test_version_banner() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir).assert().failure();
}

#[test]
fn test_analyze_missing_file_exits_1() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("analyze")
        .arg(dir.path().join("missing.csv"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Dataset not found"));
}

#[test]
fn test_analyze_empty_results_dir_exits_1() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("empty")).unwrap();
    create_test_cmd(&dir)
        .arg("analyze")
        .arg("--results-dir")
        .arg(dir.path().join("empty"))
        .assert()
        .code(1);
}

#[test]
fn test_analyze_latest_dataset() {
    let dir = TempDir::new().unwrap();
    write_dataset(&dir);
    let out = dir.path().join("analysis");

    create_test_cmd(&dir)
        .arg("--no-color")
        .arg("analyze")
        .arg("--results-dir")
        .arg(dir.path().join("results"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Analysis finished"));

    for name in ["descriptive_statistics.csv", "rq1_analysis.csv", "anova_size.csv", "analysis_summary.txt"] {
        assert!(out.join(name).is_file(), "{} missing", name);
    }
    assert!(out.join("visualizations").is_dir());
}

#[test]
fn test_run_without_token_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["run", "-n", "1", "--delay-ms", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("GITHUB_TOKEN"));
}

#[test]
fn test_run_rejects_zero_repetitions() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["run", "--repetitions", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Repetitions must be greater than 0"));
}

/// Every REST GET and GraphQL POST succeeds with a small JSON body
async fn mock_github() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"login":"octocat","name":"hello-world"}]"#))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":{"user":{"login":"octocat"}}}"#))
        .mount(&server)
        .await;
    server
}

#[tokio::test(flavor = "multi_thread")]
async fn test_completed_run_flushes_experiment_files() {
    let server = mock_github().await;
    let dir = TempDir::new().unwrap();
    let results_dir = dir.path().join("results");

    let mut cmd = create_test_cmd(&dir);
    cmd.env("GITHUB_TOKEN", "ghp_test_token_1234")
        .env("REST_BASE_URL", server.uri())
        .env("GRAPHQL_URL", format!("{}/graphql", server.uri()))
        .args(["run", "-n", "1", "--delay-ms", "0", "--results-dir"])
        .arg(&results_dir);
    let output = tokio::task::spawn_blocking(move || cmd.output()).await.unwrap().unwrap();

    output
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Experiment finished"))
        .stdout(predicate::str::contains("completed"));

    let mut names: Vec<String> = std::fs::read_dir(&results_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 3, "{:?}", names);

    let stamp = regex::Regex::new(r"^experiment_\d{8}_\d{6}(\.csv|\.json|_summary\.txt)$").unwrap();
    assert!(names.iter().all(|name| stamp.is_match(name)), "{:?}", names);

    let csv = names.iter().find(|name| name.ends_with(".csv")).unwrap();
    let table = CsvTable::parse(&std::fs::read_to_string(results_dir.join(csv)).unwrap()).unwrap();
    // Four treatments, one REST/GraphQL pair each
    assert_eq!(table.len(), 8);
    let success = table.column_index("success").unwrap();
    assert!(table.rows().iter().all(|row| row[success] == "true"));
}
