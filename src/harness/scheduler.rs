//! Treatment scheduler: repeated, optionally shuffled, paired execution

use super::recorder::Recorder;
use crate::{
    client::{ApiClient, Subject},
    error::{AppError, Result},
    logging::{ErrorEventLogger, ExperimentLogger},
    models::{Config, ResultSet},
    types::{QueryType, RunOutcome},
};
use futures::FutureExt;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::any::Any;
use std::ops::RangeInclusive;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

/// Logins sampled by the user-centred treatments
pub const USER_LOGINS: [&str; 5] = ["torvalds", "gvanrossum", "mojombo", "defunkt", "pjhyett"];

/// Repository searches sampled by the filter treatment
pub const FILTER_QUERIES: [&str; 5] = [
    "language:python stars:>10000",
    "language:javascript stars:>5000",
    "language:java stars:>3000",
    "language:go stars:>2000",
    "topic:machine-learning stars:>1000",
];

/// Pages sampled by the pagination treatment
pub const PAGE_RANGE: RangeInclusive<u32> = 1..=3;

/// One query shape with its subject pool
#[derive(Debug, Clone, PartialEq)]
pub struct Treatment {
    pub query_type: QueryType,
    pub pool: Vec<String>,
    pub pages: Option<RangeInclusive<u32>>,
}

impl Treatment {
    pub fn new<S: Into<String>>(query_type: QueryType, pool: impl IntoIterator<Item = S>) -> Self {
        Self {
            query_type,
            pool: pool.into_iter().map(Into::into).collect(),
            pages: None,
        }
    }

    pub fn with_pages(mut self, pages: RangeInclusive<u32>) -> Self {
        self.pages = Some(pages);
        self
    }

    /// The four treatments in canonical order
    pub fn standard_set() -> Vec<Treatment> {
        vec![
            Treatment::new(QueryType::Simple, USER_LOGINS),
            Treatment::new(QueryType::Relationship, USER_LOGINS),
            Treatment::new(QueryType::Filter, FILTER_QUERIES),
            Treatment::new(QueryType::Pagination, USER_LOGINS).with_pages(PAGE_RANGE),
        ]
    }

    pub fn query_name(&self) -> &'static str {
        self.query_type.operation_name()
    }

    /// Draw a subject uniformly, with replacement
    pub fn sample_subject<R: Rng>(&self, rng: &mut R) -> Result<Subject> {
        let key = self.pool.choose(rng).ok_or_else(|| {
            AppError::treatment_fatal(self.query_type.as_str(), "subject pool is empty")
        })?;

        Ok(match &self.pages {
            Some(pages) => Subject::with_page(key.clone(), rng.gen_range(pages.clone())),
            None => Subject::new(key.clone()),
        })
    }
}

/// What a failed invocation does to its treatment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Record the failure and keep going
    #[default]
    Continue,
    /// Record the failure, then abandon the treatment
    AbortTreatment,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub repetitions: u32,
    pub randomize: bool,
    /// Pause awaited after every invocation
    pub request_delay: Duration,
    pub error_policy: ErrorPolicy,
    /// Fixed RNG seed; entropy when unset
    pub seed: Option<u64>,
}

impl SchedulerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            repetitions: config.repetitions,
            randomize: config.randomize,
            request_delay: config.request_delay(),
            error_policy: ErrorPolicy::Continue,
            seed: None,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Summary of one scheduler run; the measurements live in the caller's `ResultSet`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Treatment order actually executed
    pub order: Vec<QueryType>,
    /// Treatments abandoned after a fatal failure
    pub abandoned: Vec<QueryType>,
    pub recorded: usize,
    pub failed: usize,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.abandoned.is_empty()
    }
}

/// How a run ended: the flush prefix, the report if it finished, the error otherwise
#[derive(Debug)]
pub struct RunResolution {
    pub outcome: RunOutcome,
    pub report: Option<RunReport>,
    pub failure: Option<AppError>,
}

impl RunResolution {
    pub fn from_result(result: Result<RunReport>) -> Self {
        match result {
            Ok(report) => Self {
                outcome: RunOutcome::Completed,
                report: Some(report),
                failure: None,
            },
            Err(e @ AppError::Interrupted(_)) => Self {
                outcome: RunOutcome::Interrupted,
                report: None,
                failure: Some(e),
            },
            Err(e) => Self {
                outcome: RunOutcome::Errored,
                report: None,
                failure: Some(e),
            },
        }
    }

    /// Process exit code: 0 on completion, the error's code otherwise
    pub fn exit_code(&self) -> i32 {
        self.failure.as_ref().map_or(0, AppError::exit_code)
    }
}

pub struct Scheduler {
    config: SchedulerConfig,
    rng: StdRng,
    logger: ExperimentLogger,
    error_logger: ErrorEventLogger,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, logger: ExperimentLogger, error_logger: ErrorEventLogger) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            config,
            rng,
            logger,
            error_logger,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Shuffle the treatments once when randomizing; never reorders repetitions
    pub fn plan(&mut self, treatments: &[Treatment]) -> Vec<Treatment> {
        let mut order = treatments.to_vec();
        if self.config.randomize {
            order.shuffle(&mut self.rng);
        }
        order
    }

    /// Execute every treatment, appending to `results` as measurements are taken.
    ///
    /// `results` is owned by the caller so that whatever was recorded survives
    /// an interruption that drops this future.
    pub async fn run(
        &mut self,
        treatments: &[Treatment],
        rest: &dyn ApiClient,
        graphql: &dyn ApiClient,
        results: &mut ResultSet,
    ) -> Result<RunReport> {
        if self.config.repetitions == 0 {
            return Err(AppError::validation("Repetitions must be a positive integer"));
        }

        let plan = self.plan(treatments);
        let order: Vec<QueryType> = plan.iter().map(|t| t.query_type).collect();
        self.logger
            .log_run_started(&order, self.config.repetitions, self.config.randomize)
            .await;

        let mut report = RunReport {
            order,
            ..RunReport::default()
        };

        for (index, treatment) in plan.iter().enumerate() {
            self.logger
                .log_treatment_started(treatment.query_type, index, plan.len())
                .await;

            let before = results.len();
            let outcome = AssertUnwindSafe(self.run_treatment(treatment, rest, graphql, results))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(error)) => self.abandon(treatment.query_type, error, &mut report).await,
                Err(payload) => {
                    let error = AppError::treatment_fatal(
                        treatment.query_type.as_str(),
                        format!("panicked: {}", panic_message(payload.as_ref())),
                    );
                    self.abandon(treatment.query_type, error, &mut report).await;
                }
            }

            // Rows recorded before an abandonment still count
            let recorded = results.len() - before;
            let failed = results.as_slice()[before..].iter().filter(|m| !m.success).count();
            report.recorded += recorded;
            report.failed += failed;

            self.logger
                .log_treatment_finished(treatment.query_type, recorded, failed)
                .await;
        }

        self.logger
            .log_run_finished(report.recorded, report.failed, &report.abandoned)
            .await;

        Ok(report)
    }

    async fn run_treatment(
        &mut self,
        treatment: &Treatment,
        rest: &dyn ApiClient,
        graphql: &dyn ApiClient,
        results: &mut ResultSet,
    ) -> Result<()> {
        let repetitions = self.config.repetitions;

        for repetition in 0..repetitions {
            let subject = treatment.sample_subject(&mut self.rng)?;

            // A strictly before B, same subject
            for client in [rest, graphql] {
                let outcome = Recorder::record(client, treatment.query_type, &subject).await;
                let (measurement, error) = outcome.into_parts();

                self.logger
                    .log_measurement(&measurement, repetition, repetitions)
                    .await;
                results.push(measurement);

                self.pause().await;

                if let Some(error) = error {
                    if self.config.error_policy == ErrorPolicy::AbortTreatment {
                        return Err(AppError::treatment_fatal(treatment.query_type.as_str(), error.to_string()));
                    }
                }
            }
        }

        Ok(())
    }

    async fn pause(&self) {
        if !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }
    }

    async fn abandon(&self, query_type: QueryType, error: AppError, report: &mut RunReport) {
        let error = match error {
            fatal @ AppError::TreatmentFatal { .. } => fatal,
            other => AppError::treatment_fatal(query_type.as_str(), other.to_string()),
        };
        self.error_logger.log_treatment_fatal(query_type, &error).await;
        report.abandoned.push(query_type);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Invocation;
    use crate::types::ApiType;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    type CallLog = Arc<Mutex<Vec<(ApiType, QueryType, Subject)>>>;

    #[test]
    fn test_resolution_of_completed_run() {
        let resolution = RunResolution::from_result(Ok(RunReport::default()));
        assert_eq!(resolution.outcome, RunOutcome::Completed);
        assert!(resolution.report.is_some());
        assert_eq!(resolution.exit_code(), 0);
    }

    #[test]
    fn test_resolution_of_interrupted_run() {
        let resolution = RunResolution::from_result(Err(AppError::interrupted("Run interrupted by user")));
        assert_eq!(resolution.outcome, RunOutcome::Interrupted);
        assert_eq!(resolution.outcome.file_prefix(), "experiment_partial");
        assert!(resolution.report.is_none());
        assert_eq!(resolution.exit_code(), 130);
    }

    #[test]
    fn test_resolution_of_failed_run() {
        let resolution = RunResolution::from_result(Err(AppError::internal("scheduler state lost")));
        assert_eq!(resolution.outcome, RunOutcome::Errored);
        assert_eq!(resolution.outcome.file_prefix(), "experiment_error");
        assert_ne!(resolution.exit_code(), 0);
        assert_eq!(resolution.exit_code(), 99);
    }

    struct StubClient {
        api_type: ApiType,
        calls: CallLog,
        fail_on: Option<QueryType>,
        panic_on: Option<QueryType>,
    }

    impl StubClient {
        fn new(api_type: ApiType, calls: CallLog) -> Self {
            Self {
                api_type,
                calls,
                fail_on: None,
                panic_on: None,
            }
        }

        fn answer(&self, query_type: QueryType, subject: Subject) -> Result<Invocation> {
            if self.panic_on == Some(query_type) {
                panic!("stub exploded on {}", query_type);
            }
            self.calls.lock().unwrap().push((self.api_type, query_type, subject));
            if self.fail_on == Some(query_type) {
                return Err(AppError::transport("HTTP 502 Bad Gateway"));
            }
            Ok(Invocation {
                payload: serde_json::json!({}),
                elapsed: Duration::from_millis(3),
                byte_size: match self.api_type {
                    ApiType::Rest => 1000,
                    ApiType::GraphQl => 400,
                },
            })
        }
    }

    #[async_trait]
    impl ApiClient for StubClient {
        fn api_type(&self) -> ApiType {
            self.api_type
        }

        async fn get_simple(&self, login: &str) -> Result<Invocation> {
            self.answer(QueryType::Simple, Subject::new(login))
        }

        async fn get_with_relations(&self, login: &str) -> Result<Invocation> {
            self.answer(QueryType::Relationship, Subject::new(login))
        }

        async fn search_filtered(&self, query: &str) -> Result<Invocation> {
            self.answer(QueryType::Filter, Subject::new(query))
        }

        async fn get_paginated(&self, login: &str, page: u32) -> Result<Invocation> {
            self.answer(QueryType::Pagination, Subject::with_page(login, page))
        }
    }

    fn scheduler(repetitions: u32, randomize: bool, seed: u64) -> Scheduler {
        let mut config = Config::default();
        config.enable_color = false;
        let scheduler_config = SchedulerConfig {
            repetitions,
            randomize,
            request_delay: Duration::ZERO,
            error_policy: ErrorPolicy::Continue,
            seed: Some(seed),
        };
        Scheduler::new(
            scheduler_config,
            ExperimentLogger::new(&config).with_progress(false),
            ErrorEventLogger::new(&config),
        )
    }

    fn stubs() -> (StubClient, StubClient, CallLog) {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        (
            StubClient::new(ApiType::Rest, calls.clone()),
            StubClient::new(ApiType::GraphQl, calls.clone()),
            calls,
        )
    }

    #[tokio::test]
    async fn test_complete_run_has_eight_measurements_per_repetition() {
        let (rest, graphql, _) = stubs();
        let mut scheduler = scheduler(4, true, 7);
        let mut results = ResultSet::new();

        let report = scheduler
            .run(&Treatment::standard_set(), &rest, &graphql, &mut results)
            .await
            .unwrap();

        assert_eq!(results.len(), 8 * 4);
        assert_eq!(report.recorded, 32);
        assert_eq!(report.failed, 0);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_pairs_run_a_then_b_on_same_subject() {
        let (rest, graphql, calls) = stubs();
        let mut scheduler = scheduler(5, false, 11);
        let mut results = ResultSet::new();

        scheduler
            .run(&Treatment::standard_set(), &rest, &graphql, &mut results)
            .await
            .unwrap();

        for pair in results.as_slice().chunks(2) {
            assert_eq!(pair[0].api_type, ApiType::Rest);
            assert_eq!(pair[1].api_type, ApiType::GraphQl);
            assert_eq!(pair[0].query_type, pair[1].query_type);
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }

        let calls = calls.lock().unwrap();
        for pair in calls.chunks(2) {
            assert_eq!(pair[0].2, pair[1].2);
        }
        for (_, query_type, subject) in calls.iter() {
            match query_type {
                QueryType::Filter => assert!(FILTER_QUERIES.contains(&subject.key.as_str())),
                QueryType::Pagination => {
                    assert!(USER_LOGINS.contains(&subject.key.as_str()));
                    assert!(subject.page.is_some_and(|p| PAGE_RANGE.contains(&p)));
                }
                _ => assert!(USER_LOGINS.contains(&subject.key.as_str())),
            }
        }
    }

    #[tokio::test]
    async fn test_unrandomized_order_is_canonical() {
        let (rest, graphql, _) = stubs();
        let mut scheduler = scheduler(1, false, 3);
        let mut results = ResultSet::new();

        let report = scheduler
            .run(&Treatment::standard_set(), &rest, &graphql, &mut results)
            .await
            .unwrap();

        assert_eq!(report.order, QueryType::ALL.to_vec());
        let seen: Vec<QueryType> = results.iter().step_by(2).map(|m| m.query_type).collect();
        assert_eq!(seen, QueryType::ALL.to_vec());
    }

    #[test]
    fn test_randomized_order_varies_across_runs() {
        let orders: HashSet<Vec<QueryType>> = (0..32)
            .map(|seed| {
                scheduler(1, true, seed)
                    .plan(&Treatment::standard_set())
                    .iter()
                    .map(|t| t.query_type)
                    .collect()
            })
            .collect();

        assert!(orders.len() > 1);
        for order in &orders {
            let mut sorted = order.clone();
            sorted.sort();
            assert_eq!(sorted, QueryType::ALL.to_vec());
        }
    }

    #[tokio::test]
    async fn test_failed_invocations_become_data() {
        let (rest, mut graphql, _) = stubs();
        graphql.fail_on = Some(QueryType::Filter);
        let mut scheduler = scheduler(3, false, 5);
        let mut results = ResultSet::new();

        let report = scheduler
            .run(&Treatment::standard_set(), &rest, &graphql, &mut results)
            .await
            .unwrap();

        assert_eq!(results.len(), 24);
        assert_eq!(report.failed, 3);
        assert!(report.is_complete());
        for m in results.iter().filter(|m| !m.success) {
            assert_eq!(m.api_type, ApiType::GraphQl);
            assert_eq!(m.query_type, QueryType::Filter);
            assert_eq!(m.response_time_ms, 0.0);
            assert_eq!(m.response_size_bytes, 0);
            assert!(m.error_msg.as_deref().is_some_and(|e| !e.is_empty()));
        }
    }

    #[tokio::test]
    async fn test_panicking_treatment_is_abandoned() {
        let (mut rest, graphql, _) = stubs();
        rest.panic_on = Some(QueryType::Relationship);
        let mut scheduler = scheduler(2, false, 9);
        let mut results = ResultSet::new();

        let report = scheduler
            .run(&Treatment::standard_set(), &rest, &graphql, &mut results)
            .await
            .unwrap();

        assert_eq!(report.abandoned, vec![QueryType::Relationship]);
        assert_eq!(results.len(), 3 * 2 * 2);
        assert!(results.iter().all(|m| m.query_type != QueryType::Relationship));
    }

    #[tokio::test]
    async fn test_abort_policy_stops_treatment_after_first_failure() {
        let (mut rest, graphql, _) = stubs();
        rest.fail_on = Some(QueryType::Simple);
        let mut scheduler = scheduler(3, false, 1);
        scheduler.config.error_policy = ErrorPolicy::AbortTreatment;
        let mut results = ResultSet::new();

        let report = scheduler
            .run(&Treatment::standard_set(), &rest, &graphql, &mut results)
            .await
            .unwrap();

        assert_eq!(report.abandoned, vec![QueryType::Simple]);
        let simple: Vec<_> = results.iter().filter(|m| m.query_type == QueryType::Simple).collect();
        assert_eq!(simple.len(), 1);
        assert!(!simple[0].success);
        assert_eq!(results.len(), 1 + 3 * 2 * 3);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_empty_pool_abandons_treatment() {
        let (rest, graphql, _) = stubs();
        let mut scheduler = scheduler(2, false, 2);
        let treatments = vec![
            Treatment::new(QueryType::Simple, Vec::<String>::new()),
            Treatment::new(QueryType::Filter, FILTER_QUERIES),
        ];
        let mut results = ResultSet::new();

        let report = scheduler.run(&treatments, &rest, &graphql, &mut results).await.unwrap();

        assert_eq!(report.abandoned, vec![QueryType::Simple]);
        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn test_zero_repetitions_rejected() {
        let (rest, graphql, _) = stubs();
        let mut scheduler = scheduler(0, false, 0);
        let mut results = ResultSet::new();

        let error = scheduler
            .run(&Treatment::standard_set(), &rest, &graphql, &mut results)
            .await
            .unwrap_err();
        assert_eq!(error.category(), "VALIDATION");
    }

    #[tokio::test]
    async fn test_dropped_run_keeps_partial_results() {
        let (rest, graphql, _) = stubs();
        let mut scheduler = scheduler(5, false, 4);
        scheduler.config.request_delay = Duration::from_millis(20);
        let mut results = ResultSet::new();

        let interrupted = tokio::time::timeout(
            Duration::from_millis(90),
            scheduler.run(&Treatment::standard_set(), &rest, &graphql, &mut results),
        )
        .await;

        assert!(interrupted.is_err());
        assert!(!results.is_empty());
        assert!(results.len() < 40);
    }
}
