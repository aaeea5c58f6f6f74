//! Statistical analysis pipeline over a persisted measurement file
//!
//! Stages run in a fixed order against an immutable [`Dataset`], each
//! writing one artifact into the output directory:
//! descriptive, normality, homogeneity, RQ1 (time), RQ2 (size), ANOVA,
//! visualization aggregates and finally the text report.

pub mod dataset;
pub mod tables;

pub use dataset::Dataset;
pub use tables::{QuestionTable, StageTable, OVERALL_SCOPE};

use crate::{
    defaults::SIGNIFICANCE_LEVEL,
    error::{AppError, Result},
    logging::PerformanceLogger,
    output::{ReportGenerator, ReportInput, REPORT_FILE},
    stats::Comparison,
    store::CsvTable,
    types::Metric,
};
use std::fs;
use std::path::{Path, PathBuf};

pub const DESCRIPTIVE_FILE: &str = "descriptive_statistics.csv";
pub const NORMALITY_FILE: &str = "normality_test.csv";
pub const LEVENE_FILE: &str = "levene_test.csv";
pub const RQ1_FILE: &str = "rq1_analysis.csv";
pub const RQ2_FILE: &str = "rq2_analysis.csv";
pub const ANOVA_TIME_FILE: &str = "anova_time.csv";
pub const ANOVA_SIZE_FILE: &str = "anova_size.csv";
pub const VISUALIZATIONS_DIR: &str = "visualizations";

/// Everything one analysis run produced
#[derive(Debug, Clone)]
pub struct AnalysisArtifacts {
    pub output_dir: PathBuf,
    /// Written files in stage order, the report last
    pub files: Vec<PathBuf>,
    pub rq_time: Option<Comparison>,
    pub rq_size: Option<Comparison>,
}

impl AnalysisArtifacts {
    pub fn report(&self) -> PathBuf {
        self.output_dir.join(REPORT_FILE)
    }
}

pub struct Analyzer {
    output_dir: PathBuf,
    alpha: f64,
    perf: PerformanceLogger,
}

impl Analyzer {
    pub fn new(output_dir: impl Into<PathBuf>, perf: PerformanceLogger) -> Self {
        Self {
            output_dir: output_dir.into(),
            alpha: SIGNIFICANCE_LEVEL,
            perf,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run every stage; the dataset is only read
    pub async fn run(&mut self, dataset: &Dataset) -> Result<AnalysisArtifacts> {
        let visualizations = self.output_dir.join(VISUALIZATIONS_DIR);
        fs::create_dir_all(&visualizations).map_err(|e| {
            AppError::io(format!("Cannot create output directory {}: {}", visualizations.display(), e))
        })?;

        let mut files = Vec::new();

        self.perf.start_timing("descriptive").await;
        let table = tables::descriptive(dataset);
        files.push(self.write_table(DESCRIPTIVE_FILE, &table)?);
        self.finish_stage("descriptive", table.len(), 0).await;

        self.perf.start_timing("normality").await;
        let stage = tables::normality(dataset, self.alpha)?;
        files.push(self.write_table(NORMALITY_FILE, &stage.table)?);
        self.finish_stage("normality", stage.table.len(), stage.skipped).await;

        self.perf.start_timing("homogeneity").await;
        let stage = tables::homogeneity(dataset, self.alpha)?;
        files.push(self.write_table(LEVENE_FILE, &stage.table)?);
        self.finish_stage("homogeneity", stage.table.len(), stage.skipped).await;

        self.perf.start_timing("rq1").await;
        let rq1 = tables::research_question(dataset, Metric::ResponseTime, self.alpha)?;
        files.push(self.write_table(RQ1_FILE, &rq1.table)?);
        self.finish_stage("rq1", rq1.table.len(), rq1.skipped).await;

        self.perf.start_timing("rq2").await;
        let rq2 = tables::research_question(dataset, Metric::ResponseSize, self.alpha)?;
        files.push(self.write_table(RQ2_FILE, &rq2.table)?);
        self.finish_stage("rq2", rq2.table.len(), rq2.skipped).await;

        self.perf.start_timing("anova").await;
        let time = tables::anova(dataset, Metric::ResponseTime)?;
        let size = tables::anova(dataset, Metric::ResponseSize)?;
        files.push(self.write_table(ANOVA_TIME_FILE, &time)?);
        files.push(self.write_table(ANOVA_SIZE_FILE, &size)?);
        self.finish_stage("anova", time.len() + size.len(), 0).await;

        self.perf.start_timing("visualizations").await;
        let mut rows = 0;
        for metric in Metric::ALL {
            let table = tables::group_aggregates(dataset, metric);
            rows += table.len();
            let name = format!("{}/{}_by_group.csv", VISUALIZATIONS_DIR, metric.column());
            files.push(self.write_table(&name, &table)?);
        }
        self.finish_stage("visualizations", rows, 0).await;

        self.perf.start_timing("report").await;
        let manifest = manifest();
        let input = ReportInput {
            source: dataset.source(),
            total: dataset.total(),
            successful: dataset.successful(),
            failed: dataset.failed(),
            rq_time: rq1.overall.as_ref(),
            rq_size: rq2.overall.as_ref(),
            alpha: self.alpha,
            manifest: &manifest,
        };
        files.push(ReportGenerator::new(&self.output_dir).write(&input)?);
        self.finish_stage("report", 1, 0).await;

        Ok(AnalysisArtifacts {
            output_dir: self.output_dir.clone(),
            files,
            rq_time: rq1.overall,
            rq_size: rq2.overall,
        })
    }

    async fn finish_stage(&mut self, stage: &str, rows: usize, skipped: usize) {
        self.perf.end_timing(stage).await;
        self.perf.log_stage_complete(stage, rows, skipped).await;
    }

    fn write_table(&self, name: &str, table: &CsvTable) -> Result<PathBuf> {
        let path = self.output_dir.join(name);
        fs::write(&path, table.render())
            .map_err(|e| AppError::io(format!("Cannot write {}: {}", path.display(), e)))?;
        Ok(path)
    }
}

/// Artifact names listed in the report
fn manifest() -> Vec<String> {
    [
        DESCRIPTIVE_FILE,
        NORMALITY_FILE,
        LEVENE_FILE,
        RQ1_FILE,
        RQ2_FILE,
        ANOVA_TIME_FILE,
        ANOVA_SIZE_FILE,
    ]
    .iter()
    .map(|name| name.to_string())
    .chain([format!("{}/", VISUALIZATIONS_DIR), REPORT_FILE.to_string()])
    .collect()
}
