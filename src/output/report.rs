//! Plain-text analysis report (`analysis_summary.txt`)

use crate::{
    error::{AppError, Result},
    stats::Comparison,
    types::Metric,
};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const REPORT_FILE: &str = "analysis_summary.txt";

const WIDTH: usize = 70;

/// Everything the report states
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub source: &'a Path,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub rq_time: Option<&'a Comparison>,
    pub rq_size: Option<&'a Comparison>,
    pub alpha: f64,
    /// Emitted artifact names, relative to the output directory
    pub manifest: &'a [String],
}

pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn write(&self, input: &ReportInput<'_>) -> Result<PathBuf> {
        self.write_at(input, Local::now())
    }

    pub fn write_at(&self, input: &ReportInput<'_>, at: DateTime<Local>) -> Result<PathBuf> {
        let path = self.output_dir.join(REPORT_FILE);
        fs::write(&path, render_report(input, at))
            .map_err(|e| AppError::io(format!("Cannot write {}: {}", path.display(), e)))?;
        Ok(path)
    }
}

/// Render the report; only the `Date:` line depends on `at`
pub fn render_report(input: &ReportInput<'_>, at: DateTime<Local>) -> String {
    let mut out = String::new();
    let heavy = "=".repeat(WIDTH);

    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(out, "REST vs GraphQL EXPERIMENT - ANALYSIS SUMMARY");
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(out);
    let _ = writeln!(out, "Date: {}", at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Data file: {}", input.source.display());
    let _ = writeln!(out, "Total measurements: {}", input.total);
    let _ = writeln!(out, "Successful: {}", input.successful);
    let _ = writeln!(out, "Failed: {}", input.failed);

    write_question(&mut out, "RQ1: Response time (is GraphQL faster than REST?)", Metric::ResponseTime, input.rq_time, input.alpha);
    write_question(&mut out, "RQ2: Response size (is GraphQL smaller than REST?)", Metric::ResponseSize, input.rq_size, input.alpha);

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "-".repeat(WIDTH));
    let _ = writeln!(out, "Generated files:");
    for name in input.manifest {
        let _ = writeln!(out, "  - {}", name);
    }

    out
}

fn write_question(out: &mut String, title: &str, metric: Metric, comparison: Option<&Comparison>, alpha: f64) {
    let unit = metric.unit();

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "-".repeat(WIDTH));
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(WIDTH));

    let Some(c) = comparison else {
        let _ = writeln!(out, "Not enough data: a paradigm has no successful measurements");
        return;
    };

    let _ = writeln!(out, "REST mean: {:.2} {} (n={})", c.mean_a, unit, c.n_a);
    let _ = writeln!(out, "GraphQL mean: {:.2} {} (n={})", c.mean_b, unit, c.n_b);
    let _ = writeln!(out, "Difference (REST - GraphQL): {:.2} {}", c.difference, unit);
    if metric == Metric::ResponseSize {
        let _ = writeln!(out, "Reduction: {}", fixed(c.reduction_percent, 2, "%"));
    }
    let _ = writeln!(out, "Mann-Whitney p-value: {}", fixed(c.mann_whitney.p_value, 4, ""));
    let _ = writeln!(out, "Cohen's d: {}", fixed(c.cohens_d, 4, ""));

    let (better, claim) = match metric {
        Metric::ResponseTime => ("faster", "significantly faster"),
        Metric::ResponseSize => ("smaller", "significantly smaller"),
    };
    let conclusion = if c.significant {
        format!("GraphQL is {} than REST (p < {})", claim, alpha)
    } else {
        format!("No significant evidence that GraphQL is {} than REST (p >= {})", better, alpha)
    };
    let _ = writeln!(out, "Conclusion: {}", conclusion);
}

fn fixed(value: f64, decimals: usize, suffix: &str) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.*}{}", decimals, value, suffix)
    }
}
