//! Colored terminal summaries for the run, analyze and check commands

use crate::{
    analysis::AnalysisArtifacts,
    harness::RunReport,
    stats::Comparison,
    store::FlushedFiles,
    types::{Metric, RunOutcome},
};
use colored::*;
use std::fmt::Write as _;

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            muted: Color::BrightBlack,
        }
    }
}

pub struct ConsoleFormatter {
    enable_color: bool,
    scheme: ColorScheme,
}

impl ConsoleFormatter {
    pub fn new(enable_color: bool) -> Self {
        Self {
            enable_color,
            scheme: ColorScheme::default(),
        }
    }

    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn title(&self, text: &str) -> ColoredString {
        if self.enable_color {
            text.bold().color(self.scheme.header)
        } else {
            text.normal()
        }
    }

    fn header(&self, out: &mut String, title: &str) {
        let _ = writeln!(out, "{}", self.colorize(&"=".repeat(60), self.scheme.muted));
        let _ = writeln!(out, "{}", self.title(title));
        let _ = writeln!(out, "{}", self.colorize(&"=".repeat(60), self.scheme.muted));
    }

    /// Outcome of an experiment run and the flushed artifacts
    pub fn format_run(&self, outcome: RunOutcome, report: Option<&RunReport>, files: &FlushedFiles) -> String {
        let mut out = String::new();
        self.header(&mut out, "Experiment finished");

        let status = match outcome {
            RunOutcome::Completed => self.colorize("completed", self.scheme.success),
            RunOutcome::Interrupted => self.colorize("interrupted, partial results saved", self.scheme.warning),
            RunOutcome::Errored => self.colorize("aborted by error, partial results saved", self.scheme.error),
        };
        let _ = writeln!(out, "Status: {}", status);

        if let Some(report) = report {
            let order: Vec<&str> = report.order.iter().map(|q| q.as_str()).collect();
            let _ = writeln!(out, "Treatment order: {}", order.join(", "));
            let _ = writeln!(
                out,
                "Measurements: {} ({} failed)",
                report.recorded,
                self.colorize(&report.failed.to_string(), if report.failed == 0 { self.scheme.success } else { self.scheme.warning })
            );
            if !report.abandoned.is_empty() {
                let abandoned: Vec<&str> = report.abandoned.iter().map(|q| q.as_str()).collect();
                let _ = writeln!(out, "Abandoned treatments: {}", self.colorize(&abandoned.join(", "), self.scheme.error));
            }
        }

        let _ = writeln!(out, "Files:");
        for path in files.all() {
            let _ = writeln!(out, "  {}", self.colorize(&path.display().to_string(), self.scheme.info));
        }
        out
    }

    /// Pooled conclusions and emitted artifacts of an analysis
    pub fn format_analysis(&self, artifacts: &AnalysisArtifacts) -> String {
        let mut out = String::new();
        self.header(&mut out, "Analysis finished");

        self.format_conclusion(&mut out, "RQ1 response time", Metric::ResponseTime, artifacts.rq_time.as_ref());
        self.format_conclusion(&mut out, "RQ2 response size", Metric::ResponseSize, artifacts.rq_size.as_ref());

        let _ = writeln!(out, "Output directory: {}", self.colorize(&artifacts.output_dir.display().to_string(), self.scheme.info));
        for path in &artifacts.files {
            let name = path.strip_prefix(&artifacts.output_dir).unwrap_or(path.as_path());
            let _ = writeln!(out, "  {}", name.display());
        }
        out
    }

    fn format_conclusion(&self, out: &mut String, label: &str, metric: Metric, comparison: Option<&Comparison>) {
        let Some(c) = comparison else {
            let _ = writeln!(out, "{}: {}", label, self.colorize("not enough data", self.scheme.warning));
            return;
        };

        let verdict = if c.significant {
            self.colorize("GraphQL significantly better", self.scheme.success)
        } else {
            self.colorize("no significant difference", self.scheme.muted)
        };
        let _ = writeln!(
            out,
            "{}: REST {:.2} {unit} vs GraphQL {:.2} {unit}, p={:.4} ({})",
            label,
            c.mean_a,
            c.mean_b,
            c.mann_whitney.p_value,
            verdict,
            unit = metric.unit()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QueryType;
    use std::path::PathBuf;

    fn files() -> FlushedFiles {
        FlushedFiles {
            csv: PathBuf::from("results/experiment_20240101_000000.csv"),
            json: PathBuf::from("results/experiment_20240101_000000.json"),
            summary: PathBuf::from("results/experiment_20240101_000000_summary.txt"),
        }
    }

    #[test]
    fn test_run_summary_plain() {
        let report = RunReport {
            order: QueryType::ALL.to_vec(),
            abandoned: vec![QueryType::Filter],
            recorded: 16,
            failed: 3,
        };
        let text = ConsoleFormatter::new(false).format_run(RunOutcome::Interrupted, Some(&report), &files());

        assert!(text.contains("interrupted, partial results saved"));
        assert!(text.contains("Treatment order: simple, relationship, filter, pagination"));
        assert!(text.contains("Measurements: 16 (3 failed)"));
        assert!(text.contains("Abandoned treatments: filter"));
        assert!(text.contains("experiment_20240101_000000_summary.txt"));
        assert!(!text.contains("\u{1b}["));
    }

    #[test]
    fn test_run_summary_without_report() {
        let text = ConsoleFormatter::new(false).format_run(RunOutcome::Errored, None, &files());
        assert!(text.contains("aborted by error"));
        assert!(!text.contains("Treatment order"));
    }
}
