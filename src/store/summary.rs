//! Human-readable summary written next to each flushed result set

use crate::{
    models::ResultSet,
    stats::Summary,
    types::{ApiType, Metric, QueryType, RunOutcome},
};
use chrono::{DateTime, Local};
use std::fmt::Write;

const RULE_WIDTH: usize = 60;

fn outcome_label(outcome: RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Completed => "completed",
        RunOutcome::Interrupted => "interrupted (partial results)",
        RunOutcome::Errored => "aborted by error (partial results)",
    }
}

/// Render counts and per-metric mean/min/max of the successful measurements,
/// grouped by api type then query type
pub fn render_summary(results: &ResultSet, outcome: RunOutcome, at: DateTime<Local>) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "EXPERIMENT SUMMARY");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Date: {}", at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Status: {}", outcome_label(outcome));
    let _ = writeln!(out, "Total measurements: {}", results.len());
    let _ = writeln!(out, "Successful: {}", results.success_count());
    let _ = writeln!(out, "Failed: {}", results.failure_count());

    for api in ApiType::ALL {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}:", api);

        for query in QueryType::ALL {
            let group: Vec<_> = results
                .iter()
                .filter(|m| m.success && m.api_type == api && m.query_type == query)
                .collect();

            let _ = writeln!(out, "  {}:", query);
            let _ = writeln!(out, "    count: {}", group.len());
            if group.is_empty() {
                continue;
            }

            for metric in Metric::ALL {
                let values: Vec<f64> = group.iter().map(|m| m.metric(metric)).collect();
                if let Some(summary) = Summary::from_values(&values) {
                    let _ = writeln!(
                        out,
                        "    {}: mean={:.2} min={:.2} max={:.2}",
                        metric, summary.mean, summary.min, summary.max
                    );
                }
            }
        }
    }

    out
}
