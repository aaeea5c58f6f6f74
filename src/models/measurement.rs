//! Measurement and result set data models

use crate::types::{ApiType, QueryType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One observation: a single attempted invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Capture instant
    pub timestamp: DateTime<Utc>,

    pub api_type: ApiType,

    pub query_type: QueryType,

    /// Operation invoked (`get_user`, `search_repositories`, ...)
    pub query_name: String,

    /// Elapsed time in milliseconds; 0 for failures
    pub response_time_ms: f64,

    /// Raw body length; 0 for failures
    pub response_size_bytes: u64,

    pub success: bool,

    /// Failure cause, present iff `success` is false
    #[serde(default)]
    pub error_msg: Option<String>,
}

impl Measurement {
    /// Create a successful measurement stamped now
    pub fn success(
        api_type: ApiType,
        query_type: QueryType,
        query_name: impl Into<String>,
        elapsed: Duration,
        byte_size: usize,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            api_type,
            query_type,
            query_name: query_name.into(),
            response_time_ms: elapsed.as_secs_f64() * 1000.0,
            response_size_bytes: byte_size as u64,
            success: true,
            error_msg: None,
        }
    }

    /// Create a failed measurement stamped now
    pub fn failure(
        api_type: ApiType,
        query_type: QueryType,
        query_name: impl Into<String>,
        error_msg: impl Into<String>,
    ) -> Self {
        let mut error_msg = error_msg.into();
        if error_msg.trim().is_empty() {
            error_msg = "unknown error".to_string();
        }

        Self {
            timestamp: Utc::now(),
            api_type,
            query_type,
            query_name: query_name.into(),
            response_time_ms: 0.0,
            response_size_bytes: 0,
            success: false,
            error_msg: Some(error_msg),
        }
    }

    /// Override the capture instant
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Value of the given metric as a float
    pub fn metric(&self, metric: crate::types::Metric) -> f64 {
        match metric {
            crate::types::Metric::ResponseTime => self.response_time_ms,
            crate::types::Metric::ResponseSize => self.response_size_bytes as f64,
        }
    }

    /// Check the success/failure field invariants of a loaded row
    pub fn is_consistent(&self) -> bool {
        if self.success {
            self.error_msg.is_none() && self.response_time_ms >= 0.0
        } else {
            self.response_time_ms == 0.0
                && self.response_size_bytes == 0
                && self.error_msg.as_deref().is_some_and(|m| !m.is_empty())
        }
    }
}

/// Ordered, append-only measurements of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    measurements: Vec<Measurement>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, measurement: Measurement) {
        self.measurements.push(measurement);
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Measurement> {
        self.measurements.iter()
    }

    pub fn as_slice(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn success_count(&self) -> usize {
        self.measurements.iter().filter(|m| m.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }
}

impl From<Vec<Measurement>> for ResultSet {
    fn from(measurements: Vec<Measurement>) -> Self {
        Self { measurements }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Measurement;
    type IntoIter = std::slice::Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.measurements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metric;

    #[test]
    fn test_success_measurement() {
        let m = Measurement::success(
            ApiType::Rest,
            QueryType::Simple,
            "get_user",
            Duration::from_micros(123_456),
            2048,
        );
        assert!(m.success);
        assert!((m.response_time_ms - 123.456).abs() < 1e-9);
        assert_eq!(m.response_size_bytes, 2048);
        assert!(m.error_msg.is_none());
        assert!(m.is_consistent());
        assert_eq!(m.metric(Metric::ResponseSize), 2048.0);
    }

    #[test]
    fn test_failure_measurement_zeroes_metrics() {
        let m = Measurement::failure(ApiType::GraphQl, QueryType::Filter, "search_repositories", "timeout");
        assert!(!m.success);
        assert_eq!(m.response_time_ms, 0.0);
        assert_eq!(m.response_size_bytes, 0);
        assert_eq!(m.error_msg.as_deref(), Some("timeout"));
        assert!(m.is_consistent());
    }

    #[test]
    fn test_failure_with_blank_cause_still_has_message() {
        let m = Measurement::failure(ApiType::Rest, QueryType::Simple, "get_user", "  ");
        assert_eq!(m.error_msg.as_deref(), Some("unknown error"));
    }

    #[test]
    fn test_inconsistent_rows_are_detected() {
        let mut m = Measurement::failure(ApiType::Rest, QueryType::Simple, "get_user", "boom");
        m.response_size_bytes = 10;
        assert!(!m.is_consistent());
    }

    #[test]
    fn test_result_set_counts() {
        let mut set = ResultSet::new();
        set.push(Measurement::success(ApiType::Rest, QueryType::Simple, "get_user", Duration::from_millis(5), 10));
        set.push(Measurement::failure(ApiType::GraphQl, QueryType::Simple, "get_user", "boom"));

        assert_eq!(set.len(), 2);
        assert_eq!(set.success_count(), 1);
        assert_eq!(set.failure_count(), 1);
        assert_eq!(set.iter().next().map(|m| m.api_type), Some(ApiType::Rest));
    }

    #[test]
    fn test_json_shape() {
        let m = Measurement::success(ApiType::GraphQl, QueryType::Pagination, "get_repos_paginated", Duration::from_millis(1), 1)
            .with_timestamp("2024-01-02T03:04:05Z".parse().unwrap());
        let value = serde_json::to_value(&m).unwrap();

        assert_eq!(value["api_type"], "GraphQL");
        assert_eq!(value["query_type"], "pagination");
        assert_eq!(value["timestamp"], "2024-01-02T03:04:05Z");
        assert!(value["error_msg"].is_null());
    }
}
