//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// The two compared API paradigms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApiType {
    /// Resource/endpoint-oriented paradigm (paradigm A)
    #[serde(rename = "REST")]
    Rest,
    /// Declarative query-oriented paradigm (paradigm B)
    #[serde(rename = "GraphQL")]
    GraphQl,
}

impl ApiType {
    /// Both paradigms in pairing order: A is always invoked before B
    pub const ALL: [ApiType; 2] = [ApiType::Rest, ApiType::GraphQl];

    /// Serialized label used in persisted files
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiType::Rest => "REST",
            ApiType::GraphQl => "GraphQL",
        }
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "REST" | "rest" | "A" => Ok(ApiType::Rest),
            "GraphQL" | "graphql" | "GRAPHQL" | "B" => Ok(ApiType::GraphQl),
            other => Err(AppError::parse(format!("Unknown api_type: {}", other))),
        }
    }
}

/// The four query shapes (treatments) of the experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// Single-entity lookup
    Simple,
    /// Entity plus related collection
    Relationship,
    /// Filtered search
    Filter,
    /// Paginated listing
    Pagination,
}

impl QueryType {
    /// Canonical (non-randomized) treatment order
    pub const ALL: [QueryType; 4] = [
        QueryType::Simple,
        QueryType::Relationship,
        QueryType::Filter,
        QueryType::Pagination,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Simple => "simple",
            QueryType::Relationship => "relationship",
            QueryType::Filter => "filter",
            QueryType::Pagination => "pagination",
        }
    }

    /// Name of the client operation exercised by this treatment
    pub fn operation_name(&self) -> &'static str {
        match self {
            QueryType::Simple => "get_user",
            QueryType::Relationship => "get_user_with_repos",
            QueryType::Filter => "search_repositories",
            QueryType::Pagination => "get_repos_paginated",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(QueryType::Simple),
            "relationship" => Ok(QueryType::Relationship),
            "filter" => Ok(QueryType::Filter),
            "pagination" => Ok(QueryType::Pagination),
            other => Err(AppError::parse(format!("Unknown query_type: {}", other))),
        }
    }
}

/// Measured quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    /// Response time in milliseconds
    #[serde(rename = "response_time_ms")]
    ResponseTime,
    /// Response payload size in bytes
    #[serde(rename = "response_size_bytes")]
    ResponseSize,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::ResponseTime, Metric::ResponseSize];

    /// Column name in the persisted measurement file
    pub fn column(&self) -> &'static str {
        match self {
            Metric::ResponseTime => "response_time_ms",
            Metric::ResponseSize => "response_size_bytes",
        }
    }

    /// Display unit
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::ResponseTime => "ms",
            Metric::ResponseSize => "bytes",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// How a run ended; selects the file-name prefix of the flushed artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// All treatments were attempted
    Completed,
    /// The user interrupted the run
    Interrupted,
    /// A top-level error escaped the scheduler
    Errored,
}

impl RunOutcome {
    pub fn file_prefix(&self) -> &'static str {
        match self {
            RunOutcome::Completed => "experiment",
            RunOutcome::Interrupted => "experiment_partial",
            RunOutcome::Errored => "experiment_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_type_round_trip_labels() {
        assert_eq!("REST".parse::<ApiType>().unwrap(), ApiType::Rest);
        assert_eq!("GraphQL".parse::<ApiType>().unwrap(), ApiType::GraphQl);
        assert!("SOAP".parse::<ApiType>().is_err());
        assert_eq!(ApiType::GraphQl.to_string(), "GraphQL");
    }

    #[test]
    fn test_query_type_order() {
        let names: Vec<&str> = QueryType::ALL.iter().map(|q| q.as_str()).collect();
        assert_eq!(names, vec!["simple", "relationship", "filter", "pagination"]);
        assert_eq!("Filter".parse::<QueryType>().unwrap(), QueryType::Filter);
    }

    #[test]
    fn test_serde_labels() {
        assert_eq!(serde_json::to_string(&ApiType::Rest).unwrap(), "\"REST\"");
        assert_eq!(serde_json::to_string(&QueryType::Pagination).unwrap(), "\"pagination\"");
        assert_eq!(serde_json::to_string(&Metric::ResponseSize).unwrap(), "\"response_size_bytes\"");
    }

    #[test]
    fn test_run_outcome_prefixes_are_distinct() {
        assert_eq!(RunOutcome::Completed.file_prefix(), "experiment");
        assert_eq!(RunOutcome::Interrupted.file_prefix(), "experiment_partial");
        assert_eq!(RunOutcome::Errored.file_prefix(), "experiment_error");
    }
}
