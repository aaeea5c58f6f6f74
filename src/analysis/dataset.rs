//! Successes-only view of a persisted result set

use crate::{
    error::Result,
    models::{Measurement, ResultSet},
    store,
    types::{ApiType, Metric, QueryType},
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Immutable input of the analysis stages.
///
/// Failed rows are counted for provenance and dropped; query types that
/// appear only in failed rows are still listed so they surface as
/// zero-count groups.
#[derive(Debug, Clone)]
pub struct Dataset {
    source: PathBuf,
    total: usize,
    failed: usize,
    query_types: BTreeSet<QueryType>,
    groups: BTreeMap<(ApiType, QueryType), Vec<Measurement>>,
}

impl Dataset {
    /// Load from a `.csv` or `.json` measurement file
    pub fn load(path: &Path) -> Result<Self> {
        let results = store::load_measurements(path)?;
        Ok(Self::from_results(path, &results))
    }

    pub fn from_results(source: impl Into<PathBuf>, results: &ResultSet) -> Self {
        let mut groups: BTreeMap<(ApiType, QueryType), Vec<Measurement>> = BTreeMap::new();
        let mut query_types = BTreeSet::new();

        for m in results {
            query_types.insert(m.query_type);
            if m.success {
                groups.entry((m.api_type, m.query_type)).or_default().push(m.clone());
            }
        }

        Self {
            source: source.into(),
            total: results.len(),
            failed: results.failure_count(),
            query_types,
            groups,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn successful(&self) -> usize {
        self.total - self.failed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Query types present in the file, in canonical order
    pub fn query_types(&self) -> impl Iterator<Item = QueryType> + '_ {
        self.query_types.iter().copied()
    }

    /// Successful values of one group
    pub fn values(&self, api: ApiType, query: QueryType, metric: Metric) -> Vec<f64> {
        self.groups
            .get(&(api, query))
            .map(|group| group.iter().map(|m| m.metric(metric)).collect())
            .unwrap_or_default()
    }

    /// Successful values of one api type across every query type
    pub fn pooled(&self, api: ApiType, metric: Metric) -> Vec<f64> {
        self.groups
            .iter()
            .filter(|((a, _), _)| *a == api)
            .flat_map(|(_, group)| group.iter().map(move |m| m.metric(metric)))
            .collect()
    }

    /// `(api, query, value)` triples of every success, for the factorial model
    pub fn observations(&self, metric: Metric) -> Vec<(ApiType, QueryType, f64)> {
        self.groups
            .iter()
            .flat_map(|(&(api, query), group)| group.iter().map(move |m| (api, query, m.metric(metric))))
            .collect()
    }
}
