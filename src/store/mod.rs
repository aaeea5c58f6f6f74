//! Result store: durable persistence of a run's measurements
//!
//! Every flush writes three artifacts sharing one stem,
//! `<prefix>_<YYYYmmdd_HHMMSS>`: the tabular `.csv`, the structured `.json`
//! and a human-readable `_summary.txt`.

pub mod csv;
pub mod summary;

pub use self::csv::{decode_measurements, encode_measurements, CsvTable};
pub use summary::render_summary;

use crate::{
    error::{AppError, Result},
    models::ResultSet,
    types::RunOutcome,
};
use chrono::{DateTime, Local};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// File name pattern of a flushed measurement table
pub const DATASET_PATTERN: &str = r"^experiment(_partial|_error)?_\d{8}_\d{6}\.csv$";

/// Paths written by one flush
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushedFiles {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub summary: PathBuf,
}

impl FlushedFiles {
    pub fn all(&self) -> [&Path; 3] {
        [&self.csv, &self.json, &self.summary]
    }
}

#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Flush stamped with the current local time
    pub fn flush(&self, results: &ResultSet, outcome: RunOutcome) -> Result<FlushedFiles> {
        self.flush_at(results, outcome, Local::now())
    }

    pub fn flush_at(&self, results: &ResultSet, outcome: RunOutcome, at: DateTime<Local>) -> Result<FlushedFiles> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::io(format!("Cannot create results directory {}: {}", self.dir.display(), e))
        })?;

        let stem = format!("{}_{}", outcome.file_prefix(), at.format("%Y%m%d_%H%M%S"));
        let files = FlushedFiles {
            csv: self.dir.join(format!("{}.csv", stem)),
            json: self.dir.join(format!("{}.json", stem)),
            summary: self.dir.join(format!("{}_summary.txt", stem)),
        };

        write_file(&files.csv, &encode_measurements(results))?;
        write_file(&files.json, &serde_json::to_string_pretty(results)?)?;
        write_file(&files.summary, &render_summary(results, outcome, at))?;

        Ok(files)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| AppError::io(format!("Cannot write {}: {}", path.display(), e)))
}

/// Load a persisted result set; `.json` files are read as JSON, anything else as CSV
pub fn load_measurements(path: &Path) -> Result<ResultSet> {
    if !path.is_file() {
        return Err(AppError::dataset_not_found(path.display().to_string()));
    }

    let text = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Cannot read {}: {}", path.display(), e)))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(serde_json::from_str(&text)?)
    } else {
        decode_measurements(&text)
    }
}

/// Most recently modified measurement table in `dir`
pub fn find_latest(dir: &Path) -> Result<PathBuf> {
    let pattern = Regex::new(DATASET_PATTERN)
        .map_err(|e| AppError::internal(format!("Invalid dataset pattern: {}", e)))?;

    let entries = fs::read_dir(dir).map_err(|_| {
        AppError::dataset_not_found(format!("results directory {} is not readable", dir.display()))
    })?;

    let mut candidates: Vec<(SystemTime, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| pattern.is_match(name))
        })
        .filter_map(|entry| {
            let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, entry.path()))
        })
        .collect();

    // Newest first; equal mtimes fall back to the later stamp in the name
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

    candidates
        .into_iter()
        .next()
        .map(|(_, path)| path)
        .ok_or_else(|| AppError::dataset_not_found(format!("no experiment CSV files in {}", dir.display())))
}
