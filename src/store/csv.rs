//! Minimal CSV encoding shared by the result store and the analysis tables

use crate::{
    error::{AppError, Result},
    models::{Measurement, ResultSet},
    types::{ApiType, QueryType},
};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use std::collections::HashMap;

/// Column order of the persisted measurement file
pub const MEASUREMENT_COLUMNS: [&str; 8] = [
    "timestamp",
    "api_type",
    "query_type",
    "query_name",
    "response_time_ms",
    "response_size_bytes",
    "success",
    "error_msg",
];

/// A header plus string rows, rendered with RFC 4180 quoting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new<S: AsRef<str>>(header: &[S]) -> Self {
        Self {
            header: header.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.header.len());
        self.rows.push(row);
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format_line(&self.header));
        for row in &self.rows {
            out.push_str(&format_line(row));
        }
        out
    }

    /// Parse a rendered table; the first record is the header
    pub fn parse(text: &str) -> Result<Self> {
        let mut records = parse_records(text)?.into_iter();
        let header = records
            .next()
            .ok_or_else(|| AppError::parse("CSV input is empty"))?;

        let mut rows = Vec::new();
        for (index, record) in records.enumerate() {
            if record.len() == 1 && record[0].is_empty() {
                continue;
            }
            if record.len() != header.len() {
                return Err(AppError::parse(format!(
                    "CSV row {} has {} fields, expected {}",
                    index + 2,
                    record.len(),
                    header.len()
                )));
            }
            rows.push(record);
        }

        Ok(Self { header, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }
}

/// Escape CSV field (handle commas, quotes, newlines)
pub fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn format_line<S: AsRef<str>>(fields: &[S]) -> String {
    let escaped: Vec<String> = fields.iter().map(|f| escape_field(f.as_ref())).collect();
    format!("{}\n", escaped.join(","))
}

/// Split CSV text into records, honouring quoted fields that span lines
pub fn parse_records(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(AppError::parse("CSV input ends inside a quoted field"));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}

/// Render a result set with the persisted column layout
pub fn encode_measurements(results: &ResultSet) -> String {
    let mut table = CsvTable::new(&MEASUREMENT_COLUMNS);
    for m in results {
        table.push_row(vec![
            m.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            m.api_type.to_string(),
            m.query_type.to_string(),
            m.query_name.clone(),
            m.response_time_ms.to_string(),
            m.response_size_bytes.to_string(),
            m.success.to_string(),
            m.error_msg.clone().unwrap_or_default(),
        ]);
    }
    table.render()
}

/// Parse a persisted measurement file. Columns are matched by name.
pub fn decode_measurements(text: &str) -> Result<ResultSet> {
    let table = CsvTable::parse(text)?;
    let columns: HashMap<&str, usize> = MEASUREMENT_COLUMNS
        .iter()
        .filter_map(|name| table.column_index(name).map(|i| (*name, i)))
        .collect();

    for required in &MEASUREMENT_COLUMNS[..7] {
        if !columns.contains_key(required) {
            return Err(AppError::parse(format!("CSV input lacks column '{}'", required)));
        }
    }

    let mut results = ResultSet::new();
    for (index, row) in table.rows().iter().enumerate() {
        let cell = |name: &str| columns.get(name).map(|&i| row[i].as_str()).unwrap_or("");
        let line = index + 2;

        let timestamp = parse_timestamp(cell("timestamp"))
            .map_err(|e| AppError::parse(format!("line {}: {}", line, e)))?;
        let api_type: ApiType = cell("api_type").parse()?;
        let query_type: QueryType = cell("query_type").parse()?;
        let response_time_ms: f64 = cell("response_time_ms")
            .trim()
            .parse()
            .map_err(|_| AppError::parse(format!("line {}: bad response_time_ms", line)))?;
        let response_size_bytes = parse_size(cell("response_size_bytes"))
            .ok_or_else(|| AppError::parse(format!("line {}: bad response_size_bytes", line)))?;
        let success = parse_bool(cell("success"))
            .ok_or_else(|| AppError::parse(format!("line {}: bad success flag", line)))?;
        let error_msg = Some(cell("error_msg").to_string()).filter(|m| !m.is_empty());

        results.push(Measurement {
            timestamp,
            api_type,
            query_type,
            query_name: cell("query_name").to_string(),
            response_time_ms,
            response_size_bytes,
            success,
            error_msg,
        });
    }

    Ok(results)
}

/// RFC 3339, or a zone-less ISO 8601 timestamp taken as UTC
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|_| AppError::parse(format!("invalid timestamp '{}'", value)))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "True" | "TRUE" | "1" => Some(true),
        "false" | "False" | "FALSE" | "0" => Some(false),
        _ => None,
    }
}

// Sizes written by other tools may carry a ".0"
fn parse_size(value: &str) -> Option<u64> {
    let value = value.trim();
    value.parse::<u64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
            .map(|v| v as u64)
    })
}
