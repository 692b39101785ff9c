//! Task import/export codecs.
//!
//! Both formats carry the same fixed schema, version 1: title, notes,
//! due date, completed flag. Imports are validated row by row; a bad row
//! is reported and skipped, never fatal to the rest of the payload.

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::utils::errors::AppError;
use crate::utils::transfer::RowError;

use super::model::Task;

pub const SCHEMA_VERSION: u32 = 1;
const CSV_HEADERS: [&str; 4] = ["title", "notes", "due_date", "completed"];
const MAX_TITLE_LEN: usize = 200;

/// The portable task shape. Owner and timestamps never travel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TaskRecord {
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskDocument {
    pub version: u32,
    pub tasks: Vec<TaskRecord>,
}

fn validate_record(record: &TaskRecord, row: usize) -> Result<(), RowError> {
    let title = record.title.trim();
    if title.is_empty() {
        return Err(RowError::new(row, "title must not be empty"));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(RowError::new(row, "title exceeds 200 characters"));
    }
    Ok(())
}

pub fn to_records(tasks: &[Task]) -> Vec<TaskRecord> {
    tasks
        .iter()
        .map(|t| TaskRecord {
            title: t.title.clone(),
            notes: t.notes.clone(),
            due_date: t.due_date,
            completed: t.completed,
        })
        .collect()
}

pub fn to_json(tasks: &[Task]) -> Result<String, AppError> {
    let document = TaskDocument {
        version: SCHEMA_VERSION,
        tasks: to_records(tasks),
    };

    serde_json::to_string_pretty(&document).map_err(AppError::internal)
}

pub fn to_csv(tasks: &[Task]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(CSV_HEADERS).map_err(AppError::internal)?;
    for task in tasks {
        writer
            .write_record([
                task.title.as_str(),
                task.notes.as_deref().unwrap_or(""),
                &task
                    .due_date
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                if task.completed { "true" } else { "false" },
            ])
            .map_err(AppError::internal)?;
    }

    let bytes = writer.into_inner().map_err(AppError::internal)?;
    String::from_utf8(bytes).map_err(AppError::internal)
}

/// Parses a JSON export document. The envelope must be well formed and
/// carry a supported version; individual tasks are validated per row.
pub fn parse_json(body: &str) -> Result<(Vec<TaskRecord>, Vec<RowError>), AppError> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| AppError::bad_request(anyhow!("Invalid JSON payload: {}", e)))?;

    let version = document
        .get("version")
        .and_then(Value::as_u64)
        .ok_or_else(|| AppError::bad_request(anyhow!("Missing schema version")))?;
    if version != u64::from(SCHEMA_VERSION) {
        return Err(AppError::bad_request(anyhow!(
            "Unsupported schema version {} (expected {})",
            version,
            SCHEMA_VERSION
        )));
    }

    let rows = document
        .get("tasks")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::bad_request(anyhow!("Missing tasks array")))?;

    let mut records = Vec::new();
    let mut errors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        match serde_json::from_value::<TaskRecord>(row.clone()) {
            Ok(record) => match validate_record(&record, row_number) {
                Ok(()) => records.push(record),
                Err(e) => errors.push(e),
            },
            Err(e) => errors.push(RowError::new(row_number, e.to_string())),
        }
    }

    Ok((records, errors))
}

/// Parses CSV with the exact version-1 header row.
pub fn parse_csv(body: &str) -> Result<(Vec<TaskRecord>, Vec<RowError>), AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::bad_request(anyhow!("Invalid CSV payload: {}", e)))?;
    let header_matches = headers.len() == CSV_HEADERS.len()
        && headers.iter().zip(CSV_HEADERS).all(|(h, expected)| h == expected);
    if !header_matches {
        return Err(AppError::bad_request(anyhow!(
            "CSV header must be exactly: {}",
            CSV_HEADERS.join(",")
        )));
    }

    let mut records = Vec::new();
    let mut errors = Vec::new();

    for (index, row) in reader.records().enumerate() {
        let row_number = index + 1;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                errors.push(RowError::new(row_number, e.to_string()));
                continue;
            }
        };

        match parse_csv_row(&row, row_number) {
            Ok(record) => records.push(record),
            Err(e) => errors.push(e),
        }
    }

    Ok((records, errors))
}

fn parse_csv_row(row: &csv::StringRecord, row_number: usize) -> Result<TaskRecord, RowError> {
    let field = |i: usize| row.get(i).unwrap_or("");

    let due_date = match field(2) {
        "" => None,
        raw => Some(raw.parse::<NaiveDate>().map_err(|_| {
            RowError::new(row_number, format!("invalid due_date '{}', expected YYYY-MM-DD", raw))
        })?),
    };

    let completed = match field(3).to_lowercase().as_str() {
        "" | "false" | "0" => false,
        "true" | "1" => true,
        raw => {
            return Err(RowError::new(
                row_number,
                format!("invalid completed value '{}'", raw),
            ));
        }
    };

    let record = TaskRecord {
        title: field(0).to_string(),
        notes: match field(1) {
            "" => None,
            notes => Some(notes.to_string()),
        },
        due_date,
        completed,
    };

    validate_record(&record, row_number)?;
    Ok(record)
}
