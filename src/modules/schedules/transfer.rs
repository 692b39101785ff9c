//! Schedule import/export codecs, version 1.
//!
//! Same contract as the task codecs: strict envelope, per-row validation,
//! bad rows reported and skipped. Weekday values outside 1..=7 and
//! unparseable times are row errors.

use anyhow::anyhow;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::utils::errors::AppError;
use crate::utils::transfer::RowError;

use super::model::ScheduleEntry;

pub const SCHEMA_VERSION: u32 = 1;
const CSV_HEADERS: [&str; 7] = [
    "title",
    "period",
    "weekday",
    "starts_at",
    "ends_at",
    "room",
    "instructor",
];
const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScheduleRecord {
    pub title: String,
    #[serde(default)]
    pub period: Option<i32>,
    pub weekday: i16,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScheduleDocument {
    pub version: u32,
    pub entries: Vec<ScheduleRecord>,
}

fn validate_record(record: &ScheduleRecord, row: usize) -> Result<(), RowError> {
    let title = record.title.trim();
    if title.is_empty() {
        return Err(RowError::new(row, "title must not be empty"));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(RowError::new(row, "title exceeds 200 characters"));
    }
    if !(1..=7).contains(&record.weekday) {
        return Err(RowError::new(
            row,
            format!("weekday {} is outside 1..=7", record.weekday),
        ));
    }
    if record.ends_at <= record.starts_at {
        return Err(RowError::new(row, "ends_at must be after starts_at"));
    }
    Ok(())
}

pub fn to_records(entries: &[ScheduleEntry]) -> Vec<ScheduleRecord> {
    entries
        .iter()
        .map(|e| ScheduleRecord {
            title: e.title.clone(),
            period: e.period,
            weekday: e.weekday,
            starts_at: e.starts_at,
            ends_at: e.ends_at,
            room: e.room.clone(),
            instructor: e.instructor.clone(),
        })
        .collect()
}

pub fn to_json(entries: &[ScheduleEntry]) -> Result<String, AppError> {
    let document = ScheduleDocument {
        version: SCHEMA_VERSION,
        entries: to_records(entries),
    };

    serde_json::to_string_pretty(&document).map_err(AppError::internal)
}

pub fn to_csv(entries: &[ScheduleEntry]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(CSV_HEADERS).map_err(AppError::internal)?;
    for entry in entries {
        writer
            .write_record([
                entry.title.as_str(),
                &entry.period.map(|p| p.to_string()).unwrap_or_default(),
                &entry.weekday.to_string(),
                &entry.starts_at.format("%H:%M:%S").to_string(),
                &entry.ends_at.format("%H:%M:%S").to_string(),
                entry.room.as_deref().unwrap_or(""),
                entry.instructor.as_deref().unwrap_or(""),
            ])
            .map_err(AppError::internal)?;
    }

    let bytes = writer.into_inner().map_err(AppError::internal)?;
    String::from_utf8(bytes).map_err(AppError::internal)
}

pub fn parse_json(body: &str) -> Result<(Vec<ScheduleRecord>, Vec<RowError>), AppError> {
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
        .get("entries")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::bad_request(anyhow!("Missing entries array")))?;

    let mut records = Vec::new();
    let mut errors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        match serde_json::from_value::<ScheduleRecord>(row.clone()) {
            Ok(record) => match validate_record(&record, row_number) {
                Ok(()) => records.push(record),
                Err(e) => errors.push(e),
            },
            Err(e) => errors.push(RowError::new(row_number, e.to_string())),
        }
    }

    Ok((records, errors))
}

pub fn parse_csv(body: &str) -> Result<(Vec<ScheduleRecord>, Vec<RowError>), AppError> {
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

fn parse_time(raw: &str, field: &str, row: usize) -> Result<NaiveTime, RowError> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| RowError::new(row, format!("invalid {} '{}', expected HH:MM[:SS]", field, raw)))
}

fn parse_csv_row(row: &csv::StringRecord, row_number: usize) -> Result<ScheduleRecord, RowError> {
    let field = |i: usize| row.get(i).unwrap_or("");

    let period = match field(1) {
        "" => None,
        raw => Some(raw.parse::<i32>().map_err(|_| {
            RowError::new(row_number, format!("invalid period '{}'", raw))
        })?),
    };

    let weekday = field(2)
        .parse::<i16>()
        .map_err(|_| RowError::new(row_number, format!("invalid weekday '{}'", field(2))))?;

    let record = ScheduleRecord {
        title: field(0).to_string(),
        period,
        weekday,
        starts_at: parse_time(field(3), "starts_at", row_number)?,
        ends_at: parse_time(field(4), "ends_at", row_number)?,
        room: match field(5) {
            "" => None,
            room => Some(room.to_string()),
        },
        instructor: match field(6) {
            "" => None,
            instructor => Some(instructor.to_string()),
        },
    };

    validate_record(&record, row_number)?;
    Ok(record)
}
