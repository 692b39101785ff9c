//! Grade levels and the once-per-school-year progression rule.
//!
//! The school year rolls over on August 1. A student's grade advances one
//! step the first time their profile is read after the rollover; the stored
//! last-progression timestamp keeps it from advancing twice in one year.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GradeLevel {
    Freshman,
    Sophomore,
    Junior,
    Senior,
    Graduated,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown grade level: {0}")]
pub struct UnknownGradeLevel(pub String);

impl GradeLevel {
    pub const ALL: [GradeLevel; 5] = [
        GradeLevel::Freshman,
        GradeLevel::Sophomore,
        GradeLevel::Junior,
        GradeLevel::Senior,
        GradeLevel::Graduated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GradeLevel::Freshman => "freshman",
            GradeLevel::Sophomore => "sophomore",
            GradeLevel::Junior => "junior",
            GradeLevel::Senior => "senior",
            GradeLevel::Graduated => "graduated",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GradeLevel::Freshman => "Freshman",
            GradeLevel::Sophomore => "Sophomore",
            GradeLevel::Junior => "Junior",
            GradeLevel::Senior => "Senior",
            GradeLevel::Graduated => "Graduated",
        }
    }

    /// Forward map. Seniors graduate; graduated is terminal.
    pub fn next(&self) -> Option<GradeLevel> {
        match self {
            GradeLevel::Freshman => Some(GradeLevel::Sophomore),
            GradeLevel::Sophomore => Some(GradeLevel::Junior),
            GradeLevel::Junior => Some(GradeLevel::Senior),
            GradeLevel::Senior => Some(GradeLevel::Graduated),
            GradeLevel::Graduated => None,
        }
    }

    /// Reverse map, used for admin corrections.
    pub fn previous(&self) -> Option<GradeLevel> {
        match self {
            GradeLevel::Freshman => None,
            GradeLevel::Sophomore => Some(GradeLevel::Freshman),
            GradeLevel::Junior => Some(GradeLevel::Sophomore),
            GradeLevel::Senior => Some(GradeLevel::Junior),
            GradeLevel::Graduated => Some(GradeLevel::Senior),
        }
    }
}

impl std::str::FromStr for GradeLevel {
    type Err = UnknownGradeLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "freshman" => Ok(GradeLevel::Freshman),
            "sophomore" => Ok(GradeLevel::Sophomore),
            "junior" => Ok(GradeLevel::Junior),
            "senior" => Ok(GradeLevel::Senior),
            "graduated" => Ok(GradeLevel::Graduated),
            other => Err(UnknownGradeLevel(other.to_string())),
        }
    }
}

impl std::fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// August 1 boundary of the school year containing `now`.
pub fn school_year_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let year = if now.month() >= 8 {
        now.year()
    } else {
        now.year() - 1
    };

    Utc.with_ymd_and_hms(year, 8, 1, 0, 0, 0).unwrap()
}

/// True when the stored last-progression timestamp predates the current
/// school year. A missing timestamp counts as due.
pub fn progression_due(last_progression: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_progression {
        Some(last) => last < school_year_start(now),
        None => true,
    }
}

/// One forward step if a progression is due. Returns the new grade, or
/// `None` when nothing changes (not due, or already graduated).
pub fn apply_progression(
    grade: GradeLevel,
    last_progression: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<GradeLevel> {
    if !progression_due(last_progression, now) {
        return None;
    }

    grade.next()
}
