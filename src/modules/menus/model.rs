use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Meal {
    Breakfast,
    Lunch,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown meal: {0}")]
pub struct UnknownMeal(pub String);

impl Meal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
        }
    }
}

impl std::str::FromStr for Meal {
    type Err = UnknownMeal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(Meal::Breakfast),
            "lunch" => Ok(Meal::Lunch),
            other => Err(UnknownMeal(other.to_string())),
        }
    }
}

impl std::fmt::Display for Meal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One item on a day's menu. `station` is the serving line ("Grill",
/// "Salad Bar") when the source provides one.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct MenuItem {
    pub id: Uuid,
    pub school_id: Uuid,
    pub served_on: NaiveDate,
    pub meal: String,
    pub name: String,
    pub station: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMenuItemDto {
    /// Defaults to the caller's school.
    pub school_id: Option<Uuid>,
    pub served_on: NaiveDate,
    pub meal: Meal,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 100))]
    pub station: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateMenuItemDto {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub station: Option<String>,
}

/// Query parameters for the day view. `date` defaults to today and `meal`
/// to lunch; `school_id` is only honored when the caller has no school of
/// their own (or is browsing cross-school as an admin).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MenuDayParams {
    pub date: Option<NaiveDate>,
    pub meal: Option<Meal>,
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuDayResponse {
    pub school_id: Uuid,
    pub served_on: NaiveDate,
    pub meal: Meal,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ImportMenuDto {
    /// Defaults to the caller's school.
    pub school_id: Option<Uuid>,
    pub served_on: NaiveDate,
    pub meal: Meal,
}

/// What an import run did. Zero extracted items is a valid outcome, not an
/// error; the source page format may simply have drifted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportMenuResponse {
    pub school_id: Uuid,
    pub served_on: NaiveDate,
    pub meal: Meal,
    pub extracted: usize,
    pub imported: usize,
    pub skipped_duplicates: usize,
}
