use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub total: i64,
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PaginationParams {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub offset: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: Some(10),
            offset: Some(0),
            page: Some(1),
        }
    }
}

impl PaginationParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).max(1).min(100)
    }

    pub fn offset(&self) -> i64 {
        // If page is provided, calculate offset from page
        if let Some(page) = self.page {
            let page = page.max(1);
            let limit = self.limit();
            (page - 1) * limit
        } else {
            self.offset.unwrap_or(0).max(0)
        }
    }

    pub fn page(&self) -> Option<i64> {
        self.page.map(|p| p.max(1))
    }
}
