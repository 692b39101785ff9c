//! Cache key builders and invalidation helpers.

use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

use crate::cache::RedisCache;

const CACHE_PREFIX: &str = "lunchlit";

fn build_key(parts: &[&str]) -> String {
    format!("{}:{}", CACHE_PREFIX, parts.join(":"))
}

/// Per-user resolved permission set.
pub fn user_permissions(user_id: Uuid) -> String {
    build_key(&["user", &user_id.to_string(), "permissions"])
}

/// Pattern matching every user's permission cache. Custom-role changes can
/// affect any number of users, so they clear the whole space.
pub fn all_user_permissions_pattern() -> String {
    format!("{}:user:*:permissions", CACHE_PREFIX)
}

/// A school's menu for one day and meal.
pub fn menu_day(school_id: Uuid, served_on: NaiveDate, meal: &str) -> String {
    build_key(&[
        "school",
        &school_id.to_string(),
        "menu",
        &served_on.to_string(),
        meal,
    ])
}

/// Pattern matching every cached menu day for a school.
pub fn school_menus_pattern(school_id: Uuid) -> String {
    format!("{}:school:{}:menu:*", CACHE_PREFIX, school_id)
}

/// Invalidation helpers that log and carry on; a failed invalidation only
/// means a stale read until the TTL expires.
pub mod invalidate {
    use super::*;

    /// Call after a user's role assignments change.
    pub async fn user_permissions(cache: Option<&RedisCache>, user_id: Uuid) {
        let Some(cache) = cache else { return };

        if let Err(e) = cache.invalidate(&super::user_permissions(user_id)).await {
            warn!(error = %e, user_id = %user_id, "Failed to invalidate user permission cache");
        }
    }

    /// Call after any custom role is created, updated, or deleted.
    pub async fn all_user_permissions(cache: Option<&RedisCache>) {
        let Some(cache) = cache else { return };

        if let Err(e) = cache
            .invalidate_pattern(&all_user_permissions_pattern())
            .await
        {
            warn!(error = %e, "Failed to invalidate permission caches");
        }
    }

    /// Call after menu rows change for a school.
    pub async fn school_menus(cache: Option<&RedisCache>, school_id: Uuid) {
        let Some(cache) = cache else { return };

        if let Err(e) = cache
            .invalidate_pattern(&school_menus_pattern(school_id))
            .await
        {
            warn!(error = %e, school_id = %school_id, "Failed to invalidate menu caches");
        }
    }
}
