use std::env;

/// Redis cache configuration.
///
/// # Environment Variables
///
/// - `CACHE_ENABLED`: turn caching on (default: `false`)
/// - `REDIS_URL`: Redis connection URL (default: `redis://127.0.0.1:6379`)
/// - `CACHE_TTL_SECONDS`: default TTL for cached items (default: `300`)
/// - `CACHE_PERMISSIONS_TTL_SECONDS`: TTL for resolved permission sets
///   (default: `600`)
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub enabled: bool,
    pub redis_url: String,
    pub default_ttl_seconds: u64,
    pub permissions_ttl_seconds: u64,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("CACHE_ENABLED")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            default_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            permissions_ttl_seconds: env::var("CACHE_PERMISSIONS_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(600),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            redis_url: "redis://127.0.0.1:6379".into(),
            default_ttl_seconds: 300,
            permissions_ttl_seconds: 600,
        }
    }
}
