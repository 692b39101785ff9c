use std::time::Duration;

use sqlx::PgPool;
use tracing::{info, warn};

use crate::cache::RedisCache;
use crate::config::cache::CacheConfig;
use crate::config::chat::ChatConfig;
use crate::config::cors::CorsConfig;
use crate::config::database::init_db_pool;
use crate::config::email::EmailConfig;
use crate::config::jwt::JwtConfig;
use crate::config::rate_limit::RateLimitConfig;
use crate::events::EventBus;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub email_config: EmailConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub chat_config: ChatConfig,
    pub cache_config: CacheConfig,
    /// None when caching is disabled or Redis is unreachable; callers fall
    /// through to the database.
    pub cache: Option<RedisCache>,
    pub events: EventBus,
    /// Shared client for outbound HTTP (menu pages, chat upstream).
    pub http: reqwest::Client,
}

pub async fn init_app_state() -> AppState {
    let cache_config = CacheConfig::from_env();
    let cache = init_cache(&cache_config).await;

    AppState {
        db: init_db_pool().await,
        jwt_config: JwtConfig::from_env(),
        email_config: EmailConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        rate_limit_config: RateLimitConfig::from_env(),
        chat_config: ChatConfig::from_env(),
        cache_config,
        cache,
        events: EventBus::new(),
        http: reqwest::Client::new(),
    }
}

async fn init_cache(config: &CacheConfig) -> Option<RedisCache> {
    if !config.enabled {
        info!("Cache disabled; permission resolution will hit the database");
        return None;
    }

    match RedisCache::new(
        &config.redis_url,
        Duration::from_secs(config.default_ttl_seconds),
    )
    .await
    {
        Ok(cache) => {
            info!(redis_url = %config.redis_url, "Connected to Redis cache");
            Some(cache)
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to Redis; continuing without cache");
            None
        }
    }
}
