use axum::http::{HeaderValue, Method};
use std::env;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// CORS configuration loaded from `CORS_ALLOWED_ORIGINS`, a comma-separated
/// origin list. The default `*` allows any origin, which is only meant for
/// local development.
#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn from_env() -> Self {
        let allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self { allowed_origins }
    }

    pub fn layer(&self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::PUT,
                Method::DELETE,
            ])
            .allow_headers(Any);

        if self.allowed_origins.iter().any(|o| o == "*") {
            return layer.allow_origin(Any);
        }

        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();

        layer.allow_origin(origins)
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}
