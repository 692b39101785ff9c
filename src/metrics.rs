use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if observability is enabled via OBSERVABILITY_ENABLED env var
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true) // Enabled by default
    })
}

/// Initialize Prometheus metrics exporter with upkeep task
/// Returns None if observability is disabled
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5,
                10.0,
            ],
        )
        .expect("Failed to set buckets")
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    // Spawn upkeep task to clean stale metrics
    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Some(handle)
}

/// Metrics middleware to track HTTP requests
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let uri_path = req.uri().path().to_owned();

    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or(uri_path);

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();
    let status_str = status.to_string();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status_str).increment(1);

    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    let status_category = match status {
        200..=299 => "2xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    };
    counter!("http_requests_by_status", "status_category" => status_category).increment(1);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Router for metrics server
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

// Business metrics helpers

pub fn track_user_registered() {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_registered_total").increment(1);
}

pub fn track_login_success() {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "status" => "success").increment(1);
}

pub fn track_login_failure(reason: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "status" => "failure", "reason" => reason.to_string())
        .increment(1);
}

/// Track permission cache effectiveness
pub fn track_cache_hit() {
    if !is_observability_enabled() {
        return;
    }
    counter!("cache_lookups_total", "outcome" => "hit").increment(1);
}

pub fn track_cache_miss() {
    if !is_observability_enabled() {
        return;
    }
    counter!("cache_lookups_total", "outcome" => "miss").increment(1);
}

/// Track menu import runs and their yield
pub fn track_menu_import(extracted: usize, imported: u64) {
    if !is_observability_enabled() {
        return;
    }
    counter!("menu_imports_total").increment(1);
    counter!("menu_items_extracted_total").increment(extracted as u64);
    counter!("menu_items_imported_total").increment(imported);
}

/// Track chat proxy usage
pub fn track_chat_request() {
    if !is_observability_enabled() {
        return;
    }
    counter!("chat_requests_total").increment(1);
}

pub fn track_chat_stream_duration(duration_secs: f64) {
    if !is_observability_enabled() {
        return;
    }
    histogram!("chat_stream_duration_seconds").record(duration_secs);
}

/// Current occupancy gauge per study hall
pub fn set_study_hall_occupancy(hall_id: &str, count: i64) {
    if !is_observability_enabled() {
        return;
    }
    gauge!("study_hall_occupancy", "hall" => hall_id.to_string()).set(count as f64);
}

/// Track transactional email sends by template
pub fn track_email_sent(template: &str, success: bool) {
    if !is_observability_enabled() {
        return;
    }
    let status = if success { "sent" } else { "failed" };
    counter!("emails_total", "template" => template.to_string(), "status" => status).increment(1);
}
