use dotenvy::dotenv;
use lunchlit::logging::{init_tracing, shutdown_tracer};
use lunchlit::metrics::{init_metrics, metrics_app};
use lunchlit::router::init_router;
use lunchlit::state::init_app_state;

#[tokio::main]
async fn main() {
    dotenv().ok();

    init_tracing();

    // Prometheus scrapes a separate listener so /metrics never rides the public API
    if let Some(handle) = init_metrics() {
        tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind("0.0.0.0:9091").await.unwrap();
            println!("📈 Metrics available at http://localhost:9091/metrics");
            axum::serve(listener, metrics_app(handle)).await.unwrap();
        });
    }

    let state = init_app_state().await;
    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    println!("🚀 Server running on http://localhost:3000");
    println!("📚 Swagger UI available at http://localhost:3000/swagger-ui");
    println!("📖 Scalar UI available at http://localhost:3000/scalar");
    axum::serve(listener, app).await.unwrap();

    shutdown_tracer().await;
}
