//! Blooters API Gateway
//!
//! Read-only HTTP API over the games and goals written by the ingestion
//! service. Handles:
//! - Game listing for the front-end
//! - Rate limiting
//! - Health and readiness probes
//! - Observability (logging, metrics)

mod handlers;
mod middleware;

use axum::{
    http::{HeaderValue, StatusCode},
    routing::get,
    Router,
};
use blooters_common::{
    config::{AppConfig, ObservabilityConfig},
    db::DbPool,
    metrics, MatchStore, Repository,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use middleware::rate_limit::{create_rate_limiter, rate_limit_middleware};
use middleware::request_metrics::track_requests;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn MatchStore>,
    pub metrics: Option<PrometheusHandle>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    init_tracing(&config.observability);
    info!("Starting Blooters API Gateway v{}", blooters_common::VERSION);

    // Initialize metrics
    metrics::register_metrics();
    let metrics_handle = PrometheusBuilder::new()
        .set_buckets(metrics::LATENCY_BUCKETS)?
        .install_recorder()?;

    // Initialize database connection
    let db = DbPool::new(&config.database).await?;
    db.ensure_schema().await?;

    // Create app state
    let state = AppState {
        config: config.clone(),
        store: Arc::new(Repository::new(db)),
        metrics: Some(metrics_handle),
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let server = &state.config.server;

    let cors = cors_layer(&server.cors_origin);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let mut api_routes = Router::new()
        .route("/games", get(handlers::games::list_games))
        .route("/ping", get(handlers::games::ping));

    if let Some(limiter) = create_rate_limiter(server.rate_limit_rps, server.rate_limit_burst) {
        api_routes = api_routes.layer(axum::middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    let timeout = state.config.request_timeout();

    // Compose the app
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn(track_requests))
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        // Outermost so the id exists before it is copied to the response
        .layer(request_id)
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                warn!(origin, "Invalid CORS origin, allowing any");
                AllowOrigin::any()
            }
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(observability.log_level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use blooters_common::{GoalRecord, MatchRecord, MemoryStore};
    use chrono::Utc;
    use tower::ServiceExt;

    async fn seeded_state() -> AppState {
        let store = MemoryStore::new();
        let goal = GoalRecord {
            description: "Arsenal [1]-0 Leeds United - Thierry Henry 78'".into(),
            home_team: "Arsenal".into(),
            away_team: "Leeds United".into(),
            goalscorer: "Thierry Henry".into(),
            minute: "78".into(),
            url: "https://streamable.com/abc".into(),
            reddit_url: "https://www.reddit.com/r/soccer/comments/abc/".into(),
            home_score: 1,
            ..Default::default()
        };
        let game_id = store
            .insert_match(&MatchRecord::from_first_goal(goal.clone(), Utc::now()))
            .await
            .unwrap();
        store.insert_goal(game_id, &goal).await.unwrap();

        let mut config = AppConfig::default();
        config.server.cors_origin = "https://blooters.example".into();

        AppState {
            config: Arc::new(config),
            store: Arc::new(store),
            metrics: None,
        }
    }

    async fn send_get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(header::ORIGIN, "https://blooters.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, headers, body)
    }

    #[tokio::test]
    async fn test_list_games_shape() {
        let (status, headers, body) = send_get(create_router(seeded_state().await), "/api/games").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], 200);
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://blooters.example"
        );
        assert!(headers.contains_key("x-request-id"));

        let game = &body["games"][0];
        assert_eq!(game["home_team"], "Arsenal");
        assert_eq!(game["away_team"], "Leeds United");
        assert_eq!(game["home_score"], 1);

        let goal = &game["goals"][0];
        assert_eq!(goal["goalscorer"], "Thierry Henry");
        assert_eq!(goal["minute"], "78");
        assert_eq!(goal["game_id"], game["id"]);
        assert_eq!(goal["mirrors"], serde_json::Value::Null);
        assert_eq!(goal["away"], false);
    }

    #[tokio::test]
    async fn test_request_id_generated_and_propagated() {
        let (_, headers, _) = send_get(create_router(seeded_state().await), "/api/ping").await;
        let generated = headers.get("x-request-id").expect("generated request id");
        assert!(!generated.is_empty());

        let response = create_router(seeded_state().await)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers().get("x-request-id").unwrap(), "abc-123");
    }

    #[tokio::test]
    async fn test_ping() {
        let (status, _, body) = send_get(create_router(seeded_state().await), "/api/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"message": "pong", "status": 200}));
    }

    #[tokio::test]
    async fn test_health_and_ready() {
        let state = seeded_state().await;

        let (status, _, body) = send_get(create_router(state.clone()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, _, body) = send_get(create_router(state), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["database"]["status"], "up");
    }

    #[tokio::test]
    async fn test_metrics_disabled_without_exporter() {
        let (status, _, _) = send_get(create_router(seeded_state().await), "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rate_limit_applies_to_api() {
        let mut state = seeded_state().await;
        let mut config = (*state.config).clone();
        config.server.rate_limit_rps = 1;
        config.server.rate_limit_burst = 1;
        state.config = Arc::new(config);

        let app = create_router(state);
        let (first, _, _) = send_get(app.clone(), "/api/ping").await;
        let (second, _, _) = send_get(app.clone(), "/api/ping").await;
        let (health, _, _) = send_get(app, "/health").await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(health, StatusCode::OK);
    }
}
