//! Per-request log line and metrics

use axum::{extract::Request, middleware::Next, response::Response};
use blooters_common::metrics::RequestMetrics;
use std::time::Instant;
use tracing::info;

pub async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let start = Instant::now();
    let metrics = RequestMetrics::start(&method, &path);

    let response = next.run(request).await;
    let status = response.status().as_u16();

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status,
        latency_ms = start.elapsed().as_millis() as u64,
        "completed request"
    );
    metrics.finish(status);

    response
}
