//! Operational API handlers.

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use serde::Serialize;

use cfscale_autoscale::StatsSnapshot;
use cfscale_core::Rule;

use crate::ApiState;
use crate::prometheus::render_prometheus;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(Serialize)]
struct Status {
    version: &'static str,
    rules: Vec<Rule>,
    stats: StatsSnapshot,
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}

/// GET /status
pub async fn status(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(Status {
        version: env!("CARGO_PKG_VERSION"),
        rules: state.rules.rules().to_vec(),
        stats: state.stats.snapshot(),
    })
}

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = render_prometheus(&state.stats.snapshot(), state.rules.len());
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
