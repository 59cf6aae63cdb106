//! cfscale-api — operational HTTP surface of the autoscaler daemon.
//!
//! Runs independently of the polling loop; it only reads the shared rule
//! set and counters.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/healthz` | Liveness probe |
//! | GET | `/status` | Version, loaded rules, and loop counters |
//! | GET | `/metrics` | Prometheus exposition |

pub mod handlers;
pub mod prometheus;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use cfscale_autoscale::AutoscaleStats;
use cfscale_core::RuleSet;

pub use prometheus::render_prometheus;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub rules: Arc<RuleSet>,
    pub stats: Arc<AutoscaleStats>,
}

/// Build the operational router.
pub fn build_router(rules: Arc<RuleSet>, stats: Arc<AutoscaleStats>) -> Router {
    let state = ApiState { rules, stats };

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/status", get(handlers::status))
        .route("/metrics", get(handlers::prometheus_metrics))
        .with_state(state)
}
