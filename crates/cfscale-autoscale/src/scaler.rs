//! Autoscaler — the polling loop.
//!
//! Each tick fetches a snapshot of every application from the platform,
//! decides a target instance count per application, and issues a scale
//! request where the target differs from the current count. A failed
//! fetch skips the whole tick; a failure on one application never
//! affects the others.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use cfscale_core::{AppId, AppSnapshot, MIN_INSTANCES_FLOOR, RuleSet};

use crate::decision::decide;
use crate::error::AutoscaleError;
use crate::platform::Platform;
use crate::stats::AutoscaleStats;

/// What the autoscaler did with one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleDecision {
    /// A scale request for this instance count was accepted.
    ScaleTo(u32),
    /// No change needed.
    NoChange,
}

/// Result of processing one application during a tick.
pub type AppOutcome = Result<ScaleDecision, AutoscaleError>;

/// Drives scaling decisions for every application on the platform.
pub struct Autoscaler {
    rules: Arc<RuleSet>,
    platform: Arc<dyn Platform>,
    stats: Arc<AutoscaleStats>,
}

impl Autoscaler {
    /// Create an autoscaler over a validated rule set.
    pub fn new(rules: Arc<RuleSet>, platform: Arc<dyn Platform>) -> Self {
        Self {
            rules,
            platform,
            stats: Arc::new(AutoscaleStats::new()),
        }
    }

    /// Share counters with another component (e.g. the status API).
    pub fn with_stats(mut self, stats: Arc<AutoscaleStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> Arc<AutoscaleStats> {
        self.stats.clone()
    }

    /// Decide on a single application and scale it if needed.
    pub async fn autoscale_app(&self, app: &AppSnapshot) -> AppOutcome {
        let desired = decide(app, &self.rules)?;

        debug!(
            app = %app.name,
            space = %app.space,
            org = %app.org,
            app_id = %app.id,
            current = app.desired_instances,
            running = app.running_instances,
            cpu = app.cpu_pct,
            mem = app.mem_pct,
            target = desired,
            "autoscale app"
        );

        self.apply(app, desired).await
    }

    /// Move `app` to `desired` instances, refusing targets below the floor.
    async fn apply(&self, app: &AppSnapshot, desired: u32) -> AppOutcome {
        if desired == app.desired_instances {
            return Ok(ScaleDecision::NoChange);
        }

        // Unreachable with a validated rule set.
        if desired < MIN_INSTANCES_FLOOR {
            return Err(AutoscaleError::BelowFloor {
                desired,
                floor: MIN_INSTANCES_FLOOR,
            });
        }

        self.platform
            .scale(app, desired)
            .await
            .map_err(AutoscaleError::Scale)?;

        info!(
            app = %app.name,
            space = %app.space,
            org = %app.org,
            app_id = %app.id,
            from = app.desired_instances,
            to = desired,
            cpu = app.cpu_pct,
            mem = app.mem_pct,
            "scaling app"
        );

        Ok(ScaleDecision::ScaleTo(desired))
    }

    /// Run a single iteration over every application.
    ///
    /// Fails only if the application list cannot be fetched, in which
    /// case nothing is scaled.
    pub async fn tick(&self) -> anyhow::Result<Vec<(AppId, AppOutcome)>> {
        let apps = match self.platform.fetch_apps().await {
            Ok(apps) => apps,
            Err(e) => {
                self.stats.record_tick_skipped();
                return Err(e.context("get app list"));
            }
        };

        let mut outcomes = Vec::with_capacity(apps.len());
        let mut scaled = 0usize;

        for (id, app) in &apps {
            self.stats.record_app_evaluated();
            let outcome = self.autoscale_app(app).await;

            match &outcome {
                Ok(ScaleDecision::ScaleTo(to)) => {
                    scaled += 1;
                    self.stats.record_scale(app.desired_instances, *to);
                }
                Ok(ScaleDecision::NoChange) => {}
                Err(e) => self.report_failure(app, e),
            }

            outcomes.push((id.clone(), outcome));
        }

        self.stats.record_tick_completed();
        info!(apps = apps.len(), scaled, "autoscaler iteration completed");

        Ok(outcomes)
    }

    fn report_failure(&self, app: &AppSnapshot, err: &AutoscaleError) {
        match err {
            AutoscaleError::Decision(_) => {
                self.stats.record_decision_error();
                warn!(
                    app = %app.name,
                    space = %app.space,
                    org = %app.org,
                    app_id = %app.id,
                    desired = app.desired_instances,
                    running = app.running_instances,
                    cpu = app.cpu_pct,
                    mem = app.mem_pct,
                    error = %err,
                    "autoscale app skipped"
                );
            }
            AutoscaleError::BelowFloor { .. } => {
                self.stats.record_invariant_violation();
                error!(
                    app = %app.name,
                    space = %app.space,
                    org = %app.org,
                    app_id = %app.id,
                    desired = app.desired_instances,
                    error = %err,
                    "refusing scale request"
                );
            }
            AutoscaleError::Scale(_) => {
                self.stats.record_scale_failure();
                warn!(
                    app = %app.name,
                    space = %app.space,
                    org = %app.org,
                    app_id = %app.id,
                    desired = app.desired_instances,
                    error = %err,
                    "scaling action failed"
                );
            }
        }
    }

    /// Run the autoscaler loop until `shutdown` changes.
    ///
    /// The first iteration starts one `interval` after the call. Shutdown
    /// is only observed between iterations, so an in-flight iteration
    /// always runs to completion.
    pub async fn run(&self, interval: Duration, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        info!(
            interval_secs = interval.as_secs(),
            rules = self.rules.len(),
            "autoscaler started"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("starting autoscaler iteration");
                    if let Err(e) = self.tick().await {
                        let msg = format!("{e:#}");
                        warn!(error = %msg, "autoscaler iteration skipped");
                    }
                }
                _ = shutdown.changed() => {
                    info!("autoscaler shutting down");
                    break;
                }
            }
        }
    }
}
