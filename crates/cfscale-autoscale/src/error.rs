//! Per-application autoscaling errors.

use thiserror::Error;

use crate::decision::DecisionError;

/// Why an application was not scaled this tick.
///
/// None of these abort the tick; they are logged and counted, and the
/// next application is processed.
#[derive(Debug, Error)]
pub enum AutoscaleError {
    #[error("analyze app: {0}")]
    Decision(#[from] DecisionError),

    #[error("illegal to scale below {floor} instances (computed {desired})")]
    BelowFloor { desired: u32, floor: u32 },

    #[error("scale app: {0:#}")]
    Scale(#[source] anyhow::Error),
}
