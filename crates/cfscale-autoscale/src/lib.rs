//! cfscale-autoscale — keeps application instance counts within bounds.
//!
//! Every tick the [`Autoscaler`] fetches a snapshot of all applications
//! from a [`Platform`], decides a target instance count for each one
//! against its [`Rule`](cfscale_core::Rule), and asks the platform to
//! scale the applications whose target differs from their current count.
//!
//! # Scaling Algorithm
//!
//! ```text
//! rule    = rules[(app, space, org)]          else error: no rule
//! current = desired_instances
//!
//! current outside [rule.min, rule.max]        error: out of bounds
//! current != running_instances                error: still converging
//! current < max and (cpu >= cpu.out or mem >= mem.out)   ScaleTo(current + 1)
//! current > min and (cpu <= cpu.in and mem <= mem.in)    ScaleTo(current - 1)
//! otherwise                                              NoChange
//! ```
//!
//! A disabled dimension never triggers scale-out and never blocks
//! scale-in. Large excursions are corrected one instance per tick.

pub mod aggregate;
pub mod decision;
pub mod error;
pub mod platform;
pub mod scaler;
pub mod stats;

pub use aggregate::{Utilization, aggregate, build_snapshot};
pub use decision::{DecisionError, decide, evaluate};
pub use error::AutoscaleError;
pub use platform::{Apps, BoxFuture, Platform};
pub use scaler::{AppOutcome, Autoscaler, ScaleDecision};
pub use stats::{AutoscaleStats, StatsSnapshot};
