//! Domain types observed on the hosting platform.
//!
//! Everything here is rebuilt from scratch on every tick; nothing is
//! persisted between iterations of the control loop.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable platform identifier of an application (its GUID).
pub type AppId = String;

/// Identifier of one instance within an application (its index).
pub type InstanceId = String;

/// Name triple that binds a scaling rule to an application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleKey {
    pub app: String,
    pub space: String,
    pub org: String,
}

impl RuleKey {
    pub fn new(app: impl Into<String>, space: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            space: space.into(),
            org: org.into(),
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.org, self.space, self.app)
    }
}

// ── Application ───────────────────────────────────────────────────

/// Identity and configured instance count of an application, as listed
/// by the platform before any instance telemetry is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMeta {
    pub id: AppId,
    pub name: String,
    pub space: String,
    pub org: String,
    /// Instance count the platform is converging toward.
    pub instances: u32,
}

/// Observed state of one application at one polling instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSnapshot {
    pub id: AppId,
    pub name: String,
    pub space: String,
    pub org: String,
    /// Instance count the platform is converging toward.
    pub desired_instances: u32,
    /// Instances whose telemetry passed validity filtering.
    pub running_instances: u32,
    /// Average CPU utilization across running instances (0–100).
    pub cpu_pct: u32,
    /// Average memory utilization across running instances (0–100).
    pub mem_pct: u32,
}

impl AppSnapshot {
    /// The rule lookup key for this application.
    pub fn key(&self) -> RuleKey {
        RuleKey::new(&self.name, &self.space, &self.org)
    }
}

// ── Instance ──────────────────────────────────────────────────────

/// Lifecycle state reported for a single instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceState {
    Running,
    Starting,
    Crashed,
    Down,
    #[serde(other)]
    Unknown,
}

/// Raw resource sample for one instance.
///
/// Values are kept exactly as reported; out-of-range readings are
/// filtered by the aggregator rather than rejected at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstanceSample {
    pub state: InstanceState,
    /// CPU usage as a fraction of one core share (expected 0.0–1.0).
    pub cpu: f64,
    /// Memory in use, in bytes.
    pub mem_bytes: i64,
    /// Memory quota, in bytes.
    pub mem_quota_bytes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_key_display_is_org_space_app() {
        let key = RuleKey::new("api", "prod", "acme");
        assert_eq!(key.to_string(), "acme/prod/api");
    }

    #[test]
    fn snapshot_key_uses_names_not_id() {
        let snap = AppSnapshot {
            id: "0b5c2d9e".to_string(),
            name: "api".to_string(),
            space: "prod".to_string(),
            org: "acme".to_string(),
            desired_instances: 4,
            running_instances: 4,
            cpu_pct: 10,
            mem_pct: 20,
        };
        assert_eq!(snap.key(), RuleKey::new("api", "prod", "acme"));
    }

    #[test]
    fn unknown_instance_state_decodes() {
        let state: InstanceState = serde_json::from_str("\"STARTING\"").unwrap();
        assert_eq!(state, InstanceState::Starting);

        let state: InstanceState = serde_json::from_str("\"EVACUATING\"").unwrap();
        assert_eq!(state, InstanceState::Unknown);
    }
}
