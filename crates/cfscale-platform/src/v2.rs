//! Cloud Foundry v2 API wire types.
//!
//! Only the fields the autoscaler reads are modelled; everything else in
//! the responses is ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use cfscale_core::{InstanceId, InstanceSample, InstanceState};

/// One page of a paginated listing.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub next_url: Option<String>,
    #[serde(default = "Vec::new")]
    pub resources: Vec<Resource<T>>,
}

/// A metadata/entity envelope.
#[derive(Debug, Deserialize)]
pub struct Resource<T> {
    pub metadata: Metadata,
    pub entity: T,
}

#[derive(Debug, Deserialize)]
pub struct Metadata {
    pub guid: String,
}

/// Desired lifecycle state of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppState {
    Started,
    Stopped,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct AppEntity {
    pub name: String,
    pub space_guid: String,
    pub state: AppState,
    pub instances: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpaceEntity {
    pub name: String,
    pub organization_guid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrgEntity {
    pub name: String,
}

/// Entry of the `/v2/apps/{guid}/stats` map, keyed by instance index.
#[derive(Debug, Deserialize)]
pub struct InstanceStats {
    pub state: InstanceState,
    /// Absent for instances that are down or still starting.
    #[serde(default)]
    pub stats: Option<StatsBody>,
}

#[derive(Debug, Deserialize)]
pub struct StatsBody {
    pub usage: Usage,
    pub mem_quota: i64,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub cpu: f64,
    pub mem: i64,
}

impl From<&InstanceStats> for InstanceSample {
    fn from(s: &InstanceStats) -> Self {
        match &s.stats {
            Some(body) => InstanceSample {
                state: s.state,
                cpu: body.usage.cpu,
                mem_bytes: body.usage.mem,
                mem_quota_bytes: body.mem_quota,
            },
            // A zero quota keeps the sample out of the averages.
            None => InstanceSample {
                state: s.state,
                cpu: 0.0,
                mem_bytes: 0,
                mem_quota_bytes: 0,
            },
        }
    }
}

/// Decode a `/v2/apps/{guid}/stats` map entry by entry.
///
/// An entry that does not decode becomes an excluded sample (zero quota)
/// instead of failing the whole map.
pub fn decode_instance_stats(raw: HashMap<InstanceId, Value>) -> HashMap<InstanceId, InstanceSample> {
    raw.into_iter()
        .map(|(id, entry)| {
            let sample = match serde_json::from_value::<InstanceStats>(entry) {
                Ok(stats) => InstanceSample::from(&stats),
                Err(e) => {
                    debug!(instance = %id, error = %e, "malformed instance stats ignored");
                    InstanceSample {
                        state: InstanceState::Unknown,
                        cpu: 0.0,
                        mem_bytes: 0,
                        mem_quota_bytes: 0,
                    }
                }
            };
            (id, sample)
        })
        .collect()
}

/// Body of the scale request.
#[derive(Debug, Serialize)]
pub struct ScaleRequest {
    pub instances: u32,
}
