//! Scaling rules: operator records, validation, and lookup.
//!
//! Operators declare one [`RuleConfig`] per (app, space, org) triple.
//! At startup the whole list is validated in order and normalized into
//! a [`RuleSet`]; the first malformed record rejects the entire set.
//!
//! # Checks
//!
//! ```text
//! 1. app, space, org non-empty
//! 2. min_instances >= MIN_INSTANCES_FLOOR
//! 3. max_instances > min_instances
//! 4. scale_out_cpu, scale_in_cpu in [0,100]
//! 5. cpu pair not (0,0)  =>  scale_in_cpu < scale_out_cpu
//! 6. scale_out_mem, scale_in_mem in [0,100]
//! 7. mem pair not (0,0)  =>  scale_in_mem < scale_out_mem
//! 8. at least one of cpu/mem is enabled
//! 9. no other rule uses the same (app, space, org)
//! ```
//!
//! A `(0, 0)` threshold pair disables that dimension and is normalized
//! to [`Threshold::Disabled`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, RuleError};
use crate::types::RuleKey;

/// The autoscaler never manages an application below this many instances.
pub const MIN_INSTANCES_FLOOR: u32 = 3;

/// A scaling rule exactly as the operator wrote it.
///
/// Numeric fields are signed and default to zero so that every mistake
/// reaches the validator with a precise message instead of failing
/// deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub app: String,
    pub space: String,
    pub org: String,
    pub min_instances: i64,
    pub max_instances: i64,
    pub scale_in_cpu: i64,
    pub scale_out_cpu: i64,
    pub scale_in_mem: i64,
    pub scale_out_mem: i64,
}

/// Inclusive instance-count bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceBounds {
    pub min: u32,
    pub max: u32,
}

/// Utilization band for one resource dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Threshold {
    /// The dimension is not monitored.
    Disabled,
    /// Scale in at or below `scale_in`, scale out at or above `scale_out`.
    Enabled { scale_in: u32, scale_out: u32 },
}

impl Threshold {
    /// Whether utilization `pct` on this dimension asks for another instance.
    ///
    /// A disabled dimension never asks.
    pub fn wants_scale_out(self, pct: u32) -> bool {
        match self {
            Threshold::Disabled => false,
            Threshold::Enabled { scale_out, .. } => pct >= scale_out,
        }
    }

    /// Whether utilization `pct` on this dimension is low enough to drop
    /// an instance.
    ///
    /// A disabled dimension never objects.
    pub fn allows_scale_in(self, pct: u32) -> bool {
        match self {
            Threshold::Disabled => true,
            Threshold::Enabled { scale_in, .. } => pct <= scale_in,
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, Threshold::Enabled { .. })
    }

    // Only called on pairs that already passed range checks.
    fn from_pair(scale_in: i64, scale_out: i64) -> Self {
        if scale_in == 0 && scale_out == 0 {
            Threshold::Disabled
        } else {
            Threshold::Enabled {
                scale_in: scale_in as u32,
                scale_out: scale_out as u32,
            }
        }
    }
}

/// A validated, normalized scaling rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub key: RuleKey,
    pub instances: InstanceBounds,
    pub cpu: Threshold,
    pub mem: Threshold,
}

impl RuleConfig {
    /// Check this record and normalize it into a [`Rule`].
    ///
    /// Checks run in a fixed order and stop at the first failure.
    pub fn validate(&self) -> Result<Rule, RuleError> {
        if self.app.is_empty() {
            return Err(RuleError::MissingApp);
        }
        if self.space.is_empty() {
            return Err(RuleError::MissingSpace);
        }
        if self.org.is_empty() {
            return Err(RuleError::MissingOrg);
        }
        if self.min_instances < i64::from(MIN_INSTANCES_FLOOR) {
            return Err(RuleError::MinBelowFloor {
                min: self.min_instances,
                floor: MIN_INSTANCES_FLOOR,
            });
        }
        if self.max_instances <= self.min_instances {
            return Err(RuleError::MaxNotAboveMin {
                min: self.min_instances,
                max: self.max_instances,
            });
        }
        if self.max_instances > i64::from(u32::MAX) {
            return Err(RuleError::MaxTooLarge {
                max: self.max_instances,
            });
        }

        check_percent("scale_out_cpu", self.scale_out_cpu)?;
        check_percent("scale_in_cpu", self.scale_in_cpu)?;
        check_ordered("cpu", self.scale_in_cpu, self.scale_out_cpu)?;

        check_percent("scale_out_mem", self.scale_out_mem)?;
        check_percent("scale_in_mem", self.scale_in_mem)?;
        check_ordered("mem", self.scale_in_mem, self.scale_out_mem)?;

        let cpu = Threshold::from_pair(self.scale_in_cpu, self.scale_out_cpu);
        let mem = Threshold::from_pair(self.scale_in_mem, self.scale_out_mem);
        if !cpu.is_enabled() && !mem.is_enabled() {
            return Err(RuleError::NoThresholds);
        }

        Ok(Rule {
            key: RuleKey::new(&self.app, &self.space, &self.org),
            instances: InstanceBounds {
                min: self.min_instances as u32,
                max: self.max_instances as u32,
            },
            cpu,
            mem,
        })
    }
}

fn check_percent(field: &'static str, value: i64) -> Result<(), RuleError> {
    if (0..=100).contains(&value) {
        Ok(())
    } else {
        Err(RuleError::ThresholdOutOfRange { field, value })
    }
}

fn check_ordered(dimension: &'static str, scale_in: i64, scale_out: i64) -> Result<(), RuleError> {
    let disabled = scale_in == 0 && scale_out == 0;
    if disabled || scale_in < scale_out {
        Ok(())
    } else {
        Err(RuleError::InvertedThresholds {
            dimension,
            scale_in,
            scale_out,
        })
    }
}

/// The validated rule set, immutable for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    index: HashMap<RuleKey, usize>,
}

impl RuleSet {
    /// Validate `configs` in order, failing on the first bad record.
    pub fn validate(configs: &[RuleConfig]) -> ConfigResult<Self> {
        let mut rules = Vec::with_capacity(configs.len());
        let mut index = HashMap::with_capacity(configs.len());

        for (i, config) in configs.iter().enumerate() {
            let rule = config
                .validate()
                .map_err(|source| ConfigError::InvalidRule { index: i, source })?;

            if let Some(&first) = index.get(&rule.key) {
                return Err(ConfigError::InvalidRule {
                    index: i,
                    source: RuleError::Duplicate {
                        key: rule.key,
                        first,
                    },
                });
            }

            index.insert(rule.key.clone(), i);
            rules.push(rule);
        }

        Ok(Self { rules, index })
    }

    /// Find the rule bound to an (app, space, org) triple.
    pub fn get(&self, key: &RuleKey) -> Option<&Rule> {
        self.index.get(key).map(|&i| &self.rules[i])
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
