//! cfscale-core — shared types for the cfscale autoscaler.
//!
//! Holds the scaling rule model (raw operator records, the validated
//! [`Rule`] and the keyed [`RuleSet`]), the per-tick application
//! snapshot types, and the rules-file parsers used at startup.

pub mod config;
pub mod error;
pub mod rules;
pub mod types;

pub use config::{load_rules_file, parse_json_rules, parse_toml_rules};
pub use error::{ConfigError, RuleError};
pub use rules::{InstanceBounds, MIN_INSTANCES_FLOOR, Rule, RuleConfig, RuleSet, Threshold};
pub use types::*;
