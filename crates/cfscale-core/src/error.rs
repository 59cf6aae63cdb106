//! Error types for rule validation and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::RuleKey;

/// Why a single scaling rule was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("no app specified")]
    MissingApp,

    #[error("no space specified")]
    MissingSpace,

    #[error("no org specified")]
    MissingOrg,

    #[error("minimum instances should be >= {floor}, got {min}")]
    MinBelowFloor { min: i64, floor: u32 },

    #[error("maximum instances ({max}) should be more than minimum instances ({min})")]
    MaxNotAboveMin { min: i64, max: i64 },

    #[error("maximum instances ({max}) exceeds the supported range")]
    MaxTooLarge { max: i64 },

    #[error("{field} threshold should be in the range 0<=t<=100, got {value}")]
    ThresholdOutOfRange { field: &'static str, value: i64 },

    #[error("{dimension} scale-in threshold ({scale_in}) should be less than scale-out threshold ({scale_out})")]
    InvertedThresholds {
        dimension: &'static str,
        scale_in: i64,
        scale_out: i64,
    },

    #[error("no cpu/mem thresholds defined")]
    NoThresholds,

    #[error("duplicate rule for {key}, first declared by rule {first}")]
    Duplicate { key: RuleKey, first: usize },
}

/// Errors raised while loading and validating the rule set at startup.
///
/// All of these are fatal: the autoscaler refuses to start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("rule {index}: {source}")]
    InvalidRule { index: usize, source: RuleError },

    #[error("failed to read rules file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse JSON rules: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse TOML rules: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported rules file format: {} (expected .json or .toml)", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
