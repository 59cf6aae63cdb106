//! Rules-file parsing.
//!
//! Rules arrive either as a JSON array (inline in the environment or in a
//! `.json` file) or as a TOML file of `[[rule]]` tables:
//!
//! ```toml
//! [[rule]]
//! app = "api"
//! space = "prod"
//! org = "acme"
//! min_instances = 3
//! max_instances = 10
//! scale_in_cpu = 20
//! scale_out_cpu = 70
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::rules::RuleConfig;

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rule: Vec<RuleConfig>,
}

/// Parse a JSON array of rule records.
pub fn parse_json_rules(content: &str) -> ConfigResult<Vec<RuleConfig>> {
    Ok(serde_json::from_str(content)?)
}

/// Parse a TOML document of `[[rule]]` tables.
pub fn parse_toml_rules(content: &str) -> ConfigResult<Vec<RuleConfig>> {
    let file: RulesFile = toml::from_str(content)?;
    Ok(file.rule)
}

/// Read rule records from a `.json` or `.toml` file.
pub fn load_rules_file(path: &Path) -> ConfigResult<Vec<RuleConfig>> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_json_rules(&content),
        Some("toml") => parse_toml_rules(&content),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}
