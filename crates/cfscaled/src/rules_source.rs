//! Where the rule set comes from: a file on disk or an inline JSON
//! document (usually the `AUTOSCALER_RULES` environment variable).

use std::path::PathBuf;

use anyhow::{Context, bail};
use tracing::info;

use cfscale_core::{RuleSet, load_rules_file, parse_json_rules};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesSource {
    File(PathBuf),
    Inline(String),
}

impl RulesSource {
    /// Pick the single configured source.
    pub fn resolve(file: Option<PathBuf>, inline: Option<String>) -> anyhow::Result<Self> {
        match (file, inline) {
            (Some(path), None) => Ok(Self::File(path)),
            (None, Some(json)) => Ok(Self::Inline(json)),
            (Some(_), Some(_)) => {
                bail!("both --rules-file and AUTOSCALER_RULES are set; configure exactly one")
            }
            (None, None) => bail!("no rules configured: set --rules-file or AUTOSCALER_RULES"),
        }
    }

    /// Parse and validate the rules. Any invalid record rejects the set.
    pub fn load(&self) -> anyhow::Result<RuleSet> {
        let configs = match self {
            Self::File(path) => load_rules_file(path)
                .with_context(|| format!("load rules from {}", path.display()))?,
            Self::Inline(json) => parse_json_rules(json).context("parse AUTOSCALER_RULES")?,
        };

        let rules = RuleSet::validate(&configs).context("validate rules")?;
        info!(rules = rules.len(), source = %self, "rules loaded");
        Ok(rules)
    }
}

impl std::fmt::Display for RulesSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Inline(_) => f.write_str("AUTOSCALER_RULES"),
        }
    }
}
