//! Detection rules for skill source files.
//!
//! Rules are regular expressions evaluated line by line. The built-in set
//! lives in [`defaults`]; a YAML rules file can disable built-ins by id and
//! append custom rules:
//!
//! ```yaml
//! use_default_rules: true
//! disabled_rules:
//!   - env-access
//! rules:
//!   - id: pastebin-upload
//!     rule_name: CredentialExfiltration
//!     pattern: "pastebin\\.com"
//!     severity: critical
//!     description: "Upload to paste site"
//! ```

pub mod defaults;

use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::errors::ClawscanError;
use crate::models::Severity;

pub use defaults::default_rules;

/// A single detection rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRule {
    /// Stable identifier, used to disable the rule.
    pub id: String,
    /// Rule family reported with each match (e.g. `CredentialExfiltration`).
    pub rule_name: String,
    /// Regular expression matched against each line.
    pub pattern: String,
    /// Text reported as the matched string; defaults to the pattern.
    #[serde(default)]
    pub label: Option<String>,
    pub severity: Severity,
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl PatternRule {
    pub fn new(id: &str, rule_name: &str, pattern: &str, severity: Severity, description: &str) -> Self {
        Self {
            id: id.to_string(),
            rule_name: rule_name.to_string(),
            pattern: pattern.to_string(),
            label: None,
            severity,
            description: description.to_string(),
            enabled: true,
        }
    }

    pub fn labelled(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.pattern)
    }

    pub fn compile(&self) -> Result<Regex, ClawscanError> {
        Regex::new(&self.pattern).map_err(|e| {
            ClawscanError::Rule(format!("Failed to compile rule '{}': {}", self.id, e))
        })
    }
}

/// A rule together with its compiled expression.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: PatternRule,
    pub regex: Regex,
}

/// Rule set customisation loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_enabled")]
    pub use_default_rules: bool,
    #[serde(default)]
    pub disabled_rules: Vec<String>,
    #[serde(default)]
    pub rules: Vec<PatternRule>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            use_default_rules: true,
            disabled_rules: Vec::new(),
            rules: Vec::new(),
        }
    }
}

impl RulesConfig {
    /// Merges two configurations; `other` adds rules and disables on top of `self`.
    pub fn merge(mut self, other: RulesConfig) -> Self {
        self.use_default_rules = self.use_default_rules && other.use_default_rules;
        self.disabled_rules.extend(other.disabled_rules);
        self.rules.extend(other.rules);
        self
    }

    /// Resolves the effective rule list and compiles it.
    pub fn compile(&self) -> Result<Vec<CompiledRule>, ClawscanError> {
        let mut rules = if self.use_default_rules { default_rules() } else { Vec::new() };
        rules.extend(self.rules.iter().cloned());

        rules
            .into_iter()
            .filter(|r| r.enabled && !self.disabled_rules.contains(&r.id))
            .map(|rule| {
                let regex = rule.compile()?;
                Ok(CompiledRule { rule, regex })
            })
            .collect()
    }
}
