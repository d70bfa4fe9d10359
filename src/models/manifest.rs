use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use super::finding::RiskLevel;

/// Result of a single manifest validation check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestCheck {
    pub check_name: String,
    pub passed: bool,
    pub risk_level: RiskLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ManifestCheck {
    pub fn pass(name: impl Into<String>, risk_level: RiskLevel, message: impl Into<String>) -> Self {
        Self { check_name: name.into(), passed: true, risk_level, message: message.into(), details: None }
    }

    pub fn fail(name: impl Into<String>, risk_level: RiskLevel, message: impl Into<String>) -> Self {
        Self { check_name: name.into(), passed: false, risk_level, message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Complete validation result for a `skill.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestScanResult {
    pub skill_name: String,
    pub passed: bool,
    pub risk_level: RiskLevel,
    pub checks: Vec<ManifestCheck>,
    pub raw_manifest: Value,
}

impl ManifestScanResult {
    /// Builds a result from its checks, deriving risk and pass state.
    pub fn from_checks(skill_name: String, checks: Vec<ManifestCheck>, raw_manifest: Value) -> Self {
        let risk_level = checks.iter().map(|c| c.risk_level).max().unwrap_or_default();
        let passed = checks.iter().all(|c| c.passed) && risk_level < RiskLevel::High;
        Self { skill_name, passed, risk_level, checks, raw_manifest }
    }

    /// Risk used for the install verdict. A manifest that fails
    /// validation always blocks installation.
    pub fn verdict_risk(&self) -> RiskLevel {
        if self.passed {
            self.risk_level
        } else {
            self.risk_level.max(RiskLevel::High)
        }
    }

    pub fn critical_issues(&self) -> Vec<&ManifestCheck> {
        self.checks.iter().filter(|c| c.risk_level >= RiskLevel::High).collect()
    }

    /// Messages of failed Low/Medium checks.
    pub fn warnings(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|c| !c.passed && matches!(c.risk_level, RiskLevel::Low | RiskLevel::Medium))
            .map(|c| c.message.clone())
            .collect()
    }

    /// Messages of failed High/Critical checks.
    pub fn errors(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|c| !c.passed && c.risk_level >= RiskLevel::High)
            .map(|c| c.message.clone())
            .collect()
    }

    pub fn permissions(&self) -> Value {
        self.raw_manifest.get("permissions").cloned().unwrap_or(Value::Null)
    }

    /// Author and repository metadata, normalised to objects.
    pub fn metadata(&self) -> Value {
        let normalise = |key: &str, inner: &str| match self.raw_manifest.get(key) {
            Some(Value::String(s)) => json!({ inner: s }),
            Some(v @ Value::Object(_)) => v.clone(),
            _ => Value::Null,
        };
        json!({
            "author": normalise("author", "name"),
            "repository": normalise("repository", "url"),
        })
    }

    pub fn to_json(&self) -> Value {
        json!({
            "valid": self.passed,
            "skill_name": self.skill_name,
            "risk_level": self.risk_level.as_upper(),
            "warnings": self.warnings(),
            "errors": self.errors(),
            "permissions": self.permissions(),
            "checks": self.checks.iter().map(|c| json!({
                "name": c.check_name,
                "passed": c.passed,
                "risk": c.risk_level.as_str(),
                "message": c.message,
                "details": c.details,
            })).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_is_maximum_of_checks() {
        let result = ManifestScanResult::from_checks(
            "s".into(),
            vec![
                ManifestCheck::pass("a", RiskLevel::Safe, "ok"),
                ManifestCheck::fail("b", RiskLevel::Medium, "warn"),
            ],
            Value::Null,
        );
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert!(!result.passed);
        assert_eq!(result.warnings(), vec!["warn".to_string()]);
        assert!(result.errors().is_empty());
    }

    #[test]
    fn test_passed_checks_at_high_still_fail() {
        let result = ManifestScanResult::from_checks(
            "s".into(),
            vec![ManifestCheck::pass("net", RiskLevel::High, "network declared")],
            Value::Null,
        );
        assert!(!result.passed);
        assert_eq!(result.critical_issues().len(), 1);
    }

    #[test]
    fn test_metadata_normalises_strings() {
        let result = ManifestScanResult::from_checks(
            "s".into(),
            vec![],
            json!({"author": "alice", "repository": {"url": "https://github.com/a/b"}}),
        );
        let meta = result.metadata();
        assert_eq!(meta["author"]["name"], "alice");
        assert_eq!(meta["repository"]["url"], "https://github.com/a/b");
        assert_eq!(result.risk_level, RiskLevel::Safe);
        assert!(result.passed);
    }
}
