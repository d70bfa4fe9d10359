//! Combines manifest validation and pattern scanning into one verdict.

use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::ClawscanError;
use crate::manifest::ManifestParser;
use crate::models::{Finding, FindingSource, ManifestScanResult, PatternScanResult, RiskLevel};
use crate::scanner::PatternScanner;

pub const MANIFEST_FILE: &str = "skill.json";

/// Outcome of the manifest phase.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ManifestPhase {
    Missing,
    Checked { result: ManifestScanResult },
}

impl ManifestPhase {
    /// Risk contributed to the overall verdict.
    pub fn risk(&self) -> RiskLevel {
        match self {
            ManifestPhase::Missing => RiskLevel::Medium,
            ManifestPhase::Checked { result } => result.verdict_risk(),
        }
    }

    pub fn issues(&self) -> Vec<String> {
        match self {
            ManifestPhase::Missing => vec!["Missing manifest file".to_string()],
            ManifestPhase::Checked { result } => {
                let mut issues = result.errors();
                issues.extend(result.warnings());
                issues
            }
        }
    }

    pub fn result(&self) -> Option<&ManifestScanResult> {
        match self {
            ManifestPhase::Missing => None,
            ManifestPhase::Checked { result } => Some(result),
        }
    }
}

/// 0 = install, 1 = review, 2 = block.
pub fn verdict_exit_code(risk: RiskLevel) -> i32 {
    match risk {
        RiskLevel::Safe | RiskLevel::Low => 0,
        RiskLevel::Medium => 1,
        RiskLevel::High | RiskLevel::Critical => 2,
    }
}

/// Final verdict for one skill.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub skill_name: String,
    pub skill_path: String,
    pub manifest: ManifestPhase,
    pub patterns: PatternScanResult,
    pub risk_level: RiskLevel,
    pub passed: bool,
}

impl Assessment {
    pub fn new(skill_path: &Path, manifest: ManifestPhase, patterns: PatternScanResult) -> Self {
        let pattern_risk = patterns.max_severity().map(RiskLevel::from).unwrap_or_default();
        let risk_level = manifest.risk().max(pattern_risk);

        let skill_name = manifest
            .result()
            .map(|r| r.skill_name.clone())
            .filter(|n| n != "unknown")
            .or_else(|| skill_path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            skill_name,
            skill_path: skill_path.display().to_string(),
            manifest,
            patterns,
            risk_level,
            passed: risk_level <= RiskLevel::Low,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self.risk_level {
            RiskLevel::Safe | RiskLevel::Low => "Skill appears safe to install",
            RiskLevel::Medium => "Review findings before installing",
            RiskLevel::High | RiskLevel::Critical => "DO NOT INSTALL - Critical security issues detected",
        }
    }

    pub fn exit_code(&self) -> i32 {
        verdict_exit_code(self.risk_level)
    }

    /// Manifest problems and pattern matches as one uniform list.
    pub fn findings(&self) -> Vec<Finding> {
        let mut findings = Vec::new();

        match &self.manifest {
            ManifestPhase::Missing => findings.push(Finding {
                severity: RiskLevel::Medium,
                category: FindingSource::Manifest,
                rule: None,
                message: "Missing manifest file".to_string(),
                details: Value::Null,
            }),
            ManifestPhase::Checked { result } => {
                for check in &result.checks {
                    if !check.passed || check.risk_level >= RiskLevel::Medium {
                        findings.push(Finding {
                            severity: check.risk_level,
                            category: FindingSource::Manifest,
                            rule: Some(check.check_name.clone()),
                            message: check.message.clone(),
                            details: check.details.clone().unwrap_or(Value::Null),
                        });
                    }
                }
            }
        }

        for m in &self.patterns.matches {
            findings.push(Finding {
                severity: m.severity.into(),
                category: FindingSource::Pattern,
                rule: Some(m.rule_name.clone()),
                message: m.description.clone(),
                details: json!({
                    "file": file_name(&m.file_path),
                    "matched_strings": m.matched_strings,
                    "line_numbers": m.line_numbers,
                }),
            });
        }

        findings
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Runs both phases against a skill directory.
pub fn assess_skill(skill_path: &Path, scanner: &PatternScanner) -> Result<Assessment, ClawscanError> {
    if !skill_path.exists() {
        return Err(ClawscanError::InvalidSkill(format!(
            "Skill path does not exist: {}",
            skill_path.display()
        )));
    }
    if !skill_path.is_dir() {
        return Err(ClawscanError::InvalidSkill(format!(
            "Skill path is not a directory: {}",
            skill_path.display()
        )));
    }

    let manifest_path = skill_path.join(MANIFEST_FILE);
    let manifest = if manifest_path.is_file() {
        ManifestPhase::Checked { result: ManifestParser::new().parse(&manifest_path) }
    } else {
        ManifestPhase::Missing
    };

    let patterns = scanner.scan_skill(skill_path)?;
    let assessment = Assessment::new(skill_path, manifest, patterns);
    info!(skill = %assessment.skill_name, risk = %assessment.risk_level, passed = assessment.passed, "Assessment complete");
    Ok(assessment)
}
