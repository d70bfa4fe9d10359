use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use super::finding::{PatternMatch, Severity};

/// Pattern scan result for one skill directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternScanResult {
    pub skill_path: String,
    /// True when no High or Critical match was found.
    pub passed: bool,
    pub matches: Vec<PatternMatch>,
    pub files_scanned: usize,
}

impl PatternScanResult {
    pub fn from_matches(skill_path: String, matches: Vec<PatternMatch>, files_scanned: usize) -> Self {
        let passed = !matches.iter().any(|m| m.severity.is_blocking());
        Self { skill_path, passed, matches, files_scanned }
    }

    /// Returns only High and Critical matches.
    pub fn critical_matches(&self) -> Vec<&PatternMatch> {
        self.matches.iter().filter(|m| m.severity.is_blocking()).collect()
    }

    /// Count of matches per severity; every severity is present, even at zero.
    pub fn severity_summary(&self) -> BTreeMap<&'static str, usize> {
        let mut summary: BTreeMap<&'static str, usize> =
            Severity::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        for m in &self.matches {
            *summary.entry(m.severity.as_str()).or_insert(0) += 1;
        }
        summary
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.matches.iter().map(|m| m.severity).max()
    }
}
