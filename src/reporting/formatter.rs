use std::path::Path;

use console::style;
use serde_json::{json, Value};

use crate::assessment::{Assessment, ManifestPhase};
use crate::models::{PatternScanResult, RiskLevel, Severity};

const RULE: &str = "======================================================================";
const THIN: &str = "----------------------------------------------------------------------";

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Plain-text report of a pattern scan.
pub fn format_pattern_report(result: &PatternScanResult) -> String {
    let mut lines = vec![
        RULE.to_string(),
        format!("Pattern Scan Report: {}", file_name(&result.skill_path)),
        RULE.to_string(),
        format!("Files Scanned: {}", result.files_scanned),
        format!("Status: {}", if result.passed { "✅ PASS" } else { "❌ FAIL" }),
        String::new(),
    ];

    if result.matches.is_empty() {
        lines.push("No suspicious patterns detected.".to_string());
        return lines.join("\n");
    }

    let summary = result.severity_summary();
    lines.push("Severity Summary:".to_string());
    for severity in Severity::ALL {
        let count = summary.get(severity.as_str()).copied().unwrap_or(0);
        if count > 0 {
            let icon = if severity.is_blocking() { "🔴" } else { "🟡" };
            lines.push(format!("  {} {}: {}", icon, severity.as_str().to_uppercase(), count));
        }
    }

    lines.push(String::new());
    lines.push("Detailed Findings:".to_string());
    lines.push(THIN.to_string());

    let mut sorted: Vec<_> = result.matches.iter().collect();
    sorted.sort_by(|a, b| b.severity.cmp(&a.severity));

    for m in sorted {
        lines.push(format!("\n[{}] {}", m.severity.as_str().to_uppercase(), m.rule_name));
        lines.push(format!("Description: {}", m.description));
        lines.push(format!("File: {}", file_name(&m.file_path)));
        lines.push(format!(
            "Lines: {}",
            m.line_numbers.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ")
        ));
        lines.push(format!("Patterns: {}", m.matched_strings.join(", ")));
    }

    lines.push(format!("\n{}", RULE));
    lines.join("\n")
}

/// Colours a risk label for terminal output.
pub fn styled_risk(risk: RiskLevel) -> String {
    let label = risk.as_upper();
    match risk {
        RiskLevel::Critical => style(label).red().bold().to_string(),
        RiskLevel::High => style(label).yellow().bold().to_string(),
        RiskLevel::Medium => style(label).blue().to_string(),
        RiskLevel::Low | RiskLevel::Safe => style(label).green().to_string(),
    }
}

/// Console report printed by `clawscan scan`.
pub fn format_assessment(assessment: &Assessment, verbose: bool) -> String {
    let mut out = Vec::new();
    out.push(format!("\n{} {}", style("Scanning:").bold(), assessment.skill_name));
    out.push("─".repeat(70));

    out.push(format!("\n{}", style("[1/2] Validating manifest...").bold()));
    match &assessment.manifest {
        ManifestPhase::Missing => {
            out.push(format!("  {} No skill.json found", style("Warning:").yellow()));
        }
        ManifestPhase::Checked { result } if result.passed => {
            out.push("  ✓ Manifest valid".to_string());
            out.push(format!("  Risk level: {}", styled_risk(result.risk_level)));
            if verbose {
                let permissions = crate::manifest::declared_permissions(&result.raw_manifest);
                if !permissions.is_empty() {
                    out.push("\n  Declared permissions:".to_string());
                    for p in permissions {
                        out.push(format!("    • {}", p));
                    }
                }
            }
        }
        ManifestPhase::Checked { .. } => {
            out.push(format!("  {}", style("✗ Manifest validation failed").red()));
        }
    }

    out.push(format!("\n{}", style("[2/2] Scanning for malicious patterns...").bold()));
    let matches = &assessment.patterns.matches;
    if matches.is_empty() {
        out.push("  ✓ No malicious patterns detected".to_string());
    } else {
        out.push(format!("  {}\n", style(format!("✗ Found {} suspicious patterns", matches.len())).red()));
        for m in matches {
            out.push(format!("  [{}] {}", styled_risk(m.severity.into()), m.rule_name));
            out.push(format!("      File: {}", m.file_path));
            out.push(format!("      Description: {}", m.description));
            if verbose {
                for s in m.matched_strings.iter().take(3) {
                    out.push(format!("      Match: {}", s));
                }
                out.push(format!(
                    "      Lines: {}",
                    m.line_numbers.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ")
                ));
            }
            out.push(String::new());
        }
    }

    out.push(format!("\n{}", "═".repeat(70)));
    out.push(style("OVERALL ASSESSMENT").bold().to_string());
    out.push("─".repeat(70));
    out.push(format!("Risk Level: {}", styled_risk(assessment.risk_level)));

    let issues = assessment.manifest.issues();
    if !issues.is_empty() {
        out.push(format!("\nManifest Issues ({}):", issues.len()));
        for issue in issues {
            out.push(format!("  • {}", issue));
        }
    }

    if !matches.is_empty() {
        out.push(format!("\nSecurity Findings ({}):", matches.len()));
        for m in matches {
            out.push(format!("  • {} ({})", m.rule_name, m.severity));
        }
    }

    out.push(format!("\n{}", style("RECOMMENDATION:").bold()));
    let line = match assessment.exit_code() {
        0 => style(format!("✓ {}", assessment.recommendation())).green(),
        1 => style(format!("⚠ {}", assessment.recommendation())).yellow(),
        _ => style(format!("✗ {}", assessment.recommendation())).red(),
    };
    out.push(format!("  {}", line));
    out.push(format!("{}\n", "─".repeat(70)));

    out.join("\n")
}

/// Machine-readable form of an assessment.
pub fn to_json(assessment: &Assessment) -> Value {
    json!({
        "skill_name": assessment.skill_name,
        "skill_path": assessment.skill_path,
        "passed": assessment.passed,
        "risk_level": assessment.risk_level.as_upper(),
        "manifest": assessment.manifest.result().map(|r| r.to_json()),
        "pattern_scan": {
            "passed": assessment.patterns.passed,
            "files_scanned": assessment.patterns.files_scanned,
            "matches": assessment.patterns.matches.iter().map(|m| json!({
                "rule_name": m.rule_name,
                "severity": m.severity,
                "description": m.description,
                "file_path": file_name(&m.file_path),
                "matched_strings": m.matched_strings,
                "line_numbers": m.line_numbers,
            })).collect::<Vec<_>>(),
            "severity_summary": assessment.patterns.severity_summary(),
        },
        "findings": assessment.findings(),
        "recommendation": assessment.recommendation(),
    })
}
