use std::path::PathBuf;

use console::style;

use crate::assessment::{verdict_exit_code, MANIFEST_FILE};
use crate::cli::commands::ManifestArgs;
use crate::errors::ClawscanError;
use crate::manifest::ManifestParser;
use crate::reporting::styled_risk;

/// Runs `clawscan manifest` and returns the process exit code.
pub fn handle_manifest(args: ManifestArgs) -> Result<i32, ClawscanError> {
    let mut path = PathBuf::from(&args.path);
    if path.is_dir() {
        path = path.join(MANIFEST_FILE);
    }
    if !path.is_file() {
        return Err(ClawscanError::InvalidSkill(format!("Manifest not found: {}", path.display())));
    }

    let result = ManifestParser::new().parse(&path);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.to_json())?);
    } else {
        println!("\n{} {}", style("Manifest:").bold(), result.skill_name);
        println!("{}", "─".repeat(70));
        for check in &result.checks {
            let mark = if check.passed { style("✓").green() } else { style("✗").red() };
            println!("  {} {:<28} {} [{}]", mark, check.check_name, check.message, styled_risk(check.risk_level));
        }
        println!("{}", "─".repeat(70));
        println!(
            "Result: {}  Risk Level: {}\n",
            if result.passed { style("VALID").green().bold() } else { style("INVALID").red().bold() },
            styled_risk(result.risk_level),
        );
    }

    Ok(verdict_exit_code(result.verdict_risk()))
}
