use std::path::{Path, PathBuf};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use crate::assessment::{assess_skill, Assessment};
use crate::cli::banner;
use crate::cli::commands::ScanArgs;
use crate::config::parse_rules_file;
use crate::errors::ClawscanError;
use crate::reporting::{format_assessment, to_json};
use crate::rules::RulesConfig;
use crate::scanner::PatternScanner;

const NON_SKILL_DIRS: &[&str] = &["node_modules", "dist", "build"];

/// Runs `clawscan scan` and returns the process exit code.
pub fn handle_scan(args: ScanArgs, verbose: bool, quiet: bool) -> Result<i32, ClawscanError> {
    let scanner = build_scanner(args.rules.as_deref())?;
    let root = PathBuf::from(&args.path);
    if !root.exists() {
        return Err(ClawscanError::InvalidSkill(format!("Path not found: {}", root.display())));
    }

    if !args.json && !quiet && !args.no_banner {
        banner::print_banner();
    }

    let skills = if args.recursive {
        let dirs = skill_dirs(&root)?;
        if dirs.is_empty() {
            return Err(ClawscanError::InvalidSkill(format!(
                "No skill directories found in {}",
                root.display()
            )));
        }
        dirs
    } else {
        vec![root]
    };

    let progress = (args.recursive && !args.json && !quiet).then(|| {
        let bar = ProgressBar::new(skills.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("  {bar:30.cyan/dark_gray} {pos}/{len} skills | {msg}") {
            bar.set_style(style.progress_chars("█▓░"));
        }
        bar
    });

    let mut assessments = Vec::with_capacity(skills.len());
    for skill in &skills {
        if let Some(bar) = &progress {
            bar.set_message(display_name(skill));
        }
        assessments.push(assess_skill(skill, &scanner)?);
        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    if args.json {
        let output = if args.recursive {
            json!({
                "skills": assessments.iter().map(to_json).collect::<Vec<_>>(),
                "summary": summary(&assessments),
            })
        } else {
            to_json(&assessments[0])
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for assessment in &assessments {
            print!("{}", format_assessment(assessment, verbose));
        }
        if args.recursive {
            print_summary(&assessments);
        }
    }

    Ok(assessments.iter().map(Assessment::exit_code).max().unwrap_or(0))
}

fn build_scanner(rules: Option<&str>) -> Result<PatternScanner, ClawscanError> {
    let config = match rules {
        Some(path) => RulesConfig::default().merge(parse_rules_file(Path::new(path))?),
        None => RulesConfig::default(),
    };
    PatternScanner::with_config(config)
}

/// Immediate subdirectories that look like skills, sorted by name.
fn skill_dirs(root: &Path) -> Result<Vec<PathBuf>, ClawscanError> {
    if !root.is_dir() {
        return Err(ClawscanError::InvalidSkill(format!("Not a directory: {}", root.display())));
    }
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter(|p| {
            let name = display_name(p);
            !name.starts_with('.') && !NON_SKILL_DIRS.contains(&name.as_str())
        })
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn summary(assessments: &[Assessment]) -> serde_json::Value {
    let count = |code: i32| assessments.iter().filter(|a| a.exit_code() == code).count();
    json!({
        "total": assessments.len(),
        "safe": count(0),
        "review": count(1),
        "blocked": count(2),
    })
}

fn print_summary(assessments: &[Assessment]) {
    println!("{}", style("SUMMARY").bold());
    for a in assessments {
        let mark = match a.exit_code() {
            0 => style("✓").green(),
            1 => style("⚠").yellow(),
            _ => style("✗").red(),
        };
        println!("  {} {:<32} {}", mark, a.skill_name, crate::reporting::styled_risk(a.risk_level));
    }
    let s = summary(assessments);
    println!(
        "\n  {} scanned, {} safe, {} need review, {} blocked\n",
        s["total"], s["safe"], s["review"], s["blocked"]
    );
}
