use std::path::Path;
use crate::errors::ClawscanError;
use crate::rules::RulesConfig;
use tracing::debug;

/// Largest rules file accepted.
const MAX_RULES_FILE_BYTES: u64 = 1_048_576;

/// Rule file names picked up automatically from a skill directory.
pub const RULES_FILE_NAMES: &[&str] = &[".clawscan-rules.yaml", ".clawscan-rules.yml"];

pub fn parse_rules_file(path: &Path) -> Result<RulesConfig, ClawscanError> {
    if !path.exists() {
        return Err(ClawscanError::Config(format!("Rules file not found: {}", path.display())));
    }

    let metadata = std::fs::metadata(path)?;
    if metadata.len() > MAX_RULES_FILE_BYTES {
        return Err(ClawscanError::Config("Rules file exceeds 1MB limit".into()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: RulesConfig = serde_yaml::from_str(&content)?;
    debug!(path = %path.display(), custom = config.rules.len(), disabled = config.disabled_rules.len(), "Loaded rules file");
    Ok(config)
}

/// Finds a rules file inside `skill_dir`, if any.
pub fn find_rules_file(skill_dir: &Path) -> Option<std::path::PathBuf> {
    RULES_FILE_NAMES
        .iter()
        .map(|name| skill_dir.join(name))
        .find(|p| p.is_file())
}
