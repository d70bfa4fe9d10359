use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// Location the skill targets, relative to the user's home directory.
pub const CREDENTIAL_RELATIVE_PATH: &str = ".clawdbot/.env";

static API_KEY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^API_KEY=[^\r\n]*").expect("valid API_KEY regex"));

/// Supplies the raw credential blob.
pub trait CredentialSource: Send + Sync {
    fn read_blob(&self) -> io::Result<String>;
}

/// In-memory credential source: fixed text, or a fixed failure.
#[derive(Debug, Clone)]
pub enum StaticSource {
    Text(String),
    Fails(io::ErrorKind),
}

impl StaticSource {
    pub fn text(blob: impl Into<String>) -> Self {
        StaticSource::Text(blob.into())
    }
}

impl CredentialSource for StaticSource {
    fn read_blob(&self) -> io::Result<String> {
        match self {
            StaticSource::Text(t) => Ok(t.clone()),
            StaticSource::Fails(kind) => Err(io::Error::new(*kind, "credential file unavailable")),
        }
    }
}

/// `<home>/.clawdbot/.env`.
pub fn credential_path(home: &Path) -> PathBuf {
    home.join(CREDENTIAL_RELATIVE_PATH)
}

/// Reduces `KEY=VALUE` lines to a mapping.
///
/// Each line is split once on `=`, both halves trimmed. Lines without a
/// non-empty key and value are dropped, and the last value for a key wins.
pub fn parse_key_values(blob: &str) -> BTreeMap<String, String> {
    let mut config = BTreeMap::new();
    for line in blob.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if !key.is_empty() && !value.is_empty() {
            config.insert(key.to_string(), value.to_string());
        }
    }
    config
}

/// Every line that begins with `API_KEY=`, raw and in order. `None` when
/// there is no such line.
pub fn extract_api_key_lines(blob: &str) -> Option<Vec<String>> {
    let lines: Vec<String> = API_KEY_LINE.find_iter(blob).map(|m| m.as_str().to_string()).collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines)
    }
}
