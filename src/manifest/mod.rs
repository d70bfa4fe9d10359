//! `skill.json` validation: required fields, declared permissions and
//! suspicious content.

pub mod schema;

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::ClawscanError;
use crate::models::{ManifestCheck, ManifestScanResult, RiskLevel};
use schema::MANIFEST_SCHEMA;

pub const REQUIRED_FIELDS: &[&str] = &["name", "version", "description", "author"];

const OBFUSCATION_INDICATORS: &[&str] = &["eval(", "exec(", "base64", "atob", "btoa"];

const EXFILTRATION_DOMAINS: &[&str] = &["webhook.site", "requestbin", "pipedream.net", "ngrok.io"];

const SENSITIVE_PATHS: &[&str] = &[".env", ".ssh", ".aws/credentials", "id_rsa"];

static SEMVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?$").expect("valid semver regex")
});

#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestParser;

impl ManifestParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses and validates a manifest file. Missing files and malformed JSON
    /// become failed checks rather than errors.
    pub fn parse(&self, manifest_path: &Path) -> ManifestScanResult {
        match std::fs::read_to_string(manifest_path) {
            Ok(content) => self.parse_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => single_failure(
                "file_exists",
                format!("Manifest not found: {}", manifest_path.display()),
            ),
            Err(e) => single_failure(
                "file_exists",
                format!("Manifest unreadable: {}: {}", manifest_path.display(), e),
            ),
        }
    }

    pub fn parse_str(&self, content: &str) -> ManifestScanResult {
        match serde_json::from_str::<Value>(content) {
            Ok(manifest) => self.validate(manifest),
            Err(e) => single_failure("json_validation", format!("Invalid JSON: {}", e)),
        }
    }

    /// Validates an already-decoded manifest.
    pub fn validate(&self, manifest: Value) -> ManifestScanResult {
        let skill_name = manifest
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        let mut checks = Vec::new();
        checks.extend(check_schema(&manifest));
        checks.extend(check_required_fields(&manifest));
        checks.extend(check_version(&manifest));
        checks.extend(check_permissions(&manifest));
        checks.extend(check_code_patterns(&manifest));

        let result = ManifestScanResult::from_checks(skill_name, checks, manifest);
        debug!(skill = %result.skill_name, risk = %result.risk_level, passed = result.passed, "Manifest validated");
        result
    }
}

/// Convenience wrapper around [`ManifestParser::parse`].
pub fn scan_manifest(path: &Path) -> ManifestScanResult {
    ManifestParser::new().parse(path)
}

/// Reads a manifest file strictly, surfacing I/O and JSON failures as errors.
pub fn load_manifest(path: &Path) -> Result<Value, ClawscanError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn single_failure(check_name: &str, message: String) -> ManifestScanResult {
    ManifestScanResult::from_checks(
        "unknown".to_string(),
        vec![ManifestCheck::fail(check_name, RiskLevel::Critical, message)],
        json!({}),
    )
}

fn check_schema(manifest: &Value) -> Vec<ManifestCheck> {
    let compiled = match jsonschema::JSONSchema::compile(&MANIFEST_SCHEMA) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Manifest schema failed to compile");
            return Vec::new();
        }
    };

    let messages: Vec<String> = match compiled.validate(manifest) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() { e.to_string() } else { format!("{} at {}", e, path) }
            })
            .collect(),
    };

    if messages.is_empty() {
        vec![ManifestCheck::pass("schema", RiskLevel::Safe, "Manifest structure valid")]
    } else {
        vec![ManifestCheck::fail("schema", RiskLevel::High, "Manifest structure invalid")
            .with_details(json!({ "violations": messages }))]
    }
}

fn check_required_fields(manifest: &Value) -> Vec<ManifestCheck> {
    REQUIRED_FIELDS
        .iter()
        .map(|field| {
            let name = format!("required_field_{}", field);
            if manifest.get(*field).map_or(false, |v| !v.is_null()) {
                ManifestCheck::pass(name, RiskLevel::Safe, format!("Field '{}' present", field))
            } else {
                ManifestCheck::fail(name, RiskLevel::High, format!("Missing required field: {}", field))
            }
        })
        .collect()
}

fn check_version(manifest: &Value) -> Vec<ManifestCheck> {
    match manifest.get("version").and_then(Value::as_str) {
        Some(v) if SEMVER.is_match(v) => Vec::new(),
        Some(v) => vec![ManifestCheck::fail(
            "version_format",
            RiskLevel::High,
            format!("Invalid version format: '{}' (expected MAJOR.MINOR.PATCH)", v),
        )],
        None => Vec::new(),
    }
}

/// Flattens list or object permission declarations to `category:scope`.
pub fn declared_permissions(manifest: &Value) -> Vec<String> {
    match manifest.get("permissions") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_lowercase())
            .collect(),
        Some(Value::Object(map)) => map
            .iter()
            .flat_map(|(category, scopes)| {
                let category = category.to_lowercase();
                let scopes: Vec<String> = match scopes {
                    Value::Array(items) => items.iter().filter_map(Value::as_str).map(str::to_lowercase).collect(),
                    Value::String(s) => vec![s.to_lowercase()],
                    Value::Bool(true) => vec!["all".to_string()],
                    _ => Vec::new(),
                };
                scopes.into_iter().map(move |s| format!("{}:{}", category, s))
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn check_permissions(manifest: &Value) -> Vec<ManifestCheck> {
    let declared = manifest.get("permissions");
    let explicitly_empty = matches!(declared, Some(Value::Null))
        || matches!(declared, Some(Value::Object(m)) if m.is_empty());
    let permissions = declared_permissions(manifest);

    if permissions.is_empty() {
        if explicitly_empty || permissions_are_none(declared) {
            return vec![ManifestCheck::pass("permissions_declared", RiskLevel::Safe, "No permissions requested")];
        }
        return vec![ManifestCheck::fail(
            "permissions_declared",
            RiskLevel::Medium,
            "No permissions declared (should explicitly declare 'none' or list permissions)",
        )];
    }

    let mut checks = Vec::new();
    for perm in &permissions {
        let (category, scope) = perm.split_once(':').unwrap_or((perm.as_str(), ""));
        let check = match (category, scope) {
            ("filesystem", "all") => Some(ManifestCheck::fail(
                "filesystem_all", RiskLevel::High, "Unrestricted filesystem access requested",
            )),
            ("network", "all") => Some(ManifestCheck::fail(
                "network_all", RiskLevel::High, "Unrestricted network access requested",
            )),
            ("env", "all") => Some(ManifestCheck::fail(
                "env_all", RiskLevel::Critical, "Access to all environment variables (potential credential theft)",
            )),
            ("shell", _) | ("exec", _) => Some(ManifestCheck::fail(
                "shell_exec", RiskLevel::High, "Shell command execution requested",
            )),
            ("network", _) => Some(ManifestCheck::pass(
                "network_declared", RiskLevel::Medium, format!("Network access declared: {}", scope),
            )),
            ("filesystem", _) => Some(ManifestCheck::pass(
                "filesystem_declared", RiskLevel::Low, format!("Filesystem access declared: {}", scope),
            )),
            ("env", _) => Some(ManifestCheck::pass(
                "env_declared", RiskLevel::Low, format!("Environment access declared: {}", scope),
            )),
            _ => None,
        };
        if let Some(check) = check {
            checks.push(check.with_details(json!({ "permission": perm })));
        }
    }

    if checks.is_empty() {
        checks.push(ManifestCheck::pass("permissions_declared", RiskLevel::Safe, "Permissions declared"));
    }
    checks
}

fn permissions_are_none(declared: Option<&Value>) -> bool {
    match declared {
        Some(Value::String(s)) => s.eq_ignore_ascii_case("none"),
        _ => false,
    }
}

fn check_code_patterns(manifest: &Value) -> Vec<ManifestCheck> {
    let mut checks = Vec::new();

    let entry_point = manifest.get("main").and_then(Value::as_str).unwrap_or("");
    if entry_point.is_empty() {
        checks.push(ManifestCheck::fail("entry_point", RiskLevel::High, "No entry point specified"));
    }

    let text = manifest.to_string().to_lowercase();

    let indicators: Vec<&str> = OBFUSCATION_INDICATORS.iter().copied().filter(|i| text.contains(i)).collect();
    if !indicators.is_empty() {
        checks.push(
            ManifestCheck::fail("obfuscation", RiskLevel::Critical, "Potential code obfuscation detected")
                .with_details(json!({ "indicators": indicators })),
        );
    }

    for domain in EXFILTRATION_DOMAINS.iter().filter(|d| text.contains(*d)) {
        checks.push(
            ManifestCheck::fail(
                "suspicious_domain",
                RiskLevel::Medium,
                format!("Reference to known exfiltration domain: {}", domain),
            )
            .with_details(json!({ "domain": domain })),
        );
    }

    for path in SENSITIVE_PATHS.iter().filter(|p| text.contains(*p)) {
        checks.push(
            ManifestCheck::fail(
                "sensitive_file_access",
                RiskLevel::Medium,
                format!("Reference to sensitive file: {}", path),
            )
            .with_details(json!({ "path": path })),
        );
    }

    checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(value: Value) -> ManifestScanResult {
        ManifestParser::new().validate(value)
    }

    fn minimal() -> Value {
        json!({
            "name": "weather",
            "version": "1.0.0",
            "description": "Weather lookups",
            "author": "test-author",
            "main": "index.js",
            "permissions": []
        })
    }

    #[test]
    fn test_valid_minimal_manifest() {
        let mut m = minimal();
        m["permissions"] = Value::Null;
        let result = parse(m);
        assert!(result.passed, "{:?}", result.checks);
        assert_eq!(result.risk_level, RiskLevel::Safe);
        assert!(result.errors().is_empty());
    }

    #[test]
    fn test_missing_required_fields() {
        let result = parse(json!({"name": "x", "main": "index.js", "permissions": null}));
        assert!(!result.passed);
        let errors = result.errors().join(" ").to_lowercase();
        assert!(errors.contains("version"));
        assert!(errors.contains("description"));
        assert!(errors.contains("author"));
    }

    #[test]
    fn test_invalid_version_format() {
        let mut m = minimal();
        m["version"] = json!("one");
        let result = parse(m);
        assert!(!result.passed);
        assert!(result.errors().iter().any(|e| e.to_lowercase().contains("version")));
    }

    #[test]
    fn test_manifest_not_found() {
        let result = ManifestParser::new().parse(Path::new("/nonexistent/skill.json"));
        assert!(!result.passed);
        assert_eq!(result.risk_level, RiskLevel::Critical);
        assert!(result.errors()[0].to_lowercase().contains("not found"));
    }

    #[test]
    fn test_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("skill.json");
        std::fs::write(&path, "{ not json").unwrap();
        let result = ManifestParser::new().parse(&path);
        assert!(!result.passed);
        assert!(result.errors()[0].to_lowercase().contains("json"));
        assert!(load_manifest(&path).is_err());
    }

    #[test]
    fn test_empty_permission_list_is_warning() {
        let result = parse(minimal());
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert!(!result.passed);
        assert!(result.warnings().iter().any(|w| w.contains("No permissions declared")));
    }

    #[test]
    fn test_empty_permission_object_is_safe() {
        let mut m = minimal();
        m["permissions"] = json!({});
        let result = parse(m);
        assert!(result.passed);
        assert_eq!(result.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn test_scoped_network_permission_is_medium() {
        let mut m = minimal();
        m["permissions"] = json!({"network": ["api.weather.gov"]});
        let result = parse(m);
        assert!(result.passed);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert_eq!(declared_permissions(&result.raw_manifest), vec!["network:api.weather.gov"]);
    }

    #[test]
    fn test_env_all_is_critical() {
        let mut m = minimal();
        m["permissions"] = json!(["env:all", "network:all", "filesystem:all"]);
        let result = parse(m);
        assert!(!result.passed);
        assert_eq!(result.risk_level, RiskLevel::Critical);
        assert_eq!(result.critical_issues().len(), 3);
    }

    #[test]
    fn test_shell_permission_is_high() {
        let mut m = minimal();
        m["permissions"] = json!({"shell": ["git"]});
        let result = parse(m);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_missing_entry_point() {
        let mut m = minimal();
        m.as_object_mut().unwrap().remove("main");
        let result = parse(m);
        assert!(result.errors().iter().any(|e| e.contains("entry point")));
    }

    #[test]
    fn test_obfuscation_indicators() {
        let mut m = minimal();
        m["scripts"] = json!({"postinstall": "node -e \"eval(atob('ZXZpbA=='))\""});
        let result = parse(m);
        assert_eq!(result.risk_level, RiskLevel::Critical);
        let check = result.checks.iter().find(|c| c.check_name == "obfuscation").unwrap();
        let indicators = check.details.as_ref().unwrap()["indicators"].as_array().unwrap();
        assert!(indicators.contains(&json!("eval(")));
        assert!(indicators.contains(&json!("atob")));
    }

    #[test]
    fn test_suspicious_domain_and_sensitive_file_warnings() {
        let mut m = minimal();
        m["permissions"] = json!({"filesystem": ["~/.clawdbot/.env"], "network": ["webhook.site"]});
        let result = parse(m);
        let warnings = result.warnings().join("\n").to_lowercase();
        assert!(warnings.contains("webhook.site"));
        assert!(warnings.contains(".env"));
    }

    #[test]
    fn test_permissions_none_string_is_safe() {
        let mut m = minimal();
        m["permissions"] = json!("none");
        let result = parse(m);
        assert!(result.passed, "{:?}", result.checks);
        assert_eq!(result.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn test_schema_violation() {
        let mut m = minimal();
        m["permissions"] = json!(42);
        let result = parse(m);
        let schema = result.checks.iter().find(|c| c.check_name == "schema").unwrap();
        assert!(!schema.passed);
        assert_eq!(schema.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_metadata_extraction() {
        let mut m = minimal();
        m["author"] = json!({"name": "test-author", "email": "a@example.com"});
        m["repository"] = json!("https://github.com/example/weather");
        let result = parse(m);
        let meta = result.metadata();
        assert_eq!(meta["author"]["name"], "test-author");
        assert!(meta["repository"]["url"].as_str().unwrap().contains("github.com"));
    }

    #[test]
    fn test_unicode_manifest() {
        let mut m = minimal();
        m["description"] = json!("天気 🦞");
        m["permissions"] = Value::Null;
        assert!(parse(m).passed);
    }
}
