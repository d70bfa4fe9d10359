//! Built-in rules for JavaScript/TypeScript skills.

use super::PatternRule;
use crate::models::Severity;

pub fn default_rules() -> Vec<PatternRule> {
    vec![
        // ====================================================================
        // Credential exfiltration
        // ====================================================================
        PatternRule::new(
            "exfil-webhook-site",
            "CredentialExfiltration",
            r"webhook\.site",
            Severity::Critical,
            "Known exfiltration domain",
        )
        .labelled("webhook.site"),
        // `process.env` is covered by env-access; this one wants a literal
        // dotfile reference such as '.env' or '/.clawdbot/.env'.
        PatternRule::new(
            "dotenv-read",
            "CredentialExfiltration",
            r"(?:^|[^\w])\.env\b",
            Severity::High,
            "Reading .env file",
        )
        .labelled(".env"),
        PatternRule::new(
            "bulk-env-capture",
            "CredentialExfiltration",
            r"(?:\benv\s*:\s*process\.env\s*(?:[,}]|$)|JSON\.stringify\(\s*process\.env\s*\))",
            Severity::High,
            "Bulk environment capture",
        )
        .labelled("env: process.env"),
        // ====================================================================
        // Permissions and execution
        // ====================================================================
        PatternRule::new(
            "env-access",
            "DangerousPermissions",
            r"process\.env",
            Severity::Medium,
            "Environment variable access",
        )
        .labelled("process.env"),
        PatternRule::new(
            "child-process",
            "DangerousPermissions",
            r"child_process",
            Severity::High,
            "Shell command execution",
        )
        .labelled("child_process"),
        PatternRule::new(
            "eval-call",
            "ObfuscatedCode",
            r"\beval\s*\(",
            Severity::High,
            "Dynamic code execution",
        )
        .labelled("eval("),
        // ====================================================================
        // Network and load-time behaviour
        // ====================================================================
        PatternRule::new(
            "outbound-http",
            "NetworkAccess",
            r"(?:\bhttps?\.(?:request|post|get)\s*\(|\bfetch\s*\()",
            Severity::Medium,
            "Outbound HTTP request",
        )
        .labelled("http request"),
        PatternRule::new(
            "load-time-file-read",
            "LoadTimeSideEffect",
            r"^(?:const|let|var)\s+[\w{}\s,]+=\s*(?:fs\.)?readFileSync\s*\(",
            Severity::High,
            "File read at module load",
        )
        .labelled("readFileSync"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn rule(id: &str) -> Regex {
        default_rules()
            .into_iter()
            .find(|r| r.id == id)
            .unwrap()
            .compile()
            .unwrap()
    }

    #[test]
    fn test_rule_ids_unique() {
        let rules = default_rules();
        let mut ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), rules.len());
    }

    #[test]
    fn test_dotenv_rule_skips_process_env() {
        let re = rule("dotenv-read");
        assert!(re.is_match("fs.readFileSync('.env', 'utf-8')"));
        assert!(re.is_match("process.env.HOME + '/.clawdbot/.env'"));
        assert!(re.is_match("path.join(home, '.clawdbot', '.env')"));
        assert!(!re.is_match("const key = process.env.API_KEY;"));
        assert!(!re.is_match("load('.envrc')"));
    }

    #[test]
    fn test_bulk_env_capture() {
        let re = rule("bulk-env-capture");
        assert!(re.is_match("  env: process.env"));
        assert!(re.is_match("{ keys, env: process.env }"));
        assert!(re.is_match("body: JSON.stringify(process.env)"));
        assert!(!re.is_match("env: process.env.NODE_ENV,"));
    }

    #[test]
    fn test_load_time_read_requires_top_level() {
        let re = rule("load-time-file-read");
        assert!(re.is_match("const envFile = fs.readFileSync(p, 'utf8');"));
        assert!(!re.is_match("  const credentials = fs.readFileSync(envPath, 'utf8');"));
    }

    #[test]
    fn test_outbound_http() {
        let re = rule("outbound-http");
        assert!(re.is_match("https.post('https://example.test/x', data);"));
        assert!(re.is_match("const req = https.request(options);"));
        assert!(re.is_match("await fetch(url)"));
        assert!(!re.is_match("const https = require('https');"));
    }

    #[test]
    fn test_eval_word_boundary() {
        let re = rule("eval-call");
        assert!(re.is_match("eval(userInput);"));
        assert!(!re.is_match("retrieval(x)"));
    }
}
