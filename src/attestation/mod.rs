//! Signed attestations for deep-scan results.
//!
//! An attestation is a small JSON document describing one scan. It is hashed
//! over its canonical form (sorted keys, no whitespace) and the hash is
//! signed with HMAC-SHA256 under the service key.

use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::errors::ClawscanError;
use crate::models::RiskLevel;

type HmacSha256 = Hmac<Sha256>;

pub const ATTESTATION_VERSION: &str = "1.0";
pub const SCANNER_NAME: &str = "clawscan";

/// Fields lifted from a scan into its attestation.
#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub scan_id: String,
    pub skill: String,
    pub verdict: RiskLevel,
    pub timestamp: DateTime<Utc>,
    pub findings_count: usize,
    pub tier: String,
}

/// Serializes `value` with object keys sorted and no whitespace.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

/// SHA-256 of the canonical JSON form, lowercase hex.
pub fn hash_canonical(value: &Value) -> String {
    hex::encode(Sha256::digest(canonical_json(value).as_bytes()))
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

/// Holds the signing key for the lifetime of the service.
#[derive(Clone)]
pub struct AttestationSigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for AttestationSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttestationSigner").field("key_id", &self.key_id()).finish()
    }
}

impl AttestationSigner {
    pub fn from_key(key: Vec<u8>) -> Result<Self, ClawscanError> {
        if key.len() < 16 {
            return Err(ClawscanError::Config(
                "ATTESTATION_KEY must be at least 16 bytes".into(),
            ));
        }
        Ok(Self { key })
    }

    /// Key from a hex string, or a fresh random key when none is configured.
    pub fn from_config(hex_key: Option<&str>) -> Result<Self, ClawscanError> {
        match hex_key {
            Some(k) => {
                let key = hex::decode(strip_hex_prefix(k.trim()))
                    .map_err(|e| ClawscanError::Config(format!("ATTESTATION_KEY is not valid hex: {}", e)))?;
                Self::from_key(key)
            }
            None => {
                let signer = Self::generate();
                warn!(key_id = %signer.key_id(), "No ATTESTATION_KEY configured, using an ephemeral key");
                Ok(signer)
            }
        }
    }

    pub fn generate() -> Self {
        let mut key = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self { key }
    }

    /// Public fingerprint of the key, `0x` + 20 bytes of its SHA-256.
    pub fn key_id(&self) -> String {
        let digest = Sha256::digest(&self.key);
        format!("0x{}", hex::encode(&digest[..20]))
    }

    fn mac(&self) -> Result<HmacSha256, ClawscanError> {
        HmacSha256::new_from_slice(&self.key).map_err(|e| ClawscanError::Attestation(e.to_string()))
    }

    pub fn sign(&self, summary: &ScanSummary) -> Result<Value, ClawscanError> {
        let mut attestation = json!({
            "version": ATTESTATION_VERSION,
            "scanner": SCANNER_NAME,
            "scanner_version": env!("CARGO_PKG_VERSION"),
            "scan_id": summary.scan_id,
            "skill": summary.skill,
            "verdict": summary.verdict.as_upper(),
            "timestamp": summary.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            "findings_count": summary.findings_count,
            "tier": summary.tier,
        });

        let digest = hash_canonical(&attestation);
        let hash_bytes = hex::decode(&digest).map_err(|e| ClawscanError::Attestation(e.to_string()))?;

        let mut mac = self.mac()?;
        mac.update(&hash_bytes);
        let signature = hex::encode(mac.finalize().into_bytes());

        let map = attestation
            .as_object_mut()
            .ok_or_else(|| ClawscanError::Attestation("attestation is not an object".into()))?;
        map.insert("hash".into(), Value::String(format!("sha256:{}", digest)));
        map.insert("signature".into(), Value::String(format!("0x{}", signature)));
        map.insert("signer".into(), Value::String(self.key_id()));

        info!(scan_id = %summary.scan_id, "Signed attestation");
        Ok(attestation)
    }

    /// Checks `signature` against `attestation`. Any malformed input is
    /// reported as an invalid signature.
    pub fn verify(&self, attestation: &Value, signature: &str) -> bool {
        let Some(map) = attestation.as_object() else {
            return false;
        };

        let mut body: Map<String, Value> = map.clone();
        body.remove("signature");
        body.remove("signer");
        let claimed_hash = body.remove("hash");

        let digest = hash_canonical(&Value::Object(body));
        if let Some(claimed) = claimed_hash {
            if claimed.as_str() != Some(&format!("sha256:{}", digest)) {
                return false;
            }
        }

        let Ok(hash_bytes) = hex::decode(&digest) else {
            return false;
        };
        let Ok(signature_bytes) = hex::decode(strip_hex_prefix(signature)) else {
            return false;
        };

        let Ok(mut mac) = self.mac() else {
            return false;
        };
        mac.update(&hash_bytes);
        mac.verify_slice(&signature_bytes).is_ok()
    }
}
