use serde::{Deserialize, Serialize};
use crate::errors::ClawscanError;

/// CAIP-2 identifier of Base Sepolia.
pub const BASE_SEPOLIA: &str = "eip155:84532";
/// CAIP-2 identifier of Base mainnet.
pub const BASE_MAINNET: &str = "eip155:8453";

pub const TESTNET_FACILITATOR: &str = "https://x402.org/facilitator";

pub const DEFAULT_DEEP_SCAN_PRICE: &str = "$0.01";
pub const DEFAULT_MANIFEST_SCAN_PRICE: &str = "$0.00";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8402;

/// Runtime settings for the scanner service and its x402 payment gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// EVM address that receives deep-scan payments. Empty means demo mode.
    pub pay_to_address: String,
    pub network: String,
    pub facilitator_url: String,
    pub deep_scan_price: String,
    pub manifest_scan_price: String,
    pub host: String,
    pub port: u16,
    pub upload_dir: String,
    /// Hex-encoded attestation signing key.
    #[serde(skip_serializing)]
    pub attestation_key: Option<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            pay_to_address: String::new(),
            network: BASE_SEPOLIA.to_string(),
            facilitator_url: TESTNET_FACILITATOR.to_string(),
            deep_scan_price: DEFAULT_DEEP_SCAN_PRICE.to_string(),
            manifest_scan_price: DEFAULT_MANIFEST_SCAN_PRICE.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            upload_dir: default_upload_dir(),
            attestation_key: None,
        }
    }
}

fn default_upload_dir() -> String {
    std::env::temp_dir().join("clawscan_scans").display().to_string()
}

impl ScannerConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ClawscanError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup, falling back to
    /// defaults for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClawscanError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str, default: String| lookup(key).unwrap_or(default);

        let port = match lookup("API_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ClawscanError::Config(format!("API_PORT is not a valid port: {}", raw)))?,
            None => defaults.port,
        };

        Ok(Self {
            pay_to_address: get("PAY_TO_ADDRESS", defaults.pay_to_address),
            network: get("X402_NETWORK", defaults.network),
            facilitator_url: get("X402_FACILITATOR_URL", defaults.facilitator_url),
            deep_scan_price: get("DEEP_SCAN_PRICE", defaults.deep_scan_price),
            manifest_scan_price: get("MANIFEST_SCAN_PRICE", defaults.manifest_scan_price),
            host: get("API_HOST", defaults.host),
            port,
            upload_dir: get("UPLOAD_DIR", defaults.upload_dir),
            attestation_key: lookup("ATTESTATION_KEY").filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn is_mainnet(&self) -> bool {
        self.network == BASE_MAINNET
    }

    /// Payments are enforced only once a receiving address is set.
    pub fn is_configured(&self) -> bool {
        !self.pay_to_address.is_empty()
    }

    /// Whether the deep-scan endpoint must be paid for.
    pub fn deep_scan_requires_payment(&self) -> bool {
        self.is_configured() && self.deep_scan_price != "$0.00"
    }
}
