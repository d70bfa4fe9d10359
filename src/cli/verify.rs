use std::path::Path;

use console::style;
use serde_json::Value;

use crate::attestation::AttestationSigner;
use crate::cli::commands::VerifyArgs;
use crate::config::ScannerConfig;
use crate::errors::ClawscanError;

/// Runs `clawscan verify`. Exit code 0 for a valid signature, 1 otherwise.
pub fn handle_verify(args: VerifyArgs, config: &ScannerConfig) -> Result<i32, ClawscanError> {
    let key = config.attestation_key.as_deref().ok_or_else(|| {
        ClawscanError::Config("ATTESTATION_KEY must be set to verify attestations".into())
    })?;
    let signer = AttestationSigner::from_config(Some(key))?;

    let path = Path::new(&args.attestation);
    if !path.is_file() {
        return Err(ClawscanError::Attestation(format!("File not found: {}", path.display())));
    }
    let document: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    // Accept a bare attestation or a full deep-scan report that carries one.
    let attestation = document.get("attestation").cloned().unwrap_or(document);

    let signature = match args.signature {
        Some(s) => s,
        None => attestation["signature"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ClawscanError::Attestation("Attestation has no signature field".into()))?,
    };

    if signer.verify(&attestation, &signature) {
        println!("{} attestation signed by {}", style("✓ Valid").green().bold(), signer.key_id());
        Ok(0)
    } else {
        println!("{} signature does not match attestation", style("✗ Invalid").red().bold());
        Ok(1)
    }
}
