//! Pre-install security scanner for ClawdHub skills.
//!
//! A skill is checked in two phases: its `skill.json` manifest is validated
//! and its source files are matched against pattern rules. The combined
//! verdict is available from the CLI and from an HTTP service whose deep
//! scans are gated by x402 payments and return signed attestations.

pub mod api;
pub mod assessment;
pub mod attestation;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fixture;
pub mod manifest;
pub mod models;
pub mod payment;
pub mod reporting;
pub mod rules;
pub mod scanner;
