use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "clawscan", version, about = "Pre-install security scanner for ClawdHub skills")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a skill directory before installing it
    Scan(ScanArgs),
    /// Validate a single skill.json manifest
    Manifest(ManifestArgs),
    /// Start the HTTP scanning service
    Serve(ServeArgs),
    /// Verify a signed scan attestation
    Verify(VerifyArgs),
}

#[derive(Args, Clone)]
pub struct ScanArgs {
    /// Skill directory (or a directory of skills with --recursive)
    pub path: String,

    /// Scan every skill directory under PATH
    #[arg(short, long)]
    pub recursive: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Extra rules file (YAML)
    #[arg(long)]
    pub rules: Option<String>,

    /// Skip the startup banner
    #[arg(long)]
    pub no_banner: bool,
}

#[derive(Args, Clone)]
pub struct ManifestArgs {
    /// Path to skill.json, or the skill directory containing it
    pub path: String,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Listen address (overrides API_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port (overrides API_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args, Clone)]
pub struct VerifyArgs {
    /// Attestation JSON file
    pub attestation: String,

    /// Signature to check; defaults to the attestation's own `signature` field
    #[arg(long)]
    pub signature: Option<String>,
}
