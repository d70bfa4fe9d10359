use clap::Parser;
use clawscan::cli::{self, Commands};
use clawscan::config::ScannerConfig;
use clawscan::errors::ClawscanError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    // Initialize logging
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.with_ansi(!cli.no_color).init();
    }

    let verbose = cli.verbose > 0;
    let result = run(cli.command, verbose, cli.quiet).await;

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(command: Commands, verbose: bool, quiet: bool) -> Result<i32, ClawscanError> {
    match command {
        Commands::Scan(args) => cli::scan::handle_scan(args, verbose, quiet),
        Commands::Manifest(args) => cli::manifest::handle_manifest(args),
        Commands::Serve(args) => {
            let config = ScannerConfig::from_env()?;
            cli::serve::handle_serve(args, config).await.map(|()| 0)
        }
        Commands::Verify(args) => {
            let config = ScannerConfig::from_env()?;
            cli::verify::handle_verify(args, &config)
        }
    }
}
