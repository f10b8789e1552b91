//! rc-verify CLI
//!
//! Entry point for the `rc-verify` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use rc_verify::pipeline::resolve_staging_dir;
use rc_verify::signal::SignalHandler;
use rc_verify::{Pipeline, VerifyConfig};

#[derive(Parser)]
#[command(name = "rc-verify")]
#[command(about = "Release-candidate verification pipeline", version)]
struct Cli {
    /// Base URL of the published release-candidate artifact tree
    base_url: String,

    /// Staging directory (overrides the configured value)
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// Path to config file (default: rc-verify.toml when present)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Verbose stage-by-stage progress on stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() {
    // clap's own exit code for usage errors is 2; a missing base URL is
    // an invocation failure like any other and exits 1
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    let mut config = match VerifyConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    config.staging_dir = resolve_staging_dir(&config, cli.staging_dir);

    let handler = SignalHandler::new();
    if let Err(e) = handler.install() {
        eprintln!("Error: failed to install signal handler: {}", e);
        process::exit(1);
    }

    let pipeline = Pipeline::new(config, cli.base_url)
        .with_signal_state(handler.state())
        .with_verbose(cli.verbose);

    match pipeline.run() {
        Ok(summary) => process::exit(summary.exit_code()),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}
