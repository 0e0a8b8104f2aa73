// Thin shell around the restyle library: argument parsing, logging setup
// and the exit-code policy live here and nowhere else. Library code never
// terminates the process, so every path ends in the match at the bottom.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use restyle::{PatchError, DEFAULT_CSS_BASE_URL};

/// Exit code for "nothing to recover" and URL validation failures, so a
/// wrapping script can tell them apart from generic errors.
const EXIT_UNRECOVERABLE: u8 = 160;

#[derive(Parser)]
#[command(name = "slack-restyle", about = "Injects custom CSS into the Slack desktop app.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply this modification to the Slack app.
    Apply {
        /// Target Slack app directory (the one holding app-<version> dirs).
        #[arg(long)]
        slack_dir: PathBuf,
        /// Base URL for CSS.
        #[arg(long, default_value = DEFAULT_CSS_BASE_URL)]
        css_base_url: String,
    },
    /// Recover from backup files.
    Recover {
        /// Target Slack app directory.
        #[arg(long)]
        slack_dir: PathBuf,
    },
}

fn run(cli: Cli) -> restyle::Result<()> {
    match cli.command {
        Commands::Apply {
            slack_dir,
            css_base_url,
        } => {
            let config = restyle::PatchConfig::new(&slack_dir, &css_base_url)?;
            let outcome = restyle::apply(&config)?;
            println!(
                "{} {}",
                outcome.header_hash_before, outcome.header_hash_after
            );
            Ok(())
        }
        Commands::Recover { slack_dir } => restyle::recover(&slack_dir),
    }
}

fn main() -> ExitCode {
    restyle::init_logging();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ (PatchError::BackupMissing(_) | PatchError::InvalidUrl { .. })) => {
            eprintln!("{e}");
            ExitCode::from(EXIT_UNRECOVERABLE)
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
