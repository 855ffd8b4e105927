//! Headless Bastion player.
//!
//! # Usage
//!
//! ```bash
//! # Play a live match over stdin/stdout
//! cargo run -p bastion_headless -- play
//!
//! # Replay a transcript and write the replies to a file
//! cargo run -p bastion_headless -- replay --transcript match.jsonl --output replies.jsonl
//! ```
//!
//! Logs go to stderr; stdout carries only protocol replies.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bastion_headless::{load_engine_config, MatchRunner, Result, RunSummary};

#[derive(Parser)]
#[command(name = "bastion_headless")]
#[command(about = "Headless tower-defense decision engine")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// RON file overriding decision thresholds
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a live match on stdin/stdout (default)
    Play,

    /// Feed a recorded transcript through the engine
    Replay {
        /// JSON-lines transcript: game config, then state frames
        #[arg(short, long)]
        transcript: PathBuf,

        /// Where to write replies (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    match run(cli) {
        Ok(summary) => {
            tracing::info!(
                rounds = summary.rounds,
                frames = summary.frames,
                countered = summary.countered,
                "Run complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<RunSummary> {
    let config = load_engine_config(cli.config.as_deref())?;
    let mut runner = MatchRunner::new(config);

    match cli.command.unwrap_or(Commands::Play) {
        Commands::Play => {
            let stdin = io::stdin();
            runner.run(stdin.lock(), io::stdout().lock())
        }
        Commands::Replay { transcript, output } => {
            let input = BufReader::new(File::open(&transcript)?);
            tracing::info!(path = %transcript.display(), "Replaying transcript");
            match output {
                Some(path) => runner.run(input, BufWriter::new(File::create(path)?)),
                None => runner.run(input, io::stdout().lock()),
            }
        }
    }
}
