//! chessmirror - mirror a player's chess.com game history locally, search
//! it by opening moves, and run engine analysis over a chosen game.

mod analyze;
mod search;

use clap::{Parser, ValueEnum};
use mirror::GameStore;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chessmirror", about = "Mirror and analyse your chess.com games")]
struct Cli {
    /// User whose games to load.
    #[arg(short, long)]
    user: String,

    /// Log level when RUST_LOG is not set.
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Check the server for new data before running.
    #[arg(short = 'r', long)]
    refresh: bool,

    /// Force a full refetch of all data.
    #[arg(short = 'f', long)]
    force: bool,

    /// Number of games to display.
    #[arg(short = 'n', long, default_value_t = 20)]
    limit: usize,

    /// Only display games opening with these moves (space-separated SAN).
    #[arg(short = 'q', long)]
    query: Option<String>,

    /// Game to analyse: a game URL suffix, or "latest".
    #[arg(short = 'a', long)]
    analyze: Option<String>,

    /// Search depth per analysed position.
    #[arg(short = 'd', long, default_value_t = 20)]
    depth: u32,

    /// Soft time budget per analysed position, in milliseconds.
    #[arg(short = 't', long, default_value_t = 1000)]
    timeout_ms: u64,

    /// Score swing (in pawns) above which a move gets annotated.
    #[arg(long, default_value_t = 1.8)]
    threshold: f64,

    /// Engine binary to drive.
    #[arg(long, default_value = "stockfish")]
    engine: PathBuf,

    /// Analysis output format.
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Annotated movetext on stdout.
    Text,
    /// A chess.com analysis-board URL carrying the annotated movetext.
    Url,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut store = GameStore::open();

    if cli.refresh || cli.force {
        if let Err(err) = store.refresh(&cli.user, cli.force) {
            tracing::warn!("could not refresh mirror for {}: {}", cli.user, err);
        }
    }

    match cli.analyze.clone() {
        Some(id) => analyze::run(&cli, &mut store, &id),
        None => search::run(&cli, &mut store),
    }
}
