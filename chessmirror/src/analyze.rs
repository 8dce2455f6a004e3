//! Whole-game engine analysis and annotation.

use crate::{Cli, OutputFormat};
use anyhow::Context;
use cozy_chess::{Board, Color};
use engine::{AnalysisReport, EngineConfig, EngineDriver, NO_MOVE};
use mirror::{GameStore, RemoteArchives};
use std::time::Duration;

pub fn run<R: RemoteArchives>(cli: &Cli, store: &mut GameStore<R>, id: &str) -> anyhow::Result<()> {
    let game = if id == "latest" {
        store
            .cached_games(&cli.user)?
            .into_iter()
            .next()
            .with_context(|| format!("no games mirrored for {}", cli.user))?
    } else {
        store.open_game(&cli.user, id)?
    };

    let (positions, moves) =
        chess::replay(&game.pgn).context("could not parse game to analyse")?;

    tracing::info!(
        "analysing {} ({} positions, depth {}, budget {}ms)",
        game.url,
        positions.len(),
        cli.depth,
        cli.timeout_ms
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let reports = runtime.block_on(evaluate(cli, &positions))?;

    let annotated = annotate(cli, &positions, &moves, &reports);
    match cli.output {
        OutputFormat::Text => println!("{}", annotated),
        OutputFormat::Url => {
            let url = reqwest::Url::parse_with_params(
                "https://chess.com/analysis",
                &[("pgn", annotated.as_str())],
            )?;
            println!("{}", url);
        }
    }

    Ok(())
}

/// Score every position, from White's perspective. A tainted engine stops
/// the loop; the remaining positions keep zero reports so the annotation
/// pass still lines up with the move list.
async fn evaluate(cli: &Cli, positions: &[Board]) -> anyhow::Result<Vec<AnalysisReport>> {
    let mut driver = EngineDriver::spawn(EngineConfig {
        command: cli.engine.clone(),
        args: Vec::new(),
        depth: cli.depth,
        budget: Duration::from_millis(cli.timeout_ms),
    })
    .await
    .context("could not initialise analysis engine")?;

    let mut reports = vec![AnalysisReport::default(); positions.len()];
    for (i, board) in positions.iter().enumerate() {
        let fen = board.to_string();
        let mut report = driver.analyze(&fen).await;
        if let Some(err) = driver.error() {
            tracing::warn!("engine failed on position {} ({}): {}", i, fen, err);
            break;
        }

        // The engine scores from the side to move.
        if board.side_to_move() == Color::Black {
            report.score = -report.score;
        }

        tracing::info!(
            "analysed position {}/{} (depth {}, {:?})",
            i + 1,
            positions.len(),
            report.depth,
            report.elapsed
        );
        reports[i] = report;
    }

    driver.shutdown().await;
    Ok(reports)
}

/// Annotated movetext: a star where the played move was the engine's
/// choice, and the score swing plus the better move wherever the swing
/// exceeds the threshold.
fn annotate(
    cli: &Cli,
    positions: &[Board],
    moves: &[chess::PgnMove],
    reports: &[AnalysisReport],
) -> String {
    let mut out = String::new();

    for (i, pm) in moves.iter().enumerate() {
        let turn = if i % 2 == 0 {
            format!("{}.", i / 2 + 1)
        } else {
            format!("{}...", i / 2 + 1)
        };

        let played = chess::format_san(&positions[i], pm.mv);
        out.push_str(&format!("{} {} ", turn, played));

        let best = best_move_san(&positions[i], &reports[i].best_move);
        if played == best {
            out.push_str("{\u{2605}} ");
        }

        let swing = reports[i + 1].score - reports[i].score;
        if swing.abs() > cli.threshold {
            out.push_str(&format!("{{ {:+.2} }} ({} {}) ", swing, turn, best));
        }
    }

    out.trim_end().to_string()
}

/// Decode the engine's move into SAN; fall back to the raw text when it
/// cannot be decoded against this position.
fn best_move_san(board: &Board, best_move: &str) -> String {
    if best_move == NO_MOVE {
        return best_move.to_string();
    }
    match chess::decode_uci(board, best_move) {
        Ok(mv) => chess::format_san(board, mv),
        Err(err) => {
            tracing::warn!("could not decode engine move {}: {}", best_move, err);
            best_move.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(threshold: f64) -> Cli {
        Cli::parse_from([
            "chessmirror",
            "-u",
            "alice",
            "--threshold",
            &threshold.to_string(),
        ])
    }

    fn report(score: f64, best_move: &str) -> AnalysisReport {
        AnalysisReport {
            score,
            depth: 10,
            best_move: best_move.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn stars_engine_agreement_and_flags_blunders() {
        let (positions, moves) = chess::replay("1. e4 e5").unwrap();
        // White's e4 matches the engine; Black's e5 loses 2.5 pawns.
        let reports = vec![
            report(0.2, "e2e4"),
            report(0.3, "g8f6"),
            report(2.8, "g1f3"),
        ];

        let out = annotate(&cli(1.8), &positions, &moves, &reports);
        assert!(out.starts_with("1. e4 {\u{2605}}"));
        assert!(out.contains("{ +2.50 } (1... Nf6)"));
    }

    #[test]
    fn quiet_moves_stay_unannotated() {
        let (positions, moves) = chess::replay("1. d4 d5").unwrap();
        let reports = vec![
            report(0.1, "e2e4"),
            report(0.0, "g8f6"),
            report(0.1, "g1f3"),
        ];

        let out = annotate(&cli(1.8), &positions, &moves, &reports);
        assert_eq!(out, "1. d4 1... d5");
    }

    #[test]
    fn sentinel_best_move_is_left_alone() {
        let board = Board::default();
        assert_eq!(best_move_san(&board, NO_MOVE), NO_MOVE);
    }
}
