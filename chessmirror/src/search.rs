//! Listing mirrored games, optionally filtered by opening moves.

use crate::Cli;
use anyhow::Context;
use cozy_chess::{Board, Move};
use mirror::{Game, GameStore, RemoteArchives};

pub fn run<R: RemoteArchives>(cli: &Cli, store: &mut GameStore<R>) -> anyhow::Result<()> {
    let wanted = cli
        .query
        .as_deref()
        .map(parse_query)
        .transpose()
        .context("invalid move in query string")?;

    let games = store.cached_games(&cli.user)?;

    let mut shown = 0;
    for game in &games {
        if shown >= cli.limit {
            break;
        }
        if let Some(wanted) = &wanted {
            if !opening_matches(game, wanted) {
                continue;
            }
        }
        println!("{}", format_game(game, &cli.user));
        shown += 1;
    }

    Ok(())
}

/// Validate the query's SAN moves by playing them from the start position.
fn parse_query(query: &str) -> anyhow::Result<Vec<Move>> {
    let mut board = Board::default();
    let mut moves = Vec::new();
    for san in query.split_whitespace() {
        let mv = chess::parse_san(&board, san)
            .with_context(|| format!("move {:?} is not playable here", san))?;
        board.play_unchecked(mv);
        moves.push(mv);
    }
    Ok(moves)
}

/// Does the game open with exactly these moves?
fn opening_matches(game: &Game, wanted: &[Move]) -> bool {
    let moves = match chess::parse_moves(&game.pgn) {
        Ok(moves) => moves,
        Err(err) => {
            tracing::warn!("could not parse game {}: {}", game.url, err);
            return false;
        }
    };

    moves.len() >= wanted.len() && moves.iter().zip(wanted).all(|(played, w)| played.mv == *w)
}

/// One listing line: date, URL, side glyph, rating, result initial, and the
/// first six moves of the game.
fn format_game(game: &Game, user: &str) -> String {
    let (icon, rating, result) = if game.white.username == user {
        ('\u{2654}', game.white.rating, game.white.normalized().initial())
    } else if game.black.username == user {
        ('\u{265A}', game.black.rating, game.black.normalized().initial())
    } else {
        ('?', 0, '?')
    };

    format!(
        "{} [{}] {}{:>4}{} {}",
        game.end_time.format("%d/%m"),
        game.url,
        icon,
        rating,
        result,
        opening_text(game)
    )
}

fn opening_text(game: &Game) -> String {
    let moves = match chess::parse_moves(&game.pgn) {
        Ok(moves) => moves,
        Err(err) => {
            tracing::warn!("could not parse game {}: {}", game.url, err);
            return String::new();
        }
    };

    let mut out = String::new();
    for (i, pm) in moves.iter().take(12).enumerate() {
        if i % 2 == 0 {
            out.push_str(&format!("{}. ", i / 2 + 1));
        }
        out.push_str(&pm.san);
        out.push(' ');
    }
    out.trim_end().to_string()
}
