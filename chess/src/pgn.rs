//! PGN movetext parsing.
//!
//! Only the movetext is interpreted: tag pairs, comments, variations and
//! annotation glyphs are stripped, and the remaining SAN tokens are
//! replayed from the standard starting position.

use crate::san::{parse_san, SanError};
use cozy_chess::{Board, Move};

/// A single replayed move with the SAN it was written as.
#[derive(Debug, Clone)]
pub struct PgnMove {
    pub mv: Move,
    pub san: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("move {number}: {source}")]
    BadMove {
        number: usize,
        #[source]
        source: SanError,
    },
}

/// Parse a PGN's movetext into the sequence of played moves.
pub fn parse_moves(pgn: &str) -> Result<Vec<PgnMove>, PgnError> {
    let mut board = Board::default();
    let mut moves = Vec::new();

    for token in movetext_tokens(pgn) {
        if is_skippable(&token) {
            continue;
        }
        let mv = parse_san(&board, &token).map_err(|source| PgnError::BadMove {
            number: moves.len() + 1,
            source,
        })?;
        board.play_unchecked(mv);
        moves.push(PgnMove { mv, san: token });
    }

    Ok(moves)
}

/// Replay a PGN, returning every board position alongside the moves.
///
/// `positions[i]` is the position the i-th move was played from;
/// `positions` has one more element than `moves` (the final position).
pub fn replay(pgn: &str) -> Result<(Vec<Board>, Vec<PgnMove>), PgnError> {
    let moves = parse_moves(pgn)?;

    let mut board = Board::default();
    let mut positions = Vec::with_capacity(moves.len() + 1);
    for pm in &moves {
        positions.push(board.clone());
        board.play_unchecked(pm.mv);
    }
    positions.push(board);

    Ok((positions, moves))
}

/// Split out the whitespace-separated movetext tokens, dropping tag-pair
/// lines, `{}` comments, `;` comments and `()` variations.
fn movetext_tokens(pgn: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut brace_depth = 0usize;
    let mut paren_depth = 0usize;

    for line in pgn.lines() {
        let line = line.trim();
        if line.starts_with('[') && brace_depth == 0 && paren_depth == 0 {
            continue;
        }

        for ch in line.chars() {
            match ch {
                '{' => brace_depth += 1,
                '}' => brace_depth = brace_depth.saturating_sub(1),
                '(' if brace_depth == 0 => paren_depth += 1,
                ')' if brace_depth == 0 => paren_depth = paren_depth.saturating_sub(1),
                ';' if brace_depth == 0 => break,
                c if brace_depth == 0 && paren_depth == 0 => {
                    if c.is_whitespace() {
                        flush(&mut current, &mut tokens);
                    } else {
                        current.push(c);
                    }
                }
                _ => {}
            }
        }
        flush(&mut current, &mut tokens);
    }

    tokens
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

/// Move numbers, results and NAGs carry no move information.
fn is_skippable(token: &str) -> bool {
    matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*")
        || token.starts_with('$')
        || token.chars().all(|c| c.is_ascii_digit() || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[Event "Live Chess"]
[Site "Chess.com"]
[Result "1-0"]

1. e4 {[%clk 0:02:58]} 1... e5 {[%clk 0:02:57]} 2. Nf3 {[%clk 0:02:55]} 2... Nc6
3. Bb5 a6 4. Bxc6 dxc6 1-0"#;

    #[test]
    fn parses_movetext_with_clock_comments() {
        let moves = parse_moves(SAMPLE).unwrap();
        let sans: Vec<&str> = moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(
            sans,
            vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Bxc6", "dxc6"]
        );
    }

    #[test]
    fn replay_yields_one_more_position_than_moves() {
        let (positions, moves) = replay(SAMPLE).unwrap();
        assert_eq!(positions.len(), moves.len() + 1);
        assert_eq!(positions[0], Board::default());
    }

    #[test]
    fn variations_are_ignored() {
        let moves = parse_moves("1. e4 (1. d4 d5) 1... c5 2. Nf3").unwrap();
        let sans: Vec<&str> = moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "c5", "Nf3"]);
    }

    #[test]
    fn illegal_movetext_reports_move_number() {
        let err = parse_moves("1. e4 e5 2. Ke2 Qh1").unwrap_err();
        let PgnError::BadMove { number, .. } = err;
        assert_eq!(number, 4);
    }
}
