//! Parsing for the engine's `info` and `bestmove` output lines.

/// Sentinel returned when the engine reports no playable move.
pub const NO_MOVE: &str = "(none)";

/// Saturation value (in pawns) for forced-mate scores.
const MATE_SCORE_PAWNS: f64 = 1000.0;

/// A search score as reported by the engine, from the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Moves until mate; negative when the side to move is being mated.
    Mate(i32),
}

impl Score {
    /// Convert to pawns. Mate scores saturate, sign preserved.
    pub fn pawns(self) -> f64 {
        match self {
            Score::Centipawns(cp) => f64::from(cp) / 100.0,
            // `mate 0` means the side to move is already checkmated.
            Score::Mate(n) if n <= 0 => -MATE_SCORE_PAWNS,
            Score::Mate(_) => MATE_SCORE_PAWNS,
        }
    }
}

/// The fields of an `info` line this driver cares about.
#[derive(Debug, Clone, Default)]
pub struct SearchInfo {
    pub depth: Option<u32>,
    pub score: Option<Score>,
}

/// Walk an `info` line's key/value tokens, keeping depth and score.
/// Unknown keywords are skipped, malformed values yield `None`.
pub fn parse_info_line(line: &str) -> SearchInfo {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut info = SearchInfo::default();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                info.depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                if let (Some(&kind), Some(&value)) = (tokens.get(i + 1), tokens.get(i + 2)) {
                    info.score = match kind {
                        "cp" => value.parse().ok().map(Score::Centipawns),
                        "mate" => value.parse().ok().map(Score::Mate),
                        _ => None,
                    };
                    i += 2;
                }
            }
            _ => {}
        }
        i += 1;
    }

    info
}

/// The chosen move sits at a fixed token position on the terminal line.
/// An absent or truncated token is the "no move" sentinel, not an error.
pub fn parse_bestmove_line(line: &str) -> String {
    line.split_whitespace()
        .nth(1)
        .unwrap_or(NO_MOVE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_centipawn_info() {
        let info = parse_info_line("info depth 18 seldepth 24 score cp -43 nodes 119060324");
        assert_eq!(info.depth, Some(18));
        assert_eq!(info.score, Some(Score::Centipawns(-43)));
        assert!((info.score.unwrap().pawns() + 0.43).abs() < 1e-9);
    }

    #[test]
    fn mate_scores_saturate_with_sign() {
        let winning = parse_info_line("info depth 31 score mate 4 pv h5f7");
        assert_eq!(winning.score.unwrap().pawns(), 1000.0);
        let losing = parse_info_line("info depth 31 score mate -2");
        assert_eq!(losing.score.unwrap().pawns(), -1000.0);
    }

    #[test]
    fn mate_zero_means_already_mated() {
        let mated = parse_info_line("info depth 0 score mate 0");
        assert_eq!(mated.score, Some(Score::Mate(0)));
        assert_eq!(mated.score.unwrap().pawns(), -1000.0);
    }

    #[test]
    fn unknown_keywords_are_skipped() {
        let info = parse_info_line("info tbhits 0 multipv 1 depth 9 score cp 12 string hello");
        assert_eq!(info.depth, Some(9));
        assert_eq!(info.score, Some(Score::Centipawns(12)));
    }

    #[test]
    fn bestmove_token_or_sentinel() {
        assert_eq!(parse_bestmove_line("bestmove e2e4 ponder e7e5"), "e2e4");
        assert_eq!(parse_bestmove_line("bestmove (none)"), "(none)");
        assert_eq!(parse_bestmove_line("bestmove"), NO_MOVE);
    }
}
