//! Standard Algebraic Notation encode/decode.

use cozy_chess::{Board, GameStatus, Move, Piece, Square};

#[derive(Debug, thiserror::Error)]
pub enum SanError {
    #[error("invalid SAN: {0}")]
    InvalidFormat(String),
    #[error("no legal move matches: {0}")]
    NoLegalMove(String),
}

/// Parse a SAN move against the given position.
///
/// Check/mate/annotation suffixes are ignored, and the `0-0` castling
/// spelling is accepted alongside `O-O`.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let wanted = normalize(san);
    if wanted.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    for mv in crate::legal_moves(board) {
        if normalize(&format_san(board, mv)) == wanted {
            return Ok(mv);
        }
    }

    Err(SanError::NoLegalMove(san.to_string()))
}

/// Format a legal move as SAN, with minimal disambiguation and a
/// check/mate suffix.
pub fn format_san(board: &Board, mv: Move) -> String {
    let Some(piece) = board.piece_on(mv.from) else {
        // Not a legal move for this position; fall back to coordinates.
        return crate::uci::format_uci_move(mv);
    };
    let stm = board.side_to_move();

    // cozy-chess encodes castling as the king capturing its own rook.
    if piece == Piece::King && board.color_on(mv.to) == Some(stm) {
        let base = if mv.to.file() > mv.from.file() {
            "O-O"
        } else {
            "O-O-O"
        };
        return with_check_suffix(board, mv, base.to_string());
    }

    let is_capture = board.color_on(mv.to) == Some(!stm)
        || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

    let mut san = String::new();
    if piece == Piece::Pawn {
        if is_capture {
            san.push(file_char(mv.from));
        }
    } else {
        san.push(piece_letter(piece));
        san.push_str(&disambiguation(board, mv, piece));
    }

    if is_capture {
        san.push('x');
    }
    san.push_str(&mv.to.to_string());

    if let Some(promo) = mv.promotion {
        san.push('=');
        san.push(piece_letter(promo));
    }

    with_check_suffix(board, mv, san)
}

fn normalize(san: &str) -> String {
    let trimmed = san.trim_end_matches(['+', '#', '!', '?']);
    match trimmed {
        "0-0" => "O-O".to_string(),
        "0-0-0" => "O-O-O".to_string(),
        _ => trimmed.to_string(),
    }
}

/// Smallest qualifier that distinguishes `mv` from other legal moves of the
/// same piece type to the same square: file, then rank, then both.
fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let rivals: Vec<Move> = crate::legal_moves(board)
        .into_iter()
        .filter(|m| {
            m.to == mv.to && m.from != mv.from && board.piece_on(m.from) == Some(piece)
        })
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let file_clash = rivals.iter().any(|m| m.from.file() == mv.from.file());
    let rank_clash = rivals.iter().any(|m| m.from.rank() == mv.from.rank());
    match (file_clash, rank_clash) {
        (false, _) => file_char(mv.from).to_string(),
        (true, false) => rank_char(mv.from).to_string(),
        (true, true) => mv.from.to_string(),
    }
}

fn with_check_suffix(board: &Board, mv: Move, mut san: String) -> String {
    let mut after = board.clone();
    after.play_unchecked(mv);
    if !after.checkers().is_empty() {
        san.push(if matches!(after.status(), GameStatus::Won) {
            '#'
        } else {
            '+'
        });
    }
    san
}

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::King => 'K',
        Piece::Queen => 'Q',
        Piece::Rook => 'R',
        Piece::Bishop => 'B',
        Piece::Knight => 'N',
        Piece::Pawn => 'P',
    }
}

fn file_char(sq: Square) -> char {
    (b'a' + sq.file() as u8) as char
}

fn rank_char(sq: Square) -> char {
    (b'1' + sq.rank() as u8) as char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        Board::from_fen(fen, false).unwrap()
    }

    #[test]
    fn parses_pawn_push_and_knight_move() {
        let start = Board::default();
        let e4 = parse_san(&start, "e4").unwrap();
        assert_eq!(crate::format_uci_move(e4), "e2e4");
        let nf3 = parse_san(&start, "Nf3").unwrap();
        assert_eq!(crate::format_uci_move(nf3), "g1f3");
    }

    #[test]
    fn formats_capture_with_pawn_file() {
        let b = board("rnbqkbnr/pppp1ppp/8/4p3/3P4/8/PPP1PPPP/RNBQKBNR w KQkq - 0 2");
        let mv = parse_san(&b, "dxe5").unwrap();
        assert_eq!(format_san(&b, mv), "dxe5");
    }

    #[test]
    fn castling_spellings_are_equivalent() {
        let b = board("r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4");
        let a = parse_san(&b, "O-O").unwrap();
        let z = parse_san(&b, "0-0").unwrap();
        assert_eq!(a, z);
        assert_eq!(format_san(&b, a), "O-O");
    }

    #[test]
    fn disambiguates_by_file() {
        // Knights on c3 and e3 both reach d5.
        let b = board("4k3/8/8/8/8/2N1N3/8/4K3 w - - 0 1");
        let mv = parse_san(&b, "Ncd5").unwrap();
        assert_eq!(format_san(&b, mv), "Ncd5");
        assert!(matches!(
            parse_san(&b, "Nd5"),
            Err(SanError::NoLegalMove(_))
        ));
    }

    #[test]
    fn promotion_and_check_suffix() {
        let b = board("8/5P1k/8/8/8/8/8/4K3 w - - 0 1");
        let mv = parse_san(&b, "f8=Q+").unwrap();
        assert_eq!(format_san(&b, mv), "f8=Q+");
        // Suffix is optional on input.
        assert_eq!(parse_san(&b, "f8=Q").unwrap(), mv);
    }

    #[test]
    fn rejects_illegal_move() {
        let start = Board::default();
        assert!(matches!(
            parse_san(&start, "Qd5"),
            Err(SanError::NoLegalMove(_))
        ));
    }
}
