//! UCI coordinate-notation move codec.

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

#[derive(Debug, thiserror::Error)]
pub enum UciMoveError {
    #[error("invalid move: {0}")]
    InvalidMove(String),
    #[error("invalid square: {0}")]
    InvalidSquare(String),
    #[error("invalid promotion: {0}")]
    InvalidPromotion(String),
    #[error("move is not legal here: {0}")]
    IllegalMove(String),
}

/// Format a move in UCI notation (e.g. "e2e4", "e7e8q").
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", mv.from, mv.to);
    if let Some(promo) = mv.promotion {
        s.push(match promo {
            Piece::Queen => 'q',
            Piece::Rook => 'r',
            Piece::Bishop => 'b',
            Piece::Knight => 'n',
            _ => return s,
        });
    }
    s
}

/// Parse UCI move syntax without reference to a position.
pub fn parse_uci_move(s: &str) -> Result<Move, UciMoveError> {
    if !s.is_ascii() || s.len() < 4 || s.len() > 5 {
        return Err(UciMoveError::InvalidMove(s.to_string()));
    }

    let from: Square = s[0..2]
        .parse()
        .map_err(|_| UciMoveError::InvalidSquare(s[0..2].to_string()))?;
    let to: Square = s[2..4]
        .parse()
        .map_err(|_| UciMoveError::InvalidSquare(s[2..4].to_string()))?;

    let promotion = if s.len() == 5 {
        Some(match &s[4..5] {
            "q" => Piece::Queen,
            "r" => Piece::Rook,
            "b" => Piece::Bishop,
            "n" => Piece::Knight,
            _ => return Err(UciMoveError::InvalidPromotion(s.to_string())),
        })
    } else {
        None
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

/// Decode a UCI move against a position, yielding a legal cozy-chess move.
///
/// Engines write castling as the king moving two squares (e1g1); cozy-chess
/// wants king-takes-rook (e1h1). The conversion only applies when the
/// adjusted move is actually legal.
pub fn decode_uci(board: &Board, s: &str) -> Result<Move, UciMoveError> {
    let mv = parse_uci_move(s)?;
    let legal = crate::legal_moves(board);
    let mv = convert_castling(mv, &legal);
    if legal.contains(&mv) {
        Ok(mv)
    } else {
        Err(UciMoveError::IllegalMove(s.to_string()))
    }
}

fn convert_castling(mv: Move, legal: &[Move]) -> Move {
    let back_rank = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let king_file = matches!(mv.from.file(), File::E);
    let castle_file = matches!(mv.to.file(), File::G | File::C);
    if !(back_rank && king_file && castle_file && mv.promotion.is_none()) {
        return mv;
    }

    let rook_file = if mv.to.file() == File::G {
        File::H
    } else {
        File::A
    };
    let converted = Move {
        from: mv.from,
        to: Square::new(rook_file, mv.from.rank()),
        promotion: None,
    };

    if legal.contains(&converted) {
        converted
    } else {
        mv
    }
}
