//! Rules and notation support on top of cozy-chess.
//!
//! The rest of the workspace treats this crate as a black box with three
//! concerns: parsing a game's move text, and translating moves between
//! Standard Algebraic Notation, UCI coordinate notation, and board
//! positions (FEN).

pub mod pgn;
pub mod san;
pub mod uci;

pub use pgn::{parse_moves, replay, PgnError, PgnMove};
pub use san::{format_san, parse_san, SanError};
pub use uci::{decode_uci, format_uci_move, parse_uci_move, UciMoveError};

use cozy_chess::{Board, Move};

/// Collect every legal move in the position.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|piece_moves| {
        moves.extend(piece_moves);
        false
    });
    moves
}
