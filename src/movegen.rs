//! Legal move generation.
//!
//! Pipeline:
//!   1. Pseudo-legal destinations from the ray walkers (`attacks`).
//!   2. Append the en-passant destination, derived from the last history
//!      entry — it is never a standing flag.
//!   3. Filter every candidate through a scratch-copy check simulation.
//!   4. For the king, append the castling destinations that survive the
//!      full eligibility test.
//!
//! Simulate-then-filter is O(destinations × pieces) per query — acceptable
//! on a fixed 64-square board with at most 16 pieces a side.

use crate::attacks;
use crate::board::Board;
use crate::types::{MoveRecord, Piece, PieceKind, Side, Square};

// =========================================================================
// Public API
// =========================================================================

/// Every square the piece on `from` may legally move to, given the last
/// applied move (for en passant). Empty when `from` is vacant.
pub fn legal_destinations(
    board: &Board,
    from: Square,
    last_move: Option<&MoveRecord>,
) -> Vec<Square> {
    let Some(piece) = board.occupant(from) else {
        return Vec::new();
    };

    let mut candidates = attacks::pseudo_destinations(board, piece);
    if let Some(ep) = en_passant_destination(board, piece, last_move) {
        candidates.push(ep);
    }

    let mut legal: Vec<Square> = candidates
        .into_iter()
        .filter(|&to| !board.in_check_after(piece.side, from, to))
        .collect();

    if piece.kind == PieceKind::King {
        for wing in [Wing::Short, Wing::Long] {
            if let Some(to) = castle_destination(board, piece, wing) {
                legal.push(to);
            }
        }
    }

    legal
}

/// Does `side` have at least one legal move anywhere? Drives checkmate and
/// stalemate detection; exits on the first hit.
pub fn side_has_legal_move(board: &Board, side: Side, last_move: Option<&MoveRecord>) -> bool {
    board
        .side(side)
        .pieces()
        .iter()
        .any(|p| !legal_destinations(board, p.square, last_move).is_empty())
}

// =========================================================================
// En passant
// =========================================================================

/// The en-passant destination for `piece`, if the immediately preceding
/// move was the enemy pawn's double step landing right beside it.
fn en_passant_destination(
    board: &Board,
    piece: &Piece,
    last_move: Option<&MoveRecord>,
) -> Option<Square> {
    let last = last_move?;
    if piece.kind != PieceKind::Pawn
        || last.side == piece.side
        || !last.is_double_step()
        || last.to.rank != piece.square.rank
        || last.to.file.abs_diff(piece.square.file) != 1
    {
        return None;
    }
    // The square the enemy pawn skipped — empty, directly behind it.
    let to = Square::new(last.to.file, (piece.square.rank as i8 + piece.side.forward()) as u8);
    debug_assert!(board.occupant(to).is_none());
    Some(to)
}

// =========================================================================
// Castling
// =========================================================================

#[derive(Clone, Copy)]
enum Wing {
    /// King side: king e→g, rook h→f.
    Short,
    /// Queen side: king e→c, rook a→d.
    Long,
}

/// The king's castling destination on `wing`, or `None` if any condition
/// fails: king moved or in check, rook absent/moved, blocked between, or
/// transit/destination attacked (checked by simulating the king there).
fn castle_destination(board: &Board, king: &Piece, wing: Wing) -> Option<Square> {
    let side = king.side;
    let home = side.home_rank();

    if king.has_moved || king.square != Square::new(4, home) || board.in_check(side) {
        return None;
    }

    let (rook_file, between, transit_file, dest_file): (u8, &[u8], u8, u8) = match wing {
        Wing::Short => (7, &[5, 6], 5, 6),
        Wing::Long => (0, &[1, 2, 3], 3, 2),
    };

    let rook = board.occupant_of(side, Square::new(rook_file, home))?;
    if rook.kind != PieceKind::Rook || rook.has_moved {
        return None;
    }

    if between
        .iter()
        .any(|&f| board.occupant(Square::new(f, home)).is_some())
    {
        return None;
    }

    let transit = Square::new(transit_file, home);
    let dest = Square::new(dest_file, home);
    if board.in_check_after(side, king.square, transit)
        || board.in_check_after(side, king.square, dest)
    {
        return None;
    }

    Some(dest)
}

// =========================================================================
// Tests
// =========================================================================
