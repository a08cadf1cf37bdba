//! Pressure and pseudo-legal destination generation.
//!
//! One code path per piece kind's *data*, not per kind's code: non-pawn
//! pieces share a single ray walk over `PieceKind::dirs()`, bounded by
//! `PieceKind::slides()`. Pawns are the bespoke exception.
//!
//! Pressure is deliberately broader than pseudo-legal movement: a ray
//! includes the first occupied square it meets regardless of colour. A
//! piece pressures a square its own side occupies — that square is not a
//! destination, but it matters for king safety (the defended piece cannot
//! be captured by the enemy king).

use crate::board::Board;
use crate::types::{Piece, PieceKind, Square};

// =========================================================================
// Pressure (attack sets)
// =========================================================================

/// Every square `piece` threatens, independent of turn or legality.
pub fn pressure(board: &Board, piece: &Piece) -> Vec<Square> {
    match piece.kind {
        PieceKind::Pawn => pawn_pressure(piece),
        _ => ray_pressure(board, piece),
    }
}

/// Allocation-free containment test: is `target` in `piece`'s pressure set?
/// Same walk as [`pressure`], early-exiting — this is the check detector's
/// inner loop.
pub fn pressures(board: &Board, piece: &Piece, target: Square) -> bool {
    match piece.kind {
        PieceKind::Pawn => {
            let dr = piece.side.forward();
            piece.square.offset(-1, dr) == Some(target)
                || piece.square.offset(1, dr) == Some(target)
        }
        kind => {
            for &(df, dr) in kind.dirs() {
                let mut sq = piece.square;
                loop {
                    let Some(next) = sq.offset(df, dr) else { break };
                    if next == target {
                        return true;
                    }
                    if board.occupant(next).is_some() || !kind.slides() {
                        break;
                    }
                    sq = next;
                }
            }
            false
        }
    }
}

/// The one or two forward diagonals, clipped at the board edge.
fn pawn_pressure(piece: &Piece) -> Vec<Square> {
    let dr = piece.side.forward();
    [(-1, dr), (1, dr)]
        .into_iter()
        .filter_map(|(df, dr)| piece.square.offset(df, dr))
        .collect()
}

/// Walk each direction vector, collecting every square visited. A ray ends
/// after including the first occupied square — own or enemy.
fn ray_pressure(board: &Board, piece: &Piece) -> Vec<Square> {
    let mut out = Vec::new();
    for &(df, dr) in piece.kind.dirs() {
        let mut sq = piece.square;
        loop {
            let Some(next) = sq.offset(df, dr) else { break };
            out.push(next);
            if board.occupant(next).is_some() || !piece.kind.slides() {
                break;
            }
            sq = next;
        }
    }
    out
}

// =========================================================================
// Pseudo-legal destinations
// =========================================================================

/// Squares `piece` could move to or capture on, ignoring king safety.
///
/// A strict subset of pressure for non-pawns: a friendly occupant ends the
/// ray *before* inclusion, an enemy occupant ends it *after*. Pawn pushes
/// need emptiness, pawn captures need an enemy on the diagonal. En passant
/// and castling are history-dependent and resolved by the legal-move layer.
pub fn pseudo_destinations(board: &Board, piece: &Piece) -> Vec<Square> {
    match piece.kind {
        PieceKind::Pawn => pawn_destinations(board, piece),
        _ => ray_destinations(board, piece),
    }
}

fn ray_destinations(board: &Board, piece: &Piece) -> Vec<Square> {
    let mut out = Vec::new();
    for &(df, dr) in piece.kind.dirs() {
        let mut sq = piece.square;
        loop {
            let Some(next) = sq.offset(df, dr) else { break };
            match board.occupant(next) {
                Some(other) if other.side == piece.side => break,
                Some(_) => {
                    out.push(next); // capture ends the ray
                    break;
                }
                None => out.push(next),
            }
            if !piece.kind.slides() {
                break;
            }
            sq = next;
        }
    }
    out
}

fn pawn_destinations(board: &Board, piece: &Piece) -> Vec<Square> {
    let mut out = Vec::new();
    let dr = piece.side.forward();

    // Diagonal captures where an enemy stands.
    for df in [-1, 1] {
        if let Some(diag) = piece.square.offset(df, dr)
            && let Some(other) = board.occupant(diag)
            && other.side != piece.side
        {
            out.push(diag);
        }
    }

    // Forward push needs an empty square; the double step additionally
    // needs a never-moved pawn and an empty square beyond.
    if let Some(ahead) = piece.square.offset(0, dr)
        && board.occupant(ahead).is_none()
    {
        out.push(ahead);
        if !piece.has_moved
            && let Some(two_ahead) = ahead.offset(0, dr)
            && board.occupant(two_ahead).is_none()
        {
            out.push(two_ahead);
        }
    }

    out
}

// =========================================================================
// Tests
// =========================================================================
