//! Piece-registry board representation.
//!
//! `Board` owns one `SideRegistry` per side. Each registry owns its live
//! pieces (at most 16, exactly one King); no two live pieces anywhere share
//! a square. All higher layers — move generation, check detection, the game
//! aggregate — borrow the board for the duration of a query. Check legality
//! is evaluated on scratch clones so the live board is never observed in a
//! half-mutated state.

use crate::attacks;
use crate::types::{Piece, PieceId, PieceKind, Side, Square};
use std::fmt;

// ---------------------------------------------------------------------------
// SideRegistry
// ---------------------------------------------------------------------------

/// The live piece set for one side.
#[derive(Clone, Debug)]
pub struct SideRegistry {
    side: Side,
    pieces: Vec<Piece>,
}

impl SideRegistry {
    fn new(side: Side) -> Self {
        SideRegistry {
            side,
            pieces: Vec::with_capacity(16),
        }
    }

    /// Which side this registry belongs to.
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// All live pieces.
    #[inline]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// The piece occupying `sq`, if any.
    pub fn piece_at(&self, sq: Square) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.square == sq)
    }

    /// Look up a live piece by id.
    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces.iter_mut().find(|p| p.id == id)
    }

    /// This side's king. A registry without exactly one king is a
    /// construction bug, checked at position setup.
    pub fn king(&self) -> &Piece {
        self.pieces
            .iter()
            .find(|p| p.kind == PieceKind::King)
            .expect("registry must hold a king")
    }

    fn add(&mut self, piece: Piece) {
        debug_assert_eq!(piece.side, self.side);
        debug_assert!(
            self.piece_at(piece.square).is_none(),
            "square {} already occupied",
            piece.square
        );
        self.pieces.push(piece);
    }

    fn remove(&mut self, id: PieceId) -> Option<Piece> {
        let idx = self.pieces.iter().position(|p| p.id == id)?;
        Some(self.pieces.swap_remove(idx))
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Both side registries plus the piece-id allocator.
#[derive(Clone, Debug)]
pub struct Board {
    sides: [SideRegistry; 2],
    next_id: u32,
}

impl Board {
    /// An empty board with no pieces.
    pub fn empty() -> Self {
        Board {
            sides: [
                SideRegistry::new(Side::White),
                SideRegistry::new(Side::Black),
            ],
            next_id: 0,
        }
    }

    /// The standard starting layout: R N B Q K B N R on each home rank,
    /// eight pawns in front.
    pub fn standard() -> Self {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        let mut board = Board::empty();
        for side in [Side::White, Side::Black] {
            let home = side.home_rank();
            let pawn_rank = (home as i8 + side.forward()) as u8;
            for (file, &kind) in BACK_RANK.iter().enumerate() {
                board.spawn(side, kind, Square::new(file as u8, home), false);
            }
            for file in 0..8 {
                board.spawn(side, PieceKind::Pawn, Square::new(file, pawn_rank), false);
            }
        }
        board
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// One side's registry.
    #[inline]
    pub fn side(&self, side: Side) -> &SideRegistry {
        &self.sides[side.index()]
    }

    /// The piece on `sq` from either side, if any.
    pub fn occupant(&self, sq: Square) -> Option<&Piece> {
        self.sides[0].piece_at(sq).or_else(|| self.sides[1].piece_at(sq))
    }

    /// The piece on `sq` scoped to one side.
    #[inline]
    pub fn occupant_of(&self, side: Side, sq: Square) -> Option<&Piece> {
        self.side(side).piece_at(sq)
    }

    /// Look up a live piece by id on either side.
    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.sides[0].piece(id).or_else(|| self.sides[1].piece(id))
    }

    /// The king square for a side.
    #[inline]
    pub fn king_square(&self, side: Side) -> Square {
        self.side(side).king().square
    }

    // -----------------------------------------------------------------------
    // Mutation (executor / undo manager / scratch simulations only)
    // -----------------------------------------------------------------------

    /// Create a piece, assigning it a fresh id. Returns the id.
    pub(crate) fn spawn(
        &mut self,
        side: Side,
        kind: PieceKind,
        square: Square,
        has_moved: bool,
    ) -> PieceId {
        let id = PieceId(self.next_id);
        self.next_id += 1;
        self.sides[side.index()].add(Piece {
            id,
            kind,
            side,
            square,
            has_moved,
        });
        id
    }

    /// Re-insert a piece that left play (undo restoring from the captured
    /// pool). The piece keeps its original id, square, and flags.
    pub(crate) fn restore(&mut self, piece: Piece) {
        self.sides[piece.side.index()].add(piece);
    }

    /// Remove a piece from its registry, returning it.
    pub(crate) fn remove(&mut self, id: PieceId) -> Option<Piece> {
        self.sides[0].remove(id).or_else(|| self.sides[1].remove(id))
    }

    fn any_piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        let [white, black] = &mut self.sides;
        white.piece_mut(id).or_else(|| black.piece_mut(id))
    }

    /// Move a piece to `to` without touching its `has_moved` flag.
    pub(crate) fn relocate(&mut self, id: PieceId, to: Square) {
        let piece = self.any_piece_mut(id).expect("relocate of unknown piece");
        piece.square = to;
    }

    /// Overwrite a piece's `has_moved` flag.
    pub(crate) fn set_moved(&mut self, id: PieceId, moved: bool) {
        let piece = self.any_piece_mut(id).expect("set_moved of unknown piece");
        piece.has_moved = moved;
    }

    // -----------------------------------------------------------------------
    // Check detection
    // -----------------------------------------------------------------------

    /// Is `sq` inside the pressure set of any piece of side `by`?
    pub fn is_attacked(&self, sq: Square, by: Side) -> bool {
        self.side(by)
            .pieces()
            .iter()
            .any(|p| attacks::pressures(self, p, sq))
    }

    /// Is `side`'s king currently attacked?
    #[inline]
    pub fn in_check(&self, side: Side) -> bool {
        self.is_attacked(self.king_square(side), !side)
    }

    /// Would `side` be in check after moving its piece from `from` to `to`?
    ///
    /// Evaluated on a scratch clone: any occupant of `to` is removed, the
    /// mover is relocated, and — when the move matches the en-passant
    /// pattern (pawn stepping diagonally onto an empty square) — the passed
    /// pawn beside the destination is removed as well, so a discovered
    /// check along the vacated rank is seen.
    pub fn in_check_after(&self, side: Side, from: Square, to: Square) -> bool {
        let Some(mover) = self.occupant_of(side, from) else {
            return self.in_check(side);
        };
        let mover_id = mover.id;
        let is_pawn = mover.kind == PieceKind::Pawn;

        let mut scratch = self.clone();
        match scratch.occupant(to).map(|p| p.id) {
            Some(victim) => {
                scratch.remove(victim);
            }
            None => {
                // Empty destination: a diagonal pawn step can only be the
                // en-passant capture, whose victim sits beside `to`.
                if is_pawn && from.file != to.file {
                    let beside = Square::new(to.file, from.rank);
                    if let Some(victim) = scratch.occupant(beside).map(|p| p.id) {
                        scratch.remove(victim);
                    }
                }
            }
        }
        scratch.relocate(mover_id, to);
        scratch.in_check(side)
    }

    // -----------------------------------------------------------------------
    // Consistency (debug / test builds)
    // -----------------------------------------------------------------------

    /// Verify registry invariants: unique squares across both sides and
    /// exactly one king per side.
    #[cfg(any(debug_assertions, test))]
    pub fn assert_consistent(&self) {
        let mut seen = std::collections::HashSet::new();
        for registry in &self.sides {
            let kings = registry
                .pieces()
                .iter()
                .filter(|p| p.kind == PieceKind::King)
                .count();
            assert_eq!(kings, 1, "{} must have exactly one king", registry.side());
            for piece in registry.pieces() {
                assert!(
                    seen.insert(piece.square),
                    "two live pieces share {}",
                    piece.square
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Display — ASCII diagram, rank 8 at the top
// ---------------------------------------------------------------------------

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "  {} ", rank + 1)?;
            for file in 0..8 {
                let glyph = self
                    .occupant(Square::new(file, rank))
                    .map(|p| p.kind.glyph(p.side))
                    .unwrap_or('.');
                write!(f, "{glyph}")?;
                if file < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "    a b c d e f g h")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
