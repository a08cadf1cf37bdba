//! Stateful game aggregate.
//!
//! `Game` owns the board, the move history, and the captured/created piece
//! pools, and drives the state machine (active → checkmate / stalemate /
//! pending promotion). It is the primary type a host interacts with. One
//! aggregate per game — concurrent games never share state.
//!
//! Two API flavours, the lenient one wrapping the typed one:
//!   * `apply_move` / `resolve_promotion` / `undo` never fail — an invalid
//!     request leaves the game unchanged and returns the current state;
//!   * `try_apply_move` / `try_resolve_promotion` / `try_undo` report the
//!     rejection as a `RulesError`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::board::Board;
use crate::movegen;
use crate::types::{
    GameState, MoveRecord, Piece, PieceId, PieceKind, PromotionKind, RulesError, Side, Square,
};

// =========================================================================
// Placement — minimal position representation
// =========================================================================

/// One piece of a constructed position (see [`Game::from_position`]).
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    pub side: Side,
    pub kind: PieceKind,
    pub square: Square,
    pub has_moved: bool,
}

impl Placement {
    /// A piece that has not moved yet.
    pub fn new(side: Side, kind: PieceKind, square: Square) -> Self {
        Placement {
            side,
            kind,
            square,
            has_moved: false,
        }
    }

    /// A piece that already counts as moved (no castling rights, no pawn
    /// double step).
    pub fn moved(side: Side, kind: PieceKind, square: Square) -> Self {
        Placement {
            side,
            kind,
            square,
            has_moved: true,
        }
    }
}

// =========================================================================
// Pool entries
// =========================================================================

/// A piece removed from play, tagged with the move that removed it.
#[derive(Clone, Debug)]
struct CapturedEntry {
    piece: Piece,
    move_index: u32,
}

/// A piece created by promotion, tagged with the move that created it.
#[derive(Clone, Debug)]
struct CreatedEntry {
    id: PieceId,
    move_index: u32,
}

// =========================================================================
// Game
// =========================================================================

/// A complete chess game: position, history, pools, and phase.
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    history: Vec<MoveRecord>,
    captured: Vec<CapturedEntry>,
    created: Vec<CreatedEntry>,
    /// Monotonic move counter; the next record's `move_index`.
    move_count: u32,
    state: GameState,

    // Host-facing metadata.
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// A new game from the standard starting layout, White to move.
    pub fn new() -> Self {
        let game = Game {
            board: Board::standard(),
            history: Vec::new(),
            captured: Vec::new(),
            created: Vec::new(),
            move_count: 0,
            state: GameState::Active {
                to_move: Side::White,
            },
            id: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        tracing::debug!(game = %game.id, "new game from standard layout");
        game
    }

    /// A game from a constructed position — the minimal stand-in for a
    /// serialized layout. Rejects double occupancy, oversized sides, and a
    /// side without exactly one king. The phase is evaluated immediately,
    /// so a constructed mate or stalemate is reported as such.
    pub fn from_position(
        placements: impl IntoIterator<Item = Placement>,
        to_move: Side,
    ) -> Result<Self, RulesError> {
        let mut board = Board::empty();
        for p in placements {
            if board.occupant(p.square).is_some() {
                return Err(RulesError::InvalidPosition(format!(
                    "two pieces on {}",
                    p.square
                )));
            }
            board.spawn(p.side, p.kind, p.square, p.has_moved);
        }
        for side in [Side::White, Side::Black] {
            let registry = board.side(side);
            let kings = registry
                .pieces()
                .iter()
                .filter(|p| p.kind == PieceKind::King)
                .count();
            if kings != 1 {
                return Err(RulesError::InvalidPosition(format!(
                    "{side} has {kings} kings"
                )));
            }
            if registry.pieces().len() > 16 {
                return Err(RulesError::InvalidPosition(format!(
                    "{side} has more than 16 pieces"
                )));
            }
        }
        // A position with the waiting side already in check is unreachable
        // in play and would let the mover capture the king outright.
        if board.in_check(!to_move) {
            return Err(RulesError::InvalidPosition(format!(
                "{} is in check but {to_move} is to move",
                !to_move
            )));
        }

        let mut game = Game {
            board,
            history: Vec::new(),
            captured: Vec::new(),
            created: Vec::new(),
            move_count: 0,
            state: GameState::Active { to_move },
            id: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        game.state = game.compute_state(to_move);
        tracing::debug!(game = %game.id, state = %game.state, "new game from constructed position");
        Ok(game)
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// The current phase.
    #[inline]
    pub fn current_state(&self) -> GameState {
        self.state
    }

    /// The live position.
    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Applied moves, oldest first.
    #[inline]
    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    /// Total applied moves (both sides).
    #[inline]
    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    /// A side's most recent move, if it has made one.
    pub fn last_move(&self, side: Side) -> Option<&MoveRecord> {
        self.history.iter().rev().find(|r| r.side == side)
    }

    /// Pieces of `side` currently out of play, oldest capture first.
    pub fn captured_pieces(&self, side: Side) -> Vec<&Piece> {
        self.captured
            .iter()
            .map(|e| &e.piece)
            .filter(|p| p.side == side)
            .collect()
    }

    /// Every square the piece on `from` may legally move to. Empty when the
    /// square is vacant, the piece belongs to the waiting side, or the game
    /// is not active.
    pub fn legal_moves(&self, from: Square) -> Vec<Square> {
        let GameState::Active { to_move } = self.state else {
            return Vec::new();
        };
        match self.board.occupant(from) {
            Some(piece) if piece.side == to_move => {
                movegen::legal_destinations(&self.board, from, self.history.last())
            }
            _ => Vec::new(),
        }
    }

    // -----------------------------------------------------------------
    // Apply move
    // -----------------------------------------------------------------

    /// Apply a legal move. On an illegal request the game is unchanged and
    /// the current state is returned.
    pub fn apply_move(&mut self, from: Square, to: Square) -> GameState {
        match self.try_apply_move(from, to) {
            Ok(state) => state,
            Err(err) => {
                tracing::debug!(game = %self.id, %from, %to, %err, "move rejected");
                self.state
            }
        }
    }

    /// Apply a legal move, reporting a rejection as an error.
    pub fn try_apply_move(&mut self, from: Square, to: Square) -> Result<GameState, RulesError> {
        let GameState::Active { to_move } = self.state else {
            return Err(RulesError::WrongPhase);
        };
        if !self.legal_moves(from).contains(&to) {
            return Err(RulesError::IllegalMove { from, to });
        }

        let mover = *self.board.occupant(from).expect("legal move has a mover");
        let move_index = self.move_count;

        // ---- Resolve the capture, ordinary or en passant ----
        let victim_id = self.capture_victim(&mover, to);
        if let Some(id) = victim_id {
            let piece = self.board.remove(id).expect("victim is on the board");
            self.captured.push(CapturedEntry { piece, move_index });
        }

        // ---- Relocate the mover ----
        self.board.relocate(mover.id, to);
        self.board.set_moved(mover.id, true);

        // ---- Castling: bring the rook across ----
        if mover.kind == PieceKind::King && from.file.abs_diff(to.file) == 2 {
            let home = to_move.home_rank();
            let (rook_from, rook_to) = if to.file == 6 {
                (Square::new(7, home), Square::new(5, home))
            } else {
                (Square::new(0, home), Square::new(3, home))
            };
            let rook = self
                .board
                .occupant_of(to_move, rook_from)
                .expect("castling rook on its corner")
                .id;
            self.board.relocate(rook, rook_to);
            self.board.set_moved(rook, true);
        }

        // ---- Record and advance ----
        self.history.push(MoveRecord {
            mover: mover.id,
            side: to_move,
            kind: mover.kind,
            from,
            to,
            prior_has_moved: mover.has_moved,
            move_index,
            captured: victim_id,
            promoted_to: None,
        });
        self.move_count += 1;

        // A pawn on the back rank stalls the turn until the promotion kind
        // arrives; otherwise the opponent is up, phase re-evaluated.
        if mover.kind == PieceKind::Pawn && to.rank == to_move.promotion_rank() {
            self.state = GameState::PendingPromotion {
                side: to_move,
                square: to,
            };
        } else {
            self.state = self.compute_state(!to_move);
        }

        tracing::debug!(
            game = %self.id,
            index = move_index,
            %from,
            %to,
            state = %self.state,
            "applied move"
        );
        if self.state.is_game_over() {
            tracing::info!(game = %self.id, state = %self.state, "game over");
        }
        Ok(self.state)
    }

    /// The piece this move captures: the destination's occupant, or — for a
    /// pawn stepping diagonally onto an empty square — the en-passant
    /// victim beside the destination.
    fn capture_victim(&self, mover: &Piece, to: Square) -> Option<PieceId> {
        if let Some(occupant) = self.board.occupant(to) {
            return Some(occupant.id);
        }
        if mover.kind == PieceKind::Pawn && mover.square.file != to.file {
            let beside = Square::new(to.file, mover.square.rank);
            return self.board.occupant(beside).map(|p| p.id);
        }
        None
    }

    // -----------------------------------------------------------------
    // Promotion
    // -----------------------------------------------------------------

    /// Resolve a pending promotion. Ignored (state unchanged) unless a
    /// promotion is pending.
    pub fn resolve_promotion(&mut self, kind: PromotionKind) -> GameState {
        match self.try_resolve_promotion(kind) {
            Ok(state) => state,
            Err(err) => {
                tracing::debug!(game = %self.id, %kind, %err, "promotion rejected");
                self.state
            }
        }
    }

    /// Resolve a pending promotion, reporting a rejection as an error.
    pub fn try_resolve_promotion(
        &mut self,
        kind: PromotionKind,
    ) -> Result<GameState, RulesError> {
        let GameState::PendingPromotion { side, square } = self.state else {
            return Err(RulesError::WrongPhase);
        };

        let record_index = self.history.len() - 1;
        let move_index = self.history[record_index].move_index;

        // The pawn retires into the captured pool (restored only by undo);
        // the chosen piece takes its square, tagged for the same undo.
        let pawn_id = self.history[record_index].mover;
        let pawn = self.board.remove(pawn_id).expect("promoting pawn is live");
        self.captured.push(CapturedEntry {
            piece: pawn,
            move_index,
        });

        let new_id = self.board.spawn(side, kind.kind(), square, true);
        self.created.push(CreatedEntry {
            id: new_id,
            move_index,
        });
        self.history[record_index].promoted_to = Some(new_id);

        self.state = self.compute_state(!side);
        tracing::debug!(game = %self.id, %side, %kind, %square, state = %self.state, "promotion resolved");
        if self.state.is_game_over() {
            tracing::info!(game = %self.id, state = %self.state, "game over");
        }
        Ok(self.state)
    }

    // -----------------------------------------------------------------
    // Undo
    // -----------------------------------------------------------------

    /// Undo the most recent move. No-op (state unchanged) when the history
    /// is empty.
    pub fn undo(&mut self) -> GameState {
        match self.try_undo() {
            Ok(state) => state,
            Err(err) => {
                tracing::debug!(game = %self.id, %err, "undo rejected");
                self.state
            }
        }
    }

    /// Undo the most recent move, reporting an empty history as an error.
    ///
    /// Reverses every effect of the popped record: destroys promotion
    /// pieces created at that move, restores captured pieces tagged with
    /// it, returns the mover (and a castling rook) to its prior square and
    /// flag, and hands the turn back to the mover.
    pub fn try_undo(&mut self) -> Result<GameState, RulesError> {
        let record = self.history.pop().ok_or(RulesError::EmptyHistory)?;

        // ---- Destroy pieces created by this move's promotion ----
        let mut i = 0;
        while i < self.created.len() {
            if self.created[i].move_index == record.move_index {
                let entry = self.created.remove(i);
                self.board.remove(entry.id).expect("created piece is live");
            } else {
                i += 1;
            }
        }

        // ---- Return the mover, if still live, before restoring pools ----
        // (An unresolved promotion leaves the pawn live on the back rank; a
        // resolved one parked it in the captured pool.)
        if self.board.piece(record.mover).is_some() {
            self.board.relocate(record.mover, record.from);
            self.board.set_moved(record.mover, record.prior_has_moved);
        }

        // ---- Restore everything captured at this move ----
        let mut i = 0;
        while i < self.captured.len() {
            if self.captured[i].move_index == record.move_index {
                let mut piece = self.captured.remove(i).piece;
                if piece.id == record.mover {
                    // The retired promotion pawn comes back at its origin.
                    piece.square = record.from;
                    piece.has_moved = record.prior_has_moved;
                }
                self.board.restore(piece);
            } else {
                i += 1;
            }
        }

        // ---- Castling: walk the rook back ----
        if record.is_castle() {
            let home = record.side.home_rank();
            let (rook_now, rook_home) = if record.to.file == 6 {
                (Square::new(5, home), Square::new(7, home))
            } else {
                (Square::new(3, home), Square::new(0, home))
            };
            let rook = self
                .board
                .occupant_of(record.side, rook_now)
                .expect("castled rook beside the king")
                .id;
            self.board.relocate(rook, rook_home);
            self.board.set_moved(rook, false);
        }

        self.move_count -= 1;
        self.state = GameState::Active {
            to_move: record.side,
        };
        tracing::debug!(game = %self.id, index = record.move_index, "undid move");
        Ok(self.state)
    }

    // -----------------------------------------------------------------
    // State machine evaluation
    // -----------------------------------------------------------------

    /// The phase with `to_move` up: active while any legal move exists,
    /// otherwise checkmate (in check) or stalemate (not).
    fn compute_state(&self, to_move: Side) -> GameState {
        if movegen::side_has_legal_move(&self.board, to_move, self.history.last()) {
            GameState::Active { to_move }
        } else if self.board.in_check(to_move) {
            GameState::Checkmate { loser: to_move }
        } else {
            GameState::Stalemate
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn play(game: &mut Game, from: &str, to: &str) {
        game.try_apply_move(sq(from), sq(to))
            .unwrap_or_else(|e| panic!("{from}{to}: {e}"));
    }

    /// Canonical position fingerprint for exact-undo comparisons.
    fn snapshot(game: &Game) -> (Vec<(u32, PieceKind, Side, String, bool)>, GameState, u32, usize, usize) {
        let mut pieces: Vec<_> = [Side::White, Side::Black]
            .iter()
            .flat_map(|&s| game.board().side(s).pieces())
            .map(|p| (p.id.0, p.kind, p.side, p.square.to_algebraic(), p.has_moved))
            .collect();
        pieces.sort();
        (
            pieces,
            game.current_state(),
            game.move_count(),
            game.history().len(),
            game.captured_pieces(Side::White).len() + game.captured_pieces(Side::Black).len(),
        )
    }

    // -----------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------

    #[test]
    fn new_game_is_active_white() {
        let game = Game::new();
        assert_eq!(
            game.current_state(),
            GameState::Active {
                to_move: Side::White
            }
        );
        assert_eq!(game.move_count(), 0);
        assert!(game.history().is_empty());
        game.board().assert_consistent();
    }

    #[test]
    fn from_position_rejects_double_occupancy() {
        let result = Game::from_position(
            [
                Placement::moved(Side::White, PieceKind::King, sq("e1")),
                Placement::moved(Side::Black, PieceKind::King, sq("e8")),
                Placement::moved(Side::Black, PieceKind::Rook, sq("e8")),
            ],
            Side::White,
        );
        assert!(matches!(result, Err(RulesError::InvalidPosition(_))));
    }

    #[test]
    fn from_position_requires_one_king_each() {
        let result = Game::from_position(
            [Placement::moved(Side::White, PieceKind::King, sq("e1"))],
            Side::White,
        );
        assert!(matches!(result, Err(RulesError::InvalidPosition(_))));
    }

    #[test]
    fn from_position_rejects_waiting_side_in_check() {
        let result = Game::from_position(
            [
                Placement::moved(Side::White, PieceKind::King, sq("e1")),
                Placement::moved(Side::White, PieceKind::Rook, sq("e4")),
                Placement::moved(Side::Black, PieceKind::King, sq("e8")),
            ],
            Side::White,
        );
        assert!(matches!(result, Err(RulesError::InvalidPosition(_))));
    }

    // -----------------------------------------------------------------
    // Applying moves
    // -----------------------------------------------------------------

    #[test]
    fn opening_pawn_move_flips_turn() {
        let mut game = Game::new();
        let state = game.apply_move(sq("e2"), sq("e4"));
        assert_eq!(
            state,
            GameState::Active {
                to_move: Side::Black
            }
        );
        assert_eq!(game.move_count(), 1);
        assert_eq!(game.board().occupant(sq("e4")).unwrap().kind, PieceKind::Pawn);
        assert!(game.board().occupant(sq("e2")).is_none());
        assert!(game.board().occupant(sq("e4")).unwrap().has_moved);
    }

    #[test]
    fn illegal_move_is_a_no_op() {
        let mut game = Game::new();
        let before = snapshot(&game);
        let state = game.apply_move(sq("e2"), sq("e5"));
        assert_eq!(
            state,
            GameState::Active {
                to_move: Side::White
            }
        );
        assert_eq!(snapshot(&game), before);
        assert_eq!(
            game.try_apply_move(sq("e2"), sq("e5")),
            Err(RulesError::IllegalMove {
                from: sq("e2"),
                to: sq("e5")
            })
        );
    }

    #[test]
    fn wrong_side_cannot_move() {
        let mut game = Game::new();
        assert!(game.legal_moves(sq("e7")).is_empty());
        let before = snapshot(&game);
        game.apply_move(sq("e7"), sq("e5"));
        assert_eq!(snapshot(&game), before);
    }

    #[test]
    fn capture_moves_piece_to_pool() {
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        play(&mut game, "d7", "d5");
        play(&mut game, "e4", "d5");

        assert_eq!(game.captured_pieces(Side::Black).len(), 1);
        assert_eq!(game.captured_pieces(Side::White).len(), 0);
        let victim = game.captured_pieces(Side::Black)[0];
        assert_eq!(victim.kind, PieceKind::Pawn);
        assert_eq!(victim.square, sq("d5"));
        assert_eq!(game.board().side(Side::Black).pieces().len(), 15);
    }

    #[test]
    fn last_move_tracks_each_side() {
        let mut game = Game::new();
        assert!(game.last_move(Side::White).is_none());
        play(&mut game, "e2", "e4");
        play(&mut game, "e7", "e5");
        play(&mut game, "g1", "f3");

        assert_eq!(game.last_move(Side::White).unwrap().to, sq("f3"));
        assert_eq!(game.last_move(Side::Black).unwrap().to, sq("e5"));
    }

    // -----------------------------------------------------------------
    // Castling through the executor
    // -----------------------------------------------------------------

    #[test]
    fn kingside_castle_relocates_rook() {
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        play(&mut game, "e7", "e5");
        play(&mut game, "g1", "f3");
        play(&mut game, "b8", "c6");
        play(&mut game, "f1", "c4");
        play(&mut game, "g8", "f6");
        assert!(game.legal_moves(sq("e1")).contains(&sq("g1")));
        play(&mut game, "e1", "g1");

        let king = game.board().occupant(sq("g1")).unwrap();
        assert_eq!(king.kind, PieceKind::King);
        let rook = game.board().occupant(sq("f1")).unwrap();
        assert_eq!(rook.kind, PieceKind::Rook);
        assert!(rook.has_moved);
        assert!(game.board().occupant(sq("h1")).is_none());
    }

    #[test]
    fn castle_undo_restores_rook_and_flags() {
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        play(&mut game, "e7", "e5");
        play(&mut game, "g1", "f3");
        play(&mut game, "b8", "c6");
        play(&mut game, "f1", "c4");
        play(&mut game, "g8", "f6");
        let before = snapshot(&game);
        play(&mut game, "e1", "g1");
        game.try_undo().unwrap();

        assert_eq!(snapshot(&game), before);
        let rook = game.board().occupant(sq("h1")).unwrap();
        assert_eq!(rook.kind, PieceKind::Rook);
        assert!(!rook.has_moved);
        assert!(!game.board().occupant(sq("e1")).unwrap().has_moved);
    }

    // -----------------------------------------------------------------
    // En passant through the executor
    // -----------------------------------------------------------------

    #[test]
    fn en_passant_captures_the_passed_pawn() {
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        play(&mut game, "a7", "a6");
        play(&mut game, "e4", "e5");
        play(&mut game, "d7", "d5");
        assert!(game.legal_moves(sq("e5")).contains(&sq("d6")));
        play(&mut game, "e5", "d6");

        assert!(game.board().occupant(sq("d5")).is_none(), "victim removed");
        assert_eq!(
            game.board().occupant(sq("d6")).unwrap().kind,
            PieceKind::Pawn
        );
        let victim = game.captured_pieces(Side::Black)[0];
        assert_eq!(victim.square, sq("d5"));
    }

    #[test]
    fn en_passant_window_closes_after_one_move() {
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        play(&mut game, "a7", "a6");
        play(&mut game, "e4", "e5");
        play(&mut game, "d7", "d5");
        // Decline the capture…
        play(&mut game, "b1", "c3");
        play(&mut game, "a6", "a5");
        // …and it is gone.
        assert!(!game.legal_moves(sq("e5")).contains(&sq("d6")));
    }

    #[test]
    fn en_passant_undo_restores_both_pawns() {
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        play(&mut game, "a7", "a6");
        play(&mut game, "e4", "e5");
        play(&mut game, "d7", "d5");
        let before = snapshot(&game);
        play(&mut game, "e5", "d6");
        game.try_undo().unwrap();

        assert_eq!(snapshot(&game), before);
        assert_eq!(
            game.board().occupant(sq("d5")).unwrap().side,
            Side::Black
        );
        assert_eq!(
            game.board().occupant(sq("e5")).unwrap().side,
            Side::White
        );
        // The window is still open after the undo.
        assert!(game.legal_moves(sq("e5")).contains(&sq("d6")));
    }

    // -----------------------------------------------------------------
    // Promotion
    // -----------------------------------------------------------------

    /// White pawn one step from promotion, kings parked away.
    fn promotion_game() -> Game {
        Game::from_position(
            [
                Placement::moved(Side::White, PieceKind::King, sq("e1")),
                Placement::moved(Side::White, PieceKind::Pawn, sq("b7")),
                Placement::moved(Side::Black, PieceKind::King, sq("h8")),
                Placement::moved(Side::Black, PieceKind::Rook, sq("a8")),
            ],
            Side::White,
        )
        .unwrap()
    }

    #[test]
    fn back_rank_pawn_stalls_the_game() {
        let mut game = promotion_game();
        let state = game.apply_move(sq("b7"), sq("b8"));
        assert_eq!(
            state,
            GameState::PendingPromotion {
                side: Side::White,
                square: sq("b8")
            }
        );
        // No moves, no undo-free progress: everything but the promotion waits.
        assert!(game.legal_moves(sq("e1")).is_empty());
        assert_eq!(
            game.try_apply_move(sq("e1"), sq("e2")),
            Err(RulesError::WrongPhase)
        );
    }

    #[test]
    fn resolving_promotion_creates_piece_and_advances() {
        let mut game = promotion_game();
        play(&mut game, "b7", "b8");
        let state = game.resolve_promotion(PromotionKind::Queen);
        assert_eq!(
            state,
            GameState::Active {
                to_move: Side::Black
            }
        );
        let queen = game.board().occupant(sq("b8")).unwrap();
        assert_eq!(queen.kind, PieceKind::Queen);
        assert_eq!(queen.side, Side::White);
        assert!(queen.has_moved);
        assert_eq!(game.history().last().unwrap().promoted_to, Some(queen.id));
    }

    #[test]
    fn capture_promotion_takes_the_rook() {
        let mut game = promotion_game();
        play(&mut game, "b7", "a8");
        game.resolve_promotion(PromotionKind::Knight);
        assert_eq!(
            game.board().occupant(sq("a8")).unwrap().kind,
            PieceKind::Knight
        );
        assert_eq!(game.captured_pieces(Side::Black).len(), 1);
    }

    #[test]
    fn promotion_undo_restores_the_pawn() {
        let mut game = promotion_game();
        let before = snapshot(&game);
        play(&mut game, "b7", "b8");
        game.resolve_promotion(PromotionKind::Queen);
        game.try_undo().unwrap();

        assert_eq!(snapshot(&game), before);
        let pawn = game.board().occupant(sq("b7")).unwrap();
        assert_eq!(pawn.kind, PieceKind::Pawn);
        assert!(game.board().occupant(sq("b8")).is_none());
        assert_eq!(
            game.current_state(),
            GameState::Active {
                to_move: Side::White
            }
        );
    }

    #[test]
    fn unresolved_promotion_can_still_be_undone() {
        let mut game = promotion_game();
        let before = snapshot(&game);
        play(&mut game, "b7", "b8");
        game.try_undo().unwrap();
        assert_eq!(snapshot(&game), before);
    }

    #[test]
    fn promotion_resolve_outside_pending_is_ignored() {
        let mut game = Game::new();
        let before = snapshot(&game);
        let state = game.resolve_promotion(PromotionKind::Queen);
        assert_eq!(
            state,
            GameState::Active {
                to_move: Side::White
            }
        );
        assert_eq!(snapshot(&game), before);
        assert_eq!(
            game.try_resolve_promotion(PromotionKind::Queen),
            Err(RulesError::WrongPhase)
        );
    }

    // -----------------------------------------------------------------
    // Undo basics
    // -----------------------------------------------------------------

    #[test]
    fn undo_on_empty_history_is_a_no_op() {
        let mut game = Game::new();
        let before = snapshot(&game);
        assert_eq!(
            game.undo(),
            GameState::Active {
                to_move: Side::White
            }
        );
        assert_eq!(snapshot(&game), before);
        assert_eq!(game.try_undo(), Err(RulesError::EmptyHistory));
    }

    #[test]
    fn every_opening_move_round_trips_exactly() {
        let game = Game::new();
        let before = snapshot(&game);
        let origins: Vec<Square> = game
            .board()
            .side(Side::White)
            .pieces()
            .iter()
            .map(|p| p.square)
            .collect();
        for from in origins {
            for to in game.legal_moves(from) {
                let mut copy = game.clone();
                copy.try_apply_move(from, to).unwrap();
                copy.try_undo().unwrap();
                assert_eq!(snapshot(&copy), before, "mismatch after {from}->{to}");
                copy.board().assert_consistent();
            }
        }
    }

    #[test]
    fn capture_undo_restores_the_victim() {
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        play(&mut game, "d7", "d5");
        let before = snapshot(&game);
        play(&mut game, "e4", "d5");
        game.try_undo().unwrap();

        assert_eq!(snapshot(&game), before);
        assert_eq!(game.board().occupant(sq("d5")).unwrap().side, Side::Black);
        assert_eq!(game.board().occupant(sq("e4")).unwrap().side, Side::White);
        assert!(game.captured_pieces(Side::Black).is_empty());
    }

    // -----------------------------------------------------------------
    // Endgame states
    // -----------------------------------------------------------------

    #[test]
    fn fools_mate_is_checkmate() {
        let mut game = Game::new();
        play(&mut game, "f2", "f3");
        play(&mut game, "e7", "e5");
        play(&mut game, "g2", "g4");
        let state = game.apply_move(sq("d8"), sq("h4"));
        assert_eq!(state, GameState::Checkmate { loser: Side::White });
        assert!(game.current_state().is_game_over());

        // Every white piece is out of moves, and further play is rejected.
        let origins: Vec<Square> = game
            .board()
            .side(Side::White)
            .pieces()
            .iter()
            .map(|p| p.square)
            .collect();
        for from in origins {
            assert!(game.legal_moves(from).is_empty());
        }
        assert_eq!(
            game.try_apply_move(sq("e2"), sq("e4")),
            Err(RulesError::WrongPhase)
        );
    }

    #[test]
    fn constructed_stalemate_is_recognised() {
        let game = Game::from_position(
            [
                Placement::moved(Side::Black, PieceKind::King, sq("a8")),
                Placement::moved(Side::White, PieceKind::King, sq("c7")),
                Placement::moved(Side::White, PieceKind::Queen, sq("b6")),
            ],
            Side::Black,
        )
        .unwrap();
        assert_eq!(game.current_state(), GameState::Stalemate);
    }

    #[test]
    fn undo_revives_a_finished_game() {
        let mut game = Game::new();
        play(&mut game, "f2", "f3");
        play(&mut game, "e7", "e5");
        play(&mut game, "g2", "g4");
        play(&mut game, "d8", "h4");
        assert!(game.current_state().is_game_over());

        game.try_undo().unwrap();
        assert_eq!(
            game.current_state(),
            GameState::Active {
                to_move: Side::Black
            }
        );
        assert!(!game.legal_moves(sq("d8")).is_empty());
    }
}
