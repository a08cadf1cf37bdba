use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// The two sides in a chess game. White moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// Index for array lookups: White=0, Black=1.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Rank advance direction for this side's pawns: White +1, Black −1.
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Side::White => 1,
            Side::Black => -1,
        }
    }

    /// The rank this side's pieces start on (kings, rooks — relevant for castling).
    #[inline]
    pub const fn home_rank(self) -> u8 {
        match self {
            Side::White => 0,
            Side::Black => 7,
        }
    }

    /// The opponent's back rank — a pawn arriving here promotes.
    #[inline]
    pub const fn promotion_rank(self) -> u8 {
        match self {
            Side::White => 7,
            Side::Black => 0,
        }
    }
}

impl std::ops::Not for Side {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "white"),
            Side::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A board coordinate: file (a–h → 0–7) and rank (1–8 → 0–7).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    pub file: u8,
    pub rank: u8,
}

impl Square {
    #[inline]
    pub fn new(file: u8, rank: u8) -> Self {
        debug_assert!(file < 8 && rank < 8, "square out of range: ({file},{rank})");
        Square { file, rank }
    }

    /// Offset by a (file, rank) delta; `None` when the result leaves the board.
    #[inline]
    pub fn offset(self, d_file: i8, d_rank: i8) -> Option<Self> {
        let file = self.file as i8 + d_file;
        let rank = self.rank as i8 + d_rank;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square {
                file: file as u8,
                rank: rank as u8,
            })
        } else {
            None
        }
    }

    /// Parse algebraic notation like "e4".
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(Square { file, rank })
        } else {
            None
        }
    }

    /// Convert to algebraic notation like "e4".
    pub fn to_algebraic(self) -> String {
        let file = (b'a' + self.file) as char;
        let rank = (b'1' + self.rank) as char;
        format!("{file}{rank}")
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

// ---------------------------------------------------------------------------
// PieceKind
// ---------------------------------------------------------------------------

/// The six piece kinds. Each kind carries its static movement data:
/// direction vectors and whether it slides along them until blocked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

const KNIGHT_DIRS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];
const BISHOP_DIRS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const ROOK_DIRS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const ROYAL_DIRS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl PieceKind {
    /// All piece kinds in order.
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// Direction vectors as (file, rank) deltas. Empty for Pawn, whose
    /// movement is bespoke (forward pushes, diagonal captures).
    #[inline]
    pub const fn dirs(self) -> &'static [(i8, i8)] {
        match self {
            PieceKind::Pawn => &[],
            PieceKind::Knight => &KNIGHT_DIRS,
            PieceKind::Bishop => &BISHOP_DIRS,
            PieceKind::Rook => &ROOK_DIRS,
            PieceKind::Queen => &ROYAL_DIRS,
            PieceKind::King => &ROYAL_DIRS,
        }
    }

    /// Whether the piece repeats its direction vectors until blocked.
    /// Knight, King, and Pawn take a single step.
    #[inline]
    pub const fn slides(self) -> bool {
        matches!(self, PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen)
    }

    /// Single letter for board diagrams: uppercase for White, lowercase for Black.
    pub fn glyph(self, side: Side) -> char {
        let c = match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };
        match side {
            Side::White => c.to_ascii_uppercase(),
            Side::Black => c,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceKind::Pawn => write!(f, "pawn"),
            PieceKind::Knight => write!(f, "knight"),
            PieceKind::Bishop => write!(f, "bishop"),
            PieceKind::Rook => write!(f, "rook"),
            PieceKind::Queen => write!(f, "queen"),
            PieceKind::King => write!(f, "king"),
        }
    }
}

// ---------------------------------------------------------------------------
// PromotionKind
// ---------------------------------------------------------------------------

/// The pieces a pawn may promote to. A dedicated enum keeps King and Pawn
/// unrepresentable as promotion targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromotionKind {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl PromotionKind {
    /// All promotion choices in order of popularity.
    pub const ALL: [PromotionKind; 4] = [
        PromotionKind::Queen,
        PromotionKind::Rook,
        PromotionKind::Bishop,
        PromotionKind::Knight,
    ];

    /// The corresponding piece kind.
    #[inline]
    pub const fn kind(self) -> PieceKind {
        match self {
            PromotionKind::Queen => PieceKind::Queen,
            PromotionKind::Rook => PieceKind::Rook,
            PromotionKind::Bishop => PieceKind::Bishop,
            PromotionKind::Knight => PieceKind::Knight,
        }
    }
}

impl fmt::Display for PromotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

// ---------------------------------------------------------------------------
// Piece
// ---------------------------------------------------------------------------

/// Stable handle for a piece, valid across captures and restores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceId(pub u32);

/// A piece on the board (or in the captured pool, retaining the square it
/// last occupied).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    pub kind: PieceKind,
    pub side: Side,
    pub square: Square,
    /// Whether the piece has ever moved — governs castling eligibility and
    /// the pawn double step.
    pub has_moved: bool,
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} on {}", self.side, self.kind, self.square)
    }
}

// ---------------------------------------------------------------------------
// MoveRecord
// ---------------------------------------------------------------------------

/// A reversible record of one applied move.
///
/// Special-move flags are not stored: castling and the double step are
/// recoverable from `kind` plus the square delta, en passant from `kind`,
/// the file change, and `captured`. Promotion is the exception — undo must
/// destroy the exact piece that was created, so it is recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub mover: PieceId,
    pub side: Side,
    pub kind: PieceKind,
    pub from: Square,
    pub to: Square,
    /// The mover's `has_moved` flag before this move.
    pub prior_has_moved: bool,
    /// Position of this record in the history (0-based).
    pub move_index: u32,
    /// Piece removed from play by this move, if any.
    pub captured: Option<PieceId>,
    /// Piece created by resolving this move's promotion, if any.
    pub promoted_to: Option<PieceId>,
}

impl MoveRecord {
    /// A pawn advancing two ranks — the en-passant trigger.
    #[inline]
    pub fn is_double_step(&self) -> bool {
        self.kind == PieceKind::Pawn && self.from.rank.abs_diff(self.to.rank) == 2
    }

    /// A king displacing two files — castling.
    #[inline]
    pub fn is_castle(&self) -> bool {
        self.kind == PieceKind::King && self.from.file.abs_diff(self.to.file) == 2
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The phase of a game as seen by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    /// Normal play; `to_move` picks and applies a legal move next.
    Active { to_move: Side },
    /// A pawn reached the back rank; all turn progress is blocked until a
    /// promotion kind is supplied for it.
    PendingPromotion { side: Side, square: Square },
    /// `loser` is in check with no legal moves. Terminal.
    Checkmate { loser: Side },
    /// The side to move has no legal moves but is not in check. Terminal.
    Stalemate,
}

impl GameState {
    /// Whether moves can currently be selected and applied.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, GameState::Active { .. })
    }

    /// Whether play has ended.
    #[inline]
    pub fn is_game_over(&self) -> bool {
        matches!(self, GameState::Checkmate { .. } | GameState::Stalemate)
    }

    /// The side expected to act, if any: the mover when active, the
    /// promoting side when a promotion is pending.
    pub fn side_to_act(&self) -> Option<Side> {
        match self {
            GameState::Active { to_move } => Some(*to_move),
            GameState::PendingPromotion { side, .. } => Some(*side),
            _ => None,
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameState::Active { to_move } => write!(f, "active ({to_move} to move)"),
            GameState::PendingPromotion { side, square } => {
                write!(f, "pending promotion ({side} pawn on {square})")
            }
            GameState::Checkmate { loser } => write!(f, "checkmate ({loser} loses)"),
            GameState::Stalemate => write!(f, "stalemate"),
        }
    }
}

// ---------------------------------------------------------------------------
// RulesError
// ---------------------------------------------------------------------------

/// Domain errors for the rules engine. None of these are fatal: the lenient
/// adapter methods swallow them and leave the game unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("illegal move: {from} -> {to}")]
    IllegalMove { from: Square, to: Square },

    #[error("action not permitted in the current phase")]
    WrongPhase,

    #[error("no moves to undo")]
    EmptyHistory,

    #[error("invalid position: {0}")]
    InvalidPosition(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
