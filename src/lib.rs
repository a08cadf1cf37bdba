//! Two-player chess rules engine.
//!
//! Maintains an authoritative position, generates legal moves per the full
//! rule set (castling, en passant, promotion, check/checkmate/stalemate),
//! applies moves, and supports exact undo. A pure, synchronous state
//! machine: no rendering, no input handling, no clocks — hosts drive it
//! through [`Game`] and map squares to whatever surface they draw on.

pub mod attacks;
pub mod board;
pub mod game;
pub mod movegen;
pub mod types;

pub use board::{Board, SideRegistry};
pub use game::{Game, Placement};
pub use movegen::{legal_destinations, side_has_legal_move};
pub use types::*;
