//! UTTT Core - Ultimate Tic-Tac-Toe rules engine and AI
//!
//! This crate provides the core game logic:
//! - Board geometry (nine 3x3 sub-boards in a 3x3 meta-board)
//! - Move legality, sub-board/meta-board results and redirection
//! - Sub-board evaluation with a center/corner heuristic
//! - Alpha-beta search over the active sub-board
//! - AI player with a tactical win/block short-circuit
//! - Game controller with cancellable background AI turns

pub mod board;
pub mod game;
pub mod eval;
pub mod search;
pub mod ai;
pub mod config;
pub mod session;

// Re-exports for convenient access
pub use board::{Cell, Mark, MetaBoard, SubBoard, BOARD_CELLS, WIN_LINES};
pub use game::{BoardResult, GameState, GameStatus, Move, MoveError, Scores};
pub use eval::{evaluate, WIN_SCORE};
pub use search::{minimax, search, Searcher, INFINITY};
pub use ai::{choose_ai_move, AlphaBetaAI, Difficulty};
pub use config::{GameConfig, Mode, ParseError};
pub use session::{AiOutcome, GameHandle, Phase, Session, SessionError};
