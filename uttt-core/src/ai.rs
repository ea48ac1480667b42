//! AI player: tactical short-circuit, then alpha-beta over the chosen sub-board

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::board::{Mark, MetaBoard, SubBoard, BOARD_CELLS};
use crate::game::{GameState, Move};
use crate::search::{Searcher, INFINITY};
use crate::ParseError;

// ============================================================================
// DIFFICULTY
// ============================================================================

/// Difficulty label, mapped to a search ply limit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Search depth in plies
    pub fn depth(self) -> u32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 3,
            Difficulty::Hard => 5,
        }
    }
}

impl FromStr for Difficulty {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseError::Difficulty(s.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

// ============================================================================
// ALPHA-BETA AI
// ============================================================================

/// Alpha-Beta AI player
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlphaBetaAI {
    pub difficulty: Difficulty,
    pub mark: Mark,
}

impl AlphaBetaAI {
    /// AI playing O
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            mark: Mark::O,
        }
    }

    pub fn with_mark(difficulty: Difficulty, mark: Mark) -> Self {
        Self { difficulty, mark }
    }

    /// Best move in the sub-board the AI is allowed to play
    pub fn choose_move(&self, meta: &MetaBoard, active: Option<usize>) -> Option<Move> {
        let sub_board = target_sub_board(meta, active)?;
        let cell = self.choose_cell(&meta.boards()[sub_board])?;
        Some(Move::new(sub_board, cell))
    }

    /// Best cell within one sub-board
    pub fn choose_cell(&self, board: &SubBoard) -> Option<usize> {
        if let Some(cell) = self.tactical_move(board) {
            tracing::debug!("{} takes tactical cell {}", self.mark, cell);
            return Some(cell);
        }
        self.search_move(board)
    }

    /// Immediate win, else immediate block
    fn tactical_move(&self, board: &SubBoard) -> Option<usize> {
        let opponent = self.mark.opponent();
        board
            .empty_cells()
            .find(|&cell| board.wins_with(cell, self.mark))
            .or_else(|| {
                board
                    .empty_cells()
                    .find(|&cell| board.wins_with(cell, opponent))
            })
    }

    /// Strictly highest scoring cell; ties keep the lowest index
    fn search_move(&self, board: &SubBoard) -> Option<usize> {
        let depth = self.difficulty.depth();
        // Search scores favour O; flip them when playing X
        let perspective = match self.mark {
            Mark::O => 1,
            Mark::X => -1,
        };
        let opponent_maximizes = self.mark == Mark::X;

        let mut searcher = Searcher::new();
        let mut scratch = *board;
        let mut best: Option<(usize, i32)> = None;

        for cell in 0..BOARD_CELLS {
            if !scratch.is_empty_at(cell) {
                continue;
            }
            scratch.place(cell, self.mark);
            let score = perspective
                * searcher.alpha_beta(&mut scratch, depth, opponent_maximizes, -INFINITY, INFINITY);
            scratch.clear(cell);

            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((cell, score));
            }
        }

        if let Some((cell, score)) = best {
            tracing::debug!(
                "{} searched depth {} ({} nodes): cell {} scores {}",
                self.mark,
                depth,
                searcher.nodes(),
                cell,
                score
            );
        }
        best.map(|(cell, _)| cell)
    }
}

/// Active sub-board if still open, else the lowest open one with space
pub fn target_sub_board(meta: &MetaBoard, active: Option<usize>) -> Option<usize> {
    let playable = |i: usize| meta.boards()[i].result().is_open();
    match active {
        Some(i) if i < BOARD_CELLS && playable(i) => Some(i),
        _ => (0..BOARD_CELLS).find(|&i| playable(i)),
    }
}

/// AI move for the player to move in `state`
pub fn choose_ai_move(state: &GameState, difficulty: Difficulty) -> Option<Move> {
    if state.is_over() {
        return None;
    }
    let ai = AlphaBetaAI::with_mark(difficulty, state.current_player());
    ai.choose_move(state.meta_board(), state.active_sub_board())
}

// ============================================================================
// TESTS
// ============================================================================
