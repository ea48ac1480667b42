//! Minimax search with alpha-beta pruning over a single sub-board
//!
//! O is the maximizing side. Search mutates one board in place and undoes
//! every speculative placement before trying the next sibling.

use crate::board::{Mark, SubBoard, BOARD_CELLS};
use crate::eval::{evaluate, WIN_SCORE};

/// Window bound; negating it cannot overflow
pub const INFINITY: i32 = i32::MAX;

/// Score of a decided board, biased by remaining depth so faster wins rank higher
fn terminal_score(board: &SubBoard, depth: u32) -> Option<i32> {
    match board.winner() {
        Some(Mark::O) => Some(WIN_SCORE + depth as i32),
        Some(Mark::X) => Some(-WIN_SCORE - depth as i32),
        None if board.is_full() => Some(0),
        None => None,
    }
}

/// Search driver that counts visited nodes
#[derive(Debug, Default)]
pub struct Searcher {
    nodes: u64,
}

impl Searcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes visited since construction
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Alpha-beta search. Empty cells are tried in ascending index order.
    pub fn alpha_beta(
        &mut self,
        board: &mut SubBoard,
        depth: u32,
        maximizing: bool,
        mut alpha: i32,
        mut beta: i32,
    ) -> i32 {
        self.nodes += 1;

        if let Some(score) = terminal_score(board, depth) {
            return score;
        }
        if depth == 0 {
            return evaluate(board);
        }

        if maximizing {
            let mut best = -INFINITY;
            for cell in 0..BOARD_CELLS {
                if !board.is_empty_at(cell) {
                    continue;
                }
                board.place(cell, Mark::O);
                let score = self.alpha_beta(board, depth - 1, false, alpha, beta);
                board.clear(cell);

                best = best.max(score);
                alpha = alpha.max(best);
                if beta <= alpha {
                    break;
                }
            }
            best
        } else {
            let mut best = INFINITY;
            for cell in 0..BOARD_CELLS {
                if !board.is_empty_at(cell) {
                    continue;
                }
                board.place(cell, Mark::X);
                let score = self.alpha_beta(board, depth - 1, true, alpha, beta);
                board.clear(cell);

                best = best.min(score);
                beta = beta.min(best);
                if beta <= alpha {
                    break;
                }
            }
            best
        }
    }

    /// Exhaustive minimax, no pruning
    pub fn minimax(&mut self, board: &mut SubBoard, depth: u32, maximizing: bool) -> i32 {
        self.nodes += 1;

        if let Some(score) = terminal_score(board, depth) {
            return score;
        }
        if depth == 0 {
            return evaluate(board);
        }

        let (mark, mut best) = if maximizing {
            (Mark::O, -INFINITY)
        } else {
            (Mark::X, INFINITY)
        };
        for cell in 0..BOARD_CELLS {
            if !board.is_empty_at(cell) {
                continue;
            }
            board.place(cell, mark);
            let score = self.minimax(board, depth - 1, !maximizing);
            board.clear(cell);

            best = if maximizing {
                best.max(score)
            } else {
                best.min(score)
            };
        }
        best
    }
}

/// Alpha-beta value of `board` with the given side to move
pub fn search(board: &SubBoard, depth: u32, maximizing: bool, alpha: i32, beta: i32) -> i32 {
    let mut scratch = *board;
    Searcher::new().alpha_beta(&mut scratch, depth, maximizing, alpha, beta)
}

/// Exhaustive minimax value of `board` with the given side to move
pub fn minimax(board: &SubBoard, depth: u32, maximizing: bool) -> i32 {
    let mut scratch = *board;
    Searcher::new().minimax(&mut scratch, depth, maximizing)
}
