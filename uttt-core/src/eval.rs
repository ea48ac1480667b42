//! Sub-board evaluation
//!
//! Scores are always from O's perspective: positive favours O.

use crate::board::{Mark, SubBoard, CENTER, CORNERS};
use crate::game::BoardResult;

/// Score of a decided sub-board
pub const WIN_SCORE: i32 = 10;

/// Positional weight of the center cell
pub const CENTER_WEIGHT: i32 = 2;

/// Positional weight of each corner cell
pub const CORNER_WEIGHT: i32 = 1;

fn sign(mark: Option<Mark>) -> i32 {
    match mark {
        Some(Mark::O) => 1,
        Some(Mark::X) => -1,
        None => 0,
    }
}

/// Evaluate a sub-board: terminal score if decided, positional score otherwise
pub fn evaluate(board: &SubBoard) -> i32 {
    match board.result() {
        BoardResult::Won(Mark::O) => WIN_SCORE,
        BoardResult::Won(Mark::X) => -WIN_SCORE,
        BoardResult::Drawn => 0,
        BoardResult::Open => positional(board),
    }
}

/// Center and corner occupancy
pub fn positional(board: &SubBoard) -> i32 {
    let center = CENTER_WEIGHT * sign(board.get(CENTER));
    let corners: i32 = CORNERS
        .iter()
        .map(|&i| CORNER_WEIGHT * sign(board.get(i)))
        .sum();
    center + corners
}
