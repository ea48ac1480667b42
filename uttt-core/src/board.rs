//! Board geometry: marks, sub-boards and the meta-board

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::BoardResult;

/// Cells per sub-board, and sub-boards per meta-board
pub const BOARD_CELLS: usize = 9;

/// Center cell index
pub const CENTER: usize = 4;

/// Corner cell indices
pub const CORNERS: [usize; 4] = [0, 2, 6, 8];

/// The eight winning lines: 3 rows, 3 columns, 2 diagonals
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

// ============================================================================
// MARK
// ============================================================================

/// Player mark
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// A cell is empty or holds a mark
pub type Cell = Option<Mark>;

/// Return the mark that fills any of the eight lines, if one does.
///
/// Works on anything that can be projected to a mark per index, so the same
/// check serves cells of a sub-board and results of the meta-board.
pub fn line_winner<F>(at: F) -> Option<Mark>
where
    F: Fn(usize) -> Option<Mark>,
{
    WIN_LINES.iter().find_map(|&[a, b, c]| {
        let mark = at(a)?;
        (at(b) == Some(mark) && at(c) == Some(mark)).then_some(mark)
    })
}

// ============================================================================
// SUB-BOARD
// ============================================================================

/// One 3x3 grid, cells indexed 0-8 row-major
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubBoard {
    cells: [Cell; BOARD_CELLS],
}

impl SubBoard {
    pub const fn new() -> Self {
        Self {
            cells: [None; BOARD_CELLS],
        }
    }

    /// Build from a cell array
    pub const fn from_cells(cells: [Cell; BOARD_CELLS]) -> Self {
        Self { cells }
    }

    /// Parse a 9-character row-major pattern of `X`, `O` and `.`
    pub fn from_pattern(pattern: &str) -> Option<Self> {
        let mut cells = [None; BOARD_CELLS];
        let mut count = 0;
        for (i, ch) in pattern.chars().filter(|c| !c.is_whitespace()).enumerate() {
            if i >= BOARD_CELLS {
                return None;
            }
            cells[i] = match ch {
                'X' | 'x' => Some(Mark::X),
                'O' | 'o' => Some(Mark::O),
                '.' | '-' | '_' => None,
                _ => return None,
            };
            count += 1;
        }
        (count == BOARD_CELLS).then_some(Self { cells })
    }

    /// Cell contents; out-of-range indices read as empty
    pub fn get(&self, index: usize) -> Cell {
        self.cells.get(index).copied().flatten()
    }

    pub fn cells(&self) -> &[Cell; BOARD_CELLS] {
        &self.cells
    }

    pub fn is_empty_at(&self, index: usize) -> bool {
        index < BOARD_CELLS && self.cells[index].is_none()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Mark holding a complete line, if any
    pub fn winner(&self) -> Option<Mark> {
        line_winner(|i| self.cells[i])
    }

    /// Result derived from the cells
    pub fn result(&self) -> BoardResult {
        match self.winner() {
            Some(mark) => BoardResult::Won(mark),
            None if self.is_full() => BoardResult::Drawn,
            None => BoardResult::Open,
        }
    }

    /// Empty cell indices in ascending order
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        (0..BOARD_CELLS).filter(move |&i| self.cells[i].is_none())
    }

    /// Whether placing `mark` at `index` completes a line
    pub fn wins_with(&self, index: usize, mark: Mark) -> bool {
        if !self.is_empty_at(index) {
            return false;
        }
        let mut probe = *self;
        probe.cells[index] = Some(mark);
        probe.winner() == Some(mark)
    }

    /// Write a mark. Callers guarantee the cell is empty.
    pub(crate) fn place(&mut self, index: usize, mark: Mark) {
        debug_assert!(self.cells[index].is_none());
        self.cells[index] = Some(mark);
    }

    /// Undo a speculative placement during search
    pub(crate) fn clear(&mut self, index: usize) {
        self.cells[index] = None;
    }
}

// ============================================================================
// META-BOARD
// ============================================================================

/// Nine sub-boards, indexed like cells of a sub-board
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaBoard {
    boards: [SubBoard; BOARD_CELLS],
}

impl MetaBoard {
    pub const fn new() -> Self {
        Self {
            boards: [SubBoard::new(); BOARD_CELLS],
        }
    }

    pub const fn from_boards(boards: [SubBoard; BOARD_CELLS]) -> Self {
        Self { boards }
    }

    pub fn sub_board(&self, index: usize) -> Option<&SubBoard> {
        self.boards.get(index)
    }

    pub fn boards(&self) -> &[SubBoard; BOARD_CELLS] {
        &self.boards
    }

    pub fn cell(&self, sub_board: usize, cell: usize) -> Cell {
        self.boards.get(sub_board).and_then(|b| b.get(cell))
    }

    pub(crate) fn place(&mut self, sub_board: usize, cell: usize, mark: Mark) {
        self.boards[sub_board].place(cell, mark);
    }
}
