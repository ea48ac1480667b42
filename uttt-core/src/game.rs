//! Game state and move application

use std::ops::Add;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{line_winner, Mark, MetaBoard, SubBoard, BOARD_CELLS};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Outcome of one sub-board
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardResult {
    #[default]
    Open,
    Won(Mark),
    Drawn,
}

impl BoardResult {
    pub fn is_open(self) -> bool {
        self == BoardResult::Open
    }

    /// Mark that won this board. Drawn boards never count toward a meta-line.
    pub fn winner(self) -> Option<Mark> {
        match self {
            BoardResult::Won(mark) => Some(mark),
            BoardResult::Open | BoardResult::Drawn => None,
        }
    }
}

/// Whole-game status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Won(Mark),
    /// Every sub-board decided with no meta-line
    Drawn,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        self != GameStatus::InProgress
    }
}

/// A move: which sub-board, which cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub sub_board: usize,
    pub cell: usize,
}

impl Move {
    pub const fn new(sub_board: usize, cell: usize) -> Self {
        Self { sub_board, cell }
    }
}

/// Sub-boards won per player
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub x: u32,
    pub o: u32,
}

impl Scores {
    pub fn get(&self, mark: Mark) -> u32 {
        match mark {
            Mark::X => self.x,
            Mark::O => self.o,
        }
    }

    pub fn total(&self) -> u32 {
        self.x + self.o
    }

    fn increment(&mut self, mark: Mark) {
        match mark {
            Mark::X => self.x += 1,
            Mark::O => self.o += 1,
        }
    }
}

impl Add for Scores {
    type Output = Scores;

    fn add(self, other: Scores) -> Scores {
        Scores {
            x: self.x + other.x,
            o: self.o + other.o,
        }
    }
}

/// Reasons a move is rejected. The state is left untouched in every case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("index out of bounds: sub-board {sub_board}, cell {cell} (expected 0-8)")]
    OutOfBounds { sub_board: usize, cell: usize },
    #[error("cell {cell} of sub-board {sub_board} is already occupied")]
    CellOccupied { sub_board: usize, cell: usize },
    #[error("sub-board {requested} is not active; play in sub-board {active}")]
    BoardNotActive { requested: usize, active: usize },
    #[error("sub-board {0} is already decided")]
    BoardAlreadyDecided(usize),
    #[error("the game is over")]
    GameOver,
}

// ============================================================================
// GAME STATE
// ============================================================================

/// Game state (immutable: `apply_move` returns a successor)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    meta_board: MetaBoard,
    meta_result: [BoardResult; BOARD_CELLS],
    current_player: Mark,
    active_sub_board: Option<usize>,
    winner: Option<Mark>,
    status: GameStatus,
    scores: Scores,
    last_move: Option<Move>,
    move_count: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Fresh game, X to move, scores zeroed.
    ///
    /// Scores only count sub-boards won in this game; running totals across
    /// games are kept by `Session`.
    pub fn new() -> Self {
        Self {
            meta_board: MetaBoard::new(),
            meta_result: [BoardResult::Open; BOARD_CELLS],
            current_player: Mark::X,
            active_sub_board: None,
            winner: None,
            status: GameStatus::InProgress,
            scores: Scores::default(),
            last_move: None,
            move_count: 0,
        }
    }

    /// Same board, scores zeroed
    pub fn reset_scores(&self) -> Self {
        Self {
            scores: Scores::default(),
            ..self.clone()
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn meta_board(&self) -> &MetaBoard {
        &self.meta_board
    }

    pub fn meta_result(&self) -> &[BoardResult; BOARD_CELLS] {
        &self.meta_result
    }

    pub fn sub_board(&self, index: usize) -> Option<&SubBoard> {
        self.meta_board.sub_board(index)
    }

    pub fn current_player(&self) -> Mark {
        self.current_player
    }

    pub fn active_sub_board(&self) -> Option<usize> {
        self.active_sub_board
    }

    pub fn winner(&self) -> Option<Mark> {
        self.winner
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status.is_over()
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    /// JSON snapshot for renderers
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    // ========================================================================
    // LEGALITY
    // ========================================================================

    /// Check a move, reporting the first rule it breaks
    pub fn check_move(&self, sub_board: usize, cell: usize) -> Result<(), MoveError> {
        if self.status.is_over() {
            return Err(MoveError::GameOver);
        }
        if sub_board >= BOARD_CELLS || cell >= BOARD_CELLS {
            return Err(MoveError::OutOfBounds { sub_board, cell });
        }
        if !self.meta_result[sub_board].is_open() {
            return Err(MoveError::BoardAlreadyDecided(sub_board));
        }
        if let Some(active) = self.active_sub_board {
            if active != sub_board {
                return Err(MoveError::BoardNotActive {
                    requested: sub_board,
                    active,
                });
            }
        }
        if self.meta_board.cell(sub_board, cell).is_some() {
            return Err(MoveError::CellOccupied { sub_board, cell });
        }
        Ok(())
    }

    pub fn is_legal_move(&self, sub_board: usize, cell: usize) -> bool {
        self.check_move(sub_board, cell).is_ok()
    }

    /// Sub-boards the current player may play in
    pub fn playable_sub_boards(&self) -> Vec<usize> {
        if self.status.is_over() {
            return vec![];
        }
        match self.active_sub_board {
            Some(active) => vec![active],
            None => (0..BOARD_CELLS)
                .filter(|&i| self.meta_result[i].is_open())
                .collect(),
        }
    }

    /// All legal moves in ascending (sub-board, cell) order
    pub fn legal_moves(&self) -> Vec<Move> {
        self.playable_sub_boards()
            .into_iter()
            .flat_map(|sub| {
                self.meta_board.boards()[sub]
                    .empty_cells()
                    .map(move |cell| Move::new(sub, cell))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    // ========================================================================
    // MOVE APPLICATION
    // ========================================================================

    /// Apply a move for the current player, producing the successor state
    pub fn apply_move(&self, sub_board: usize, cell: usize) -> Result<GameState, MoveError> {
        self.check_move(sub_board, cell)?;

        let mover = self.current_player;
        let mut next = self.clone();
        next.meta_board.place(sub_board, cell, mover);
        next.last_move = Some(Move::new(sub_board, cell));
        next.move_count += 1;

        let result = next.meta_board.boards()[sub_board].result();
        next.meta_result[sub_board] = result;
        match result {
            BoardResult::Won(mark) => {
                next.scores.increment(mark);
                tracing::info!("Sub-board {} won by {}", sub_board, mark);
            }
            BoardResult::Drawn => tracing::info!("Sub-board {} drawn", sub_board),
            BoardResult::Open => {}
        }

        next.status = next.compute_status();
        match next.status {
            GameStatus::InProgress => {
                next.active_sub_board = next.meta_result[cell].is_open().then_some(cell);
                next.current_player = mover.opponent();
            }
            GameStatus::Won(mark) => {
                next.winner = Some(mark);
                next.active_sub_board = None;
                tracing::info!("Game won by {} after {} moves", mark, next.move_count);
            }
            GameStatus::Drawn => {
                next.active_sub_board = None;
                tracing::info!("Game drawn after {} moves", next.move_count);
            }
        }

        tracing::debug!(
            "{} played sub-board {} cell {} -> active {:?}",
            mover,
            sub_board,
            cell,
            next.active_sub_board
        );

        Ok(next)
    }

    /// Apply a `Move` value
    pub fn apply(&self, mv: Move) -> Result<GameState, MoveError> {
        self.apply_move(mv.sub_board, mv.cell)
    }

    fn compute_status(&self) -> GameStatus {
        if let Some(mark) = line_winner(|i| self.meta_result[i].winner()) {
            return GameStatus::Won(mark);
        }
        if self.meta_result.iter().all(|r| !r.is_open()) {
            return GameStatus::Drawn;
        }
        GameStatus::InProgress
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Play moves in order, panicking on the first illegal one
    fn play(moves: &[(usize, usize)]) -> GameState {
        moves.iter().fold(GameState::new(), |state, &(s, c)| {
            state
                .apply_move(s, c)
                .unwrap_or_else(|e| panic!("move ({}, {}) rejected: {}", s, c, e))
        })
    }

    /// State built from sub-boards, with results and scores derived from the cells
    fn position(
        boards: [SubBoard; BOARD_CELLS],
        to_move: Mark,
        active: Option<usize>,
    ) -> GameState {
        let mut game = GameState::new();
        for (i, board) in boards.iter().enumerate() {
            game.meta_result[i] = board.result();
            if let Some(mark) = board.winner() {
                game.scores.increment(mark);
            }
        }
        game.meta_board = MetaBoard::from_boards(boards);
        game.current_player = to_move;
        game.active_sub_board = active;
        game
    }

    fn board(pattern: &str) -> SubBoard {
        SubBoard::from_pattern(pattern).unwrap()
    }

    /// X wins sub-board 0 with its top row on the last move, sending O to board 2
    const X_WINS_BOARD_0: [(usize, usize); 9] = [
        (0, 0),
        (0, 3),
        (3, 3),
        (3, 0),
        (0, 1),
        (1, 3),
        (3, 4),
        (4, 0),
        (0, 2),
    ];

    #[test]
    fn test_new_game() {
        let game = GameState::new();
        assert_eq!(game.current_player(), Mark::X);
        assert_eq!(game.active_sub_board(), None);
        assert_eq!(game.winner(), None);
        assert_eq!(game.status(), GameStatus::InProgress);
        assert_eq!(game.scores(), Scores::default());
        assert!(game.meta_result().iter().all(|r| r.is_open()));
        assert_eq!(game.legal_moves().len(), 81);
    }

    #[test]
    fn test_redirection() {
        let game = GameState::new().apply_move(4, 4).unwrap();
        assert_eq!(game.active_sub_board(), Some(4));
        assert_eq!(game.current_player(), Mark::O);
        for sub in (0..9).filter(|&s| s != 4) {
            for cell in 0..9 {
                assert!(!game.is_legal_move(sub, cell));
            }
        }
        assert!(game.is_legal_move(4, 0));
        assert_eq!(
            game.check_move(0, 0),
            Err(MoveError::BoardNotActive {
                requested: 0,
                active: 4
            })
        );
    }

    #[test]
    fn test_error_kinds() {
        let game = GameState::new().apply_move(4, 4).unwrap();
        assert_eq!(
            game.check_move(9, 0),
            Err(MoveError::OutOfBounds {
                sub_board: 9,
                cell: 0
            })
        );
        assert_eq!(
            game.check_move(4, 9),
            Err(MoveError::OutOfBounds {
                sub_board: 4,
                cell: 9
            })
        );
        assert_eq!(
            game.check_move(4, 4),
            Err(MoveError::CellOccupied {
                sub_board: 4,
                cell: 4
            })
        );
    }

    #[test]
    fn test_rejected_move_leaves_state() {
        let game = GameState::new().apply_move(4, 4).unwrap();
        let before = game.clone();
        assert!(game.apply_move(4, 4).is_err());
        assert!(game.apply_move(1, 1).is_err());
        assert_eq!(game, before);
    }

    #[test]
    fn test_sub_board_win_scores_once() {
        let game = play(&X_WINS_BOARD_0);
        assert_eq!(game.meta_result()[0], BoardResult::Won(Mark::X));
        assert_eq!(game.scores(), Scores { x: 1, o: 0 });
        assert_eq!(game.active_sub_board(), Some(2));
        // Board 0 is locked
        for cell in 0..9 {
            assert!(!game.is_legal_move(0, cell));
        }
        assert_eq!(game.check_move(0, 5), Err(MoveError::BoardAlreadyDecided(0)));
    }

    #[test]
    fn test_free_choice_after_decided_board() {
        // O plays cell 0 of board 2, pointing X at the decided board 0
        let game = play(&X_WINS_BOARD_0).apply_move(2, 0).unwrap();
        assert_eq!(game.active_sub_board(), None);
        assert_eq!(game.current_player(), Mark::X);
        assert!(game.is_legal_move(8, 8));
        assert!(game.is_legal_move(2, 3));
        assert!(!game.is_legal_move(0, 8));
    }

    #[test]
    fn test_move_into_self_decided_board_frees_choice() {
        // X completes the 0-4-8 diagonal of board 0 at cell 0, which points back at board 0
        let game = play(&[(0, 4), (4, 0), (0, 8), (8, 0)]);
        assert_eq!(game.active_sub_board(), Some(0));
        let game = game.apply_move(0, 0).unwrap();
        assert_eq!(game.meta_result()[0], BoardResult::Won(Mark::X));
        assert_eq!(game.active_sub_board(), None);
    }

    #[test]
    fn test_drawn_board_frees_choice() {
        let mut boards = [SubBoard::new(); BOARD_CELLS];
        boards[4] = board("XOX XOO OX.");
        let game = position(boards, Mark::X, Some(4));

        // X fills the last cell: no line, board drawn, redirect to 8
        let game = game.apply_move(4, 8).unwrap();
        assert_eq!(game.meta_result()[4], BoardResult::Drawn);
        assert_eq!(game.scores().total(), 0);
        assert_eq!(game.active_sub_board(), Some(8));

        // O sends X to drawn board 4: free choice
        let game = game.apply_move(8, 4).unwrap();
        assert_eq!(game.active_sub_board(), None);
        assert!(!game.is_legal_move(4, 0));
    }

    #[test]
    fn test_turns_alternate() {
        let mut game = GameState::new();
        let mut expected = Mark::X;
        for _ in 0..20 {
            assert_eq!(game.current_player(), expected);
            let mv = game.legal_moves()[0];
            game = game.apply(mv).unwrap();
            if game.is_over() {
                break;
            }
            expected = expected.opponent();
        }
    }

    #[test]
    fn test_meta_diagonal_win() {
        // X holds boards 0 and 4; equal mark counts, X to move in board 8
        let mut boards = [SubBoard::new(); BOARD_CELLS];
        boards[0] = board("XXX OO. ...");
        boards[1] = board("O.. ... ...");
        boards[3] = board("O.. ... ...");
        boards[4] = board("XXX .O. O..");
        boards[8] = board("XX. OO. ...");
        let game = position(boards, Mark::X, Some(8));
        assert_eq!(game.meta_result()[0], BoardResult::Won(Mark::X));
        assert_eq!(game.meta_result()[4], BoardResult::Won(Mark::X));
        assert_eq!(game.scores(), Scores { x: 2, o: 0 });
        assert_eq!(game.status(), GameStatus::InProgress);

        let before_win = game.apply_move(8, 5).unwrap();
        assert_eq!(before_win.winner(), None);
        assert_eq!(before_win.current_player(), Mark::O);

        // X completes the top row of board 8 instead
        let won = game.apply_move(8, 2).unwrap();
        assert_eq!(won.winner(), Some(Mark::X));
        assert_eq!(won.status(), GameStatus::Won(Mark::X));
        assert_eq!(won.current_player(), Mark::X);
        assert_eq!(won.active_sub_board(), None);
        assert_eq!(won.scores().x, 3);
        assert!(won.legal_moves().is_empty());
        assert_eq!(won.check_move(1, 1), Err(MoveError::GameOver));
    }

    #[test]
    fn test_drawn_lines_never_win_meta() {
        let drawn = board("XOX XOO OXX");
        let mut boards = [SubBoard::new(); BOARD_CELLS];
        boards[..3].copy_from_slice(&[drawn; 3]);
        boards[3..6].copy_from_slice(&[board("O.. ... ..."); 3]);
        let game = position(boards, Mark::X, None);
        assert_eq!(game.meta_result()[1], BoardResult::Drawn);
        assert_eq!(game.compute_status(), GameStatus::InProgress);
        assert!(!game.legal_moves().is_empty());
    }

    #[test]
    fn test_meta_draw_ends_game() {
        // Results X O X / X O O / O X _ leave no meta-line for anyone
        let x_won = board("XXX OO. ...");
        let o_won = board("OOO XX. ...");
        let boards = [
            x_won,
            o_won,
            x_won,
            x_won,
            o_won,
            o_won,
            o_won,
            x_won,
            board("XOX XOO OX."),
        ];
        let game = position(boards, Mark::X, Some(8));
        assert_eq!(game.scores(), Scores { x: 4, o: 4 });

        let done = game.apply_move(8, 8).unwrap();
        assert_eq!(done.status(), GameStatus::Drawn);
        assert_eq!(done.winner(), None);
        assert!(done.legal_moves().is_empty());
    }

    #[test]
    fn test_reset_scores_keeps_board() {
        let game = play(&X_WINS_BOARD_0);
        let reset = game.reset_scores();
        assert_eq!(reset.scores(), Scores::default());
        assert_eq!(reset.meta_board(), game.meta_board());
        assert_eq!(reset.meta_result(), game.meta_result());
    }

    #[test]
    fn test_scores_add() {
        let total = Scores { x: 3, o: 1 } + Scores { x: 2, o: 5 };
        assert_eq!(total, Scores { x: 5, o: 6 });
        assert_eq!(total.get(Mark::O), 6);
    }

    #[test]
    fn test_last_move_tracked() {
        let game = play(&[(2, 7), (7, 1)]);
        assert_eq!(game.last_move(), Some(Move::new(7, 1)));
        assert_eq!(game.move_count(), 2);
    }

    #[test]
    fn test_json_snapshot() {
        let game = GameState::new().apply_move(4, 4).unwrap();
        let json = game.to_json().unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, game);
    }
}
