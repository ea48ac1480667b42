//! Game controller: turn flow, scores and background AI turns
//!
//! A `Session` owns one game. Human and AI moves go through the same
//! `GameState::apply_move`. AI turns can run off the caller's task via
//! `GameHandle`; each `new_game` bumps the session epoch so a result computed
//! for a replaced game is dropped instead of applied.
//!
//! Scores in `GameState` cover the current game only. The session keeps the
//! running totals of finished games next to it.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;

use crate::ai::AlphaBetaAI;
use crate::config::{GameConfig, Mode};
use crate::game::{GameState, Move, MoveError, Scores};

/// Controller phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    InProgress,
    GameOver,
}

/// Controller-level failures
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Move(#[from] MoveError),
    #[error("it is the AI's turn")]
    AiTurn,
    #[error("AI search task failed: {0}")]
    AiTask(#[from] tokio::task::JoinError),
}

/// What happened to a finished AI turn
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AiOutcome {
    Applied(Move),
    /// The game was replaced while the AI was thinking
    Stale,
    /// No legal cell was found
    NoMove,
}

/// Snapshot handed to an AI computation
#[derive(Clone, Debug)]
pub struct AiRequest {
    epoch: u64,
    ticket: u64,
    state: GameState,
    ai: AlphaBetaAI,
    think_delay: Duration,
}

impl AiRequest {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Run the search. Pure function of the snapshot.
    pub fn compute(&self) -> Option<Move> {
        self.ai
            .choose_move(self.state.meta_board(), self.state.active_sub_board())
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// One game instance
#[derive(Debug)]
pub struct Session {
    state: GameState,
    /// Scores of earlier games carried into this one
    carried: Scores,
    config: GameConfig,
    epoch: u64,
    next_ticket: u64,
    /// Ticket of the AI turn currently claimed
    ai_in_flight: Option<u64>,
}

impl Session {
    pub fn new(config: GameConfig) -> Self {
        tracing::info!(
            "New session: {} (difficulty {}, AI plays {})",
            config.mode,
            config.difficulty,
            config.ai_mark
        );
        Self {
            state: GameState::new(),
            carried: Scores::default(),
            config,
            epoch: 0,
            next_ticket: 0,
            ai_in_flight: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Running totals: carried scores plus the current game's
    pub fn scores(&self) -> Scores {
        self.carried + self.state.scores()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Bumped on every new game
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn phase(&self) -> Phase {
        if self.state.is_over() {
            Phase::GameOver
        } else {
            Phase::InProgress
        }
    }

    pub fn is_ai_pending(&self) -> bool {
        self.ai_in_flight.is_some()
    }

    /// Whether the AI should move now
    pub fn is_ai_turn(&self) -> bool {
        self.config.mode == Mode::HumanVsAi
            && self.phase() == Phase::InProgress
            && self.state.current_player() == self.config.ai_mark
    }

    /// Start a fresh game, invalidating any pending AI computation
    pub fn new_game(&mut self, keep_scores: bool) -> &GameState {
        self.epoch += 1;
        self.ai_in_flight = None;
        self.carried = if keep_scores {
            self.scores()
        } else {
            Scores::default()
        };
        self.state = GameState::new();
        tracing::info!("Game reset (epoch {}, scores kept: {})", self.epoch, keep_scores);
        &self.state
    }

    /// Fresh game following the configured score policy
    pub fn restart(&mut self) -> &GameState {
        let keep = self.config.keep_scores;
        self.new_game(keep)
    }

    /// Zero the scores without touching the board
    pub fn reset_scores(&mut self) -> &GameState {
        self.carried = Scores::default();
        self.state = self.state.reset_scores();
        &self.state
    }

    /// Human move
    pub fn play(&mut self, sub_board: usize, cell: usize) -> Result<&GameState, SessionError> {
        if self.is_ai_turn() {
            return Err(SessionError::AiTurn);
        }
        self.apply(Move::new(sub_board, cell))
    }

    /// Single transition path for every move
    fn apply(&mut self, mv: Move) -> Result<&GameState, SessionError> {
        self.state = self.state.apply(mv)?;
        Ok(&self.state)
    }

    /// Claim the AI turn, if it is one and nothing is already in flight
    pub fn begin_ai_turn(&mut self) -> Option<AiRequest> {
        if !self.is_ai_turn() || self.ai_in_flight.is_some() {
            return None;
        }
        let ai = self.config.ai()?;
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.ai_in_flight = Some(ticket);
        Some(AiRequest {
            epoch: self.epoch,
            ticket,
            state: self.state.clone(),
            ai,
            think_delay: self.config.think_delay(),
        })
    }

    /// Apply an AI result computed for `epoch`, dropping it if the game moved on
    pub fn finish_ai_turn(
        &mut self,
        epoch: u64,
        mv: Option<Move>,
    ) -> Result<AiOutcome, SessionError> {
        if epoch != self.epoch {
            tracing::warn!(
                "Discarding AI result for epoch {} (current {})",
                epoch,
                self.epoch
            );
            return Ok(AiOutcome::Stale);
        }
        self.ai_in_flight = None;
        match mv {
            Some(mv) => {
                self.apply(mv)?;
                tracing::debug!("AI played sub-board {} cell {}", mv.sub_board, mv.cell);
                Ok(AiOutcome::Applied(mv))
            }
            None => Ok(AiOutcome::NoMove),
        }
    }

    /// Drop the claim of an AI turn that ended without a result.
    /// A claim that was already finished or replaced is left alone.
    pub fn release_ai_turn(&mut self, ticket: u64) {
        if self.ai_in_flight == Some(ticket) {
            tracing::debug!("AI turn {} released without a move", ticket);
            self.ai_in_flight = None;
        }
    }

    /// Compute and apply the AI move on the current task
    pub fn step_ai(&mut self) -> Result<Option<AiOutcome>, SessionError> {
        let Some(request) = self.begin_ai_turn() else {
            return Ok(None);
        };
        let mv = request.compute();
        self.finish_ai_turn(request.epoch, mv).map(Some)
    }
}

// ============================================================================
// ASYNC HANDLE
// ============================================================================

/// Shared handle for driving a session from async code
#[derive(Clone, Debug)]
pub struct GameHandle {
    inner: Arc<Mutex<Session>>,
}

impl GameHandle {
    pub fn new(config: GameConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Session::new(config))),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().await
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> GameState {
        self.inner.lock().await.state().clone()
    }

    /// Running score totals across games
    pub async fn scores(&self) -> Scores {
        self.inner.lock().await.scores()
    }

    /// Start the AI turn in the background.
    ///
    /// Returns `None` when it is not the AI's turn or a computation is
    /// already pending. The session lock is not held while the AI thinks.
    pub async fn spawn_ai_turn(&self) -> Option<JoinHandle<Result<AiOutcome, SessionError>>> {
        let request = self.inner.lock().await.begin_ai_turn()?;
        let guard = AiTurnGuard {
            inner: Arc::clone(&self.inner),
            ticket: request.ticket,
        };
        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(ai_task(inner, request, guard)))
    }

    /// Run the AI turn to completion, if it is one
    pub async fn run_ai_turn(&self) -> Result<Option<AiOutcome>, SessionError> {
        match self.spawn_ai_turn().await {
            Some(task) => Ok(Some(task.await??)),
            None => Ok(None),
        }
    }
}

/// Releases the AI claim when a background turn is aborted or fails.
/// Lives inside the task future, so it drops even if the task never ran.
struct AiTurnGuard {
    inner: Arc<Mutex<Session>>,
    ticket: u64,
}

impl Drop for AiTurnGuard {
    fn drop(&mut self) {
        let ticket = self.ticket;
        if let Ok(mut session) = self.inner.try_lock() {
            session.release_ai_turn(ticket);
            return;
        }
        // Lock is busy: release from a follow-up task
        let inner = Arc::clone(&self.inner);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    inner.lock().await.release_ai_turn(ticket);
                });
            }
            Err(_) => tracing::warn!("AI turn {} dropped outside a runtime; claim kept", ticket),
        }
    }
}

/// Body of a background AI turn
async fn ai_task(
    inner: Arc<Mutex<Session>>,
    request: AiRequest,
    _guard: AiTurnGuard,
) -> Result<AiOutcome, SessionError> {
    let epoch = request.epoch();
    if !request.think_delay.is_zero() {
        tokio::time::sleep(request.think_delay).await;
    }
    // Skip the search entirely if the game was replaced during the delay
    if inner.lock().await.epoch() != epoch {
        tracing::debug!("AI turn for epoch {} cancelled before search", epoch);
        return Ok(AiOutcome::Stale);
    }

    let mv = tokio::task::spawn_blocking(move || request.compute()).await?;

    let mut session = inner.lock().await;
    session.finish_ai_turn(epoch, mv)
}

// ============================================================================
// TESTS
// ============================================================================
