//! Session configuration
//!
//! The UI owns these choices and hands them to the core. A config can be
//! built in code or loaded from JSON; CLI flags override file values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::ai::{AlphaBetaAI, Difficulty};
use crate::board::Mark;

/// Unrecognised option strings
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown difficulty '{0}' (expected easy, medium or hard)")]
    Difficulty(String),
    #[error("unknown mode '{0}' (expected hvh or hva)")]
    Mode(String),
    #[error("unknown mark '{0}' (expected x or o)")]
    Mark(String),
}

/// Who plays whom
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    HumanVsHuman,
    #[default]
    HumanVsAi,
}

impl FromStr for Mode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hvh" | "human-vs-human" => Ok(Mode::HumanVsHuman),
            "hva" | "human-vs-ai" => Ok(Mode::HumanVsAi),
            _ => Err(ParseError::Mode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::HumanVsHuman => f.write_str("human-vs-human"),
            Mode::HumanVsAi => f.write_str("human-vs-ai"),
        }
    }
}

impl FromStr for Mark {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x" | "X" => Ok(Mark::X),
            "o" | "O" => Ok(Mark::O),
            _ => Err(ParseError::Mark(s.to_string())),
        }
    }
}

/// Game configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Human-vs-human or human-vs-AI
    pub mode: Mode,
    /// AI strength
    pub difficulty: Difficulty,
    /// Mark the AI plays in human-vs-AI mode
    pub ai_mark: Mark,
    /// Pause before each AI move, in milliseconds
    pub think_delay_ms: u64,
    /// Carry scores into the next game on reset
    pub keep_scores: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            mode: Mode::HumanVsAi,
            difficulty: Difficulty::Medium,
            ai_mark: Mark::O,
            think_delay_ms: 0,
            keep_scores: true,
        }
    }
}

impl GameConfig {
    /// Two humans at one board
    pub fn human_vs_human() -> Self {
        Self {
            mode: Mode::HumanVsHuman,
            ..Default::default()
        }
    }

    /// Human against the AI at the given difficulty
    pub fn human_vs_ai(difficulty: Difficulty) -> Self {
        Self {
            mode: Mode::HumanVsAi,
            difficulty,
            ..Default::default()
        }
    }

    /// Load from a JSON file; missing fields take defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_ai_mark(mut self, mark: Mark) -> Self {
        self.ai_mark = mark;
        self
    }

    pub fn with_think_delay(mut self, millis: u64) -> Self {
        self.think_delay_ms = millis;
        self
    }

    pub fn with_keep_scores(mut self, keep: bool) -> Self {
        self.keep_scores = keep;
        self
    }

    /// The AI player, if this mode has one
    pub fn ai(&self) -> Option<AlphaBetaAI> {
        match self.mode {
            Mode::HumanVsAi => Some(AlphaBetaAI::with_mark(self.difficulty, self.ai_mark)),
            Mode::HumanVsHuman => None,
        }
    }

    pub fn think_delay(&self) -> Duration {
        Duration::from_millis(self.think_delay_ms)
    }
}
