//! Play command - interactive game in the terminal
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_config(), play_loop()
//! - Level 3: take_turn(), handle_command()
//! - Level 4: command parsing

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

use uttt_core::{AiOutcome, Difficulty, GameConfig, GameHandle, GameState, Mark, Mode};

use crate::render::render;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    /// JSON config file; flags below override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// hvh (two humans) or hva (human vs AI)
    #[arg(long)]
    pub mode: Option<Mode>,

    /// AI difficulty: easy, medium or hard
    #[arg(long)]
    pub difficulty: Option<Difficulty>,

    /// Mark the AI plays (x or o)
    #[arg(long)]
    pub ai_mark: Option<Mark>,

    /// Pause before each AI move, in milliseconds
    #[arg(long, value_name = "MS")]
    pub think_ms: Option<u64>,

    /// Zero scores whenever a new game starts
    #[arg(long)]
    pub fresh_scores: bool,

    /// Print a JSON snapshot of the state after every move
    #[arg(long)]
    pub json: bool,
}

/// A line of player input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Move { sub_board: usize, cell: usize },
    NewGame,
    ResetScores,
    Help,
    Quit,
}

const HELP: &str = "Commands:
  <sub-board> <cell>   play a move (both 0-8, row-major)
  new                  start a new game
  reset                reset scores
  help                 show this help
  quit                 leave";

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
///
/// 1. Build the configuration
/// 2. Drive the game loop on a tokio runtime
pub fn run(args: PlayArgs) -> Result<()> {
    let config = build_config(&args)?;

    tracing::info!(
        "Starting {} game (difficulty {}, AI mark {})",
        config.mode,
        config.difficulty,
        config.ai_mark
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(play_loop(config, args.json))
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Merge config file and flags
fn build_config(args: &PlayArgs) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => GameConfig::default(),
    };

    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(difficulty) = args.difficulty {
        config.difficulty = difficulty;
    }
    if let Some(mark) = args.ai_mark {
        config.ai_mark = mark;
    }
    if let Some(ms) = args.think_ms {
        config.think_delay_ms = ms;
    }
    if args.fresh_scores {
        config.keep_scores = false;
    }

    Ok(config)
}

/// Read commands until the player quits or input ends
async fn play_loop(config: GameConfig, json: bool) -> Result<()> {
    let handle = GameHandle::new(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", HELP);
    show(&handle, json).await?;

    loop {
        if take_ai_turn(&handle).await? {
            show(&handle, json).await?;
            continue;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_command(&line) {
            Some(Command::Quit) => break,
            Some(command) => {
                handle_command(&handle, command).await;
                show(&handle, json).await?;
            }
            None if line.trim().is_empty() => {}
            None => println!("Unrecognised input '{}'. Type 'help'.", line.trim()),
        }
    }

    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Let the AI move if it is its turn. Returns whether a move was made.
async fn take_ai_turn(handle: &GameHandle) -> Result<bool> {
    if !handle.lock().await.is_ai_turn() {
        return Ok(false);
    }

    println!("AI is thinking...");
    match handle.run_ai_turn().await? {
        Some(AiOutcome::Applied(mv)) => {
            println!("AI plays sub-board {} cell {}", mv.sub_board, mv.cell);
            Ok(true)
        }
        Some(AiOutcome::Stale) | Some(AiOutcome::NoMove) | None => Ok(false),
    }
}

/// Apply one command and return the resulting state
async fn handle_command(handle: &GameHandle, command: Command) -> GameState {
    let mut session = handle.lock().await;
    match command {
        Command::Move { sub_board, cell } => {
            if let Err(e) = session.play(sub_board, cell) {
                println!("Illegal move: {}", e);
            }
        }
        Command::NewGame => {
            session.restart();
        }
        Command::ResetScores => {
            session.reset_scores();
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    session.state().clone()
}

async fn show(handle: &GameHandle, json: bool) -> Result<()> {
    let (state, scores) = {
        let session = handle.lock().await;
        (session.state().clone(), session.scores())
    };
    println!("\n{}", render(&state, scores));
    if json {
        println!("{}", state.to_json()?);
    }
    Ok(())
}

// ============================================================================
// LEVEL 4 - PARSING
// ============================================================================

fn parse_command(line: &str) -> Option<Command> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["new"] | ["n"] => Some(Command::NewGame),
        ["reset"] | ["r"] => Some(Command::ResetScores),
        ["help"] | ["h"] | ["?"] => Some(Command::Help),
        ["quit"] | ["q"] | ["exit"] => Some(Command::Quit),
        [sub, cell] => Some(Command::Move {
            sub_board: sub.parse().ok()?,
            cell: cell.parse().ok()?,
        }),
        _ => None,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> PlayArgs {
        PlayArgs {
            config: None,
            mode: None,
            difficulty: None,
            ai_mark: None,
            think_ms: None,
            fresh_scores: false,
            json: false,
        }
    }

    #[test]
    fn test_parse_moves() {
        assert_eq!(
            parse_command("4 7"),
            Some(Command::Move {
                sub_board: 4,
                cell: 7
            })
        );
        assert_eq!(
            parse_command("  0   8 "),
            Some(Command::Move {
                sub_board: 0,
                cell: 8
            })
        );
        // Range is checked by the rules engine, not the parser
        assert_eq!(
            parse_command("12 3"),
            Some(Command::Move {
                sub_board: 12,
                cell: 3
            })
        );
        assert_eq!(parse_command("4 x"), None);
        assert_eq!(parse_command("1 2 3"), None);
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(parse_command("new"), Some(Command::NewGame));
        assert_eq!(parse_command("reset"), Some(Command::ResetScores));
        assert_eq!(parse_command("q"), Some(Command::Quit));
        assert_eq!(parse_command("?"), Some(Command::Help));
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_build_config_defaults() {
        let config = build_config(&args()).unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_build_config_overrides() {
        let mut a = args();
        a.mode = Some(Mode::HumanVsHuman);
        a.difficulty = Some(Difficulty::Hard);
        a.ai_mark = Some(Mark::X);
        a.think_ms = Some(1000);
        a.fresh_scores = true;

        let config = build_config(&a).unwrap();
        assert_eq!(config.mode, Mode::HumanVsHuman);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.ai_mark, Mark::X);
        assert_eq!(config.think_delay_ms, 1000);
        assert!(!config.keep_scores);
    }

    #[test]
    fn test_build_config_missing_file() {
        let mut a = args();
        a.config = Some(PathBuf::from("/nonexistent/uttt.json"));
        assert!(build_config(&a).is_err());
    }

    #[tokio::test]
    async fn test_handle_command_applies_move() {
        let handle = GameHandle::new(GameConfig::human_vs_human());
        let state = handle_command(
            &handle,
            Command::Move {
                sub_board: 4,
                cell: 4,
            },
        )
        .await;
        assert_eq!(state.active_sub_board(), Some(4));

        // Illegal move leaves the state unchanged
        let again = handle_command(
            &handle,
            Command::Move {
                sub_board: 0,
                cell: 0,
            },
        )
        .await;
        assert_eq!(again, state);

        let fresh = handle_command(&handle, Command::NewGame).await;
        assert_eq!(fresh.move_count(), 0);
        assert_eq!(handle.scores().await.total(), 0);
    }
}
