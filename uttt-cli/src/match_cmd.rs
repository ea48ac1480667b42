//! Match command - AI against a seeded random opponent
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_match(), report_results()
//! - Level 3: play_single_game(), compute_statistics()
//! - Level 4: formatting utilities

use anyhow::Result;
use clap::Args;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;

use uttt_core::{Difficulty, GameConfig, GameStatus, Mark, Scores, Session};

/// Default seed when none is given
const DEFAULT_SEED: u64 = 42;

/// Safety cap; a game never exceeds 81 moves
const MAX_MOVES: u32 = 81;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MatchArgs {
    /// Number of games to play
    #[arg(long, default_value = "20")]
    pub games: usize,

    /// AI difficulty: easy, medium or hard
    #[arg(long, default_value = "medium")]
    pub difficulty: Difficulty,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single game
#[derive(Clone, Debug, Serialize)]
struct GameRecord {
    game_number: usize,
    seed: u64,
    status: GameStatus,
    moves: u32,
    scores: Scores,
}

/// Aggregated match results
#[derive(Clone, Debug, Serialize)]
struct MatchResults {
    difficulty: Difficulty,
    games: Vec<GameRecord>,
    ai_wins: usize,
    random_wins: usize,
    draws: usize,
    avg_moves: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run match command
///
/// 1. Play the games in parallel
/// 2. Report results
pub fn run(args: MatchArgs, seed: Option<u64>) -> Result<()> {
    let seed = seed.unwrap_or(DEFAULT_SEED);

    tracing::info!(
        "Starting match: AI ({}) vs random, {} games, seed {}",
        args.difficulty,
        args.games,
        seed
    );

    let results = play_match(args.difficulty, args.games, seed);
    report_results(&results, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Play every game; each game gets its own seed so results are reproducible
fn play_match(difficulty: Difficulty, games: usize, seed: u64) -> MatchResults {
    let records: Vec<GameRecord> = (0..games)
        .into_par_iter()
        .map(|i| play_single_game(difficulty, i + 1, seed.wrapping_add(i as u64)))
        .collect();

    for record in &records {
        tracing::debug!(
            "Game {}: {:?} ({} moves)",
            record.game_number,
            record.status,
            record.moves
        );
    }

    compute_statistics(difficulty, records)
}

fn report_results(results: &MatchResults, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
    } else {
        print_text_results(results);
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// One game: random legal moves for X, the AI for O
fn play_single_game(difficulty: Difficulty, game_number: usize, seed: u64) -> GameRecord {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut session = Session::new(GameConfig::human_vs_ai(difficulty).with_ai_mark(Mark::O));

    while !session.state().is_over() && session.state().move_count() < MAX_MOVES {
        if session.is_ai_turn() {
            if let Err(e) = session.step_ai() {
                tracing::warn!("Game {}: AI move failed: {}", game_number, e);
                break;
            }
            continue;
        }

        let moves = session.state().legal_moves();
        let Some(&mv) = moves.choose(&mut rng) else {
            break;
        };
        if let Err(e) = session.play(mv.sub_board, mv.cell) {
            tracing::warn!("Game {}: random move rejected: {}", game_number, e);
            break;
        }
    }

    let state = session.state();
    GameRecord {
        game_number,
        seed,
        status: state.status(),
        moves: state.move_count(),
        scores: state.scores(),
    }
}

fn compute_statistics(difficulty: Difficulty, games: Vec<GameRecord>) -> MatchResults {
    let count = |status: GameStatus| games.iter().filter(|g| g.status == status).count();
    let ai_wins = count(GameStatus::Won(Mark::O));
    let random_wins = count(GameStatus::Won(Mark::X));
    let draws = games.len() - ai_wins - random_wins;

    let avg_moves = if games.is_empty() {
        0.0
    } else {
        games.iter().map(|g| g.moves as f32).sum::<f32>() / games.len() as f32
    };

    MatchResults {
        difficulty,
        games,
        ai_wins,
        random_wins,
        draws,
        avg_moves,
    }
}

// ============================================================================
// LEVEL 4 - FORMATTING
// ============================================================================

fn print_text_results(results: &MatchResults) {
    let total = results.games.len();
    println!("Match results (AI difficulty {})", results.difficulty);
    println!("  Games:       {}", total);
    println!(
        "  AI wins:     {} ({:.1}%)",
        results.ai_wins,
        percent(results.ai_wins, total)
    );
    println!(
        "  Random wins: {} ({:.1}%)",
        results.random_wins,
        percent(results.random_wins, total)
    );
    println!(
        "  Draws:       {} ({:.1}%)",
        results.draws,
        percent(results.draws, total)
    );
    println!("  Avg moves:   {:.1}", results.avg_moves);
}

fn percent(part: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        part as f32 * 100.0 / total as f32
    }
}

// ============================================================================
// TESTS
// ============================================================================
