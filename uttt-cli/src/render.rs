//! Text rendering of a game for the terminal

use std::fmt::Write;

use uttt_core::{BoardResult, GameState, GameStatus, Mark, Scores};

fn cell_char(cell: Option<Mark>) -> char {
    match cell {
        Some(Mark::X) => 'X',
        Some(Mark::O) => 'O',
        None => '.',
    }
}

fn result_label(result: BoardResult) -> String {
    match result {
        BoardResult::Open => "open".to_string(),
        BoardResult::Won(mark) => mark.to_string(),
        BoardResult::Drawn => "draw".to_string(),
    }
}

/// 9x9 grid, sub-boards separated by rules
pub fn render_grid(state: &GameState) -> String {
    let meta = state.meta_board();
    let mut out = String::new();

    for meta_row in 0..3 {
        if meta_row > 0 {
            out.push_str("-------+-------+-------\n");
        }
        for cell_row in 0..3 {
            let row: Vec<String> = (0..3)
                .map(|meta_col| {
                    let sub = meta_row * 3 + meta_col;
                    (0..3)
                        .map(|cell_col| {
                            let cell = cell_row * 3 + cell_col;
                            cell_char(meta.cell(sub, cell)).to_string()
                        })
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect();
            let _ = writeln!(out, " {} ", row.join(" | "));
        }
    }
    out
}

/// One-line summary of turn, constraint and running scores
pub fn render_status(state: &GameState, scores: Scores) -> String {
    let turn = match state.status() {
        GameStatus::InProgress => match state.active_sub_board() {
            Some(sub) => format!("{} to move in sub-board {}", state.current_player(), sub),
            None => format!("{} to move in any open sub-board", state.current_player()),
        },
        GameStatus::Won(mark) => format!("Victory for {}! Game over.", mark),
        GameStatus::Drawn => "Draw. Game over.".to_string(),
    };
    format!("{}  [X {} - O {}]", turn, scores.x, scores.o)
}

/// Results of the nine sub-boards, laid out as a 3x3 grid
pub fn render_meta(state: &GameState) -> String {
    state
        .meta_result()
        .chunks(3)
        .map(|row| {
            row.iter()
                .map(|&r| format!("{:>4}", result_label(r)))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full view: grid, sub-board results, status
pub fn render(state: &GameState, scores: Scores) -> String {
    let mut out = render_grid(state);
    out.push('\n');
    out.push_str(&render_meta(state));
    out.push_str("\n\n");
    if let Some(last) = state.last_move() {
        let _ = writeln!(out, "Last move: sub-board {} cell {}", last.sub_board, last.cell);
    }
    out.push_str(&render_status(state, scores));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_grid() {
        let grid = render_grid(&GameState::new());
        let lines: Vec<_> = grid.lines().collect();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], " . . . | . . . | . . . ");
        assert_eq!(lines[3], "-------+-------+-------");
    }

    #[test]
    fn test_mark_placement() {
        // Sub-board 5 is middle-right; cell 6 is its bottom-left
        let state = GameState::new().apply_move(5, 6).unwrap();
        let rendered = render_grid(&state);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[6], " . . . | . . . | X . . ");
    }

    #[test]
    fn test_status_lines() {
        let state = GameState::new();
        assert_eq!(
            render_status(&state, state.scores()),
            "X to move in any open sub-board  [X 0 - O 0]"
        );
        let state = state.apply_move(4, 4).unwrap();
        assert_eq!(
            render_status(&state, Scores { x: 4, o: 2 }),
            "O to move in sub-board 4  [X 4 - O 2]"
        );
    }

    #[test]
    fn test_render_includes_last_move() {
        let state = GameState::new().apply_move(2, 7).unwrap();
        let text = render(&state, state.scores());
        assert!(text.contains("Last move: sub-board 2 cell 7"));
        assert!(text.contains("open"));
    }
}
