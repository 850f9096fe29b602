//! Render frames pulled from the engine after each command or tick.
//!
//! A presenter keeps the previous [`Snapshot`] and asks for
//! [`Snapshot::changed_cells`] to repaint only what moved.

use crate::game::{CellState, Game, GameState, GRID_HEIGHT, GRID_WIDTH};
use crate::piece::TetrominoType;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RenderCell {
    Empty,
    Locked(TetrominoType),
    Ghost(TetrominoType),
    Active(TetrominoType),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Snapshot {
    pub cells: Vec<Vec<RenderCell>>,
    pub next: Option<TetrominoType>,
    pub score: u32,
    pub level: u32,
    pub state: GameState,
}

impl Snapshot {
    /// Layers the locked board, the ghost (when enabled) and the active piece.
    pub fn capture(game: &Game, show_ghost: bool) -> Self {
        let mut cells: Vec<Vec<RenderCell>> = game
            .board()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        CellState::Empty => RenderCell::Empty,
                        CellState::Filled(kind) => RenderCell::Locked(*kind),
                    })
                    .collect()
            })
            .collect();

        if let Some(piece) = game.current_piece {
            if show_ghost {
                for block in game.ghost_cells() {
                    let cell = &mut cells[block.y as usize][block.x as usize];
                    if *cell == RenderCell::Empty {
                        *cell = RenderCell::Ghost(piece.kind);
                    }
                }
            }
            for block in game.active_cells() {
                cells[block.y as usize][block.x as usize] = RenderCell::Active(piece.kind);
            }
        }

        Self {
            cells,
            next: game.next_piece,
            score: game.score(),
            level: game.level(),
            state: game.state(),
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.state == GameState::Ended
    }

    /// Cells whose content differs from `previous`, as `(row, col, new)`.
    pub fn changed_cells(&self, previous: &Snapshot) -> Vec<(usize, usize, RenderCell)> {
        let mut changed = Vec::new();
        for row in 0..GRID_HEIGHT {
            for col in 0..GRID_WIDTH {
                let cell = self.cells[row][col];
                if previous.cells[row][col] != cell {
                    changed.push((row, col, cell));
                }
            }
        }
        changed
    }
}
