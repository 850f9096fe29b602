use log::{debug, info, trace};

use crate::piece::{PieceProvider, RandomPieceProvider, Shape, TetrominoType, MAX_SHAPE_SIZE};

// ============================================================================
// Configuration
// ============================================================================

pub const GRID_WIDTH: usize = 10;
pub const GRID_HEIGHT: usize = 20;

pub const SPAWN_X: i16 = 3;
pub const SPAWN_Y: i16 = 0;

// Timing (in milliseconds)
pub const BASE_DROP_INTERVAL_MS: u64 = 1000;
pub const MIN_DROP_INTERVAL_MS: u64 = 100;
const DROP_INTERVAL_STEP_MS: u64 = 100;
pub const SCORE_PER_LEVEL: u32 = 1000;

// Scoring
pub const SCORE_SINGLE: u32 = 100;
pub const SCORE_DOUBLE: u32 = 300;
pub const SCORE_TRIPLE: u32 = 500;
pub const SCORE_TETRIS: u32 = 800;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellState {
    Empty,
    Filled(TetrominoType),
}

pub type Board = Vec<Vec<CellState>>;

fn empty_row() -> Vec<CellState> {
    vec![CellState::Empty; GRID_WIDTH]
}

fn empty_board() -> Board {
    vec![empty_row(); GRID_HEIGHT]
}

/// Absolute board positions of every filled cell of `shape` anchored at `(x, y)`.
fn shape_blocks(shape: &Shape, x: i16, y: i16) -> Vec<Position> {
    shape
        .cells()
        .map(|(i, j)| Position {
            x: x + j as i16,
            y: y + i as i16,
        })
        .collect()
}

/// The falling piece. Its shape starts canonical and changes on rotation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ActivePiece {
    pub kind: TetrominoType,
    pub shape: Shape,
    pub position: Position,
}

impl ActivePiece {
    pub fn new(kind: TetrominoType) -> Self {
        Self::new_at(kind, SPAWN_X, SPAWN_Y)
    }

    pub fn new_at(kind: TetrominoType, x: i16, y: i16) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            position: Position { x, y },
        }
    }

    pub fn blocks(&self) -> Vec<Position> {
        shape_blocks(&self.shape, self.position.x, self.position.y)
    }
}

/// Where the active piece would come to rest if dropped straight down.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Ghost {
    pub kind: TetrominoType,
    pub shape: Shape,
    pub position: Position,
}

impl Ghost {
    pub fn blocks(&self) -> Vec<Position> {
        shape_blocks(&self.shape, self.position.x, self.position.y)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    Idle,
    Running,
    Paused,
    Ended,
}

/// Discrete input delivered by the host.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
    HardDrop,
    TogglePause,
    Start,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    GameStarted,
    PieceSpawned(TetrominoType),
    NextPiece(TetrominoType),
    PieceMoved,
    PieceRotated,
    PieceLocked,
    LinesCleared(u32),
    ScoreChanged(u32),
    LevelUp(u32),
    Paused,
    Resumed,
    GameOver,
}

/// Gravity interval for a level: 100 ms faster per level, never below the floor.
pub fn drop_interval_for_level(level: u32) -> u64 {
    let speed_reduction = u64::from(level.saturating_sub(1)) * DROP_INTERVAL_STEP_MS;
    BASE_DROP_INTERVAL_MS
        .saturating_sub(speed_reduction)
        .max(MIN_DROP_INTERVAL_MS)
}

pub fn points_for_lines(lines: u32) -> u32 {
    match lines {
        1 => SCORE_SINGLE,
        2 => SCORE_DOUBLE,
        3 => SCORE_TRIPLE,
        4 => SCORE_TETRIS,
        _ => 0,
    }
}

// ============================================================================
// Game
// ============================================================================

pub struct Game {
    pub grid: Board,
    pub current_piece: Option<ActivePiece>,
    pub next_piece: Option<TetrominoType>,
    pub score: u32,
    pub level: u32,
    pub drop_interval_ms: u64,
    pub last_drop_ms: u64,
    pub state: GameState,
    piece_provider: Box<dyn PieceProvider>,
    events: Vec<GameEvent>,
}

// ============================================================================
// Game Logic
// ============================================================================

impl Game {
    pub fn new() -> Self {
        Self::with_provider(Box::new(RandomPieceProvider::new()))
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_provider(Box::new(RandomPieceProvider::seeded(seed)))
    }

    /// An idle game; nothing falls until `start`.
    pub fn with_provider(provider: Box<dyn PieceProvider>) -> Self {
        Self {
            grid: empty_board(),
            current_piece: None,
            next_piece: None,
            score: 0,
            level: 1,
            drop_interval_ms: BASE_DROP_INTERVAL_MS,
            last_drop_ms: 0,
            state: GameState::Idle,
            piece_provider: provider,
            events: Vec::new(),
        }
    }

    /// A running game over a prepared board with a prepared active piece.
    pub fn with_grid(grid: Board, current_piece: ActivePiece) -> Self {
        let mut provider: Box<dyn PieceProvider> = Box::new(RandomPieceProvider::new());
        let next_piece = provider.next_piece();

        Self {
            grid,
            current_piece: Some(current_piece),
            next_piece: Some(next_piece),
            state: GameState::Running,
            ..Self::with_provider(provider)
        }
    }

    pub fn start(&mut self) {
        if matches!(self.state, GameState::Running | GameState::Paused) {
            return;
        }

        self.grid = empty_board();
        self.current_piece = None;
        self.score = 0;
        self.level = 1;
        self.drop_interval_ms = BASE_DROP_INTERVAL_MS;
        self.state = GameState::Running;
        self.events.push(GameEvent::GameStarted);
        info!("game started");

        self.next_piece = Some(self.piece_provider.next_piece());
        self.spawn_next_piece();
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            GameState::Running => {
                self.state = GameState::Paused;
                self.events.push(GameEvent::Paused);
            }
            GameState::Paused => {
                self.state = GameState::Running;
                self.events.push(GameEvent::Resumed);
            }
            GameState::Idle | GameState::Ended => {}
        }
    }

    /// Applies a host command, ignoring it when the current state does not
    /// accept it. Returns whether the command was accepted.
    pub fn handle(&mut self, command: Command) -> bool {
        match (self.state, command) {
            (GameState::Idle | GameState::Ended, Command::Start) => {
                self.start();
                true
            }
            (GameState::Running | GameState::Paused, Command::TogglePause) => {
                self.toggle_pause();
                true
            }
            (GameState::Running, Command::MoveLeft) => self.move_piece(-1, 0),
            (GameState::Running, Command::MoveRight) => self.move_piece(1, 0),
            (GameState::Running, Command::SoftDrop) => self.move_piece(0, 1),
            (GameState::Running, Command::Rotate) => self.rotate_piece(),
            (GameState::Running, Command::HardDrop) => {
                self.hard_drop();
                true
            }
            _ => false,
        }
    }

    pub fn collides(&self, shape: &Shape, x: i16, y: i16) -> bool {
        shape_blocks(shape, x, y).into_iter().any(|block| {
            if block.x < 0 || block.x >= GRID_WIDTH as i16 || block.y >= GRID_HEIGHT as i16 {
                return true;
            }
            // Cells above the visible board never hit anything.
            block.y >= 0 && self.grid[block.y as usize][block.x as usize] != CellState::Empty
        })
    }

    pub fn spawn_next_piece(&mut self) {
        let kind = self
            .next_piece
            .take()
            .unwrap_or_else(|| self.piece_provider.next_piece());
        let next = self.piece_provider.next_piece();
        self.next_piece = Some(next);
        self.events.push(GameEvent::NextPiece(next));

        let piece = ActivePiece::new(kind);
        if self.collides(&piece.shape, piece.position.x, piece.position.y) {
            self.current_piece = None;
            self.state = GameState::Ended;
            self.events.push(GameEvent::GameOver);
            info!("game over: score {} at level {}", self.score, self.level);
            return;
        }

        debug!("spawned {:?}, next {:?}", kind, next);
        self.current_piece = Some(piece);
        self.events.push(GameEvent::PieceSpawned(kind));
    }

    /// Shifts the active piece. A blocked downward move locks the piece.
    pub fn move_piece(&mut self, dx: i16, dy: i16) -> bool {
        let Some(piece) = self.current_piece else {
            return false;
        };
        let x = piece.position.x + dx;
        let y = piece.position.y + dy;

        if !self.collides(&piece.shape, x, y) {
            self.current_piece = Some(ActivePiece {
                position: Position { x, y },
                ..piece
            });
            self.events.push(GameEvent::PieceMoved);
            return true;
        }

        if dy > 0 {
            self.lock_piece();
        }
        false
    }

    /// Rotates clockwise in place. No wall kicks: a blocked rotation is
    /// simply rejected.
    pub fn rotate_piece(&mut self) -> bool {
        let Some(piece) = self.current_piece else {
            return false;
        };
        let rotated = piece.shape.rotated_clockwise();
        if self.collides(&rotated, piece.position.x, piece.position.y) {
            return false;
        }

        self.current_piece = Some(ActivePiece {
            shape: rotated,
            ..piece
        });
        self.events.push(GameEvent::PieceRotated);
        true
    }

    pub fn hard_drop(&mut self) {
        if self.current_piece.is_none() {
            return;
        }
        while self.move_piece(0, 1) {}
    }

    /// Merges the active piece into the board, clears lines, scores them
    /// and spawns the next piece.
    pub fn lock_piece(&mut self) {
        let Some(piece) = self.current_piece.take() else {
            return;
        };
        for block in piece.blocks() {
            if block.y >= 0 {
                self.grid[block.y as usize][block.x as usize] = CellState::Filled(piece.kind);
            }
        }
        self.events.push(GameEvent::PieceLocked);
        debug!("locked {:?} at ({}, {})", piece.kind, piece.position.x, piece.position.y);

        let lines = self.clear_lines();
        self.award(lines);
        self.spawn_next_piece();
    }

    pub fn clear_lines(&mut self) -> u32 {
        let mut cleared_count = 0;
        let mut y = GRID_HEIGHT;

        while y > 0 {
            if self.is_row_complete(y - 1) {
                self.grid.remove(y - 1);
                self.grid.insert(0, empty_row());
                cleared_count += 1;
                // Rescan the same row: the one above has shifted into it
            } else {
                y -= 1;
            }
        }

        if cleared_count > 0 {
            self.events.push(GameEvent::LinesCleared(cleared_count));
        }

        cleared_count
    }

    /// Scores one lock event. The level advances at most one step per call,
    /// even when the new score crosses several thresholds.
    pub fn award(&mut self, lines: u32) {
        if lines == 0 {
            return;
        }
        self.score += points_for_lines(lines);
        self.events.push(GameEvent::ScoreChanged(self.score));

        if self.score >= self.level * SCORE_PER_LEVEL {
            self.level += 1;
            self.drop_interval_ms = drop_interval_for_level(self.level);
            self.events.push(GameEvent::LevelUp(self.level));
            info!(
                "level {} reached, drop interval {} ms",
                self.level, self.drop_interval_ms
            );
        }
    }

    pub fn ghost_position(&self) -> Option<Ghost> {
        let piece = self.current_piece?;
        let mut y = piece.position.y;
        while !self.collides(&piece.shape, piece.position.x, y + 1) {
            y += 1;
        }

        Some(Ghost {
            kind: piece.kind,
            shape: piece.shape,
            position: Position {
                x: piece.position.x,
                y,
            },
        })
    }

    /// Automatic gravity, driven by the host once per frame with a
    /// monotonic timestamp in milliseconds.
    pub fn tick(&mut self, timestamp_ms: u64) {
        if self.state != GameState::Running {
            return;
        }

        if timestamp_ms.saturating_sub(self.last_drop_ms) > self.drop_interval_ms {
            trace!("gravity step at {} ms", timestamp_ms);
            self.move_piece(0, 1);
            self.last_drop_ms = timestamp_ms;
        }
    }

    // ------------------------------------------------------------------------
    // Render surface
    // ------------------------------------------------------------------------

    pub fn board(&self) -> &Board {
        &self.grid
    }

    /// Visible cells of the active piece.
    pub fn active_cells(&self) -> Vec<Position> {
        self.current_piece
            .map(|piece| piece.blocks().into_iter().filter(|b| b.y >= 0).collect())
            .unwrap_or_default()
    }

    pub fn ghost_cells(&self) -> Vec<Position> {
        self.ghost_position()
            .map(|ghost| ghost.blocks().into_iter().filter(|b| b.y >= 0).collect())
            .unwrap_or_default()
    }

    pub fn next_preview(&self) -> Option<(TetrominoType, [[bool; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE])> {
        self.next_piece.map(|kind| (kind, kind.preview()))
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn drop_interval_ms(&self) -> u64 {
        self.drop_interval_ms
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_row_complete(&self, y: usize) -> bool {
        self.grid[y].iter().all(|cell| *cell != CellState::Empty)
    }

    pub fn filled_count_in_row(&self, y: usize) -> usize {
        self.grid[y].iter().filter(|cell| **cell != CellState::Empty).count()
    }

    pub fn is_game_over(&self) -> bool {
        self.state == GameState::Ended
    }

    pub fn total_filled_cells(&self) -> usize {
        self.grid.iter().flatten().filter(|cell| **cell != CellState::Empty).count()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;

    pub fn empty_grid() -> Board {
        empty_board()
    }

    pub fn fill_row(grid: &mut Board, y: usize) {
        grid[y] = vec![CellState::Filled(TetrominoType::Z); GRID_WIDTH];
    }

    pub fn fill_row_with_gap(grid: &mut Board, y: usize, gap_x: usize) {
        fill_row(grid, y);
        grid[y][gap_x] = CellState::Empty;
    }

    /// A running game over a prepared board, with a known next piece.
    pub fn game_with(grid: Board, piece: ActivePiece, next: TetrominoType) -> Game {
        let mut game = Game::with_grid(grid, piece);
        game.next_piece = Some(next);
        game
    }
}
