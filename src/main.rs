use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use log::{debug, info};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    io::stdout,
    time::{Duration, Instant},
};

use blockfall::config::Settings;
use blockfall::game::{Command, Game, GameState, GRID_HEIGHT, GRID_WIDTH};
use blockfall::logging::init_log;
use blockfall::piece::{TetrominoType, MAX_SHAPE_SIZE};
use blockfall::snapshot::{RenderCell, Snapshot};

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const GHOST_CHAR: &str = "░░";
const EMPTY_CHAR: &str = "  ";
const FRAME_MS: u64 = 16;

// ============================================================================
// Color Mapping
// ============================================================================

fn hex_channel(hex: &str, range: std::ops::Range<usize>) -> u8 {
    hex.get(range)
        .and_then(|s| u8::from_str_radix(s, 16).ok())
        .unwrap_or(0)
}

fn tetromino_color(t: TetrominoType) -> Color {
    let hex = t.color_hex();
    Color::Rgb(hex_channel(hex, 1..3), hex_channel(hex, 3..5), hex_channel(hex, 5..7))
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, snapshot: &Snapshot) {
    let area = frame.size();
    render_game(frame, snapshot, area);

    match snapshot.state {
        GameState::Idle => render_popup(
            frame,
            area,
            " Blockfall ",
            Color::Cyan,
            vec![Line::from(""), Line::from("Press Enter to start")],
        ),
        GameState::Paused => render_popup(
            frame,
            area,
            " Paused ",
            Color::Yellow,
            vec![Line::from(""), Line::from("Press P to continue")],
        ),
        GameState::Ended => render_popup(
            frame,
            area,
            " Game Over ",
            Color::Red,
            vec![
                Line::from(""),
                Line::from(format!("Score: {}", snapshot.score)),
                Line::from(format!("Level: {}", snapshot.level)),
                Line::from(""),
                Line::from("Press Enter to play again"),
            ],
        ),
        GameState::Running => {}
    }
}

fn render_game(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let grid_display_width = (GRID_WIDTH as u16 * CELL_WIDTH) + 2;
    let grid_display_height = GRID_HEIGHT as u16 + 2;
    let side_width = 14;
    let total_width = grid_display_width + side_width + 2;
    let total_height = grid_display_height + 2;

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);
    let game_row = vertical[0];

    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(side_width),
    ])
    .split(game_row);

    let side = Layout::vertical([
        Constraint::Length(MAX_SHAPE_SIZE as u16 + 2),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    render_grid(frame, snapshot, horizontal[0]);
    render_preview(frame, snapshot, side[0]);
    render_info(frame, snapshot, side[1]);

    let controls_area = Rect {
        x: area.x,
        y: game_row.y + game_row.height,
        width: area.width,
        height: 1,
    };
    if controls_area.y < area.height {
        let controls = Paragraph::new(Line::from(
            "←→/AD: Move | ↓/S: Drop | ↑/W: Rotate | Space: Hard drop | P: Pause | Q: Quit",
        ))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_grid(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Blockfall ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = snapshot
        .cells
        .iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|cell| match *cell {
                    RenderCell::Empty => Span::raw(EMPTY_CHAR),
                    RenderCell::Locked(kind) | RenderCell::Active(kind) => {
                        Span::styled(BLOCK_CHAR, Style::default().fg(tetromino_color(kind)))
                    }
                    RenderCell::Ghost(kind) => Span::styled(
                        GHOST_CHAR,
                        Style::default()
                            .fg(tetromino_color(kind))
                            .add_modifier(Modifier::DIM),
                    ),
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_preview(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(kind) = snapshot.next else {
        return;
    };
    let color = tetromino_color(kind);
    let lines: Vec<Line> = kind
        .preview()
        .iter()
        .map(|row| {
            let mut spans = vec![Span::raw(" ")];
            spans.extend(row.iter().map(|filled| {
                if *filled {
                    Span::styled(BLOCK_CHAR, Style::default().fg(color))
                } else {
                    Span::raw(EMPTY_CHAR)
                }
            }));
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", snapshot.score)),
        Line::from(""),
        Line::from(Span::styled("Level", Style::default().fg(Color::Green))),
        Line::from(format!("{}", snapshot.level)),
    ];

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_popup(frame: &mut Frame, area: Rect, title: &str, color: Color, mut text: Vec<Line>) {
    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        "Press Q to quit",
        Style::default().fg(Color::DarkGray),
    )));

    let height = text.len() as u16 + 2;
    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(title, Style::default().fg(color)))
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(paragraph, centered_rect(28, height, area));
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Input
// ============================================================================

fn command_for(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Command::MoveLeft),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Command::MoveRight),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Command::SoftDrop),
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Command::Rotate),
        KeyCode::Char(' ') => Some(Command::HardDrop),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::TogglePause),
        KeyCode::Enter => Some(Command::Start),
        _ => None,
    }
}

// ============================================================================
// Main Loop
// ============================================================================

fn run(settings: &Settings) -> Result<()> {
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend).context("cannot create terminal")?;

    let mut game = match settings.seed {
        Some(seed) => Game::with_seed(seed),
        None => Game::new(),
    };
    let clock = Instant::now();

    loop {
        let snapshot = Snapshot::capture(&game, settings.show_ghost());
        terminal.draw(|frame| render(frame, &snapshot))?;

        if event::poll(Duration::from_millis(FRAME_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => break,
                        code => {
                            if let Some(command) = command_for(code) {
                                game.handle(command);
                            }
                        }
                    }
                }
            }
        }

        game.tick(clock.elapsed().as_millis() as u64);

        for event in game.take_events() {
            debug!("{:?}", event);
        }
    }

    info!("quit with score {} at level {}", game.score(), game.level());
    Ok(())
}

fn main() -> Result<()> {
    let settings = Settings::parse();
    init_log(settings.log_level, &settings.log_file)?;

    enable_raw_mode().context("cannot enable raw mode")?;
    stdout().execute(EnterAlternateScreen)?;

    let result = run(&settings);

    // Restore terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}
