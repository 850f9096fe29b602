use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

/// Terminal falling-block puzzle.
#[derive(Parser, Debug, Clone)]
#[command(name = "blockfall", version)]
pub struct Settings {
    /// Seed for the piece randomizer. Omit for a fresh random sequence.
    #[arg(long)]
    pub seed: Option<u64>,

    /// File that receives the game log.
    #[arg(long, default_value = "blockfall.log")]
    pub log_file: PathBuf,

    /// Log threshold: off | error | warn | info | debug | trace
    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,

    /// Hide the landing-position preview.
    #[arg(long)]
    pub no_ghost: bool,
}

impl Settings {
    pub fn show_ghost(&self) -> bool {
        !self.no_ghost
    }
}
