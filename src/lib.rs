pub mod config;
pub mod game;
pub mod logging;
pub mod piece;
pub mod snapshot;
