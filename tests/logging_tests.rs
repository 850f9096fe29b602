//! The global logger can only be installed once per process, so these tests
//! run serially and only one of them installs it.

use std::fs;

use blockfall::game::Game;
use blockfall::logging::init_log;
use log::LevelFilter;
use serial_test::serial;

#[test]
#[serial]
fn off_level_installs_nothing() {
    let path = std::env::temp_dir().join(format!("blockfall-off-{}.log", std::process::id()));
    let _ = fs::remove_file(&path);

    init_log(LevelFilter::Off, &path).unwrap();

    assert!(!path.exists());
}

#[test]
#[serial]
fn engine_records_reach_the_log_file() {
    let path = std::env::temp_dir().join(format!("blockfall-{}.log", std::process::id()));
    let _ = fs::remove_file(&path);

    init_log(LevelFilter::Info, &path).unwrap();
    let mut game = Game::with_seed(3);
    game.start();
    log::logger().flush();

    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("game started"));
    assert!(init_log(LevelFilter::Info, &path).is_err());
}
