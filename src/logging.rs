//! File logging for the terminal front end. The screen belongs to the UI,
//! so records go to a file through log4rs.

use std::path::Path;

use anyhow::{Context, Result};
use log::LevelFilter;
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

/// Installs the global logger. `LevelFilter::Off` installs nothing.
pub fn init_log(level: LevelFilter, file_path: &Path) -> Result<()> {
    if level == LevelFilter::Off {
        return Ok(());
    }

    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {l} {t} {m}{n}",
        )))
        .build(file_path)
        .with_context(|| format!("cannot open log file {}", file_path.display()))?;

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("logfile", Box::new(logfile)),
        )
        .build(Root::builder().appender("logfile").build(level))
        .context("invalid log configuration")?;

    log4rs::init_config(config).context("logger already installed")?;
    Ok(())
}
