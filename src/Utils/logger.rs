//! simplelog setup shared by the session wrapper and the command line front end.
use std::fs::File;

use chrono::Local;
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use crate::error::LogError;

/// Maps `debug|info|warn|error|off|none` to a level filter.
pub fn parse_loglevel(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        "off" | "none" => Some(LevelFilter::Off),
        _ => None,
    }
}

/// `newton_log_<date>_<time>.txt`
pub fn default_log_file_name() -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("newton_log_{}.txt", date_and_time)
}

/// Installs a terminal logger and, if `log_file` is given, a file logger next to it.
///
/// `LevelFilter::Off` installs nothing.
pub fn init_logger(level: LevelFilter, log_file: Option<&str>) -> Result<(), LogError> {
    if level == LevelFilter::Off {
        return Ok(());
    }
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        let file = File::create(path).map_err(|source| LogError::File {
            path: path.to_string(),
            source,
        })?;
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }
    CombinedLogger::init(loggers).map_err(|_| LogError::AlreadyInstalled)
}
