use chrono::Local;
use simplelog::*;
use std::fs::File;
use std::io;

/// Maps the textual log level used in configuration files to a filter.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "trace" => Some(LevelFilter::Trace),
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        _ => None,
    }
}

/// Installs the global logger: terminal output and, if `to_file` is set, a
/// `log_<date_time>.txt` file in the working directory.
///
/// Returns `Ok(false)` when a logger was already installed.
pub fn init_logger(level: LevelFilter, to_file: bool) -> io::Result<bool> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if to_file {
        let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let name = format!("log_{}.txt", date_and_time);
        loggers.push(WriteLogger::new(level, Config::default(), File::create(name)?));
    }
    Ok(CombinedLogger::init(loggers).is_ok())
}
