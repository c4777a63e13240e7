use std::fs::OpenOptions;
use std::path::PathBuf;

use log::{info, LevelFilter};
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};

use crate::error::LoggingError;

pub const DEFAULT_LOG_FILE: &str = "game.log";

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LevelFilter,
    /// Appended to, created if missing. `None` disables the file log.
    pub file: Option<PathBuf>,
    pub terminal: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            terminal: true,
        }
    }
}

impl LogConfig {
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    pub fn with_terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }
}

/// Installs the global logger. Can only succeed once per process.
pub fn init(config: &LogConfig) -> Result<(), LoggingError> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if config.terminal {
        loggers.push(TermLogger::new(
            config.level,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ));
    }

    if let Some(path) = &config.file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LoggingError::File {
                path: path.clone(),
                source,
            })?;
        loggers.push(WriteLogger::new(config.level, Config::default(), file));
    }

    CombinedLogger::init(loggers)?;
    info!("simple2d {}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config.file {
        info!("Logging to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_log_to_game_log() {
        let config = LogConfig::default();
        assert_eq!(config.file.as_deref(), Some(std::path::Path::new("game.log")));
        assert_eq!(config.level, LevelFilter::Info);
        assert!(config.terminal);
    }

    #[test]
    fn unwritable_log_file_is_reported() {
        let config = LogConfig::default()
            .with_terminal(false)
            .with_file(Some(PathBuf::from("/nonexistent-dir/simple2d/game.log")));
        match init(&config) {
            Err(LoggingError::File { path, .. }) => {
                assert!(path.ends_with("game.log"));
            }
            other => panic!("expected file error, got {:?}", other),
        }
    }
}
