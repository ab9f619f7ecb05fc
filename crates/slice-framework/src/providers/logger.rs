//! The application logger handle registered under `logger`.

use crate::config::LoggerConfiguration;
use crate::error::{ConfigurationError, FrameworkError};
use std::str::FromStr;
use tracing::Level;

/// A level-filtered handle that forwards to `tracing`, tagged with the
/// application name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logger {
    app_name: String,
    level: Level,
}

impl Logger {
    pub fn new(app_name: impl Into<String>, level: Level) -> Self {
        Self {
            app_name: app_name.into(),
            level,
        }
    }

    pub fn from_config(app_name: &str, config: &LoggerConfiguration) -> Result<Self, FrameworkError> {
        let level = Level::from_str(&config.level).map_err(|e| ConfigurationError::Invalid {
            scope: "logger".into(),
            name: "level".into(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(app_name, level))
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// `tracing` orders levels by verbosity, so `TRACE` is the greatest.
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    pub fn log(&self, level: Level, message: &str) {
        if !self.enabled(level) {
            return;
        }
        let app = self.app_name.as_str();
        match level {
            Level::ERROR => tracing::error!(app, "{message}"),
            Level::WARN => tracing::warn!(app, "{message}"),
            Level::INFO => tracing::info!(app, "{message}"),
            Level::DEBUG => tracing::debug!(app, "{message}"),
            Level::TRACE => tracing::trace!(app, "{message}"),
        }
    }

    pub fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::ERROR, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_comes_from_configuration() {
        let config = LoggerConfiguration {
            level: "info".into(),
        };
        let logger = Logger::from_config("bookshelf", &config).unwrap();
        assert_eq!(logger.level(), Level::INFO);
        assert!(logger.enabled(Level::WARN));
        assert!(!logger.enabled(Level::DEBUG));
    }

    #[test]
    fn unknown_level_is_a_configuration_error() {
        let config = LoggerConfiguration {
            level: "loud".into(),
        };
        let err = Logger::from_config("bookshelf", &config).unwrap_err();
        assert!(err.is_misconfiguration());
    }
}
