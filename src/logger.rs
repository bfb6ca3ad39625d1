//! Thin logging facade over `tracing`.
//!
//! The logger is a plain value passed through the application state instead of
//! a process-wide singleton. Debug helpers only emit in development.

use std::{fmt, str::FromStr};
use tracing::{debug, error, info, warn};

use crate::error::StackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("invalid environment: {other}")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Logger {
    environment: Environment,
}

impl Logger {
    #[must_use]
    pub const fn new(environment: Environment) -> Self {
        Self { environment }
    }

    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    pub fn dev(&self, message: &str) {
        if self.environment.is_development() {
            debug!("{message}");
        }
    }

    pub fn dev_error(&self, err: &StackError) {
        if self.environment.is_development() {
            error!(error = %err.to_log_value(), "{err}");
        }
    }

    pub fn info(&self, message: &str) {
        info!("{message}");
    }

    pub fn warn(&self, message: &str) {
        warn!("{message}");
    }

    /// Log an error with its full cause chain.
    pub fn error(&self, err: &StackError) {
        error!(
            kind = err.kind().as_str(),
            tag = err.tag().unwrap_or("none"),
            error = %err.to_log_value(),
            "{err}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_aliases() {
        assert_eq!("development".parse(), Ok(Environment::Development));
        assert_eq!("DEV".parse(), Ok(Environment::Development));
        assert_eq!(" production ".parse(), Ok(Environment::Production));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn logger_defaults_to_production() {
        let logger = Logger::default();
        assert_eq!(logger.environment(), Environment::Production);
        assert!(!logger.environment().is_development());
    }
}
