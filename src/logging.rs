//! Structured logging for the network quality probe
//!
//! Console logger with level filtering, colored output and optional JSON
//! format for integration with log aggregators. Probes log state
//! transitions, fallback attempts and per-tick live values through this
//! module.

use crate::error::{AppError, Result};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Get ANSI color code for console output
    fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m", // White
            LogLevel::Debug => "\x1b[36m", // Cyan
            LogLevel::Info => "\x1b[32m",  // Green
            LogLevel::Warn => "\x1b[33m",  // Yellow
            LogLevel::Error => "\x1b[31m", // Red
        }
    }

    fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
}

/// Console logger scoped to a named component
#[derive(Debug, Clone)]
pub struct Logger {
    name: String,
    min_level: LogLevel,
    use_color: bool,
    format: LogFormat,
}

impl Logger {
    /// Create a new console logger for a component
    pub fn new<S: Into<String>>(name: S, min_level: LogLevel, use_color: bool) -> Self {
        Self {
            name: name.into(),
            min_level,
            use_color,
            format: LogFormat::Console,
        }
    }

    /// Derive a logger with the same settings for another component
    pub fn scoped<S: Into<String>>(&self, name: S) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Switch the output format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Check whether a level would be emitted
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message, &[]);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, &[]);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, &[]);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, &[]);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, &[]);
    }

    /// Log a message with additional structured fields
    pub fn log(&self, level: LogLevel, message: &str, fields: &[(&str, String)]) {
        if !self.enabled(level) {
            return;
        }
        let line = self.format_entry(level, message, fields);
        if level >= LogLevel::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    fn format_entry(&self, level: LogLevel, message: &str, fields: &[(&str, String)]) -> String {
        match self.format {
            LogFormat::Console => {
                let timestamp = Utc::now().format("%H:%M:%S%.3f");
                let suffix = if fields.is_empty() {
                    String::new()
                } else {
                    let rendered: Vec<String> = fields
                        .iter()
                        .map(|(k, v)| format!("{}={}", k, v))
                        .collect();
                    format!(" ({})", rendered.join(", "))
                };
                if self.use_color {
                    format!(
                        "{} {}{:5}{} [{}] {}{}",
                        timestamp,
                        level.color_code(),
                        level.as_str(),
                        LogLevel::reset_code(),
                        self.name,
                        message,
                        suffix
                    )
                } else {
                    format!(
                        "{} {:5} [{}] {}{}",
                        timestamp,
                        level.as_str(),
                        self.name,
                        message,
                        suffix
                    )
                }
            }
            LogFormat::Json => {
                let field_map: HashMap<&str, &String> =
                    fields.iter().map(|(k, v)| (*k, v)).collect();
                json!({
                    "timestamp": Utc::now().to_rfc3339(),
                    "level": level.as_str(),
                    "logger": self.name,
                    "message": message,
                    "fields": field_map,
                })
                .to_string()
            }
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new("nqp", LogLevel::Info, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering_and_filtering() {
        let logger = Logger::new("test", LogLevel::Warn, false);
        assert!(!logger.enabled(LogLevel::Debug));
        assert!(!logger.enabled(LogLevel::Info));
        assert!(logger.enabled(LogLevel::Warn));
        assert!(logger.enabled(LogLevel::Error));
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_console_format_contains_parts() {
        let logger = Logger::new("probe.jitter", LogLevel::Trace, false);
        let line = logger.format_entry(
            LogLevel::Info,
            "tick reduced",
            &[("mos", "4.21".to_string())],
        );
        assert!(line.contains("INFO"));
        assert!(line.contains("[probe.jitter]"));
        assert!(line.contains("tick reduced"));
        assert!(line.contains("mos=4.21"));
    }

    #[test]
    fn test_json_format_is_valid_json() {
        let logger =
            Logger::new("test", LogLevel::Trace, false).with_format(LogFormat::Json);
        let line = logger.format_entry(
            LogLevel::Error,
            "candidate failed",
            &[("url", "https://a.example".to_string())],
        );
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["fields"]["url"], "https://a.example");
    }

    #[test]
    fn test_scoped_logger_keeps_settings() {
        let base = Logger::new("app", LogLevel::Debug, false);
        let scoped = base.scoped("probe.video");
        assert!(scoped.enabled(LogLevel::Debug));
        let line = scoped.format_entry(LogLevel::Debug, "x", &[]);
        assert!(line.contains("[probe.video]"));
    }
}
