//! Error handling for the network quality probe

use thiserror::Error;

/// Custom error types for the network quality probe
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/transport failures (connection rejected, socket errors).
    /// Recoverable: the fallback combinator advances to the next candidate.
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP request errors (non-2xx status, malformed response)
    #[error("HTTP request error: {0}")]
    HttpRequest(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// A capability the probe depends on is absent (e.g. no loopback socket).
    /// Fatal for that probe.
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// Media load/decode failure reported by a playback source
    #[error("Media error: {0}")]
    Media(String),

    /// Degenerate input that would otherwise produce NaN/Infinity
    /// (e.g. zero or unknown playback duration)
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (sockets, file operations)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (URLs, JSON, numbers)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Probe execution errors (a run reached its Failed state)
    #[error("Probe execution error: {0}")]
    Probe(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new HTTP request error
    pub fn http_request<S: Into<String>>(message: S) -> Self {
        Self::HttpRequest(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new resource-unavailable error
    pub fn resource_unavailable<S: Into<String>>(message: S) -> Self {
        Self::ResourceUnavailable(message.into())
    }

    /// Create a new media error
    pub fn media<S: Into<String>>(message: S) -> Self {
        Self::Media(message.into())
    }

    /// Create a media error from a playback source error code.
    /// Code 4 conventionally denotes "resource not found or unsupported".
    pub fn media_code(code: u32) -> Self {
        match code {
            4 => Self::Media("resource not found or format unsupported (code 4)".to_string()),
            _ => Self::Media(format!("playback failed with error code {}", code)),
        }
    }

    /// Create a new degenerate-input error
    pub fn degenerate_input<S: Into<String>>(message: S) -> Self {
        Self::DegenerateInput(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new probe execution error
    pub fn probe<S: Into<String>>(message: S) -> Self {
        Self::Probe(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Transport(_) => "TRANSPORT",
            Self::HttpRequest(_) => "HTTP",
            Self::Timeout(_) => "TIMEOUT",
            Self::ResourceUnavailable(_) => "RESOURCE",
            Self::Media(_) => "MEDIA",
            Self::DegenerateInput(_) => "INPUT",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Probe(_) => "PROBE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if error is recoverable by advancing to a fallback candidate
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::HttpRequest(_) | Self::Timeout(_) => true,
            Self::Config(_)
            | Self::ResourceUnavailable(_)
            | Self::Media(_)
            | Self::DegenerateInput(_)
            | Self::Validation(_)
            | Self::Io(_)
            | Self::Parse(_)
            | Self::Probe(_)
            | Self::Internal(_) => false,
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::Transport(_) | Self::HttpRequest(_) => 2,
            Self::Timeout(_) => 3,
            Self::ResourceUnavailable(_) => 4,
            Self::Media(_) | Self::DegenerateInput(_) => 5,
            Self::Io(_) => 6,
            Self::Probe(_) => 7,
            Self::Internal(_) => 99,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file or command line arguments.", msg)
            }
            Self::Transport(msg) => {
                format!("Network connectivity issue: {}\n\nSuggestion: Check your internet connection and try again.", msg)
            }
            Self::HttpRequest(msg) => {
                format!("HTTP request failed: {}\n\nSuggestion: The target server may be down or blocking requests. Try a different URL.", msg)
            }
            Self::Timeout(msg) => {
                format!("Request timed out: {}\n\nSuggestion: Increase the timeout value using --timeout or check your network connection.", msg)
            }
            Self::ResourceUnavailable(msg) => {
                format!("Required resource unavailable: {}\n\nSuggestion: This probe cannot run on the current system.", msg)
            }
            Self::Media(msg) => {
                format!("Media playback failed: {}\n\nSuggestion: Verify the media URL points to a reachable, supported resource.", msg)
            }
            Self::DegenerateInput(msg) => {
                format!("Invalid measurement input: {}\n\nSuggestion: Check the declared media duration and probe parameters.", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Check the format of your URLs and other configuration values.", msg)
            }
            Self::Io(msg) => {
                format!("I/O operation failed: {}\n\nSuggestion: Check socket and file permissions.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check the format of your input data or configuration files.", msg)
            }
            Self::Probe(msg) => {
                format!("Probe run failed: {}\n\nSuggestion: This may be a temporary issue. Try running the probe again.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Transport(_) | Self::HttpRequest(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::ResourceUnavailable(_) | Self::Media(_) | Self::DegenerateInput(_) => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Io(_) | Self::Probe(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if error.is_connect() || error.is_request() {
            Self::transport(error.to_string())
        } else {
            Self::http_request(error.to_string())
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::parse(format!("Float parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

// Anyhow integration
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let original_error = e.into();
            let context = f();
            AppError::internal(format!("{}: {}", context, original_error))
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

/// Error reporter for structured error logging and user feedback
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());

            if error.is_recoverable() {
                eprintln!();
                if self.use_color {
                    use colored::Colorize;
                    eprintln!(
                        "{}",
                        "This error might be temporary. You can try running the command again."
                            .green()
                    );
                } else {
                    eprintln!(
                        "This error might be temporary. You can try running the command again."
                    );
                }
            }
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = AppError::config("Invalid configuration");
        assert_eq!(config_error.category(), "CONFIG");
        assert!(!config_error.is_recoverable());
        assert_eq!(config_error.exit_code(), 1);

        let transport_error = AppError::transport("Connection refused");
        assert_eq!(transport_error.category(), "TRANSPORT");
        assert!(transport_error.is_recoverable());
        assert_eq!(transport_error.exit_code(), 2);
    }

    #[test]
    fn test_error_categories() {
        let errors = [
            AppError::config("config"),
            AppError::transport("transport"),
            AppError::http_request("http"),
            AppError::timeout("timeout"),
            AppError::resource_unavailable("resource"),
            AppError::media("media"),
            AppError::degenerate_input("input"),
            AppError::validation("validation"),
            AppError::io("io"),
            AppError::parse("parse"),
            AppError::probe("probe"),
            AppError::internal("internal"),
        ];

        let expected_categories = [
            "CONFIG",
            "TRANSPORT",
            "HTTP",
            "TIMEOUT",
            "RESOURCE",
            "MEDIA",
            "INPUT",
            "VALIDATION",
            "IO",
            "PARSE",
            "PROBE",
            "INTERNAL",
        ];

        for (error, expected) in errors.iter().zip(expected_categories.iter()) {
            assert_eq!(error.category(), *expected);
        }
    }

    #[test]
    fn test_media_code_mapping() {
        let not_found = AppError::media_code(4);
        assert!(not_found.to_string().contains("resource not found"));

        let other = AppError::media_code(3);
        assert!(other.to_string().contains("error code 3"));
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(AppError::transport("test").is_recoverable());
        assert!(AppError::http_request("test").is_recoverable());
        assert!(AppError::timeout("test").is_recoverable());

        assert!(!AppError::config("test").is_recoverable());
        assert!(!AppError::media("test").is_recoverable());
        assert!(!AppError::degenerate_input("test").is_recoverable());
        assert!(!AppError::resource_unavailable("test").is_recoverable());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("test").exit_code(), 1);
        assert_eq!(AppError::transport("test").exit_code(), 2);
        assert_eq!(AppError::timeout("test").exit_code(), 3);
        assert_eq!(AppError::resource_unavailable("test").exit_code(), 4);
        assert_eq!(AppError::media("test").exit_code(), 5);
        assert_eq!(AppError::degenerate_input("test").exit_code(), 5);
        assert_eq!(AppError::io("test").exit_code(), 6);
        assert_eq!(AppError::probe("test").exit_code(), 7);
        assert_eq!(AppError::internal("test").exit_code(), 99);
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert_eq!(app_error.category(), "IO");

        let parse_error = "not_a_number".parse::<i32>().unwrap_err();
        let app_error: AppError = parse_error.into();
        assert_eq!(app_error.category(), "PARSE");

        let url_error = url::Url::parse("not-a-valid-url").unwrap_err();
        let app_error: AppError = url_error.into();
        assert_eq!(app_error.category(), "PARSE");
    }

    #[test]
    fn test_error_context() {
        let result: Result<i32> = Err(AppError::transport("Connection failed"));
        let with_context = result.context("While measuring throughput");

        assert!(with_context.is_err());
        let error = with_context.unwrap_err();
        assert_eq!(error.category(), "INTERNAL");
        assert!(error.to_string().contains("While measuring throughput"));
    }

    #[test]
    fn test_console_formatting() {
        let error = AppError::media("Test error");
        let formatted_no_color = error.format_for_console(false);

        assert!(formatted_no_color.contains("[MEDIA]"));
        assert!(formatted_no_color.contains("Test error"));
    }

    #[test]
    fn test_user_friendly_messages() {
        let error = AppError::degenerate_input("duration is zero");
        let message = error.user_friendly_message();
        assert!(message.contains("Invalid measurement input"));
        assert!(message.contains("Suggestion:"));
    }
}
