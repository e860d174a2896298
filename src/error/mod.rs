//! Error handling for the bandwidth benchmark exporter

use thiserror::Error;

/// Error types for the probe, encode and transmit pipeline
#[derive(Error, Debug)]
pub enum AppError {
    /// A single probe invocation failed (spawn, exit status or report decode)
    #[error("Probe execution error: {0}")]
    ProbeExecution(String),

    /// Neither direction yielded a usable result after all attempts
    #[error("Both probe directions failed: {0}")]
    BothDirectionsFailed(String),

    /// Sample set could not be serialized or compressed
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Network or timeout failure while talking to the remote endpoint
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote endpoint kept answering 429
    #[error("Rate limit exceeded: gave up after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    /// The remote endpoint answered with a non-success status
    #[error("Remote write failed with status {status}: {body}")]
    RemoteRejected { status: u16, body: String },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (YAML, JSON, URLs, numbers)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new probe execution error
    pub fn probe_execution<S: Into<String>>(message: S) -> Self {
        Self::ProbeExecution(message.into())
    }

    /// Create a new both-directions-failed error
    pub fn both_directions_failed<S: Into<String>>(message: S) -> Self {
        Self::BothDirectionsFailed(message.into())
    }

    /// Create a new encoding error
    pub fn encoding<S: Into<String>>(message: S) -> Self {
        Self::Encoding(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new rate-limit error
    pub fn rate_limit_exceeded(attempts: u32) -> Self {
        Self::RateLimitExceeded { attempts }
    }

    /// Create a new remote rejection error
    pub fn remote_rejected<S: Into<String>>(status: u16, body: S) -> Self {
        Self::RemoteRejected { status, body: body.into() }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
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

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::ProbeExecution(_) => "PROBE",
            Self::BothDirectionsFailed(_) => "PROBE",
            Self::Encoding(_) => "ENCODING",
            Self::Transport(_) => "TRANSPORT",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT",
            Self::RemoteRejected { .. } => "REMOTE",
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if error is recoverable (a later run may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ProbeExecution(_) | Self::Transport(_) | Self::RateLimitExceeded { .. } => true,
            Self::BothDirectionsFailed(_) | Self::RemoteRejected { .. } => true,
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => false,
            Self::Encoding(_) | Self::Io(_) | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ProbeExecution(msg) => {
                format!("iperf3 run failed: {}\n\nSuggestion: Check that iperf3 is installed and the server is reachable.", msg)
            }
            Self::BothDirectionsFailed(msg) => {
                format!("No usable measurement: {}\n\nSuggestion: The iperf3 server may be unreachable, busy, or blocked by a firewall.", msg)
            }
            Self::Encoding(msg) => {
                format!("Could not encode metrics: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
            Self::Transport(msg) => {
                format!("Could not reach the remote-write endpoint: {}\n\nSuggestion: Check your internet connection and the prometheus.url setting.", msg)
            }
            Self::RateLimitExceeded { attempts } => {
                format!("The endpoint rate-limited all {} attempts.\n\nSuggestion: Run the benchmark less often.", attempts)
            }
            Self::RemoteRejected { status, body } => {
                format!("The endpoint rejected the write ({}): {}\n\nSuggestion: Check prometheus.username and prometheus.password.", status, body)
            }
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your ibenc.yaml file or IBENC_* environment variables.", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Check the values in your configuration file.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check file paths and permissions.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check the format of your configuration file.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::Transport(_) | Self::RemoteRejected { .. } => 2,
            Self::RateLimitExceeded { .. } => 3,
            Self::Io(_) => 5,
            Self::ProbeExecution(_) | Self::BothDirectionsFailed(_) => 6,
            Self::Encoding(_) | Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.user_friendly_message();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Transport(_) | Self::RemoteRejected { .. } => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::RateLimitExceeded { .. } => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::ProbeExecution(_) | Self::BothDirectionsFailed(_) | Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Encoding(_) | Self::Internal(_) => {
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

impl From<serde_yaml::Error> for AppError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::parse(format!("YAML parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::transport(format!("request timed out: {}", error))
        } else {
            Self::transport(error.to_string())
        }
    }
}

impl From<prost::EncodeError> for AppError {
    fn from(error: prost::EncodeError) -> Self {
        Self::encoding(format!("failed to marshal protobuf: {}", error))
    }
}

impl From<snap::Error> for AppError {
    fn from(error: snap::Error) -> Self {
        Self::encoding(format!("snappy compression failed: {}", error))
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
            match original_error {
                AppError::Io(msg) => AppError::io(format!("{}: {}", context, msg)),
                AppError::Parse(msg) => AppError::parse(format!("{}: {}", context, msg)),
                AppError::Config(msg) => AppError::config(format!("{}: {}", context, msg)),
                other => AppError::internal(format!("{}: {}", context, other)),
            }
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}
