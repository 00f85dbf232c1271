//! Error types for trainsign
//!
//! Centralized error handling using thiserror. Every failure that can reach
//! the control loop maps onto a [`FailureKind`], which is what the recovery
//! policy and the logs see.

use thiserror::Error;

/// Coarse classification of a tick failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Malformed value: bad timestamp, bad offset, unexpected JSON shape
    Parse,
    /// Unexpected condition while running a step (HTTP status, radio command)
    Runtime,
    /// Transport-level failure: connect, reset, broken pipe, timeout
    Connection,
    /// Local I/O failure
    Io,
    /// A bounded retry gave up
    RetriesExhausted,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::Parse => "parse",
            FailureKind::Runtime => "runtime",
            FailureKind::Connection => "connection",
            FailureKind::Io => "io",
            FailureKind::RetriesExhausted => "retries-exhausted",
        };
        f.write_str(name)
    }
}

/// All error types that can occur in trainsign
#[derive(Debug, Error)]
pub enum TrainsignError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Value could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Network interface or co-processor control failed
    #[error("Radio error: {0}")]
    Radio(String),

    /// Bounded retry gave up
    #[error("Out of retries after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// Invalid or missing configuration
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrainsignError {
    /// Classify this error for the recovery policy.
    pub fn kind(&self) -> FailureKind {
        match self {
            TrainsignError::Http(e) if e.is_decode() => FailureKind::Parse,
            TrainsignError::Http(_) => FailureKind::Connection,
            TrainsignError::Status { .. } => FailureKind::Runtime,
            TrainsignError::Parse(_) => FailureKind::Parse,
            TrainsignError::Json(_) => FailureKind::Parse,
            TrainsignError::Radio(_) => FailureKind::Runtime,
            TrainsignError::RetriesExhausted { .. } => FailureKind::RetriesExhausted,
            TrainsignError::Config(_) => FailureKind::Runtime,
            TrainsignError::Io(e) => match e.kind() {
                std::io::ErrorKind::BrokenPipe
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::ConnectionRefused
                | std::io::ErrorKind::TimedOut => FailureKind::Connection,
                _ => FailureKind::Io,
            },
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        TrainsignError::Parse(msg.into())
    }
}

/// Result type alias for trainsign operations
pub type Result<T> = std::result::Result<T, TrainsignError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error() {
        let err = TrainsignError::parse("missing offset");
        assert_eq!(err.to_string(), "Parse error: missing offset");
        assert_eq!(err.kind(), FailureKind::Parse);
    }

    #[test]
    fn test_status_error() {
        let err = TrainsignError::Status {
            status: 503,
            url: "https://example.com/by-id/F20".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected status 503 from https://example.com/by-id/F20");
        assert_eq!(err.kind(), FailureKind::Runtime);
    }

    #[test]
    fn test_retries_exhausted_error() {
        let err = TrainsignError::RetriesExhausted {
            attempts: 3,
            last: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "Out of retries after 3 attempts: timeout");
        assert_eq!(err.kind(), FailureKind::RetriesExhausted);
    }

    #[test]
    fn test_broken_pipe_is_connection() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: TrainsignError = io_err.into();
        assert!(matches!(err, TrainsignError::Io(_)));
        assert_eq!(err.kind(), FailureKind::Connection);
    }

    #[test]
    fn test_other_io_is_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TrainsignError = io_err.into();
        assert_eq!(err.kind(), FailureKind::Io);
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: TrainsignError = json_err.into();
        assert!(matches!(err, TrainsignError::Json(_)));
        assert_eq!(err.kind(), FailureKind::Parse);
    }

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::Connection.to_string(), "connection");
        assert_eq!(FailureKind::RetriesExhausted.to_string(), "retries-exhausted");
    }
}
