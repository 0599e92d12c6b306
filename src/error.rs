//! Error types for the yner relay.

/// Top-level error type for the chat relay.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Generation backend unreachable or misbehaving.
    #[error("backend error: {0}")]
    Backend(String),

    /// Metadata frame encoding error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ChatError>;
