use thiserror::Error;

/// Top-level error type for murmur.
#[derive(Debug, Error)]
pub enum MurmurError {
    /// Error from the social platform client.
    #[error("platform error: {0}")]
    Platform(String),

    /// Error from a generation provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Memory/storage error.
    #[error("memory error: {0}")]
    Memory(String),

    /// A post identifier that is not a decimal number.
    #[error("invalid post id: {0:?}")]
    InvalidPostId(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
