//! Error types for ThreatScan

/// Result type alias using ThreatScan's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ThreatScan operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required file or directory is missing
    #[error("not found: {0}")]
    NotFound(String),

    /// Classifier loading or execution errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error reports a missing model artifact
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
