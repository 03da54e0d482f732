//! Error types for the fusion pipeline.

use thiserror::Error;

/// Result type alias using FusionError.
pub type Result<T> = std::result::Result<T, FusionError>;

/// Errors that can occur while transforming queries, retrieving and fusing.
#[derive(Error, Debug)]
pub enum FusionError {
    /// A document could not be canonically serialized for identity.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Fusion or orchestration parameters are invalid.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The query generator failed or produced nothing usable.
    #[error("Variant generation failed: {message}")]
    VariantGeneration { message: String },

    /// Generator output could not be split into variants.
    #[error("Failed to parse generated variants: {message}")]
    Parse { message: String },

    /// A single retrieval call failed.
    #[error("Retrieval failed for {query:?}: {message}")]
    Retrieval { query: String, message: String },

    /// A single retrieval call exceeded its deadline.
    #[error("Retrieval timed out for {query:?} after {timeout_ms}ms")]
    Timeout { query: String, timeout_ms: u64 },

    /// Every retrieval call failed.
    #[error("All {attempted} retrieval calls failed ({failed} failures), last error: {last_error}")]
    RetrievalExhausted {
        attempted: usize,
        failed: usize,
        last_error: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be loaded.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl FusionError {
    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a variant generation error.
    pub fn variant_generation(message: impl Into<String>) -> Self {
        Self::VariantGeneration {
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a retrieval error for one query.
    pub fn retrieval(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Retrieval {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
            Self::VariantGeneration { .. } => "VARIANT_GENERATION_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Retrieval { .. } => "RETRIEVAL_ERROR",
            Self::Timeout { .. } => "RETRIEVAL_TIMEOUT",
            Self::RetrievalExhausted { .. } => "RETRIEVAL_EXHAUSTED",
            Self::Io(_) => "IO_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
        }
    }
}

impl From<serde_json::Error> for FusionError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
