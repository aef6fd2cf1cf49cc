//! Error types for inbox-triage.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Mail action error: {0}")]
    MailAction(#[from] MailActionError),
}

/// Configuration-related errors. Fatal — never retried.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Mail provider fetch errors. Any listing or per-message failure aborts
/// the whole fetch; there is no per-message retry.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Mail provider request failed during {operation}: {reason}")]
    Request { operation: String, reason: String },

    #[error("Mail provider returned status {status} during {operation}")]
    Status { operation: String, status: u16 },

    #[error("Failed to decode provider payload: {0}")]
    Decode(String),
}

/// Batch classification errors. The whole batch fails together — there is
/// no partial-batch success.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Classification call failed: {reason}")]
    CallFailed { reason: String },

    #[error("Invalid classification response: {reason}")]
    InvalidResponse { reason: String },
}

/// Key-value cache errors. Always logged, never propagated — the pipeline
/// proceeds as if the slot missed.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache read failed for key {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("Cache write failed for key {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("Cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Trash (soft-delete) errors, mapped from the provider's reported code.
#[derive(Debug, thiserror::Error)]
pub enum MailActionError {
    #[error("Message {id} not found")]
    NotFound { id: String },

    #[error("Permission denied trashing message {id}")]
    PermissionDenied { id: String },

    #[error("Trash failed for message {id}: status {status}")]
    Failed { id: String, status: u16 },

    #[error("Trash request failed for message {id}: {reason}")]
    Request { id: String, reason: String },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
