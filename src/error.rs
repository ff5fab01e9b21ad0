//! Error types for kyc-onboard.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors surfaced by the onboarding manager.
///
/// A failed verification is not an error: it is an `Outcome` with
/// `success: false`. Only an unknown session or a broken store end up here.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("Session {id} not found")]
    SessionNotFound { id: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl OnboardingError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::SessionNotFound { id: id.into() }
    }

    /// Whether this error means the caller referenced an unknown session.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound { .. })
    }
}
