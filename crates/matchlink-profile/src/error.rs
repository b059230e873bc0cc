//! Error types for profile persistence.

/// Errors that can occur while reading or writing profiles.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// The underlying database failed.
    #[error("profile database error: {0}")]
    Database(String),
}
