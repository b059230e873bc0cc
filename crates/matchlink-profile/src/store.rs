//! The profile store trait and record type.

use crate::ProfileError;

/// A player's profile blob, keyed by a unique username.
///
/// The data is opaque to this crate; the game serializes whatever it
/// wants into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    pub username: String,
    pub data: Vec<u8>,
}

impl ProfileRecord {
    /// An empty profile for a user, as created on first contact.
    pub fn empty(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            data: Vec::new(),
        }
    }
}

/// A keyed persistent store for profile records.
///
/// Implementations must be safe to call concurrently for different keys;
/// concurrent calls for the same key are serialized by the store.
pub trait ProfileStore: Send + Sync + 'static {
    /// Returns the record for `username`, creating an empty one if absent.
    ///
    /// The username is a unique key: two calls for the same name observe
    /// (or create) the same record.
    async fn find_or_create(
        &self,
        username: &str,
    ) -> Result<ProfileRecord, ProfileError>;

    /// Upserts the record under its username.
    async fn update(
        &self,
        record: &ProfileRecord,
    ) -> Result<(), ProfileError>;
}

/// Loads a profile, falling back to an empty one if the store fails.
///
/// Restore failures are logged and swallowed: a broken profile store must
/// not take the session down with it.
pub async fn restore_or_default<S: ProfileStore>(
    store: &S,
    username: &str,
) -> ProfileRecord {
    match store.find_or_create(username).await {
        Ok(record) => record,
        Err(e) => {
            tracing::error!(
                username,
                error = %e,
                "profile restore failed, using defaults"
            );
            ProfileRecord::empty(username)
        }
    }
}
