//! In-memory profile store for tests.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{ProfileError, ProfileRecord, ProfileStore};

/// Profile store backed by a map. Contents die with the process.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    records: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    async fn find_or_create(
        &self,
        username: &str,
    ) -> Result<ProfileRecord, ProfileError> {
        let mut records = self.records.lock().await;
        let data = records
            .entry(username.to_string())
            .or_default()
            .clone();
        Ok(ProfileRecord {
            username: username.to_string(),
            data,
        })
    }

    async fn update(
        &self,
        record: &ProfileRecord,
    ) -> Result<(), ProfileError> {
        self.records
            .lock()
            .await
            .insert(record.username.clone(), record.data.clone());
        Ok(())
    }
}
