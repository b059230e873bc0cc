//! SQLite-backed profile store.

use sqlx::SqlitePool;

use crate::{ProfileError, ProfileRecord, ProfileStore};

/// Profile store backed by a SQLite database.
///
/// One row per username; the unique key lives in the schema
/// (`username TEXT PRIMARY KEY`), so concurrent creates for the same name
/// collapse into one row.
pub struct SqliteProfileStore {
    pool: SqlitePool,
}

impl SqliteProfileStore {
    /// Prepares the profiles table and wraps the pool.
    pub async fn new(pool: SqlitePool) -> Result<Self, ProfileError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                username TEXT PRIMARY KEY,
                data BLOB NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| ProfileError::Database(e.to_string()))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl ProfileStore for SqliteProfileStore {
    async fn find_or_create(
        &self,
        username: &str,
    ) -> Result<ProfileRecord, ProfileError> {
        // The IGNORE arm makes the create race-free for one key: whoever
        // inserts first wins, everyone reads the same row afterwards.
        sqlx::query(
            "INSERT OR IGNORE INTO profiles (username, data) VALUES (?, ?)",
        )
        .bind(username)
        .bind(Vec::<u8>::new())
        .execute(&self.pool)
        .await
        .map_err(|e| ProfileError::Database(e.to_string()))?;

        let (data,): (Vec<u8>,) =
            sqlx::query_as("SELECT data FROM profiles WHERE username = ?")
                .bind(username)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| ProfileError::Database(e.to_string()))?;

        Ok(ProfileRecord {
            username: username.to_string(),
            data,
        })
    }

    async fn update(
        &self,
        record: &ProfileRecord,
    ) -> Result<(), ProfileError> {
        sqlx::query(
            "INSERT OR REPLACE INTO profiles (username, data) VALUES (?, ?)",
        )
        .bind(&record.username)
        .bind(&record.data)
        .execute(&self.pool)
        .await
        .map_err(|e| ProfileError::Database(e.to_string()))?;

        Ok(())
    }
}
