//! Opens the session history database and applies its schema.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::StorageError;

const MAX_CONNECTIONS: u32 = 4;
// mirror writes for quick successive changes contend for the file lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the session history is kept.
pub struct Config {
    /// `SQLite` connection URL (e.g. `sqlite:vehiclehub.db` or `sqlite::memory:`).
    pub database_url: String,
}

impl Config {
    /// Open the history database, creating the file if missing, and run
    /// pending migrations.
    ///
    /// An in-memory database is held by a single connection that never
    /// expires, so every mirror write and history query sees the same rows.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the connection or migrations fail.
    pub async fn build(self) -> Result<Database, StorageError> {
        Database::open(&self.database_url).await
    }
}

fn is_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// The history connection pool.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn open(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);
        let pool_options = if is_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS)
        };
        let pool = pool_options.connect_with(options).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        let recorded: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM session_history")
            .fetch_one(&pool)
            .await?;
        tracing::info!(url = %database_url, recorded, "history database ready");

        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::SqliteHistory;
    use vehiclehub_domain::entry::Entry;
    use vehiclehub_domain::key::Key;
    use vehiclehub_domain::time::{now, utc};
    use vehiclehub_domain::value::Value;

    async fn memory() -> Database {
        Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap()
    }

    #[test]
    fn should_recognise_memory_urls() {
        assert!(is_memory("sqlite::memory:"));
        assert!(is_memory("sqlite:file:history?mode=memory&cache=shared"));
        assert!(!is_memory("sqlite:/var/lib/vehiclehub/history.db"));
    }

    #[tokio::test]
    async fn should_index_history_by_key() {
        let db = memory().await;

        let indexes: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'session_history' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        assert_eq!(indexes, vec![("idx_session_history_key".to_string(),)]);
    }

    #[tokio::test]
    async fn should_keep_memory_history_visible_to_concurrent_writers() {
        let db = memory().await;
        let history = SqliteHistory::new(db.pool().clone());
        let key = Key::parse("RPM").unwrap();

        let writers: Vec<_> = (0..8_i64)
            .map(|rpm| {
                let history = history.clone();
                let entry = Entry::new(key.clone(), Value::Int(rpm * 100), now(utc()), false);
                tokio::spawn(async move { history.record(&entry).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        assert_eq!(history.recent(&key, 20).await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn should_keep_rows_in_file_database_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("history.db").display());
        let key = Key::parse("GEAR").unwrap();
        {
            let db = Config {
                database_url: url.clone(),
            }
            .build()
            .await
            .unwrap();
            let entry = Entry::new(key.clone(), Value::from("D"), now(utc()), false);
            SqliteHistory::new(db.pool().clone())
                .record(&entry)
                .await
                .unwrap();
            db.pool().close().await;
        }

        let db = Config { database_url: url }.build().await.unwrap();
        let records = SqliteHistory::new(db.pool().clone())
            .recent(&key, 10)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, Value::from("D"));
    }
}
