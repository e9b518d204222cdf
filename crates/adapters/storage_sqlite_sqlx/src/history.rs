//! `SQLite` session history, fed as a [`StateMirror`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use vehiclehub_app::ports::mirror::StateMirror;
use vehiclehub_domain::entry::Entry;
use vehiclehub_domain::error::HubError;
use vehiclehub_domain::id::HistoryId;
use vehiclehub_domain::key::Key;
use vehiclehub_domain::time::Timestamp;
use vehiclehub_domain::value::Value;

use crate::error::StorageError;

/// One recorded session change.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HistoryRecord {
    pub id: HistoryId,
    pub key: Key,
    pub value: Value,
    pub write_count: u64,
    pub recorded_at: Timestamp,
}

struct Wrapper(HistoryRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let key: String = row.try_get("key")?;
        let value_json: String = row.try_get("value")?;
        let write_count: i64 = row.try_get("write_count")?;
        let recorded_at: String = row.try_get("recorded_at")?;

        let key = Key::parse(&key).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let value: Value =
            serde_json::from_str(&value_json).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let recorded_at = chrono::DateTime::parse_from_rfc3339(&recorded_at)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(HistoryRecord {
            id: HistoryId::from_uuid(id),
            key,
            value,
            write_count: u64::try_from(write_count).unwrap_or_default(),
            recorded_at,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO session_history (id, key, value, write_count, recorded_at)
    VALUES (?, ?, ?, ?, ?)
";

const SELECT_RECENT: &str = r"
    SELECT * FROM session_history
    WHERE key = ?
    ORDER BY rowid DESC
    LIMIT ?
";

const DELETE_BEFORE: &str = "DELETE FROM session_history WHERE recorded_at < ?";

/// `SQLite`-backed history of published session changes.
#[derive(Clone)]
pub struct SqliteHistory {
    pool: SqlitePool,
}

impl SqliteHistory {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one entry to the history.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Storage`] when the value cannot be encoded or the
    /// insert fails.
    pub async fn record(&self, entry: &Entry) -> Result<HistoryId, HubError> {
        let id = HistoryId::new();
        let value_json = serde_json::to_string(&entry.value).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(id.as_uuid())
            .bind(entry.key.as_str())
            .bind(&value_json)
            .bind(i64::try_from(entry.write_count).unwrap_or(i64::MAX))
            .bind(entry.last_update.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(id)
    }

    /// The latest `limit` records for `key`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Storage`] if the query fails or a row is corrupt.
    pub async fn recent(&self, key: &Key, limit: usize) -> Result<Vec<HistoryRecord>, HubError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(key.as_str())
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    /// Delete every record older than `before`. Returns the number of rows removed.
    ///
    /// Timestamps compare as RFC 3339 text, so `before` should use the same
    /// offset the rows were recorded with.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Storage`] if the delete fails.
    pub async fn purge_before(&self, before: Timestamp) -> Result<u64, HubError> {
        let result = sqlx::query(DELETE_BEFORE)
            .bind(before.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(result.rows_affected())
    }
}

impl StateMirror for SqliteHistory {
    async fn mirror(&self, entry: &Entry) -> Result<(), HubError> {
        let id = self.record(entry).await?;
        tracing::trace!(key = %entry.key, %id, "history recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use chrono::Duration;
    use vehiclehub_domain::time::{now, utc};

    async fn setup() -> SqliteHistory {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteHistory::new(db.pool().clone())
    }

    fn entry(key: &str, value: Value, write_count: u64) -> Entry {
        let mut entry = Entry::new(Key::parse(key).unwrap(), value, now(utc()), false);
        entry.write_count = write_count;
        entry
    }

    #[tokio::test]
    async fn should_record_and_read_back_entry() {
        let history = setup().await;
        let written = entry("acc_power", Value::Bool(true), 3);

        let id = history.record(&written).await.unwrap();
        let records = history.recent(&written.key, 10).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].value, Value::Bool(true));
        assert_eq!(records[0].write_count, 3);
        assert_eq!(records[0].recorded_at, written.last_update);
    }

    #[tokio::test]
    async fn should_return_newest_first_and_respect_limit() {
        let history = setup().await;
        for i in 1..=5 {
            history
                .mirror(&entry("main_voltage", Value::Int(i), 1))
                .await
                .unwrap();
        }

        let key = Key::parse("main_voltage").unwrap();
        let records = history.recent(&key, 2).await.unwrap();

        let values: Vec<Value> = records.into_iter().map(|r| r.value).collect();
        assert_eq!(values, vec![Value::Int(5), Value::Int(4)]);
    }

    #[tokio::test]
    async fn should_keep_value_types_apart() {
        let history = setup().await;
        history
            .record(&entry("temp", Value::Float(21.5), 1))
            .await
            .unwrap();
        history
            .record(&entry("temp", Value::from("warm"), 2))
            .await
            .unwrap();

        let key = Key::parse("temp").unwrap();
        let records = history.recent(&key, 10).await.unwrap();

        assert_eq!(records[0].value, Value::from("warm"));
        assert_eq!(records[1].value, Value::Float(21.5));
    }

    #[tokio::test]
    async fn should_only_return_rows_for_requested_key() {
        let history = setup().await;
        history
            .record(&entry("acc_power", Value::Bool(true), 1))
            .await
            .unwrap();
        history
            .record(&entry("key_state", Value::Bool(false), 1))
            .await
            .unwrap();

        let key = Key::parse("key_state").unwrap();
        let records = history.recent(&key, 10).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, key);
    }

    #[tokio::test]
    async fn should_purge_records_older_than_cutoff() {
        let history = setup().await;
        let mut old = entry("acc_power", Value::Bool(false), 1);
        old.last_update = now(utc()) - Duration::hours(2);
        history.record(&old).await.unwrap();
        history
            .record(&entry("acc_power", Value::Bool(true), 2))
            .await
            .unwrap();

        let removed = history
            .purge_before(now(utc()) - Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        let records = history.recent(&old.key, 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, Value::Bool(true));
    }
}
