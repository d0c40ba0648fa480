use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::Mutex;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::keys::{LOCAL_SCOPE, LocalKey, SessionId, SessionKey, StorageKey};
use crate::common::StoreError;

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode<K: StorageKey>(raw: &str) -> Result<K::Value, StoreError> {
    serde_json::from_str(raw).map_err(|source| StoreError::Serialization {
        key: K::NAME,
        source,
    })
}

fn encode<K: StorageKey>(value: &K::Value) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|source| StoreError::Serialization {
        key: K::NAME,
        source,
    })
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options)
            .await?;

        let db = Self::from_pool(pool);
        db.migrate().await?;

        Ok(db)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn get_raw(&self, scope: &str, key: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as(r#"SELECT value FROM kv_entries WHERE scope = ?1 AND key = ?2"#)
                .bind(scope)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    async fn put_raw(&self, scope: &str, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (scope, key, value, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (scope, key) DO UPDATE
            SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(scope)
        .bind(key)
        .bind(value)
        .bind(now_stamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_raw(&self, scope: &str, key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(r#"DELETE FROM kv_entries WHERE scope = ?1 AND key = ?2"#)
            .bind(scope)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_local<K: LocalKey>(&self) -> Result<Option<K::Value>, StoreError> {
        match self.get_raw(LOCAL_SCOPE, K::NAME).await? {
            Some(raw) => decode::<K>(&raw).map(Some),
            None => Ok(None),
        }
    }

    pub async fn set_local<K: LocalKey>(&self, value: &K::Value) -> Result<(), StoreError> {
        let raw = encode::<K>(value)?;
        let _guard = self.write_lock.lock().await;
        self.put_raw(LOCAL_SCOPE, K::NAME, &raw).await
    }

    /// Read-modify-write of a local value. Concurrent updates are serialized
    /// so list appends are never lost.
    pub async fn update_local<K, R, F>(&self, apply: F) -> Result<R, StoreError>
    where
        K: LocalKey,
        K::Value: Default,
        F: FnOnce(&mut K::Value) -> R,
    {
        let _guard = self.write_lock.lock().await;

        let mut value = match self.get_raw(LOCAL_SCOPE, K::NAME).await? {
            Some(raw) => decode::<K>(&raw)?,
            None => K::Value::default(),
        };
        let result = apply(&mut value);

        let raw = encode::<K>(&value)?;
        self.put_raw(LOCAL_SCOPE, K::NAME, &raw).await?;

        Ok(result)
    }

    pub async fn get_session<K: SessionKey>(
        &self,
        sid: SessionId,
    ) -> Result<Option<K::Value>, StoreError> {
        match self.get_raw(&sid.scope(), K::NAME).await? {
            Some(raw) => decode::<K>(&raw).map(Some),
            None => Ok(None),
        }
    }

    pub async fn set_session<K: SessionKey>(
        &self,
        sid: SessionId,
        value: &K::Value,
    ) -> Result<(), StoreError> {
        let raw = encode::<K>(value)?;
        self.put_raw(&sid.scope(), K::NAME, &raw).await
    }

    pub async fn remove_session<K: SessionKey>(&self, sid: SessionId) -> Result<bool, StoreError> {
        self.delete_raw(&sid.scope(), K::NAME).await
    }

    /// Drops every key of the session; the logout path.
    pub async fn clear_session(&self, sid: SessionId) -> Result<u64, StoreError> {
        let result = sqlx::query(r#"DELETE FROM kv_entries WHERE scope = ?1"#)
            .bind(sid.scope())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Removes sessions whose newest write is older than `idle`.
    pub async fn purge_stale_sessions(&self, idle: chrono::Duration) -> Result<u64, StoreError> {
        let cutoff = (Utc::now() - idle).to_rfc3339_opts(SecondsFormat::Micros, true);

        let result = sqlx::query(
            r#"
            DELETE FROM kv_entries
            WHERE scope IN (
                SELECT scope FROM kv_entries
                WHERE scope LIKE 'session:%'
                GROUP BY scope
                HAVING MAX(updated_at) < ?1
            )
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
