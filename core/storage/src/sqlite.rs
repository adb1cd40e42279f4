//! SQLite-backed secret store.
//!
//! Every engine instance opening the same database file sees the same
//! records. Consumption is a single conditional `UPDATE`, which SQLite
//! executes atomically across connections and processes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

use crate::record::SecretRecord;
use crate::store::SecretStore;
use burnbox_common::{Error, Result, RetrievalKey, SecretId};

/// How long SQLite waits on a locked database before reporting busy.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS secrets (
        id TEXT PRIMARY KEY,
        retrieval_key TEXT NOT NULL UNIQUE,
        ciphertext BLOB NOT NULL,
        passphrase_verifier TEXT NOT NULL,
        consumed INTEGER NOT NULL DEFAULT 0,
        expires_at INTEGER,
        created_at INTEGER NOT NULL
    );
"#;

type RawRow = (String, String, Vec<u8>, String, bool, Option<i64>, i64);

/// SQLite secret store.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    ///
    /// # Errors
    /// - Database cannot be opened or migrated
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(map_sqlite_err)?;
        Self::init(conn, path)
    }

    /// Create a private in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(map_sqlite_err)?;
        Self::init(conn, Path::new(":memory:"))
    }

    fn init(conn: Connection, path: &Path) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT).map_err(map_sqlite_err)?;
        conn.execute_batch(SCHEMA).map_err(map_sqlite_err)?;

        info!(path = %path.display(), "SQLite secret store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| Error::Storage("SQLite connection lock poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| Error::Storage(format!("SQLite task failed: {}", e)))?
    }
}

#[async_trait]
impl SecretStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn put(&self, record: &SecretRecord) -> Result<()> {
        let record = record.clone();
        self.with_conn(move |conn| {
            debug!(secret_id = %record.id, "Inserting secret");
            conn.execute(
                r#"
                INSERT INTO secrets
                (id, retrieval_key, ciphertext, passphrase_verifier, consumed, expires_at, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    record.id.to_string(),
                    record.retrieval_key.as_str(),
                    record.ciphertext,
                    record.passphrase_verifier,
                    record.consumed,
                    record.expires_at.map(|t| t.timestamp_millis()),
                    record.created_at.timestamp_millis(),
                ],
            )
            .map_err(map_sqlite_err)?;
            Ok(())
        })
        .await
    }

    async fn get_by_retrieval_key(&self, key: &RetrievalKey) -> Result<Option<SecretRecord>> {
        let key = key.clone();
        let raw = self
            .with_conn(move |conn| {
                let mut stmt = conn
                    .prepare_cached(
                        r#"
                        SELECT id, retrieval_key, ciphertext, passphrase_verifier,
                               consumed, expires_at, created_at
                        FROM secrets WHERE retrieval_key = ?1
                        "#,
                    )
                    .map_err(map_sqlite_err)?;

                let row = stmt
                    .query_row::<RawRow, _, _>([key.as_str()], |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                            row.get(6)?,
                        ))
                    })
                    .optional()
                    .map_err(map_sqlite_err)?;
                Ok(row)
            })
            .await?;

        raw.map(record_from_row).transpose()
    }

    async fn try_mark_consumed(&self, id: &SecretId) -> Result<bool> {
        let id = *id;
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE secrets SET consumed = 1 WHERE id = ?1 AND consumed = 0",
                    [id.to_string()],
                )
                .map_err(map_sqlite_err)?;
            Ok(changed == 1)
        })
        .await
    }
}

fn record_from_row(row: RawRow) -> Result<SecretRecord> {
    let (id, retrieval_key, ciphertext, passphrase_verifier, consumed, expires_at, created_at) =
        row;

    Ok(SecretRecord {
        id: SecretId::parse(&id)?,
        retrieval_key: RetrievalKey::parse(retrieval_key)?,
        ciphertext,
        passphrase_verifier,
        consumed,
        expires_at: expires_at.map(timestamp_from_millis).transpose()?,
        created_at: timestamp_from_millis(created_at)?,
    })
}

fn timestamp_from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| Error::Storage(format!("Timestamp out of range: {}", millis)))
}

/// Translate SQLite failures into the common taxonomy.
fn map_sqlite_err(err: rusqlite::Error) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::ConstraintViolation => Error::Conflict(err.to_string()),
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                Error::StoreUnavailable(err.to_string())
            }
            _ => Error::Storage(err.to_string()),
        },
        _ => Error::Storage(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;

    fn record() -> SecretRecord {
        let now = DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap();
        SecretRecord::new(
            SecretId::generate(),
            RetrievalKey::generate(),
            vec![9, 8, 7, 6],
            "$argon2id$stub".to_string(),
            now,
            Some(now + ChronoDuration::seconds(60)),
        )
    }

    #[tokio::test]
    async fn test_put_and_get_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        let rec = record();

        store.put(&rec).await.unwrap();
        let fetched = store
            .get_by_retrieval_key(&rec.retrieval_key)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fetched, rec);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = SqliteStore::in_memory().unwrap();
        let key = RetrievalKey::parse("nonexistent-key").unwrap();

        assert!(store.get_by_retrieval_key(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_retrieval_key_conflicts() {
        let store = SqliteStore::in_memory().unwrap();
        let rec = record();
        store.put(&rec).await.unwrap();

        let mut dup = record();
        dup.retrieval_key = rec.retrieval_key.clone();

        assert!(matches!(store.put(&dup).await, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_mark_consumed_once() {
        let store = SqliteStore::in_memory().unwrap();
        let rec = record();
        store.put(&rec).await.unwrap();

        assert!(store.try_mark_consumed(&rec.id).await.unwrap());
        assert!(!store.try_mark_consumed(&rec.id).await.unwrap());
        assert!(!store.try_mark_consumed(&SecretId::generate()).await.unwrap());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets.db");
        let rec = record();

        {
            let store = SqliteStore::open(&path).unwrap();
            store.put(&rec).await.unwrap();
            store.try_mark_consumed(&rec.id).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let fetched = store
            .get_by_retrieval_key(&rec.retrieval_key)
            .await
            .unwrap()
            .unwrap();
        assert!(fetched.consumed);
        assert_eq!(fetched.ciphertext, rec.ciphertext);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_connections_single_winner() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared.db");
        let a = SqliteStore::open(&path).unwrap();
        let b = SqliteStore::open(&path).unwrap();

        let rec = record();
        a.put(&rec).await.unwrap();

        let (ra, rb) = tokio::join!(a.try_mark_consumed(&rec.id), b.try_mark_consumed(&rec.id));
        let winners = [ra.unwrap(), rb.unwrap()].iter().filter(|w| **w).count();
        assert_eq!(winners, 1);
    }
}
