//! SQLite-based store implementation

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{KeyValueStore, StoreError, StoreResult, StoredValue};

/// SQLite-based key-path store.
///
/// Writes are buffered in memory and committed in a single transaction on
/// flush, so a crash loses exactly the writes since the last flush.
pub struct SqliteKvStore {
    conn: Mutex<Connection>,
    pending: Mutex<BTreeMap<String, StoredValue>>,
}

impl SqliteKvStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            pending: Mutex::new(BTreeMap::new()),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.lock_conn()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value_json TEXT NOT NULL
            );
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }

    fn lock_conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn lock_pending(&self) -> StoreResult<MutexGuard<'_, BTreeMap<String, StoredValue>>> {
        self.pending.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Number of writes not yet flushed
    pub fn pending_writes(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn commit(conn: &mut Connection, writes: &BTreeMap<String, StoredValue>) -> StoreResult<()> {
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO kv (key, value_json)
                VALUES (?, ?)
                ON CONFLICT(key)
                DO UPDATE SET value_json = excluded.value_json
                "#,
            )?;
            for (key, value) in writes {
                let json = serde_json::to_string(value)?;
                stmt.execute(params![key, json])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<StoredValue>> {
        if let Some(value) = self.lock_pending()?.get(key) {
            return Ok(Some(value.clone()));
        }

        let conn = self.lock_conn()?;
        let json: Option<String> = conn
            .query_row("SELECT value_json FROM kv WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;

        match json {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: StoredValue) -> StoreResult<()> {
        self.lock_pending()?.insert(key.to_string(), value);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut keys: BTreeSet<String> = self
            .lock_pending()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();

        let conn = self.lock_conn()?;
        let mut stmt =
            conn.prepare("SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1")?;
        let rows = stmt.query_map([prefix], |row| row.get::<_, String>(0))?;
        for row in rows {
            keys.insert(row?);
        }

        Ok(keys.into_iter().collect())
    }

    fn flush(&self) -> StoreResult<()> {
        let mut conn = self.lock_conn()?;
        let writes = std::mem::take(&mut *self.lock_pending()?);
        if writes.is_empty() {
            return Ok(());
        }

        match Self::commit(&mut conn, &writes) {
            Ok(()) => {
                debug!(keys = writes.len(), "Store flushed");
                Ok(())
            }
            Err(e) => {
                // Keep the writes buffered; anything written since wins
                let mut pending = self.lock_pending()?;
                for (key, value) in writes {
                    pending.entry(key).or_insert(value);
                }
                warn!(error = %e, "Store flush failed, writes kept pending");
                Err(e)
            }
        }
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}
