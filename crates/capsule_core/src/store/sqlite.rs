//! SQLite-backed key-value store.
//!
//! # Invariants
//! - The borrowed connection must come from `db::open_db*`, so the
//!   `kv_entries` table exists.
//! - Every write is a single statement; SQLite makes it atomic.

use super::{KvStore, StoreResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Durable store over a migrated SQLite connection.
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl KvStore for SqliteStore<'_> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteStore;
    use crate::db::open_db_in_memory;
    use crate::store::KvStore;

    #[test]
    fn upsert_overwrites_and_delete_reports_presence() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteStore::new(&conn);

        store.set("pc_capsule_1", "{}").unwrap();
        store.set("pc_capsule_1", "{\"a\":1}").unwrap();
        assert_eq!(
            store.get("pc_capsule_1").unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv_entries;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);

        assert!(store.delete("pc_capsule_1").unwrap());
        assert!(!store.delete("pc_capsule_1").unwrap());
        assert_eq!(store.get("pc_capsule_1").unwrap(), None);
    }
}
