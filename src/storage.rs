use crate::error::StoreError;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const LAST_CONVERSATION_KEY: &str = "debate:lastConversationId";
pub const LAST_PROFILE_KEY: &str = "debate:lastProfileId";

pub fn default_db_path() -> Option<PathBuf> {
    let proj = crate::config::Settings::project_dirs()?;
    Some(proj.data_dir().join("state.sqlite"))
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Small persistent key/value table for identifiers that survive restarts.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        ensure_dir(path)?;
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::init(conn)
    }

    pub fn open_default() -> Result<Self, StoreError> {
        let path = default_db_path().ok_or(StoreError::NoDataDir)?;
        Self::open(&path)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        Ok(f(&conn)?)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
        })
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO kv (key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                "#,
                params![key, value],
            )
            .map(|_| ())
        })
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| conn.execute("DELETE FROM kv WHERE key = ?1", params![key]).map(|_| ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = Store::in_memory().unwrap();
        assert_eq!(store.get(LAST_PROFILE_KEY).unwrap(), None);
        store.set(LAST_PROFILE_KEY, "general").unwrap();
        store.set(LAST_PROFILE_KEY, "rude_arrogant").unwrap();
        assert_eq!(store.get(LAST_PROFILE_KEY).unwrap().as_deref(), Some("rude_arrogant"));
        store.remove(LAST_PROFILE_KEY).unwrap();
        assert_eq!(store.get(LAST_PROFILE_KEY).unwrap(), None);
        store.remove(LAST_PROFILE_KEY).unwrap();
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("state.sqlite");
        {
            let store = Store::open(&path).unwrap();
            store.set(LAST_CONVERSATION_KEY, "abc").unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.get(LAST_CONVERSATION_KEY).unwrap().as_deref(), Some("abc"));
    }
}
