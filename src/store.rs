use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const FAVORITES_KEY: &str = "favoriteJobs";
pub const LIKED_KEY: &str = "swipeLikedJobs";
pub const PASSED_KEY: &str = "swipePassedJobs";
pub const HISTORY_KEY: &str = "swipeHistory";

pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
}

pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        let store = Self {
            conn,
            path: path.to_path_buf(),
        };
        store.init()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: PathBuf::from(":memory:"),
        };
        store.init()?;
        Ok(store)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }
}

impl KvStore for Store {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .with_context(|| format!("Failed to read '{}'", key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
                params![key, value],
            )
            .with_context(|| format!("Failed to write '{}'", key))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", [key])
            .with_context(|| format!("Failed to delete '{}'", key))?;
        Ok(())
    }
}

pub fn read_list<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Vec<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("Could not read persisted '{}': {:#}", key, e);
            return Vec::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
            warn!("Ignoring malformed persisted '{}': {}", key, e);
            Vec::new()
        }
    }
}

pub fn write_list<T: Serialize>(store: &dyn KvStore, key: &str, items: &[T]) -> Result<()> {
    let json = serde_json::to_string(items).context("Failed to encode persisted state")?;
    store.set(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_delete() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "1").unwrap();
        store.set("k", "2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("2"));
        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.delete("k").unwrap();
    }

    #[test]
    fn test_read_list_defaults_to_empty() {
        let store = Store::open_in_memory().unwrap();
        let missing: Vec<String> = read_list(&store, FAVORITES_KEY);
        assert!(missing.is_empty());

        store.set(FAVORITES_KEY, "{not json").unwrap();
        let malformed: Vec<String> = read_list(&store, FAVORITES_KEY);
        assert!(malformed.is_empty());

        store.set(FAVORITES_KEY, r#"{"a": 1}"#).unwrap();
        let wrong_shape: Vec<String> = read_list(&store, FAVORITES_KEY);
        assert!(wrong_shape.is_empty());
    }

    #[test]
    fn test_write_then_read_list() {
        let store = Store::open_in_memory().unwrap();
        write_list(&store, LIKED_KEY, &["Acme-SWE".to_string()]).unwrap();
        assert_eq!(store.get(LIKED_KEY).unwrap().as_deref(), Some(r#"["Acme-SWE"]"#));
        let items: Vec<String> = read_list(&store, LIKED_KEY);
        assert_eq!(items, vec!["Acme-SWE"]);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("internhunt-store-{}", std::process::id()));
        let path = dir.join("nested").join("internhunt.db");
        let store = Store::open(&path).unwrap();
        store.set("k", "v").unwrap();
        drop(store);

        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(reopened.path(), &path);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
