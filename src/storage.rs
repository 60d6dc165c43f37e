use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use log::debug;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

pub const CLIENT_PREFERENCES: &str = "clientPreferences";
pub const ADMIN_SETTINGS: &str = "adminSettings";

fn db_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("com", "example", "AgencyDesk")?;
    Some(proj.data_dir().join("preferences.sqlite"))
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Opaque JSON blobs keyed by name. Nothing here is versioned; a blob is
/// whatever the last writer stored.
pub struct Preferences {
    conn: Connection,
}

impl Preferences {
    pub fn open_default() -> AppResult<Self> {
        let path = db_path().ok_or(AppError::NoConfigDir)?;
        Self::open(&path)
    }

    pub fn open(path: &Path) -> AppResult<Self> {
        ensure_dir(path)?;
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> AppResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn })
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let json = serde_json::to_string(value)?;
        let now: DateTime<Utc> = Utc::now();
        self.conn.execute(
            r#"
            INSERT INTO preferences (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value=excluded.value,
                updated_at=excluded.updated_at
            "#,
            params![key, json, now],
        )?;
        debug!("stored preference {key}");
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM preferences WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    pub fn get_raw(&self, key: &str) -> AppResult<Option<Value>> {
        self.get::<Value>(key)
    }

    pub fn updated_at(&self, key: &str) -> AppResult<Option<DateTime<Utc>>> {
        let ts = self
            .conn
            .query_row("SELECT updated_at FROM preferences WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(ts)
    }

    /// Returns whether anything was removed.
    pub fn remove(&self, key: &str) -> AppResult<bool> {
        let n = self.conn.execute("DELETE FROM preferences WHERE key = ?1", params![key])?;
        Ok(n > 0)
    }

    pub fn keys(&self) -> AppResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM preferences ORDER BY key ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct ClientPrefs {
        email_notifications: bool,
        default_view: String,
    }

    #[test]
    fn put_get_overwrite_remove() {
        let prefs = Preferences::in_memory().unwrap();
        assert!(prefs.get_raw(CLIENT_PREFERENCES).unwrap().is_none());

        let first = ClientPrefs { email_notifications: true, default_view: "cards".into() };
        prefs.put(CLIENT_PREFERENCES, &first).unwrap();
        assert_eq!(prefs.get::<ClientPrefs>(CLIENT_PREFERENCES).unwrap(), Some(first));
        assert!(prefs.updated_at(CLIENT_PREFERENCES).unwrap().is_some());

        prefs.put(CLIENT_PREFERENCES, &json!({ "anything": [1, 2] })).unwrap();
        assert_eq!(prefs.get_raw(CLIENT_PREFERENCES).unwrap(), Some(json!({ "anything": [1, 2] })));

        prefs.put(ADMIN_SETTINGS, &json!({ "currency": "EUR" })).unwrap();
        assert_eq!(prefs.keys().unwrap(), vec![ADMIN_SETTINGS.to_string(), CLIENT_PREFERENCES.to_string()]);

        assert!(prefs.remove(CLIENT_PREFERENCES).unwrap());
        assert!(!prefs.remove(CLIENT_PREFERENCES).unwrap());
    }

    #[test]
    fn survives_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.sqlite");
        Preferences::open(&path).unwrap().put(ADMIN_SETTINGS, &json!({ "taxRate": 0.2 })).unwrap();
        let reopened = Preferences::open(&path).unwrap();
        assert_eq!(reopened.get_raw(ADMIN_SETTINGS).unwrap(), Some(json!({ "taxRate": 0.2 })));
    }
}
