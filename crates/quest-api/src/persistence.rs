use std::fmt;
use std::path::Path;

use contracts::SCHEMA_VERSION_V1;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value as JsonValue;

const SAVE_SLOT: &str = "default";

#[derive(Debug)]
pub enum PersistenceError {
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Serde(err) => write!(f, "serde error: {err}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// The injected durable store: one document per installation, rewritten whole
/// on save.
pub trait PlayerStore: fmt::Debug + Send {
    fn load(&mut self) -> Result<Option<JsonValue>, PersistenceError>;
    fn save(&mut self, document: &JsonValue) -> Result<(), PersistenceError>;
}

/// Volatile store for tests and for a facade with no storage attached yet.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Option<JsonValue>,
}

impl PlayerStore for MemoryStore {
    fn load(&mut self) -> Result<Option<JsonValue>, PersistenceError> {
        Ok(self.document.clone())
    }

    fn save(&mut self, document: &JsonValue) -> Result<(), PersistenceError> {
        self.document = Some(document.clone());
        Ok(())
    }
}

#[derive(Debug)]
pub struct SqlitePlayerStore {
    conn: Connection,
}

impl SqlitePlayerStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    fn configure(&mut self) -> Result<(), PersistenceError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS player_save (
                slot_id TEXT PRIMARY KEY,
                schema_version TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                revision INTEGER NOT NULL
            );
            ",
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO schema_migrations(version, name)
             VALUES(1, 'initial_v1')",
            [],
        )?;

        Ok(())
    }
}

impl PlayerStore for SqlitePlayerStore {
    fn load(&mut self) -> Result<Option<JsonValue>, PersistenceError> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload_json FROM player_save WHERE slot_id = ?1",
                params![SAVE_SLOT],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(raw) => Ok(Some(serde_json::from_str::<JsonValue>(&raw)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, document: &JsonValue) -> Result<(), PersistenceError> {
        let payload = serde_json::to_string(document)?;
        let schema_version = document
            .get("schema_version")
            .and_then(JsonValue::as_str)
            .unwrap_or(SCHEMA_VERSION_V1);

        self.conn.execute(
            "INSERT INTO player_save (slot_id, schema_version, payload_json, revision)
             VALUES (?1, ?2, ?3, 1)
             ON CONFLICT(slot_id) DO UPDATE SET
                schema_version = excluded.schema_version,
                payload_json = excluded.payload_json,
                revision = player_save.revision + 1",
            params![SAVE_SLOT, schema_version, payload],
        )?;

        Ok(())
    }
}
