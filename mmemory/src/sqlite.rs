//! SQLite-backed message store.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use mcontent::Message;
use rusqlite::{Connection, params};
use serde_json::{Value, json};

use crate::{MemoryError, MemoryFuture, MessageStore};

/// Durable transcript store on a single SQLite database. Messages are kept
/// as envelope JSON in insertion order.
#[derive(Debug)]
pub struct SqliteMessageStore {
    connection: Mutex<Connection>,
}

impl SqliteMessageStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                MemoryError::storage(format!(
                    "failed to create sqlite parent directory: {error}"
                ))
            })?;
        }

        let connection = Connection::open(path).map_err(|error| {
            MemoryError::storage(format!("failed to open sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    pub fn new_in_memory() -> Result<Self, MemoryError> {
        let connection = Connection::open_in_memory().map_err(|error| {
            MemoryError::storage(format!("failed to open in-memory sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, MemoryError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                MemoryError::storage(format!("failed to configure sqlite busy timeout: {error}"))
            })?;
        let store = Self {
            connection: Mutex::new(connection),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, MemoryError> {
        self.connection
            .lock()
            .map_err(|_| MemoryError::storage("sqlite store lock poisoned"))
    }

    fn initialize_schema(&self) -> Result<(), MemoryError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                envelope TEXT NOT NULL
            );
            ",
        )
        .map_err(|error| {
            MemoryError::storage(format!("failed to initialize sqlite schema: {error}"))
        })
    }

    fn load_all(&self) -> Result<Vec<Message>, MemoryError> {
        let conn = self.connection()?;
        let mut statement = conn
            .prepare("SELECT envelope FROM messages ORDER BY id")
            .map_err(|error| {
                MemoryError::storage(format!("failed to prepare transcript query: {error}"))
            })?;

        let rows = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|error| {
                MemoryError::storage(format!("failed to query transcript rows: {error}"))
            })?;

        let mut messages = Vec::new();
        for row in rows {
            let envelope = row.map_err(|error| {
                MemoryError::storage(format!("failed to read transcript row: {error}"))
            })?;
            let message = serde_json::from_str(&envelope).map_err(|error| {
                MemoryError::serialization(format!("failed to decode message envelope: {error}"))
            })?;
            messages.push(message);
        }
        Ok(messages)
    }
}

impl MessageStore for SqliteMessageStore {
    fn list_messages<'a>(&'a self) -> MemoryFuture<'a, Result<Vec<Message>, MemoryError>> {
        Box::pin(async move { self.load_all() })
    }

    fn add_messages<'a>(
        &'a self,
        messages: Vec<Message>,
    ) -> MemoryFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let mut conn = self.connection()?;
            let transaction = conn.transaction().map_err(|error| {
                MemoryError::storage(format!("failed to begin transaction: {error}"))
            })?;

            for message in &messages {
                let envelope = serde_json::to_string(message).map_err(|error| {
                    MemoryError::serialization(format!(
                        "failed to encode message envelope: {error}"
                    ))
                })?;
                transaction
                    .execute(
                        "INSERT INTO messages (envelope) VALUES (?1)",
                        params![envelope],
                    )
                    .map_err(|error| {
                        MemoryError::storage(format!("failed to insert message: {error}"))
                    })?;
            }

            transaction.commit().map_err(|error| {
                MemoryError::storage(format!("failed to commit transaction: {error}"))
            })
        })
    }

    fn serialize<'a>(&'a self) -> MemoryFuture<'a, Result<Value, MemoryError>> {
        Box::pin(async move {
            let messages = self.load_all()?;
            let encoded = serde_json::to_value(&messages).map_err(|error| {
                MemoryError::serialization(format!("failed to encode messages: {error}"))
            })?;
            Ok(json!({ "messages": encoded }))
        })
    }
}
