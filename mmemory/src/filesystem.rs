//! Filesystem-backed message store: one JSON document per store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use mcontent::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{MemoryError, MemoryFuture, MessageStore};

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedTranscript {
    messages: Vec<Message>,
}

/// Stores the transcript as a single JSON file, rewritten atomically on
/// every append. Suited to per-session transcript files; heavier traffic
/// belongs in [`crate::SqliteMessageStore`].
#[derive(Debug)]
pub struct FileMessageStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileMessageStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|error| {
                MemoryError::storage(format!("failed to create store directory: {error}"))
            })?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<PersistedTranscript, MemoryError> {
        if !self.path.exists() {
            return Ok(PersistedTranscript::default());
        }
        let bytes = fs::read(&self.path).map_err(|error| {
            MemoryError::storage(format!("failed to read transcript file: {error}"))
        })?;
        serde_json::from_slice(&bytes).map_err(|error| {
            MemoryError::serialization(format!("failed to decode transcript: {error}"))
        })
    }

    fn save(&self, transcript: &PersistedTranscript) -> Result<(), MemoryError> {
        let bytes = serde_json::to_vec_pretty(transcript).map_err(|error| {
            MemoryError::serialization(format!("failed to encode transcript: {error}"))
        })?;
        write_atomic(&self.path, &bytes)
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, MemoryError> {
        self.lock
            .lock()
            .map_err(|_| MemoryError::storage("file store lock poisoned"))
    }
}

impl MessageStore for FileMessageStore {
    fn list_messages<'a>(&'a self) -> MemoryFuture<'a, Result<Vec<Message>, MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            Ok(self.load()?.messages)
        })
    }

    fn add_messages<'a>(
        &'a self,
        messages: Vec<Message>,
    ) -> MemoryFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            let mut transcript = self.load()?;
            transcript.messages.extend(messages);
            self.save(&transcript)
        })
    }

    fn serialize<'a>(&'a self) -> MemoryFuture<'a, Result<Value, MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            let transcript = self.load()?;
            let encoded = serde_json::to_value(&transcript.messages).map_err(|error| {
                MemoryError::serialization(format!("failed to encode messages: {error}"))
            })?;
            Ok(json!({ "messages": encoded }))
        })
    }
}

/// Write-then-rename so readers never observe a partial document.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), MemoryError> {
    let temp = path.with_extension("tmp");
    fs::write(&temp, bytes).map_err(|error| {
        MemoryError::storage(format!("failed to write transcript temp file: {error}"))
    })?;
    fs::rename(&temp, path).map_err(|error| {
        MemoryError::storage(format!("failed to replace transcript file: {error}"))
    })
}
