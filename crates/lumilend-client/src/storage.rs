use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

use crate::constants::LOAN_HINT_PREFIX;

/// Small string store for client-side hints, scoped per wallet address.
/// Entries are advisory: losing them costs a rescan, nothing else.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().unwrap().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

/// File-backed store, one JSON object per file. Loads once on open and
/// writes through on every change. Persistence failures are logged and
/// otherwise ignored; hints are not worth failing an operation over.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> JsonFileStore {
        let path = path.into();
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        JsonFileStore { path, entries: Mutex::new(entries) }
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        match serde_json::to_string_pretty(entries) {
            Ok(raw) => {
                if let Err(err) = fs::write(&self.path, raw) {
                    warn!(path = %self.path.display(), %err, "hint store write failed");
                }
            }
            Err(err) => warn!(%err, "hint store serialization failed"),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(key);
        self.persist(&entries);
    }
}

pub fn loan_hint_key(borrower: &str) -> String {
    format!("{LOAN_HINT_PREFIX}{borrower}")
}

/// Reads the remembered loan id for a borrower. Unparseable values are
/// treated as absent.
pub fn read_loan_hint(store: &dyn KeyValueStore, borrower: &str) -> Option<u64> {
    store.get(&loan_hint_key(borrower))?.parse().ok()
}

pub fn write_loan_hint(store: &dyn KeyValueStore, borrower: &str, loan_id: u64) {
    store.set(&loan_hint_key(borrower), &loan_id.to_string());
}

pub fn clear_loan_hint(store: &dyn KeyValueStore, borrower: &str) {
    store.remove(&loan_hint_key(borrower));
}
