//! Local cache for the user record and the remembered login email.
//!
//! TRADE-OFFS
//! ==========
//! The cache is a convenience read, never authoritative: every load is
//! provisional until a server round-trip supersedes it. Records are wrapped
//! in a versioned envelope so a future shape change invalidates old entries
//! instead of failing deserialization; any parse problem reads as absent
//! (fail open to logged-out, never an error).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::types::User;

/// Bump when the shape of a cached payload changes incompatibly.
const CACHE_VERSION: u32 = 1;

const USER_KEY: &str = "user";
const REMEMBERED_EMAIL_KEY: &str = "remembered_email";

#[derive(serde::Serialize, serde::Deserialize)]
struct Envelope {
    version: u32,
    payload: Value,
}

enum Store {
    Memory(HashMap<String, Envelope>),
    File(PathBuf),
}

/// Process-wide key-value cache. Last writer wins; there is no cross-process
/// invalidation.
pub struct Cache {
    store: Mutex<Store>,
}

impl Cache {
    /// Cache that never touches disk. Suits tests and embedders that bring
    /// their own persistence.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { store: Mutex::new(Store::Memory(HashMap::new())) }
    }

    /// Cache backed by a JSON file at `path`. The file is created on first
    /// write; an unreadable or corrupt file reads as empty.
    #[must_use]
    pub fn at_path(path: PathBuf) -> Self {
        Self { store: Mutex::new(Store::File(path)) }
    }

    pub fn store_user(&self, user: &User) {
        self.put(USER_KEY, user);
    }

    #[must_use]
    pub fn load_user(&self) -> Option<User> {
        self.get(USER_KEY)
    }

    pub fn clear_user(&self) {
        self.remove(USER_KEY);
    }

    pub fn remember_email(&self, email: &str) {
        self.put(REMEMBERED_EMAIL_KEY, &email);
    }

    #[must_use]
    pub fn remembered_email(&self) -> Option<String> {
        self.get(REMEMBERED_EMAIL_KEY)
    }

    pub fn forget_email(&self) {
        self.remove(REMEMBERED_EMAIL_KEY);
    }

    fn put<T: Serialize>(&self, key: &str, value: &T) {
        let Ok(payload) = serde_json::to_value(value) else {
            return;
        };
        let envelope = Envelope { version: CACHE_VERSION, payload };
        let mut store = self.store.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match &mut *store {
            Store::Memory(map) => {
                map.insert(key.to_string(), envelope);
            }
            Store::File(path) => {
                let mut map = read_file(path);
                map.insert(key.to_string(), envelope);
                write_file(path, &map);
            }
        }
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.store.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let envelope_payload = match &*store {
            Store::Memory(map) => {
                let envelope = map.get(key)?;
                if envelope.version != CACHE_VERSION {
                    return None;
                }
                envelope.payload.clone()
            }
            Store::File(path) => {
                let map = read_file(path);
                let envelope = map.get(key)?;
                if envelope.version != CACHE_VERSION {
                    return None;
                }
                envelope.payload.clone()
            }
        };
        serde_json::from_value(envelope_payload).ok()
    }

    fn remove(&self, key: &str) {
        let mut store = self.store.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match &mut *store {
            Store::Memory(map) => {
                map.remove(key);
            }
            Store::File(path) => {
                let mut map = read_file(path);
                if map.remove(key).is_some() {
                    write_file(path, &map);
                }
            }
        }
    }
}

fn read_file(path: &Path) -> HashMap<String, Envelope> {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return HashMap::new();
    };
    serde_json::from_str(&raw).unwrap_or_default()
}

fn write_file(path: &Path, map: &HashMap<String, Envelope>) {
    let Ok(raw) = serde_json::to_string(map) else {
        return;
    };
    if let Err(e) = std::fs::write(path, raw) {
        tracing::warn!(error = %e, path = %path.display(), "cache write failed");
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
