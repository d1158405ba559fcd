//! Key-value persistence for the form state.
//!
//! Values are stored as JSON text. An empty value is never written: saving it
//! deletes the key instead, so the next load falls back to the default.

use gloo_storage::{LocalStorage, Storage};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage is not available")]
    Unavailable,

    #[error("storage operation failed: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<wasm_bindgen::JsValue> for StoreError {
    fn from(err: wasm_bindgen::JsValue) -> Self {
        StoreError::Backend(format!("{:?}", err))
    }
}

/// Raw string storage.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

/// `window.localStorage` through `gloo-storage`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserStore;

impl BrowserStore {
    // `LocalStorage::raw` throws when storage is disabled, so check first.
    fn storage(&self) -> Result<web_sys::Storage, StoreError> {
        match web_sys::window().map(|w| w.local_storage()) {
            Some(Ok(Some(_))) => Ok(LocalStorage::raw()),
            _ => Err(StoreError::Unavailable),
        }
    }
}

impl KeyValueStore for BrowserStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.storage()?.get_item(key)?)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Ok(self.storage()?.set_item(key, value)?)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.storage()?;
        LocalStorage::delete(key);
        Ok(())
    }
}

/// In-memory store, shared between clones.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.borrow().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Values that count as "nothing to store".
pub trait Falsy {
    fn is_falsy(&self) -> bool;
}

impl Falsy for String {
    fn is_falsy(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Falsy for Vec<T> {
    fn is_falsy(&self) -> bool {
        self.is_empty()
    }
}

/// Persistence service, created once per application and shared by handle.
#[derive(Clone)]
pub struct Persistence {
    store: Rc<dyn KeyValueStore>,
}

impl PartialEq for Persistence {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.store, &other.store)
    }
}

impl Persistence {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Persistence {
            store: Rc::new(store),
        }
    }

    pub fn browser() -> Self {
        Self::new(BrowserStore)
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Read `key`, falling back when it is absent, unreadable or empty.
    pub fn load<T>(&self, key: &str, fallback: T) -> T
    where
        T: DeserializeOwned + Falsy,
    {
        let raw = match self.store.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return fallback,
            Err(e) => {
                warn!("Failed to read {:?} from storage: {}", key, e);
                return fallback;
            }
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) if !value.is_falsy() => value,
            Ok(_) => fallback,
            Err(e) => {
                warn!("Discarding unreadable stored value for {:?}: {}", key, e);
                fallback
            }
        }
    }

    /// Write `value` under `key`, or delete the key when the value is empty.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + Falsy,
    {
        if value.is_falsy() {
            debug!("Removing empty {:?} from storage", key);
            return self.store.remove_item(key);
        }
        let raw = serde_json::to_string(value)?;
        self.store.set_item(key, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{empty_cooldown, CooldownEntry, CooldownSeconds};

    fn sample() -> Vec<CooldownEntry> {
        vec![CooldownEntry {
            display_name: "Tranquility".to_string(),
            cooldown: CooldownSeconds::Text("180".to_string()),
            group_name: "Healer, Druid".to_string(),
        }]
    }

    #[test]
    fn round_trips_a_list() {
        let persistence = Persistence::in_memory();
        persistence.save("cooldowns", &sample()).unwrap();

        let loaded: Vec<CooldownEntry> = persistence.load("cooldowns", vec![empty_cooldown()]);
        assert_eq!(loaded, sample());
    }

    #[test]
    fn empty_values_remove_the_key() {
        let store = MemoryStore::new();
        let persistence = Persistence::new(store.clone());

        persistence.save("template", &"{time:0:30}".to_string()).unwrap();
        assert!(store.contains_key("template"));

        persistence.save("template", &String::new()).unwrap();
        assert!(!store.contains_key("template"));
        assert_eq!(persistence.load("template", "fallback".to_string()), "fallback");

        persistence.save("cooldowns", &sample()).unwrap();
        persistence.save("cooldowns", &Vec::<CooldownEntry>::new()).unwrap();
        assert!(!store.contains_key("cooldowns"));
        assert_eq!(
            persistence.load("cooldowns", vec![empty_cooldown()]),
            vec![empty_cooldown()]
        );
    }

    #[test]
    fn strings_are_stored_as_json() {
        let store = MemoryStore::new();
        let persistence = Persistence::new(store.clone());
        persistence.save("template", &"line \"one\"".to_string()).unwrap();

        assert_eq!(
            store.get_item("template").unwrap().as_deref(),
            Some(r#""line \"one\"""#)
        );
    }

    #[test]
    fn unreadable_or_empty_values_fall_back() {
        let store = MemoryStore::new();
        let persistence = Persistence::new(store.clone());

        store.set_item("cooldowns", "not json").unwrap();
        assert_eq!(persistence.load("cooldowns", vec![empty_cooldown()]).len(), 1);

        store.set_item("cooldowns", "[]").unwrap();
        assert_eq!(
            persistence.load("cooldowns", vec![empty_cooldown()]),
            vec![empty_cooldown()]
        );
    }

    #[test]
    fn handles_compare_by_store_identity() {
        let a = Persistence::in_memory();
        assert!(a == a.clone());
        assert!(a != Persistence::in_memory());
    }
}
