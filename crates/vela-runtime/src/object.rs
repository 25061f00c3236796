//! Dynamic property bag with reference semantics
//!
//! An [`Object`] is the runtime's string-keyed, insertion-ordered map.
//! All clones point to the same underlying storage: mutation through any
//! clone is visible to all other clones, and equality is identity
//! (`Arc::ptr_eq`). Module namespaces are Objects, built once and shared by
//! reference with every caller that imports the module.

use crate::value::Value;
use std::sync::{Arc, Mutex};

/// Shared, insertion-ordered string → [`Value`] map.
#[derive(Clone, Debug, Default)]
pub struct Object(Arc<Mutex<Vec<(String, Value)>>>);

impl Object {
    pub fn new() -> Self {
        Object(Arc::new(Mutex::new(Vec::new())))
    }

    /// Look up a field, cloning the stored value.
    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.0.lock().expect("object lock poisoned");
        entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    /// Insert or overwrite a field. Overwriting keeps the original
    /// insertion position.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let mut entries = self.0.lock().expect("object lock poisoned");
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => entries.push((key, value)),
        }
    }

    /// Remove a field, returning its value if present.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut entries = self.0.lock().expect("object lock poisoned");
        let idx = entries.iter().position(|(k, _)| k == key)?;
        Some(entries.remove(idx).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        let entries = self.0.lock().expect("object lock poisoned");
        entries.iter().any(|(k, _)| k == key)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> Vec<String> {
        let entries = self.0.lock().expect("object lock poisoned");
        entries.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.lock().expect("object lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().expect("object lock poisoned").is_empty()
    }
}

impl PartialEq for Object {
    /// Reference semantics: two Objects are equal only if they are the same
    /// allocation. Two objects with identical contents are NOT equal unless
    /// they alias the same storage.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
