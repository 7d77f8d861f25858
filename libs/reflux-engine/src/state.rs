use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use reflux_api::address::FunctionKind;

/// The physical keyed map that many logical named values multiplex onto.
/// The storage engine behind it is the host's concern.
pub trait KeyedStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    fn put(&self, key: &str, value: Vec<u8>);

    fn delete(&self, key: &str);
}

/// In-memory store, one map per worker.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyedStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let guard = match self.entries.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("state store read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard.get(key).cloned()
    }

    fn put(&self, key: &str, value: Vec<u8>) {
        let mut guard = match self.entries.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("state store write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard.insert(key.to_string(), value);
    }

    fn delete(&self, key: &str) {
        let mut guard = match self.entries.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("state store write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard.remove(key);
    }
}

/// Multiplexes many logical named values over one physical store by
/// deriving the composite sub-key `namespace.name.field`.
pub struct MultiplexedState {
    store: Arc<dyn KeyedStore>,
}

impl MultiplexedState {
    pub fn new(store: Arc<dyn KeyedStore>) -> Self {
        Self { store }
    }

    /// Accessors are created once per (kind, field) and reused.
    pub fn accessor(&self, kind: &FunctionKind, field: &str) -> ValueAccessor {
        ValueAccessor {
            store: self.store.clone(),
            sub_key: format!("{}.{}.{}", kind.namespace, kind.name, field),
        }
    }
}

/// Handle to one logical value inside the shared map.
pub struct ValueAccessor {
    store: Arc<dyn KeyedStore>,
    sub_key: String,
}

impl ValueAccessor {
    pub fn sub_key(&self) -> &str {
        &self.sub_key
    }

    pub fn get(&self) -> Option<Vec<u8>> {
        self.store.get(&self.sub_key)
    }

    pub fn set(&self, value: Vec<u8>) {
        self.store.put(&self.sub_key, value)
    }

    pub fn clear(&self) {
        self.store.delete(&self.sub_key)
    }
}
