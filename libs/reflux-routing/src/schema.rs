use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use prost_reflect::{DescriptorPool, MessageDescriptor};

use crate::compile::CompiledPath;
use crate::error::PathError;

/// Supplies message descriptors by fully-qualified type name.
///
/// Looked up once per distinct message type, then cached by the consumer.
pub trait SchemaProvider: Send + Sync {
    fn descriptor(&self, message_type: &str) -> Option<MessageDescriptor>;
}

/// Provider backed by a prost-reflect descriptor pool, typically decoded
/// from a `FileDescriptorSet` (`protoc --descriptor_set_out`).
pub struct PoolSchemaProvider {
    pool: DescriptorPool,
}

impl PoolSchemaProvider {
    pub fn new(pool: DescriptorPool) -> Self {
        Self { pool }
    }

    pub fn from_descriptor_bytes(bytes: &[u8]) -> Result<Self, prost_reflect::DescriptorError> {
        Ok(Self {
            pool: DescriptorPool::decode(bytes)?,
        })
    }
}

impl SchemaProvider for PoolSchemaProvider {
    fn descriptor(&self, message_type: &str) -> Option<MessageDescriptor> {
        self.pool.get_message_by_name(message_type)
    }
}

/// Cache of compiled field paths, keyed by (message type, path string).
///
/// Compilation happens once per distinct pair; afterwards the compiled
/// lens is immutable and shared read-only across every partition the
/// worker processes.
#[derive(Default)]
pub struct PathCache {
    compiled: RwLock<HashMap<(String, String), Arc<CompiledPath>>>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(
        &self,
        descriptor: &MessageDescriptor,
        path: &str,
    ) -> Result<Arc<CompiledPath>, PathError> {
        let key = (descriptor.full_name().to_string(), path.to_string());

        {
            let guard = match self.compiled.read() {
                Ok(g) => g,
                Err(poisoned) => {
                    tracing::warn!("path cache read lock was poisoned, recovering");
                    poisoned.into_inner()
                }
            };
            if let Some(found) = guard.get(&key) {
                return Ok(found.clone());
            }
        }

        let compiled = Arc::new(CompiledPath::compile(descriptor, path)?);
        tracing::debug!(message_type = %key.0, path = %key.1, "compiled field path");

        let mut guard = match self.compiled.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("path cache write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        Ok(guard.entry(key).or_insert(compiled).clone())
    }
}
