use std::io::{Read, Write};

use crate::address::PartitionKey;
use crate::checkpoint::EpochId;
use crate::error::FabricError;

/// One spill area: the buffered feedback of a single partition within a
/// single checkpoint epoch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpillScope {
    pub partition: PartitionKey,
    pub epoch: EpochId,
}

impl SpillScope {
    pub fn new(partition: PartitionKey, epoch: EpochId) -> Self {
        Self { partition, epoch }
    }
}

impl std::fmt::Display for SpillScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.partition, self.epoch)
    }
}

/// Byte-oriented append-then-read-back store the feedback buffer spills to.
///
/// The engine doesn't know concrete implementations; for the engine,
/// external storage is just this trait. Contract:
/// - `open_write` returns a sequential writer positioned at the end of the
///   scope's existing data (spill happens in several bursts per epoch).
/// - `open_read` returns a sequential reader over everything written to the
///   scope so far, in write order.
/// - A scope is owned exclusively by one worker's buffer for the worker's
///   lifetime; no other component writes to the same scope.
pub trait StorageChannel: Send + Sync {
    fn open_write(&self, scope: &SpillScope) -> Result<Box<dyn Write + Send>, FabricError>;

    fn open_read(&self, scope: &SpillScope) -> Result<Box<dyn Read + Send>, FabricError>;

    /// Whether any bytes have been written to the scope.
    fn exists(&self, scope: &SpillScope) -> bool;

    /// Drop the scope's data. Called when the epoch is garbage-collected.
    fn remove(&self, scope: &SpillScope) -> Result<(), FabricError>;
}
