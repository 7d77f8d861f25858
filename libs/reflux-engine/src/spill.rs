//! Storage channel implementations the feedback buffer spills to.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use reflux_api::error::FabricError;
use reflux_api::storage::{SpillScope, StorageChannel};

type Areas = Arc<RwLock<HashMap<SpillScope, Vec<u8>>>>;

// ---------------------------------------------------------------------------
// InMemoryChannel
// ---------------------------------------------------------------------------

/// In-memory spill areas. For tests and for hosts that accept losing the
/// replay window with the process.
#[derive(Default, Clone)]
pub struct InMemoryChannel {
    areas: Areas,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<SpillScope, Vec<u8>>> {
        match self.areas.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("spill area read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

struct InMemoryWriter {
    areas: Areas,
    scope: SpillScope,
}

impl Write for InMemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut areas = match self.areas.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        areas
            .entry(self.scope.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl StorageChannel for InMemoryChannel {
    fn open_write(&self, scope: &SpillScope) -> Result<Box<dyn Write + Send>, FabricError> {
        Ok(Box::new(InMemoryWriter {
            areas: self.areas.clone(),
            scope: scope.clone(),
        }))
    }

    fn open_read(&self, scope: &SpillScope) -> Result<Box<dyn Read + Send>, FabricError> {
        let bytes = self.lock_read().get(scope).cloned().unwrap_or_default();
        Ok(Box::new(io::Cursor::new(bytes)))
    }

    fn exists(&self, scope: &SpillScope) -> bool {
        self.lock_read().contains_key(scope)
    }

    fn remove(&self, scope: &SpillScope) -> Result<(), FabricError> {
        let mut areas = match self.areas.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("spill area write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        areas.remove(scope);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DiskChannel
// ---------------------------------------------------------------------------

/// Directory-backed spill areas: one file per (partition, epoch) scope.
pub struct DiskChannel {
    dir: PathBuf,
}

impl DiskChannel {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, FabricError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| FabricError::io(format!("mkdir {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn scope_path(&self, scope: &SpillScope) -> PathBuf {
        self.dir.join(scope_file_name(scope))
    }
}

/// Partition keys contain `/`, so the file name carries them hex-encoded.
fn scope_file_name(scope: &SpillScope) -> String {
    let key = scope.partition.as_str().as_bytes();
    let mut name = String::with_capacity(key.len() * 2 + 24);
    for b in key {
        let _ = write!(name, "{b:02x}");
    }
    let _ = write!(name, "-{}.log", scope.epoch);
    name
}

fn open_error(path: &Path, e: io::Error) -> FabricError {
    FabricError::io(format!("{}: {e}", path.display()))
}

impl StorageChannel for DiskChannel {
    fn open_write(&self, scope: &SpillScope) -> Result<Box<dyn Write + Send>, FabricError> {
        let path = self.scope_path(scope);
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| open_error(&path, e))?;
        Ok(Box::new(file))
    }

    fn open_read(&self, scope: &SpillScope) -> Result<Box<dyn Read + Send>, FabricError> {
        let path = self.scope_path(scope);
        match std::fs::File::open(&path) {
            Ok(file) => Ok(Box::new(io::BufReader::new(file))),
            // A scope nothing was written to reads as empty.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Ok(Box::new(io::Cursor::new(Vec::new())))
            }
            Err(e) => Err(open_error(&path, e)),
        }
    }

    fn exists(&self, scope: &SpillScope) -> bool {
        self.scope_path(scope).exists()
    }

    fn remove(&self, scope: &SpillScope) -> Result<(), FabricError> {
        let path = self.scope_path(scope);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(open_error(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflux_api::address::PartitionKey;
    use reflux_api::checkpoint::EpochId;

    fn scope(partition: &str, epoch: u64) -> SpillScope {
        SpillScope::new(PartitionKey(partition.to_string()), EpochId(epoch))
    }

    fn read_all(channel: &dyn StorageChannel, scope: &SpillScope) -> Vec<u8> {
        let mut out = Vec::new();
        channel.open_read(scope).unwrap().read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn memory_channel_appends_across_writers() {
        let channel = InMemoryChannel::new();
        let scope = scope("ns/a/1", 0);

        channel.open_write(&scope).unwrap().write_all(b"one").unwrap();
        channel.open_write(&scope).unwrap().write_all(b"two").unwrap();

        assert!(channel.exists(&scope));
        assert_eq!(read_all(&channel, &scope), b"onetwo");

        channel.remove(&scope).unwrap();
        assert!(!channel.exists(&scope));
    }

    #[test]
    fn disk_channel_appends_across_writers() {
        let dir = tempfile::tempdir().unwrap();
        let channel = DiskChannel::new(dir.path()).unwrap();
        let scope = scope("ns/a/1", 3);

        channel.open_write(&scope).unwrap().write_all(b"one").unwrap();
        channel.open_write(&scope).unwrap().write_all(b"two").unwrap();

        assert!(channel.exists(&scope));
        assert_eq!(read_all(&channel, &scope), b"onetwo");

        channel.remove(&scope).unwrap();
        assert!(!channel.exists(&scope));
        // Removing twice is fine.
        channel.remove(&scope).unwrap();
    }

    #[test]
    fn unwritten_scope_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let channel = DiskChannel::new(dir.path()).unwrap();

        assert!(!channel.exists(&scope("ns/a/1", 0)));
        assert_eq!(read_all(&channel, &scope("ns/a/1", 0)), b"");
    }

    #[test]
    fn scopes_with_similar_keys_do_not_collide() {
        let a = scope("ns/a/1", 0);
        let b = scope("ns/a_1", 0);
        assert_ne!(scope_file_name(&a), scope_file_name(&b));
    }
}
