use std::fmt;

use crate::error::FabricError;

/// Monotonically increasing checkpoint epoch, assigned by the host.
///
/// Delimits which feedback records must be retained for replay if the
/// process restarts before the epoch is durably committed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct EpochId(pub u64);

impl EpochId {
    pub fn next(self) -> EpochId {
        EpochId(self.0 + 1)
    }
}

impl fmt::Display for EpochId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Driven by the host's checkpoint authority.
///
/// The host notifies when an epoch begins (barrier delivery), when it is
/// durably committed (safe to garbage-collect older buffered state), and
/// when it must be rolled back (the host will restore and replay from the
/// last committed epoch). Errors are fatal to the owning worker: epoch
/// bookkeeping must stay monotonic and uninterrupted.
pub trait CheckpointListener {
    fn checkpoint_started(&mut self, epoch: EpochId) -> Result<(), FabricError>;

    fn checkpoint_committed(&mut self, epoch: EpochId) -> Result<(), FabricError>;

    fn checkpoint_rolled_back(&mut self, epoch: EpochId) -> Result<(), FabricError>;
}
