use std::collections::{HashMap, VecDeque};
use std::io::Write as _;
use std::sync::Arc;

use reflux_api::address::PartitionKey;
use reflux_api::checkpoint::EpochId;
use reflux_api::codec::RecordCodec;
use reflux_api::record::Record;
use reflux_api::storage::{SpillScope, StorageChannel};

use crate::error::EngineError;
use crate::framing;

/// Immutable marker for an epoch that was sealed and now awaits
/// acknowledgment from the host. The sealed bytes themselves live in the
/// storage channel.
#[derive(Debug, Clone)]
pub struct SealedEpoch {
    scope: SpillScope,
    records: u64,
}

impl SealedEpoch {
    pub fn partition(&self) -> &PartitionKey {
        &self.scope.partition
    }

    pub fn epoch(&self) -> EpochId {
        self.scope.epoch
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }
}

/// The open epoch of one partition.
struct OpenEpoch {
    epoch: EpochId,
    /// In-memory tail: one encoded record per frame, oldest first.
    frames: VecDeque<Vec<u8>>,
    mem_bytes: usize,
    /// Records already spilled to the storage channel.
    spilled: u64,
    writer: Option<Box<dyn std::io::Write + Send>>,
}

impl OpenEpoch {
    fn new(epoch: EpochId) -> Self {
        Self {
            epoch,
            frames: VecDeque::new(),
            mem_bytes: 0,
            spilled: 0,
            writer: None,
        }
    }

    fn push(&mut self, frame: Vec<u8>) {
        self.mem_bytes += frame.len();
        self.frames.push_back(frame);
    }

    /// Move older frames to the storage channel until the in-memory tail
    /// fits the budget again. A zero budget spills everything.
    fn spill_over_budget(
        &mut self,
        budget: usize,
        partition: &PartitionKey,
        channel: &dyn StorageChannel,
    ) -> Result<(), EngineError> {
        while self.mem_bytes > budget {
            let Some(frame) = self.frames.pop_front() else {
                break;
            };
            self.mem_bytes -= frame.len();
            self.write_spill(partition, channel, &frame)?;
            self.spilled += 1;
        }
        Ok(())
    }

    fn write_spill(
        &mut self,
        partition: &PartitionKey,
        channel: &dyn StorageChannel,
        frame: &[u8],
    ) -> Result<(), EngineError> {
        if self.writer.is_none() {
            let scope = SpillScope::new(partition.clone(), self.epoch);
            self.writer = Some(channel.open_write(&scope)?);
            tracing::debug!(partition = %partition, epoch = %self.epoch, "feedback epoch spilling to storage");
        }
        if let Some(writer) = self.writer.as_mut() {
            framing::write_frame(writer, frame)?;
        }
        Ok(())
    }

    /// Flush everything still in memory to the storage channel and close
    /// the epoch. After this the epoch is durable in the channel.
    fn seal_into(
        mut self,
        partition: &PartitionKey,
        channel: &dyn StorageChannel,
    ) -> Result<SealedEpoch, EngineError> {
        let records = self.spilled + self.frames.len() as u64;
        let tail: Vec<Vec<u8>> = self.frames.drain(..).collect();
        for frame in &tail {
            self.write_spill(partition, channel, frame)?;
        }
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(SealedEpoch {
            scope: SpillScope::new(partition.clone(), self.epoch),
            records,
        })
    }
}

struct Shard {
    open: OpenEpoch,
    sealed: Vec<SealedEpoch>,
}

/// Append-only, checkpoint-epoch-scoped, partition-sharded feedback log.
///
/// One logger exists per physical worker. A shard holds at most one open
/// epoch; sealed epochs are immutable. While the open epoch stays under
/// the per-partition memory budget its records are held in memory; over
/// budget, older records spill to the storage channel, and `append` blocks
/// for the duration of the write — that blocking is the backpressure
/// mechanism. A budget of zero spills from the first record.
pub struct FeedbackLogger {
    codec: Arc<dyn RecordCodec>,
    channel: Arc<dyn StorageChannel>,
    budget: usize,
    shards: HashMap<PartitionKey, Shard>,
    /// Last committed epoch per partition; its scope is the recovery point.
    recovery: HashMap<PartitionKey, SealedEpoch>,
}

impl FeedbackLogger {
    pub fn new(
        codec: Arc<dyn RecordCodec>,
        channel: Arc<dyn StorageChannel>,
        budget: usize,
    ) -> Self {
        Self {
            codec,
            channel,
            budget,
            shards: HashMap::new(),
            recovery: HashMap::new(),
        }
    }

    /// Open a partition's first epoch for appends. Appending to a
    /// partition whose logging was never started is an illegal state.
    pub fn start_logging(
        &mut self,
        partition: PartitionKey,
        epoch: EpochId,
    ) -> Result<(), EngineError> {
        if self.shards.contains_key(&partition) {
            return Err(EngineError::IllegalState(format!(
                "logging already started for partition '{partition}'"
            )));
        }
        tracing::debug!(partition = %partition, epoch = %epoch, "started feedback logging");
        self.shards.insert(
            partition,
            Shard {
                open: OpenEpoch::new(epoch),
                sealed: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn is_logging(&self, partition: &PartitionKey) -> bool {
        self.shards.contains_key(partition)
    }

    /// Append a record to the open epoch of its target partition.
    pub fn append(&mut self, record: &Record) -> Result<(), EngineError> {
        let partition = record.target().partition_key();
        let shard = self.shards.get_mut(&partition).ok_or_else(|| {
            EngineError::IllegalState(format!(
                "append before logging started for partition '{partition}'"
            ))
        })?;

        let mut frame = Vec::new();
        self.codec.encode(record, &mut frame)?;
        shard.open.push(frame);
        shard
            .open
            .spill_over_budget(self.budget, &partition, self.channel.as_ref())
    }

    /// Close the open epoch for appends, flush it to the storage channel
    /// and open a fresh epoch at `at + 1`. Sealing an epoch with zero
    /// records is legal and cheap.
    pub fn seal_epoch(
        &mut self,
        partition: &PartitionKey,
        at: EpochId,
    ) -> Result<SealedEpoch, EngineError> {
        let shard = self.shards.get_mut(partition).ok_or_else(|| {
            EngineError::IllegalState(format!(
                "seal before logging started for partition '{partition}'"
            ))
        })?;

        let open = std::mem::replace(&mut shard.open, OpenEpoch::new(at.next()));
        if open.epoch != at {
            tracing::warn!(partition = %partition, open = %open.epoch, barrier = %at,
                "open epoch does not match the sealing barrier");
        }
        let sealed = open.seal_into(partition, self.channel.as_ref())?;
        tracing::debug!(partition = %partition, epoch = %sealed.epoch(),
            records = sealed.records(), "sealed feedback epoch");
        shard.sealed.push(sealed.clone());
        Ok(sealed)
    }

    /// Seal every partition this worker logs, in one barrier pass.
    pub fn seal_all(&mut self, at: EpochId) -> Result<Vec<SealedEpoch>, EngineError> {
        let partitions: Vec<PartitionKey> = self.shards.keys().cloned().collect();
        let mut sealed = Vec::with_capacity(partitions.len());
        for partition in partitions {
            sealed.push(self.seal_epoch(&partition, at)?);
        }
        Ok(sealed)
    }

    /// Sealed epochs of a partition still awaiting acknowledgment.
    pub fn sealed(&self, partition: &PartitionKey) -> &[SealedEpoch] {
        self.shards
            .get(partition)
            .map(|s| s.sealed.as_slice())
            .unwrap_or(&[])
    }

    /// Replay a sealed epoch in original append order.
    pub fn replay(&self, sealed: &SealedEpoch) -> Result<Vec<Record>, EngineError> {
        if sealed.is_empty() {
            return Ok(Vec::new());
        }
        self.read_scope(&sealed.scope)
    }

    /// Rebuild a partition's epoch straight from the storage channel — the
    /// recovery path after a restart, when no in-memory marker survived.
    pub fn restore(
        &self,
        partition: &PartitionKey,
        epoch: EpochId,
    ) -> Result<Vec<Record>, EngineError> {
        let scope = SpillScope::new(partition.clone(), epoch);
        if !self.channel.exists(&scope) {
            return Ok(Vec::new());
        }
        self.read_scope(&scope)
    }

    fn read_scope(&self, scope: &SpillScope) -> Result<Vec<Record>, EngineError> {
        let mut reader = self.channel.open_read(scope)?;
        let mut records = Vec::new();
        while let Some(frame) = framing::read_frame(&mut reader)? {
            records.push(self.codec.decode(&frame)?);
        }
        Ok(records)
    }

    /// The host durably committed `epoch`: drop sealed bookkeeping up to
    /// it and garbage-collect superseded spill scopes. The committed
    /// epoch's scope stays — it is the recovery point until the next
    /// commit supersedes it.
    pub fn epoch_committed(&mut self, epoch: EpochId) -> Result<(), EngineError> {
        for (partition, shard) in &mut self.shards {
            let mut committed = Vec::new();
            let mut retained = Vec::new();
            for sealed in shard.sealed.drain(..) {
                if sealed.epoch() <= epoch {
                    committed.push(sealed);
                } else {
                    retained.push(sealed);
                }
            }
            shard.sealed = retained;

            let Some(latest) = committed.last().cloned() else {
                continue;
            };
            for stale in &committed[..committed.len() - 1] {
                remove_scope(self.channel.as_ref(), stale)?;
            }
            if let Some(prev) = self.recovery.insert(partition.clone(), latest.clone()) {
                if prev.epoch() < latest.epoch() {
                    remove_scope(self.channel.as_ref(), &prev)?;
                }
            }
            tracing::debug!(partition = %partition, epoch = %latest.epoch(),
                "advanced feedback recovery point");
        }
        Ok(())
    }

    /// The recovery point of a partition, if any epoch was committed.
    pub fn recovery_point(&self, partition: &PartitionKey) -> Option<&SealedEpoch> {
        self.recovery.get(partition)
    }
}

fn remove_scope(channel: &dyn StorageChannel, sealed: &SealedEpoch) -> Result<(), EngineError> {
    if sealed.is_empty() {
        return Ok(());
    }
    channel.remove(&sealed.scope)?;
    Ok(())
}
