use reflux_api::address::PartitionKey;
use reflux_api::checkpoint::{CheckpointListener, EpochId};
use reflux_api::error::FabricError;
use reflux_api::record::Record;

use crate::channel::FeedbackReceiver;
use crate::error::EngineError;
use crate::logger::FeedbackLogger;

/// The merge point: presents one stream per partition combining external
/// ingest with looped-back feedback.
///
/// Feedback drains first — a looped-back record never waits behind
/// external input — and every feedback record is appended to the logger as
/// it passes through, attributing it to the open epoch. A barrier on the
/// external input seals the open epochs before it is forwarded, which pins
/// each feedback record to the epoch it belongs to for recovery. Records
/// appended after the barrier belong strictly to the next epoch.
pub struct FeedbackUnion {
    logger: FeedbackLogger,
    feedback: FeedbackReceiver,
}

impl FeedbackUnion {
    pub fn new(logger: FeedbackLogger, feedback: FeedbackReceiver) -> Self {
        Self { logger, feedback }
    }

    pub fn start_logging(
        &mut self,
        partition: PartitionKey,
        epoch: EpochId,
    ) -> Result<(), EngineError> {
        self.logger.start_logging(partition, epoch)
    }

    pub fn logger(&self) -> &FeedbackLogger {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut FeedbackLogger {
        &mut self.logger
    }

    /// Pull the next merged record: pending feedback first, then the
    /// external input. Returns `None` once both are exhausted.
    pub fn next(
        &mut self,
        external: &mut dyn Iterator<Item = Record>,
    ) -> Result<Option<Record>, EngineError> {
        if let Some(record) = self.feedback.try_recv() {
            self.logger.append(&record)?;
            return Ok(Some(record));
        }

        let Some(record) = external.next() else {
            return Ok(None);
        };
        if let Some(epoch) = record.barrier_epoch() {
            let sealed = self.logger.seal_all(epoch)?;
            for entry in &sealed {
                tracing::trace!(partition = %entry.partition(), epoch = %entry.epoch(),
                    records = entry.records(), "sealed at barrier");
            }
        }
        Ok(Some(record))
    }
}

impl CheckpointListener for FeedbackUnion {
    fn checkpoint_started(&mut self, epoch: EpochId) -> Result<(), FabricError> {
        tracing::trace!(epoch = %epoch, "checkpoint started");
        Ok(())
    }

    fn checkpoint_committed(&mut self, epoch: EpochId) -> Result<(), FabricError> {
        self.logger
            .epoch_committed(epoch)
            .map_err(|e| FabricError::storage(e.to_string()))
    }

    fn checkpoint_rolled_back(&mut self, epoch: EpochId) -> Result<(), FabricError> {
        // The host restores the worker and replays from the last committed
        // epoch; nothing to unwind locally.
        tracing::warn!(epoch = %epoch, "checkpoint rolled back");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::feedback_channel;
    use crate::logger::FeedbackLogger;
    use crate::spill::InMemoryChannel;
    use reflux_api::address::Address;
    use reflux_api::codec::JsonRecordCodec;
    use reflux_api::record::Payload;
    use std::sync::Arc;

    fn target() -> Address {
        Address::new("test.ns", "looper", "1")
    }

    fn partition() -> PartitionKey {
        target().partition_key()
    }

    fn feedback_record(tag: u8) -> Record {
        Record::envelope(
            target(),
            target(),
            Payload::new("test/tag", vec![tag]),
        )
    }

    fn union() -> (FeedbackUnion, crate::channel::FeedbackSender) {
        let logger = FeedbackLogger::new(
            Arc::new(JsonRecordCodec),
            Arc::new(InMemoryChannel::new()),
            usize::MAX,
        );
        let (tx, rx) = feedback_channel(8);
        (FeedbackUnion::new(logger, rx), tx)
    }

    #[test]
    fn feedback_drains_before_external_input() {
        let (mut union, tx) = union();
        union.start_logging(partition(), EpochId(0)).unwrap();

        tx.try_send(feedback_record(1)).unwrap();
        let mut external = vec![feedback_record(2)].into_iter();

        let first = union.next(&mut external).unwrap().unwrap();
        assert_eq!(first.payload().bytes, vec![1]);
        let second = union.next(&mut external).unwrap().unwrap();
        assert_eq!(second.payload().bytes, vec![2]);
        assert!(union.next(&mut external).unwrap().is_none());
    }

    #[test]
    fn barrier_pins_feedback_to_its_epoch() {
        let (mut union, tx) = union();
        union.start_logging(partition(), EpochId(0)).unwrap();

        // One feedback record before the barrier, one after.
        tx.try_send(feedback_record(1)).unwrap();
        let mut external = vec![Record::barrier(EpochId(0))].into_iter();

        let first = union.next(&mut external).unwrap().unwrap();
        assert_eq!(first.payload().bytes, vec![1]);

        let barrier = union.next(&mut external).unwrap().unwrap();
        assert!(barrier.is_barrier());

        tx.try_send(feedback_record(2)).unwrap();
        let late = union.next(&mut external).unwrap().unwrap();
        assert_eq!(late.payload().bytes, vec![2]);

        let second_seal = union
            .logger_mut()
            .seal_epoch(&partition(), EpochId(1))
            .unwrap();

        let sealed = union.logger().sealed(&partition()).to_vec();
        assert_eq!(sealed.len(), 2);
        assert_eq!(sealed[0].epoch(), EpochId(0));

        let epoch0 = union.logger().replay(&sealed[0]).unwrap();
        assert_eq!(epoch0.len(), 1);
        assert_eq!(epoch0[0].payload().bytes, vec![1]);

        let epoch1 = union.logger().replay(&second_seal).unwrap();
        assert_eq!(epoch1.len(), 1);
        assert_eq!(epoch1[0].payload().bytes, vec![2]);
    }

    #[test]
    fn feedback_for_an_unopened_partition_is_illegal() {
        let (mut union, tx) = union();
        // No start_logging.
        tx.try_send(feedback_record(1)).unwrap();
        let mut external = std::iter::empty();

        let err = union.next(&mut external).unwrap_err();
        assert!(matches!(err, EngineError::IllegalState(_)));
    }

    #[test]
    fn commit_notification_advances_the_recovery_point() {
        let (mut union, tx) = union();
        union.start_logging(partition(), EpochId(0)).unwrap();

        tx.try_send(feedback_record(1)).unwrap();
        let mut external = vec![Record::barrier(EpochId(0))].into_iter();
        union.next(&mut external).unwrap();
        union.next(&mut external).unwrap();

        union.checkpoint_committed(EpochId(0)).unwrap();
        assert!(union.logger().recovery_point(&partition()).is_some());
    }
}
