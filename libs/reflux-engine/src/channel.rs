use reflux_api::record::Record;

use crate::error::EngineError;

/// Create the bounded in-memory loop-back queue connecting the write-back
/// stage to the merge point of the same worker.
///
/// `send` blocks when the queue is full — that is the backpressure edge:
/// the dispatch stage stops producing until the merge point drains. No
/// record is ever dropped.
pub fn feedback_channel(capacity: usize) -> (FeedbackSender, FeedbackReceiver) {
    let (tx, rx) = tokio::sync::mpsc::channel(capacity);
    (FeedbackSender { tx }, FeedbackReceiver { rx })
}

/// Write-back half of the loop.
#[derive(Clone)]
pub struct FeedbackSender {
    tx: tokio::sync::mpsc::Sender<Record>,
}

impl FeedbackSender {
    /// Blocking hand-off into the loop-back queue. For callers running on
    /// their own thread (the usual co-located write-back stage).
    pub fn send(&self, record: Record) -> Result<(), EngineError> {
        self.tx
            .blocking_send(record)
            .map_err(|_| EngineError::FeedbackClosed)
    }

    /// Non-blocking hand-off, for callers that drive both ends of the
    /// queue from one thread and must not park on themselves.
    pub fn try_send(&self, record: Record) -> Result<(), EngineError> {
        use tokio::sync::mpsc::error::TrySendError;
        match self.tx.try_send(record) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(EngineError::FeedbackFull),
            Err(TrySendError::Closed(_)) => Err(EngineError::FeedbackClosed),
        }
    }
}

/// Merge-point half of the loop.
pub struct FeedbackReceiver {
    rx: tokio::sync::mpsc::Receiver<Record>,
}

impl FeedbackReceiver {
    /// Drain one pending record if immediately available.
    pub fn try_recv(&mut self) -> Option<Record> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflux_api::address::Address;
    use reflux_api::record::Payload;

    fn record(id: &str) -> Record {
        Record::envelope(
            Address::new("ns", "src", "0"),
            Address::new("ns", "dst", id),
            Payload::empty("test/none"),
        )
    }

    #[test]
    fn queue_preserves_order() {
        let (tx, mut rx) = feedback_channel(4);
        tx.try_send(record("a")).unwrap();
        tx.try_send(record("b")).unwrap();

        assert_eq!(rx.try_recv().unwrap().target().id, "a");
        assert_eq!(rx.try_recv().unwrap().target().id, "b");
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn full_queue_refuses_instead_of_dropping() {
        let (tx, mut rx) = feedback_channel(1);
        tx.try_send(record("a")).unwrap();

        let err = tx.try_send(record("b")).unwrap_err();
        assert!(matches!(err, EngineError::FeedbackFull));

        // Draining frees the slot.
        assert!(rx.try_recv().is_some());
        tx.try_send(record("b")).unwrap();
    }
}
