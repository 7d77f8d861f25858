use crate::address::Address;
use crate::checkpoint::EpochId;

/// Opaque typed bytes. The fabric never interprets the contents; the type
/// url is carried so the dispatch stage can pick a deserializer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Payload {
    pub type_url: String,
    pub bytes: Vec<u8>,
}

impl Payload {
    pub fn new(type_url: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            type_url: type_url.into(),
            bytes,
        }
    }

    pub fn empty(type_url: impl Into<String>) -> Self {
        Self::new(type_url, Vec::new())
    }
}

/// The envelope that moves through the pipeline.
///
/// Immutable once constructed; ownership transfers on every hand-off
/// between stages. A barrier record marks a checkpoint boundary and carries
/// the epoch it closes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Record {
    source: Address,
    target: Address,
    payload: Payload,
    barrier: Option<EpochId>,
}

const BARRIER_TYPE_URL: &str = "reflux.internal/barrier";

impl Record {
    pub fn envelope(source: Address, target: Address, payload: Payload) -> Self {
        Self {
            source,
            target,
            payload,
            barrier: None,
        }
    }

    /// A checkpoint barrier materialized as an in-band record.
    pub fn barrier(epoch: EpochId) -> Self {
        let origin = Address::new("reflux.internal", "barrier", epoch.0.to_string());
        Self {
            source: origin.clone(),
            target: origin,
            payload: Payload::empty(BARRIER_TYPE_URL),
            barrier: Some(epoch),
        }
    }

    pub fn source(&self) -> &Address {
        &self.source
    }

    pub fn target(&self) -> &Address {
        &self.target
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn is_barrier(&self) -> bool {
        self.barrier.is_some()
    }

    /// The epoch this barrier closes, if this is a barrier record.
    pub fn barrier_epoch(&self) -> Option<EpochId> {
        self.barrier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barrier_carries_its_epoch() {
        let b = Record::barrier(EpochId(7));
        assert!(b.is_barrier());
        assert_eq!(b.barrier_epoch(), Some(EpochId(7)));
    }

    #[test]
    fn envelope_is_not_a_barrier() {
        let r = Record::envelope(
            Address::new("ns", "a", "1"),
            Address::new("ns", "b", "2"),
            Payload::empty("test/none"),
        );
        assert!(!r.is_barrier());
        assert_eq!(r.barrier_epoch(), None);
    }
}
