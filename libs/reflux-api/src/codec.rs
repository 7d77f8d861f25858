use crate::error::FabricError;
use crate::record::Record;

/// Host-supplied record serializer.
///
/// The feedback buffer passes every record through the codec before it
/// touches a backing store, so the buffer stays agnostic to payload shape.
/// `encode` appends to `buf` without clearing it.
pub trait RecordCodec: Send + Sync {
    fn encode(&self, record: &Record, buf: &mut Vec<u8>) -> Result<(), FabricError>;

    fn decode(&self, bytes: &[u8]) -> Result<Record, FabricError>;
}

/// Default codec: records as JSON documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRecordCodec;

impl RecordCodec for JsonRecordCodec {
    fn encode(&self, record: &Record, buf: &mut Vec<u8>) -> Result<(), FabricError> {
        serde_json::to_writer(buf, record)?;
        Ok(())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Record, FabricError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
