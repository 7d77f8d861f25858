use std::sync::Arc;

use reflux_api::codec::RecordCodec;
use reflux_api::storage::StorageChannel;

use crate::channel::{FeedbackSender, feedback_channel};
use crate::config::EngineConfig;
use crate::dispatch::{EgressSink, HandlerLoader, HandlerRepository};
use crate::error::EngineError;
use crate::logger::FeedbackLogger;
use crate::spill::{DiskChannel, InMemoryChannel};
use crate::union::FeedbackUnion;
use crate::worker::Worker;

/// Assemble a worker from configuration.
///
/// Returns the worker plus a second handle to the write-back edge, for
/// hosts that run the dispatch stage on its own thread and feed the loop
/// from outside the run loop.
pub fn worker(
    config: &EngineConfig,
    codec: Arc<dyn RecordCodec>,
    loader: Box<dyn HandlerLoader>,
    egress: Box<dyn EgressSink>,
) -> Result<(Worker, FeedbackSender), EngineError> {
    if config.feedback_capacity == 0 {
        return Err(EngineError::Config(
            "feedback_capacity must be at least 1".to_string(),
        ));
    }

    let channel: Arc<dyn StorageChannel> = match &config.spill_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "spilling feedback epochs to disk");
            Arc::new(DiskChannel::new(dir)?)
        }
        None => Arc::new(InMemoryChannel::new()),
    };

    let (sender, receiver) = feedback_channel(config.feedback_capacity);
    let logger = FeedbackLogger::new(codec, channel, config.memory_budget_bytes);
    let union = FeedbackUnion::new(logger, receiver);
    let worker = Worker::new(
        union,
        HandlerRepository::new(loader),
        sender.clone(),
        egress,
    );

    tracing::info!(
        budget = config.memory_budget_bytes,
        capacity = config.feedback_capacity,
        "feedback worker ready"
    );
    Ok((worker, sender))
}
