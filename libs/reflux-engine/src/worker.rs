use reflux_api::record::Record;

use crate::channel::FeedbackSender;
use crate::dispatch::{EgressSink, HandlerRepository, Output};
use crate::error::EngineError;
use crate::union::FeedbackUnion;

/// Single-threaded per-partition run loop.
///
/// Drains the merged stream, invokes per-destination handlers, and routes
/// their output: terminal records to the egress sink, loop-back records
/// into the feedback channel. Record order is preserved end-to-end within
/// a partition.
pub struct Worker {
    union: FeedbackUnion,
    handlers: HandlerRepository,
    writeback: FeedbackSender,
    egress: Box<dyn EgressSink>,
}

impl Worker {
    pub fn new(
        union: FeedbackUnion,
        handlers: HandlerRepository,
        writeback: FeedbackSender,
        egress: Box<dyn EgressSink>,
    ) -> Self {
        Self {
            union,
            handlers,
            writeback,
            egress,
        }
    }

    pub fn union(&self) -> &FeedbackUnion {
        &self.union
    }

    pub fn union_mut(&mut self) -> &mut FeedbackUnion {
        &mut self.union
    }

    /// Process records until both the external input and the loop-back
    /// queue are exhausted. Barriers seal the feedback epochs at the merge
    /// point and are then forwarded to the egress sink.
    pub fn run(
        &mut self,
        external: impl IntoIterator<Item = Record>,
    ) -> Result<(), EngineError> {
        let mut external = external.into_iter();
        while let Some(record) = self.union.next(&mut external)? {
            if record.is_barrier() {
                self.egress.emit(record)?;
                continue;
            }

            let kind = record.target().kind();
            let handler = self.handlers.get(&kind)?;
            let outputs = handler
                .invoke(record)
                .map_err(|e| e.with_context(format!("handler '{kind}'")))?;

            for output in outputs {
                match output {
                    Output::External(out) => self.egress.emit(out)?,
                    // The loop-back queue is drained at the top of every
                    // turn, so capacity only has to cover one invocation's
                    // fan-out.
                    Output::Feedback(out) => self.writeback.try_send(out)?,
                }
            }
        }
        Ok(())
    }
}
