use std::collections::HashMap;
use std::collections::hash_map::Entry;

use reflux_api::address::FunctionKind;
use reflux_api::record::Record;

use crate::error::EngineError;

/// Dispatch-stage output, tagged with its routing fate.
#[derive(Debug)]
pub enum Output {
    /// Terminal output bound for an external sink.
    External(Record),
    /// Loop-back: re-enters the pipeline as new input.
    Feedback(Record),
}

/// Per-destination-type logic, invoked for every merged record of that
/// kind. Implementations are external collaborators; the fabric only
/// routes what they emit.
pub trait Handler: Send {
    fn invoke(&mut self, record: Record) -> Result<Vec<Output>, EngineError>;
}

/// Instantiates handler objects on demand.
pub trait HandlerLoader: Send {
    fn load(&self, kind: &FunctionKind) -> Result<Box<dyn Handler>, EngineError>;
}

/// Consumer of terminal output (and forwarded barriers).
pub trait EgressSink: Send {
    fn emit(&mut self, record: Record) -> Result<(), EngineError>;
}

/// Arena of handler instances keyed by destination kind.
///
/// A handler is loaded on first use and reused for the lifetime of the
/// worker. The arena is scoped to the worker, not the process.
pub struct HandlerRepository {
    loader: Box<dyn HandlerLoader>,
    instances: HashMap<FunctionKind, Box<dyn Handler>>,
}

impl HandlerRepository {
    pub fn new(loader: Box<dyn HandlerLoader>) -> Self {
        Self {
            loader,
            instances: HashMap::new(),
        }
    }

    pub fn get(&mut self, kind: &FunctionKind) -> Result<&mut dyn Handler, EngineError> {
        match self.instances.entry(kind.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_mut()),
            Entry::Vacant(slot) => {
                let handler = self.loader.load(kind)?;
                tracing::debug!(kind = %kind, "instantiated handler");
                Ok(slot.insert(handler).as_mut())
            }
        }
    }
}
