/// Compile-time addressing errors: reported immediately to the caller that
/// requested compilation, never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("malformed path '{path}': {reason}")]
    Malformed { path: String, reason: String },

    #[error("unknown field '{field}' in message '{message_type}'")]
    UnknownField { field: String, message_type: String },

    #[error("field '{field}' is not repeated and cannot be indexed")]
    NotRepeated { field: String },

    #[error("repeated field '{field}' needs an index to be traversed")]
    UnindexedRepeated { field: String },

    #[error("field '{field}' is not a message and cannot be traversed")]
    NotAMessage { field: String },
}

/// Runtime addressing errors: surfaced per message, aborting only that
/// message's routing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldAccessError {
    #[error("index {index} out of range for repeated field '{field}' (len {len})")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },

    #[error("field '{field}' does not hold a renderable scalar")]
    NotScalar { field: String },

    #[error("unexpected value shape for field '{field}'")]
    Shape { field: String },
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("malformed template '{template}': {reason}")]
    Malformed { template: String, reason: String },

    #[error(transparent)]
    Path(#[from] PathError),
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Access(#[from] FieldAccessError),

    #[error("rendered address '{rendered}' lacks namespace/name/id segments")]
    AddressShape { rendered: String },
}
