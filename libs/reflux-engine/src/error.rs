use reflux_api::error::FabricError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("fabric error: {0}")]
    Fabric(#[from] FabricError),

    #[error("feedback channel closed")]
    FeedbackClosed,

    #[error("feedback channel full")]
    FeedbackFull,

    #[error("dispatch error for '{kind}': {message}")]
    Dispatch { kind: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// For `Fabric`, context is added to the inner error. For other
    /// variants, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            EngineError::IllegalState(msg) => EngineError::IllegalState(format!("{ctx}: {msg}")),
            EngineError::Fabric(e) => EngineError::Fabric(e.with_context(ctx)),
            EngineError::Dispatch { kind, message } => EngineError::Dispatch {
                kind,
                message: format!("{ctx}: {message}"),
            },
            other => other,
        }
    }
}
