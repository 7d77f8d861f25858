use std::fmt;

/// Error kind for fabric capability errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Codec,
    Io,
    Storage,
}

/// Error returned by capability implementations (codecs, storage channels).
#[derive(Debug)]
pub struct FabricError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FabricError {
    pub fn codec(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Codec, message: msg.into() }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Io, message: msg.into() }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Storage, message: msg.into() }
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for FabricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FabricError {}

// ---------------------------------------------------------------------------
// From impls: standard error types → FabricError with correct ErrorKind
// ---------------------------------------------------------------------------

impl From<std::io::Error> for FabricError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e.to_string())
    }
}

impl From<serde_json::Error> for FabricError {
    fn from(e: serde_json::Error) -> Self {
        Self::codec(e.to_string())
    }
}
