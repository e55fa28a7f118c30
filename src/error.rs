use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors raised by the loading engine.
///
/// Only failures of the event stream itself (or misuse of the schema
/// contract) abort a load. Everything recoverable (mapping misses, value
/// conversion failures, unresolved references, bad configuration values)
/// is reported as a [`ParseWarning`](crate::loader::ParseWarning) and the
/// parse continues with best-effort partial results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum FlexmodError {
    /// The structural event stream is malformed or its source failed.
    #[error("Malformed event stream: {0}")]
    Stream(String),
    /// Same as [`FlexmodError::Stream`], with the offending line attached.
    #[error("Malformed event stream at line {0}: {1}")]
    StreamAt(u32, String),
    /// The schema provider rejected an operation (abstract instantiation,
    /// foreign handle, invalid package definition).
    #[error("Schema error: {0}")]
    Schema(String),
}

impl FlexmodError {
    /// Attach a line number to a bare [`FlexmodError::Stream`] error.
    pub fn at_line(self, line: u32) -> Self {
        match self {
            FlexmodError::Stream(message) => FlexmodError::StreamAt(line, message),
            other => other,
        }
    }
}
