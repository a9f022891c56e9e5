//! Error taxonomy
//!
//! One enum per failure domain. Extractor failures never leave the engine
//! loop; persistence failures carry the already-computed decision so a
//! caller can tell "scored but not persisted" from "not scored at all".

use crate::score::ScoreResult;

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures visible to callers of the detection API.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The observation is structurally invalid. Raised before any extractor
    /// runs.
    #[error("invalid observation: {0}")]
    InvalidObservation(String),

    /// A decision was computed but the risk record could not be persisted.
    /// The finalized result is carried along so upstream logic can still
    /// act on it.
    #[error("decision computed but risk record persistence failed: {source}")]
    Persistence {
        result: Box<ScoreResult>,
        #[source]
        source: StoreError,
    },

    /// A spawned detection task was lost (bulk path only).
    #[error("detection task failed: {0}")]
    TaskFailed(String),
}

/// Entity store failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("entity store unavailable: {0}")]
    Unavailable(String),

    #[error("entity store rejected write: {0}")]
    WriteRejected(String),
}

/// Signal extractor failures. Recovered locally by the engine: the failing
/// extractor contributes zero signals.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtractError {
    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("dependency unavailable: {0}")]
    Unavailable(String),
}

/// Per-target integration dispatch failures. Logged, never fatal.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
    #[error("target timed out after {0} ms")]
    Timeout(u64),

    #[error("target returned status {0}")]
    Rejected(u16),

    #[error("transport error: {0}")]
    Transport(String),
}
