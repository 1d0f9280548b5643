//! Error types

use thiserror::Error;

/// Errors reported by fallible tree operations.
///
/// Most engine operations never fail: unknown ids are ignored. Only loading
/// data and configuring the search surface can be rejected.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The same id appears more than once and strict id checking is on.
    #[error("duplicate node id '{0}'")]
    DuplicateId(String),

    /// A search key has no registered field extractor.
    #[error("unknown search key '{0}'")]
    UnknownSearchKey(String),

    /// Tree data could not be parsed.
    #[error("invalid tree data: {0}")]
    Deserialize(#[from] serde_json::Error),
}
