use thiserror::Error;

use crate::types::Gid;

/// Errors surfaced by the edge boundary computation and its collaborators.
///
/// Unresolvable external ids and non-local vertices are not errors; they are
/// dropped where they are found and never reach this type.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// The vertex id list could not be decoded into an array of scalar ids.
    #[error("malformed vertex list: {0}")]
    MalformedInput(#[from] serde_json::Error),

    /// A global id in the merged boundary has no external id.
    #[error("no external id for global id {0:#x}")]
    UnknownGlobalId(Gid),

    /// A peer dropped out of a collective.
    #[error("communication failure on worker {worker}: {reason}")]
    Communication { worker: usize, reason: String },

    /// A collective payload could not be encoded or decoded.
    #[error("payload codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A graph file line could not be parsed.
    #[error("graph format error at line {line}: {reason}")]
    GraphFormat { line: usize, reason: String },

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    /// A configuration value is outside its valid range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("worker {0} panicked")]
    WorkerPanicked(usize),
}

pub type Result<T> = std::result::Result<T, BoundaryError>;
