use crate::flight::Operation;
use thiserror::Error;

/// Failures of the import/query workflow.
///
/// Remote failures carry the text meant for the user: the service's own
/// message when it sent one, a generic network message otherwise.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("{0}")]
    RemoteImportFailure(String),
    #[error("{0}")]
    RemoteSearchFailure(String),
    #[error("speech capture failed: {0}")]
    MediaCaptureFailure(String),
    #[error("speech capture is not available on this host")]
    UnsupportedCapability,
    #[error("{0} already in progress")]
    Busy(Operation),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
