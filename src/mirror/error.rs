//! Mirror Error Types
//!
//! Never returned to a mutating requester. They are logged and kept in the
//! recent-failure log read by `reconcile`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    #[error("Mirror sync failed: {0}")]
    SyncFailure(String),

    #[error("Mirror call timed out after {0} ms")]
    Timeout(u64),

    #[error("Mirror queue full ({0} jobs pending)")]
    QueueFull(usize),
}

impl MirrorError {
    pub fn code(&self) -> &'static str {
        match self {
            MirrorError::SyncFailure(_) => "MIRROR_SYNC_FAILURE",
            MirrorError::Timeout(_) => "MIRROR_TIMEOUT",
            MirrorError::QueueFull(_) => "MIRROR_QUEUE_FULL",
        }
    }
}

impl From<reqwest::Error> for MirrorError {
    fn from(e: reqwest::Error) -> Self {
        MirrorError::SyncFailure(e.to_string())
    }
}

impl From<serde_json::Error> for MirrorError {
    fn from(e: serde_json::Error) -> Self {
        MirrorError::SyncFailure(format!("invalid mirror payload: {}", e))
    }
}
