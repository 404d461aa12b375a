use thiserror::Error;

use crate::models::{ApprovalStatus, RecordId};

/// Problems caught locally, before anything is sent to the backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("A reason is required to decline a change")]
    EmptyDeclineReason,

    #[error("No changes detected")]
    NoChanges,

    #[error("The original record has not been loaded")]
    OriginalNotLoaded,

    #[error("No pending change with id {0}")]
    UnknownChange(RecordId),

    #[error("Change {0} has already been {1}")]
    AlreadyDecided(RecordId, ApprovalStatus),
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Backend request failed: {0:#}")]
    Network(anyhow::Error),
}

impl WorkflowError {
    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::Validation(_))
    }
}
