use tracing::{debug, info, warn};

use crate::changes::{extract_changes, ChangeDescriptor, ExtractorProfile};
use crate::models::{ChangeKind, Decision, RecordId};

use super::backend::ChangeBackend;
use super::error::{ValidationError, WorkflowError};
use super::queue::{ApprovalQueue, QueueEvent};

/// Review and decide the pending changes of one record family.
///
/// The queue only changes after the backend accepts a request; a failed call
/// leaves it exactly as it was.
pub struct ApprovalWorkflow<B: ChangeBackend> {
    backend: B,
    kind: ChangeKind,
    profile: ExtractorProfile,
    queue: ApprovalQueue,
}

impl<B: ChangeBackend> ApprovalWorkflow<B> {
    pub fn new(backend: B, kind: ChangeKind) -> Self {
        Self {
            backend,
            kind,
            profile: ExtractorProfile::for_kind(kind),
            queue: ApprovalQueue::default(),
        }
    }

    pub fn with_profile(mut self, profile: ExtractorProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn queue(&self) -> &ApprovalQueue {
        &self.queue
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Reload the queue from the backend, returning how many records arrived
    pub async fn refresh(&mut self) -> Result<usize, WorkflowError> {
        let records = self.backend.fetch_pending(self.kind).await.map_err(|e| {
            warn!(kind = %self.kind, error = %e, "Failed to fetch pending changes");
            WorkflowError::Network(e)
        })?;
        let count = records.len();
        self.transition(QueueEvent::Loaded(records));
        debug!(kind = %self.kind, count = count, pending = self.queue.pending_count(), "Queue refreshed");
        Ok(count)
    }

    /// Human-readable summary of what a pending change would do
    pub fn review(&self, id: &RecordId) -> Result<Vec<ChangeDescriptor>, ValidationError> {
        let record = self
            .queue
            .get(id)
            .ok_or_else(|| ValidationError::UnknownChange(id.clone()))?;
        Ok(extract_changes(&record.updated_data, &self.profile))
    }

    pub async fn approve(&mut self, id: &RecordId) -> Result<(), WorkflowError> {
        let record_id = self.queue.check_decidable(id)?.id.clone();
        self.submit(Decision::approve(record_id)).await?;
        self.transition(QueueEvent::Approved(id.clone()));
        info!(kind = %self.kind, id = %id, "Change approved");
        Ok(())
    }

    /// Decline a change. A blank reason is rejected without contacting the backend.
    pub async fn decline(&mut self, id: &RecordId, reason: &str) -> Result<(), WorkflowError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::EmptyDeclineReason.into());
        }
        let record_id = self.queue.check_decidable(id)?.id.clone();
        self.submit(Decision::decline(record_id, reason)).await?;
        self.transition(QueueEvent::Declined {
            id: id.clone(),
            reason: reason.to_string(),
        });
        info!(kind = %self.kind, id = %id, "Change declined");
        Ok(())
    }

    async fn submit(&self, decision: Decision) -> Result<(), WorkflowError> {
        self.backend
            .submit_decision(self.kind, &decision)
            .await
            .map_err(|e| {
                warn!(kind = %self.kind, id = %decision.id, error = %e, "Decision was not accepted");
                WorkflowError::Network(e)
            })
    }

    fn transition(&mut self, event: QueueEvent) {
        self.queue = std::mem::take(&mut self.queue).apply(event);
    }
}
