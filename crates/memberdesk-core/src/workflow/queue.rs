use crate::models::{ApprovalStatus, PendingChangeRecord, RecordId};

use super::error::ValidationError;

/// Something that happened to the queue
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// A fresh list arrived from the backend
    Loaded(Vec<PendingChangeRecord>),
    Approved(RecordId),
    Declined { id: RecordId, reason: String },
}

/// The pending changes of one record family, as last seen by the admin.
///
/// State only moves through `apply`, which returns the next queue; nothing
/// mutates records in place from the outside.
#[derive(Debug, Clone, Default)]
pub struct ApprovalQueue {
    records: Vec<PendingChangeRecord>,
}

impl ApprovalQueue {
    pub fn new(records: Vec<PendingChangeRecord>) -> Self {
        Self { records }
    }

    pub fn apply(mut self, event: QueueEvent) -> Self {
        match event {
            QueueEvent::Loaded(records) => self.records = records,
            QueueEvent::Approved(id) => self.set_status(&id, ApprovalStatus::Approved, None),
            QueueEvent::Declined { id, reason } => {
                self.set_status(&id, ApprovalStatus::Declined, Some(reason))
            }
        }
        self
    }

    fn set_status(&mut self, id: &RecordId, status: ApprovalStatus, reason: Option<String>) {
        if let Some(record) = self.records.iter_mut().find(|r| &r.id == id) {
            record.approval_status = status;
            if reason.is_some() {
                record.decline_reason = reason;
            }
        }
    }

    pub fn records(&self) -> &[PendingChangeRecord] {
        &self.records
    }

    pub fn get(&self, id: &RecordId) -> Option<&PendingChangeRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingChangeRecord> {
        self.records.iter().filter(|r| r.is_pending())
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ensure the record exists and still awaits a decision
    pub fn check_decidable(&self, id: &RecordId) -> Result<&PendingChangeRecord, ValidationError> {
        let record = self
            .get(id)
            .ok_or_else(|| ValidationError::UnknownChange(id.clone()))?;
        if record.is_pending() {
            Ok(record)
        } else {
            Err(ValidationError::AlreadyDecided(id.clone(), record.approval_status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::pending_record;

    fn queue() -> ApprovalQueue {
        ApprovalQueue::new(vec![pending_record(1, "TSM-1"), pending_record(2, "TSM-2")])
    }

    #[test]
    fn test_loaded_replaces_records() {
        let queue = queue().apply(QueueEvent::Loaded(vec![pending_record(9, "TSM-9")]));
        assert_eq!(queue.len(), 1);
        assert!(queue.get(&RecordId::from(9)).is_some());
        assert!(queue.get(&RecordId::from(1)).is_none());
    }

    #[test]
    fn test_approved_updates_status() {
        let queue = queue().apply(QueueEvent::Approved(RecordId::from("1")));
        let record = queue.get(&RecordId::from(1)).expect("record 1 should exist");
        assert_eq!(record.approval_status, ApprovalStatus::Approved);
        assert_eq!(queue.pending_count(), 1);
    }

    #[test]
    fn test_declined_records_reason() {
        let queue = queue().apply(QueueEvent::Declined {
            id: RecordId::from(2),
            reason: "Wrong GST number".to_string(),
        });
        let record = queue.get(&RecordId::from(2)).expect("record 2 should exist");
        assert_eq!(record.approval_status, ApprovalStatus::Declined);
        assert_eq!(record.decline_reason.as_deref(), Some("Wrong GST number"));
    }

    #[test]
    fn test_event_for_unknown_id_is_ignored() {
        let queue = queue().apply(QueueEvent::Approved(RecordId::from(42)));
        assert_eq!(queue.pending_count(), 2);
    }

    #[test]
    fn test_check_decidable() {
        let queue = queue().apply(QueueEvent::Approved(RecordId::from(1)));
        assert_eq!(
            queue.check_decidable(&RecordId::from(1)).map(|r| r.id.clone()),
            Err(ValidationError::AlreadyDecided(RecordId::from(1), ApprovalStatus::Approved))
        );
        assert_eq!(
            queue.check_decidable(&RecordId::from(7)).map(|r| r.id.clone()),
            Err(ValidationError::UnknownChange(RecordId::from(7)))
        );
        assert!(queue.check_decidable(&RecordId::from(2)).is_ok());
    }
}
