use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::diff::{compute_diff, has_changes, DiffSchema};

use super::backend::ChangeBackend;
use super::error::{ValidationError, WorkflowError};

/// An edit form over one record: the snapshot as loaded, diffed against
/// whatever the admin submits.
#[derive(Debug, Clone)]
pub struct EditSession {
    schema: DiffSchema,
    original: Option<Value>,
}

impl EditSession {
    pub fn new(schema: DiffSchema) -> Self {
        Self { schema, original: None }
    }

    pub fn member() -> Self {
        Self::new(DiffSchema::member())
    }

    pub fn load(&mut self, original: Value) {
        self.original = Some(original);
    }

    pub fn original(&self) -> Option<&Value> {
        self.original.as_ref()
    }

    pub async fn load_from<B: ChangeBackend>(&mut self, backend: &B, membership_id: &str) -> Result<(), WorkflowError> {
        let record = backend.fetch_member(membership_id).await.map_err(|e| {
            warn!(membership_id = membership_id, error = %e, "Failed to load member");
            WorkflowError::Network(e)
        })?;
        debug!(membership_id = membership_id, "Member loaded for editing");
        self.load(record);
        Ok(())
    }

    /// Whether `current` differs from the loaded snapshot
    pub fn has_changes(&self, current: &Value) -> bool {
        self.original
            .as_ref()
            .is_some_and(|original| has_changes(original, current, &self.schema))
    }

    /// Build the patch to send, with the record's identity key included
    pub fn prepare_patch(&self, current: &Value) -> Result<Map<String, Value>, ValidationError> {
        let original = self.original.as_ref().ok_or(ValidationError::OriginalNotLoaded)?;
        if !has_changes(original, current, &self.schema) {
            return Err(ValidationError::NoChanges);
        }

        let mut patch = compute_diff(original, current, &self.schema).into_json();
        if let Some(ref key) = self.schema.identity_key {
            if let Some(id) = original.get(key.as_str()) {
                patch.insert(key.clone(), id.clone());
            }
        }
        Ok(patch)
    }

    /// Whether a backend response is the record itself rather than an acknowledgement
    fn is_record(&self, value: &Value) -> bool {
        match (&self.schema.identity_key, value.as_object()) {
            (Some(key), Some(obj)) => obj.contains_key(key.as_str()),
            (None, Some(_)) => true,
            (_, None) => false,
        }
    }

    /// Send the patch. On success the backend's record becomes the new snapshot.
    pub async fn submit<B: ChangeBackend>(&mut self, backend: &B, current: &Value) -> Result<Value, WorkflowError> {
        let patch = self.prepare_patch(current)?;
        let updated = backend.update_member(&patch).await.map_err(|e| {
            warn!(error = %e, "Member update was not accepted");
            WorkflowError::Network(e)
        })?;
        info!(fields = patch.len(), "Member updated");

        // Some backends acknowledge without echoing the record
        let snapshot = if self.is_record(&updated) { updated } else { current.clone() };
        self.original = Some(snapshot.clone());
        Ok(snapshot)
    }
}
