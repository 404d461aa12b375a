use anyhow::Result;
use serde_json::{Map, Value};

use crate::models::{ChangeKind, Decision, PendingChangeRecord, SystemHealth};

/// The authenticated backend operations the workflows depend on.
///
/// `ApiClient` is the production implementation. Workflows take the backend
/// as a parameter so they can be driven without a network.
#[allow(async_fn_in_trait)]
pub trait ChangeBackend {
    async fn fetch_pending(&self, kind: ChangeKind) -> Result<Vec<PendingChangeRecord>>;

    async fn submit_decision(&self, kind: ChangeKind, decision: &Decision) -> Result<()>;

    /// Load a member record as the backend stores it
    async fn fetch_member(&self, membership_id: &str) -> Result<Value>;

    /// Apply a partial member patch, returning the updated record
    async fn update_member(&self, patch: &Map<String, Value>) -> Result<Value>;

    async fn fetch_system_health(&self) -> Result<SystemHealth>;
}
