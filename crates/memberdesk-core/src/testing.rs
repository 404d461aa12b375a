//! In-memory backend for workflow tests.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use serde_json::{json, Map, Value};

use crate::models::{ChangeKind, Decision, PendingChangeRecord, SystemHealth};
use crate::workflow::ChangeBackend;

/// A backend call, as recorded by `FakeBackend`
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FetchPending(ChangeKind),
    SubmitDecision(ChangeKind, Decision),
    FetchMember(String),
    UpdateMember(Map<String, Value>),
    FetchHealth,
}

#[derive(Default)]
pub struct FakeBackend {
    pub pending: HashMap<ChangeKind, Vec<PendingChangeRecord>>,
    pub member: Option<Value>,
    /// Returned by `update_member` instead of the merged record
    pub update_response: Option<Value>,
    pub health: Option<SystemHealth>,
    /// Every call fails with a network error
    pub offline: bool,
    /// Only fetches of this kind fail
    pub failing_kind: Option<ChangeKind>,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    pub fn with_pending(mut self, kind: ChangeKind, records: Vec<PendingChangeRecord>) -> Self {
        self.pending.insert(kind, records);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: Call) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.offline {
            Err(anyhow!("connection refused"))
        } else {
            Ok(())
        }
    }
}

impl ChangeBackend for FakeBackend {
    async fn fetch_pending(&self, kind: ChangeKind) -> Result<Vec<PendingChangeRecord>> {
        self.record(Call::FetchPending(kind))?;
        if self.failing_kind == Some(kind) {
            return Err(anyhow!("{} endpoint unavailable", kind));
        }
        Ok(self.pending.get(&kind).cloned().unwrap_or_default())
    }

    async fn submit_decision(&self, kind: ChangeKind, decision: &Decision) -> Result<()> {
        self.record(Call::SubmitDecision(kind, decision.clone()))
    }

    async fn fetch_member(&self, membership_id: &str) -> Result<Value> {
        self.record(Call::FetchMember(membership_id.to_string()))?;
        self.member
            .clone()
            .ok_or_else(|| anyhow!("member {} not found", membership_id))
    }

    async fn update_member(&self, patch: &Map<String, Value>) -> Result<Value> {
        self.record(Call::UpdateMember(patch.clone()))?;
        if let Some(ref response) = self.update_response {
            return Ok(response.clone());
        }
        let mut updated = self.member.clone().unwrap_or_else(|| json!({}));
        if let Some(obj) = updated.as_object_mut() {
            for (key, value) in patch {
                obj.insert(key.clone(), value.clone());
            }
        }
        Ok(updated)
    }

    async fn fetch_system_health(&self) -> Result<SystemHealth> {
        self.record(Call::FetchHealth)?;
        self.health.clone().ok_or_else(|| anyhow!("health endpoint returned 503"))
    }
}

/// A pending member-style change touching one field
pub fn pending_record(id: i64, subject: &str) -> PendingChangeRecord {
    serde_json::from_value(json!({
        "id": id,
        "membershipId": subject,
        "approvalStatus": "PENDING",
        "updatedData": {"firmName": format!("Firm {}", id)},
        "modifiedBy": "clerk",
        "modifiedAt": format!("2024-03-{:02}T10:00:00.000Z", id.clamp(1, 28)),
    }))
    .expect("test record should deserialize")
}
