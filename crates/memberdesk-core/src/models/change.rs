use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Identifier of a backend record.
///
/// The backend is inconsistent about ids: some endpoints send numbers,
/// others strings. Two ids are equal when their text forms are equal,
/// so `1` and `"1"` name the same record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    pub fn as_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        self.as_key() == other.as_key()
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_key().hash(state);
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(s.parse::<i64>()
            .map(RecordId::Number)
            .unwrap_or_else(|_| RecordId::Text(s.to_string())))
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Number(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Declined,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalStatus::Pending => write!(f, "Pending"),
            ApprovalStatus::Approved => write!(f, "Approved"),
            ApprovalStatus::Declined => write!(f, "Declined"),
            ApprovalStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "declined" => Ok(ApprovalStatus::Declined),
            other => Err(format!("unknown approval status: {}", other)),
        }
    }
}

/// A proposed edit to a record, awaiting admin approval.
///
/// Created by the backend whenever a user edits a member, billing, invoice
/// or labour record. The subject id arrives under a different key per record
/// family; billing and labour rows may also name the member they belong to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChangeRecord {
    #[serde(alias = "_id")]
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labour_id: Option<RecordId>,
    #[serde(default)]
    pub approval_status: ApprovalStatus,
    #[serde(default, deserialize_with = "null_as_empty_object")]
    pub updated_data: Map<String, Value>,
    // Some endpoints send the modifier's name, others an embedded user object
    #[serde(default)]
    pub modified_by: Option<Value>,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(default, alias = "note")]
    pub decline_reason: Option<String>,
}

fn null_as_empty_object<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl PendingChangeRecord {
    pub fn is_pending(&self) -> bool {
        self.approval_status == ApprovalStatus::Pending
    }

    /// Name of whoever made the change, for display
    pub fn modified_by_display(&self) -> String {
        match &self.modified_by {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::Object(user)) => ["name", "fullName", "username", "email"]
                .iter()
                .find_map(|key| user.get(*key).and_then(Value::as_str))
                .unwrap_or("Unknown")
                .to_string(),
            _ => "Unknown".to_string(),
        }
    }

    /// Id of the changed record. A family-specific id wins over the member
    /// id that billing and labour rows also carry.
    pub fn subject_id(&self) -> Option<&RecordId> {
        self.billing_id
            .as_ref()
            .or(self.invoice_id.as_ref())
            .or(self.labour_id.as_ref())
            .or(self.membership_id.as_ref())
    }

    pub fn subject_display(&self) -> String {
        self.subject_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// The record family a pending change belongs to.
///
/// Each family has its own fetch endpoint, response envelope and
/// approve/decline endpoint on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Member,
    Billing,
    Invoice,
    Labour,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 4] = [
        ChangeKind::Member,
        ChangeKind::Billing,
        ChangeKind::Invoice,
        ChangeKind::Labour,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ChangeKind::Member => "Member",
            ChangeKind::Billing => "Billing",
            ChangeKind::Invoice => "Invoice",
            ChangeKind::Labour => "Labour",
        }
    }

    /// Path of the pending-change list endpoint, relative to the API base URL
    pub fn fetch_path(&self) -> &'static str {
        match self {
            ChangeKind::Member => "member/get_member_changes/ALL",
            ChangeKind::Billing => "billing/get_bill_update_request",
            ChangeKind::Invoice => "invoice/get_update_request/ALL",
            ChangeKind::Labour => "labour/get_labour_change",
        }
    }

    /// Key wrapping the record list in the fetch response, if any
    pub fn envelope_key(&self) -> Option<&'static str> {
        match self {
            ChangeKind::Member => None,
            ChangeKind::Billing => Some("pendingRequest"),
            ChangeKind::Invoice => Some("invoiceChangeRequests"),
            ChangeKind::Labour => Some("LabourChanges"),
        }
    }

    pub fn decision_path(&self) -> &'static str {
        match self {
            ChangeKind::Member => "member/approve_decline_member_changes",
            ChangeKind::Billing => "billing/approve_decline_bill_update",
            ChangeKind::Invoice => "invoice/approve_decline_update_request",
            ChangeKind::Labour => "labour/approve_decline_labour_change",
        }
    }

    /// Field carrying the decline reason in a decision request
    pub fn reason_field(&self) -> &'static str {
        match self {
            ChangeKind::Member | ChangeKind::Invoice => "declineReason",
            ChangeKind::Billing | ChangeKind::Labour => "note",
        }
    }

    /// Key under which the changed record's id travels
    pub fn subject_key(&self) -> &'static str {
        match self {
            ChangeKind::Member => "membershipId",
            ChangeKind::Billing => "billingId",
            ChangeKind::Invoice => "invoiceId",
            ChangeKind::Labour => "labourId",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

impl FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" | "members" => Ok(ChangeKind::Member),
            "billing" | "bill" | "bills" => Ok(ChangeKind::Billing),
            "invoice" | "invoices" => Ok(ChangeKind::Invoice),
            "labour" | "labor" => Ok(ChangeKind::Labour),
            other => Err(format!(
                "unknown change kind '{}' (expected member, billing, invoice or labour)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionAction {
    Approved,
    Declined,
}

/// An admin verdict on one pending change
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub id: RecordId,
    pub action: DecisionAction,
    pub reason: Option<String>,
}

impl Decision {
    pub fn approve(id: RecordId) -> Self {
        Self {
            id,
            action: DecisionAction::Approved,
            reason: None,
        }
    }

    pub fn decline(id: RecordId, reason: impl Into<String>) -> Self {
        Self {
            id,
            action: DecisionAction::Declined,
            reason: Some(reason.into()),
        }
    }

    /// Build the request body for the given record family
    pub fn to_request_body(&self, kind: ChangeKind) -> Value {
        let mut body = Map::new();
        body.insert("id".to_string(), serde_json::json!(self.id));
        body.insert("action".to_string(), serde_json::json!(self.action));
        if let Some(ref reason) = self.reason {
            body.insert(kind.reason_field().to_string(), Value::String(reason.clone()));
        }
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_id_mixed_representations() {
        assert_eq!(RecordId::from(42), RecordId::from("42"));
        assert_ne!(RecordId::from(42), RecordId::from("43"));
        assert!(matches!(" 17 ".parse::<RecordId>(), Ok(RecordId::Number(17))));
        assert!(matches!("TSM-1".parse::<RecordId>(), Ok(RecordId::Text(_))));
    }

    #[test]
    fn test_parse_member_change_record() {
        let json = r#"{
            "id": 17,
            "membershipId": "TSM-0042",
            "approvalStatus": "PENDING",
            "updatedData": {"firmName": "Sri Lakshmi Traders"},
            "modifiedBy": {"name": "Ravi Kumar"},
            "modifiedAt": "2024-03-05T10:00:00.000Z"
        }"#;

        let record: PendingChangeRecord =
            serde_json::from_str(json).expect("Failed to parse change record test JSON");
        assert_eq!(record.id, RecordId::from(17));
        assert_eq!(record.subject_id(), Some(&RecordId::from("TSM-0042")));
        assert!(record.is_pending());
        assert_eq!(record.updated_data.len(), 1);
        assert_eq!(record.modified_by_display(), "Ravi Kumar");
    }

    #[test]
    fn test_parse_record_tolerates_missing_and_null_fields() {
        let record: PendingChangeRecord =
            serde_json::from_str(r#"{"id": "abc", "updatedData": null, "approvalStatus": "ON_HOLD"}"#)
                .expect("Failed to parse sparse change record");
        assert!(record.updated_data.is_empty());
        assert_eq!(record.approval_status, ApprovalStatus::Unknown);
        assert_eq!(record.modified_by_display(), "Unknown");
        assert_eq!(record.subject_display(), "-");
    }

    #[test]
    fn test_decline_reason_alias() {
        let record: PendingChangeRecord = serde_json::from_str(
            r#"{"id": 3, "labourId": 9, "approvalStatus": "DECLINED", "note": "Duplicate entry"}"#,
        )
        .expect("Failed to parse declined labour change");
        assert_eq!(record.decline_reason.as_deref(), Some("Duplicate entry"));
        assert_eq!(record.subject_id(), Some(&RecordId::from(9)));
    }

    #[test]
    fn test_billing_row_with_member_id() {
        let record: PendingChangeRecord = serde_json::from_value(json!({
            "id": 7,
            "billingId": 70,
            "membershipId": "TSM-1",
            "approvalStatus": "PENDING",
            "updatedData": {"paidAmount": 10}
        }))
        .expect("Failed to parse billing change carrying a member id");
        assert_eq!(record.subject_id(), Some(&RecordId::from(70)));
        assert_eq!(record.membership_id, Some(RecordId::from("TSM-1")));
        assert_eq!(record.subject_display(), "70");
    }

    #[test]
    fn test_change_kind_from_str() {
        assert_eq!("member".parse::<ChangeKind>(), Ok(ChangeKind::Member));
        assert_eq!("Bills".parse::<ChangeKind>(), Ok(ChangeKind::Billing));
        assert_eq!("labor".parse::<ChangeKind>(), Ok(ChangeKind::Labour));
        assert!("payroll".parse::<ChangeKind>().is_err());
    }

    #[test]
    fn test_decision_request_body() {
        let approve = Decision::approve(RecordId::from(5));
        assert_eq!(
            approve.to_request_body(ChangeKind::Member),
            json!({"id": 5, "action": "APPROVED"})
        );

        let decline = Decision::decline(RecordId::from("b-7"), "Amount mismatch");
        assert_eq!(
            decline.to_request_body(ChangeKind::Billing),
            json!({"id": "b-7", "action": "DECLINED", "note": "Amount mismatch"})
        );
        assert_eq!(
            decline.to_request_body(ChangeKind::Invoice),
            json!({"id": "b-7", "action": "DECLINED", "declineReason": "Amount mismatch"})
        );
    }
}
