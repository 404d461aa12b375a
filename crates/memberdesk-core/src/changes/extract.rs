use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::classify::{classify, is_meaningful_where, is_scalar, ValueClass};
use super::profile::ExtractorProfile;
use crate::models::{ChangeKind, PendingChangeRecord};
use crate::utils::{format_date, looks_like_iso_date};

/// Separator between a parent label and a nested field label
const LABEL_SEPARATOR: &str = " - ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Updated,
    Deleted,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeType::Added => write!(f, "added"),
            ChangeType::Updated => write!(f, "updated"),
            ChangeType::Deleted => write!(f, "deleted"),
        }
    }
}

/// A human-readable summary of one detected change, for display only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDescriptor {
    #[serde(rename = "type")]
    pub kind: ChangeType,
    pub field: String,
    pub new_value: Value,
    pub display_value: String,
    pub description: String,
}

/// Extract a flat, ordered list of change descriptors from an `updatedData` object.
///
/// Descriptors follow the key order of the input. Bookkeeping fields and values
/// with nothing in them are skipped. Never fails: values that cannot be
/// formatted are shown raw.
pub fn extract_changes(updated: &Map<String, Value>, profile: &ExtractorProfile) -> Vec<ChangeDescriptor> {
    let mut changes = Vec::new();
    collect(updated, None, profile, &mut changes);
    changes
}

/// Extract changes for a pending record using its family's profile
pub fn extract_record_changes(record: &PendingChangeRecord, kind: ChangeKind) -> Vec<ChangeDescriptor> {
    extract_changes(&record.updated_data, &ExtractorProfile::for_kind(kind))
}

fn collect(
    object: &Map<String, Value>,
    prefix: Option<&str>,
    profile: &ExtractorProfile,
    out: &mut Vec<ChangeDescriptor>,
) {
    let skip = |key: &str| profile.is_denied(key);

    for (key, value) in object {
        if profile.is_denied(key) {
            continue;
        }

        let label = match prefix {
            Some(parent) => format!("{}{}{}", parent, LABEL_SEPARATOR, profile.label_for(key)),
            None => profile.label_for(key),
        };

        match classify(Some(value)) {
            ValueClass::EmptyOrAbsent => {}
            ValueClass::Scalar(scalar) => out.push(describe_scalar(key, label, scalar, profile)),
            ValueClass::Collection(items) => out.push(describe_collection(key, label, value, items.len())),
            ValueClass::Record(nested) => {
                let meaningful: Vec<(&String, &Value)> = nested
                    .iter()
                    .filter(|(k, v)| !skip(k) && is_meaningful_where(v, &skip))
                    .collect();

                match meaningful.as_slice() {
                    [] => {}
                    // Wrapper objects like {proposerID: "M123"} read as a plain value
                    [(inner_key, inner)] if is_scalar(inner) => {
                        out.push(describe_scalar(inner_key, label, inner, profile))
                    }
                    _ => collect(nested, Some(&label), profile, out),
                }
            }
        }
    }
}

fn describe_scalar(key: &str, label: String, value: &Value, profile: &ExtractorProfile) -> ChangeDescriptor {
    let display_value = display_scalar(key, value, profile);
    ChangeDescriptor {
        kind: ChangeType::Updated,
        description: format!("{} changed to: {}", label, display_value),
        field: label,
        new_value: value.clone(),
        display_value,
    }
}

fn describe_collection(key: &str, label: String, value: &Value, count: usize) -> ChangeDescriptor {
    let kind = collection_change_type(key);
    let verb = match kind {
        ChangeType::Added => "added",
        ChangeType::Updated => "updated",
        ChangeType::Deleted => "removed",
    };
    let display_value = format!("{} item(s)", count);
    ChangeDescriptor {
        kind,
        description: format!("{}: {} {}", label, display_value, verb),
        field: label,
        new_value: value.clone(),
        display_value,
    }
}

/// Collections named like `newBranchSchema` add items, `deletePartner` removes them
fn collection_change_type(key: &str) -> ChangeType {
    let lower = key.to_ascii_lowercase();
    if lower.contains("new") || lower.contains("add") {
        ChangeType::Added
    } else if lower.contains("delete") || lower.contains("remove") {
        ChangeType::Deleted
    } else {
        ChangeType::Updated
    }
}

fn display_scalar(key: &str, value: &Value, profile: &ExtractorProfile) -> String {
    match value {
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Number(n) => decorate_number(key, &n.to_string(), profile),
        Value::String(s) => {
            let s = s.trim();
            if looks_like_iso_date(s) {
                format_date(s)
            } else if s.parse::<f64>().is_ok_and(f64::is_finite) {
                decorate_number(key, s, profile)
            } else {
                s.to_string()
            }
        }
        other => other.to_string(),
    }
}

fn decorate_number(key: &str, number: &str, profile: &ExtractorProfile) -> String {
    if profile.is_currency_key(key) {
        format!("{}{}", profile.currency_symbol, number)
    } else if profile.is_percent_key(key) {
        format!("{}%", number)
    } else {
        number.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test input must be a JSON object"),
        }
    }

    fn extract(value: Value) -> Vec<ChangeDescriptor> {
        extract_changes(&object(value), &ExtractorProfile::default())
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(extract(json!({})).is_empty());
    }

    #[test]
    fn test_blank_values_are_skipped() {
        let changes = extract(json!({"paidAmount": 5000, "notes": ""}));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "Paid Amount");
        assert_eq!(changes[0].kind, ChangeType::Updated);
        assert_eq!(changes[0].description, "Paid Amount changed to: ₹5000");

        let nothing = extract(json!({
            "a": null,
            "b": "   ",
            "c": [],
            "d": {"e": "", "f": null}
        }));
        assert!(nothing.is_empty());
    }

    #[test]
    fn test_single_property_shorthand() {
        let changes = extract(json!({"proposer": {"proposerID": "M123"}}));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "Proposer");
        assert_eq!(changes[0].display_value, "M123");
        assert_eq!(changes[0].new_value, json!("M123"));
    }

    #[test]
    fn test_shorthand_ignores_bookkeeping_siblings() {
        let changes = extract(json!({"proposer": {"id": 9, "proposerID": "M123", "updatedAt": "2024-01-01"}}));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "Proposer");
    }

    #[test]
    fn test_nested_objects_recurse_with_prefixed_labels() {
        let changes = extract(json!({
            "bankDetails": {"bankName": "SBI", "ifscCode": "SBIN0001", "branch": {"city": "Hyderabad", "pinCode": "500001"}}
        }));
        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "Bank Details - Bank Name",
                "Bank Details - Ifsc Code",
                "Bank Details - Branch - City",
                "Bank Details - Branch - Pin Code",
            ]
        );
    }

    #[test]
    fn test_array_classification() {
        let changes = extract(json!({
            "newBranchSchema": [{"placeBusiness": "Unit 2"}, {"placeBusiness": "Unit 3"}],
            "deletePartnerDetails": [{"id": 4}],
            "machinery": [{"id": 1}],
            "removedDocuments": []
        }));
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].kind, ChangeType::Added);
        assert!(changes[0].description.contains("2 item(s)"));
        assert_eq!(changes[1].kind, ChangeType::Deleted);
        assert!(changes[1].description.contains("1 item(s)"));
        assert_eq!(changes[2].kind, ChangeType::Updated);
    }

    #[test]
    fn test_scalar_formatting() {
        let changes = extract(json!({
            "membershipDate": "2024-03-05T00:00:00.000Z",
            "renewalDate": "2024-02-30",
            "gstPercent": 18,
            "grandTotal": "1250.50",
            "machineCount": 4,
            "isActive": true
        }));
        let shown: Vec<&str> = changes.iter().map(|c| c.display_value.as_str()).collect();
        assert_eq!(
            shown,
            vec!["Mar 05, 2024", "2024-02-30", "18%", "₹1250.50", "4", "Yes"]
        );
    }

    #[test]
    fn test_non_finite_strings_are_not_decorated() {
        let changes = extract(json!({"paidAmount": "NaN", "discountPercent": "inf"}));
        let shown: Vec<&str> = changes.iter().map(|c| c.display_value.as_str()).collect();
        assert_eq!(shown, vec!["NaN", "inf"]);
    }

    #[test]
    fn test_denylisted_fields_skipped_at_every_level() {
        let profile = ExtractorProfile::member();
        let changes = extract_changes(
            &object(json!({
                "id": 1,
                "membershipId": "TSM-1",
                "modifiedBy": "admin",
                "createdAt": "2024-01-01",
                "address": {"id": 3, "city": "Warangal", "street": "MG Road"}
            })),
            &profile,
        );
        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["Address - City", "Address - Street"]);
    }

    #[test]
    fn test_custom_currency_symbol() {
        let profile = ExtractorProfile::billing().with_currency_symbol("Rs. ");
        let changes = extract_changes(&object(json!({"dueAmount": 1200, "lateFee": 50})), &profile);
        assert_eq!(changes[0].display_value, "Rs. 1200");
        assert_eq!(changes[1].display_value, "Rs. 50");
    }

    #[test]
    fn test_extraction_is_pure_and_repeatable() {
        let input = object(json!({
            "firmName": "Sri Lakshmi Traders",
            "proposer": {"proposerID": "M123"},
            "newPartnerDetails": [{"partnerName": "Anil"}],
            "bankDetails": {"bankName": "SBI", "accountNumber": "0042"}
        }));
        let snapshot = input.clone();
        let profile = ExtractorProfile::member();

        let first = extract_changes(&input, &profile);
        let second = extract_changes(&input, &profile);
        assert_eq!(first, second);
        assert_eq!(input, snapshot);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn test_extract_record_changes_uses_kind_profile() {
        let record: PendingChangeRecord = serde_json::from_value(json!({
            "id": 1,
            "billingId": 88,
            "updatedData": {"billingId": 88, "paidAmount": 300}
        }))
        .expect("Failed to parse billing change");
        let changes = extract_record_changes(&record, ChangeKind::Billing);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].description, "Paid Amount changed to: ₹300");
    }

    #[test]
    fn test_descriptor_serializes_type_field() {
        let changes = extract(json!({"firmName": "Acme"}));
        let value = serde_json::to_value(&changes[0]).expect("descriptor should serialize");
        assert_eq!(value["type"], json!("updated"));
        assert_eq!(value["newValue"], json!("Acme"));
    }
}
