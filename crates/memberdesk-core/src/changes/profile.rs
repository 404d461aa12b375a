use std::collections::HashMap;

use crate::models::ChangeKind;
use crate::utils::humanize_key;

/// Bookkeeping fields that never describe a user-visible change
const BOOKKEEPING_KEYS: [&str; 6] = ["id", "createdAt", "updatedAt", "modifiedAt", "modifiedBy", "__v"];

/// Default currency symbol for amounts
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

/// Per-domain settings for change extraction.
#[derive(Debug, Clone)]
pub struct ExtractorProfile {
    denylist: Vec<String>,
    label_overrides: HashMap<String, String>,
    currency_patterns: Vec<String>,
    percent_patterns: Vec<String>,
    pub currency_symbol: String,
}

impl Default for ExtractorProfile {
    fn default() -> Self {
        Self {
            denylist: BOOKKEEPING_KEYS.iter().map(|k| k.to_string()).collect(),
            label_overrides: HashMap::new(),
            currency_patterns: vec!["amount".into(), "total".into(), "price".into()],
            percent_patterns: vec!["percent".into()],
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}

impl ExtractorProfile {
    pub fn for_kind(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Member => Self::member(),
            ChangeKind::Billing => Self::billing(),
            ChangeKind::Invoice => Self::invoice(),
            ChangeKind::Labour => Self::labour(),
        }
    }

    pub fn member() -> Self {
        Self::default()
            .with_subject_key(ChangeKind::Member.subject_key())
            .with_label("gstNumber", "GST Number")
            .with_label("panNumber", "PAN Number")
            .with_label("electricalUscNumber", "Electrical USC Number")
            .with_label("newBranchSchema", "New Branches")
            .with_label("updateBranchSchema", "Updated Branches")
            .with_label("deleteBranchSchema", "Removed Branches")
    }

    pub fn billing() -> Self {
        Self::default()
            .with_subject_key(ChangeKind::Billing.subject_key())
            .with_subject_key(ChangeKind::Member.subject_key())
            .with_label("tdsAmount", "TDS Amount")
            .with_label("gstPercent", "GST Percent")
            .with_currency_pattern("fee")
    }

    pub fn invoice() -> Self {
        Self::default()
            .with_subject_key(ChangeKind::Invoice.subject_key())
            .with_label("cgstPercent", "CGST Percent")
            .with_label("sgstPercent", "SGST Percent")
            .with_label("igstPercent", "IGST Percent")
            .with_label("hsnCode", "HSN Code")
            .with_currency_pattern("taxableValue")
    }

    pub fn labour() -> Self {
        Self::default()
            .with_subject_key(ChangeKind::Labour.subject_key())
            .with_subject_key(ChangeKind::Member.subject_key())
            .with_label("esiNumber", "ESI Number")
            .with_label("pfNumber", "PF Number")
            .with_currency_pattern("wage")
            .with_currency_pattern("salary")
    }

    /// Skip the id of the record the change belongs to, e.g. `membershipId`
    pub fn with_subject_key(mut self, key: &str) -> Self {
        if !self.denylist.iter().any(|k| k == key) {
            self.denylist.push(key.to_string());
        }
        self
    }

    pub fn with_label(mut self, key: &str, label: &str) -> Self {
        self.label_overrides.insert(key.to_string(), label.to_string());
        self
    }

    pub fn with_currency_pattern(mut self, pattern: &str) -> Self {
        self.currency_patterns.push(pattern.to_ascii_lowercase());
        self
    }

    pub fn with_currency_symbol(mut self, symbol: &str) -> Self {
        self.currency_symbol = symbol.to_string();
        self
    }

    pub fn is_denied(&self, key: &str) -> bool {
        self.denylist.iter().any(|k| k == key)
    }

    pub fn label_for(&self, key: &str) -> String {
        self.label_overrides
            .get(key)
            .cloned()
            .unwrap_or_else(|| humanize_key(key))
    }

    pub fn is_currency_key(&self, key: &str) -> bool {
        let lower = key.to_ascii_lowercase();
        self.currency_patterns.iter().any(|p| lower.contains(p.as_str()))
    }

    pub fn is_percent_key(&self, key: &str) -> bool {
        let lower = key.to_ascii_lowercase();
        self.percent_patterns.iter().any(|p| lower.contains(p.as_str()))
    }
}
