use serde_json::Value;

/// How a field's values are compared and coerced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldKind {
    /// Compared as trimmed text
    #[default]
    Text,
    /// Compared numerically, so "10" equals 10; sent as a JSON number
    Number,
    /// Compared by calendar day
    Date,
    /// Accepts true/false, "yes"/"no" and 1/0; sent as a JSON bool
    Bool,
    /// Deep structural comparison, sent unchanged
    Any,
}

/// A field taking part in change detection.
///
/// `path` is dotted and may reach into nested sub-objects
/// (`proposer.proposerID`); `target` is the name the backend expects in the patch.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub path: String,
    pub target: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(path: &str, kind: FieldKind) -> Self {
        let target = path.rsplit('.').next().unwrap_or(path).to_string();
        Self {
            path: path.to_string(),
            target,
            kind,
        }
    }

    pub fn text(path: &str) -> Self {
        Self::new(path, FieldKind::Text)
    }

    pub fn number(path: &str) -> Self {
        Self::new(path, FieldKind::Number)
    }

    pub fn date(path: &str) -> Self {
        Self::new(path, FieldKind::Date)
    }

    pub fn boolean(path: &str) -> Self {
        Self::new(path, FieldKind::Bool)
    }

    pub fn any(path: &str) -> Self {
        Self::new(path, FieldKind::Any)
    }

    /// Send this field under a different backend name
    pub fn renamed(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    /// Resolve the dotted path inside a record
    pub fn lookup<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        self.path
            .split('.')
            .try_fold(record, |node, segment| node.as_object()?.get(segment))
    }
}

/// A repeated sub-entity collection with its own identity and lifecycle.
///
/// Emitted in the patch as `new{target}`, `update{target}` and `delete{target}`.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSpec {
    /// Key holding the item array in the record
    pub source: String,
    pub target: String,
    pub id_key: String,
    /// Tracked item fields; when empty every item property is compared
    pub fields: Vec<FieldSpec>,
    /// Collections nested inside each item, diffed per parent
    pub children: Vec<CollectionSpec>,
}

impl CollectionSpec {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            id_key: "id".to_string(),
            fields: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldSpec>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_child(mut self, child: CollectionSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_id_key(mut self, id_key: &str) -> Self {
        self.id_key = id_key.to_string();
        self
    }

    pub fn new_key(&self) -> String {
        format!("new{}", self.target)
    }

    pub fn update_key(&self) -> String {
        format!("update{}", self.target)
    }

    pub fn delete_key(&self) -> String {
        format!("delete{}", self.target)
    }
}

/// Which parts of a record participate in change detection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffSchema {
    /// Key identifying the record itself, copied into every patch
    pub identity_key: Option<String>,
    pub fields: Vec<FieldSpec>,
    pub collections: Vec<CollectionSpec>,
}

impl DiffSchema {
    /// Schema of the edit-member form
    pub fn member() -> Self {
        let machinery = CollectionSpec::new("machinery", "Machinery").with_fields(vec![
            FieldSpec::text("machineName"),
            FieldSpec::number("machineCount"),
            FieldSpec::text("machineCapacity"),
        ]);

        let branches = CollectionSpec::new("branches", "BranchSchema")
            .with_fields(vec![
                FieldSpec::text("placeBusiness"),
                FieldSpec::text("proprietorType"),
                FieldSpec::text("proprietorName"),
                FieldSpec::text("branchAddress"),
                FieldSpec::text("electricalUscNumber"),
                FieldSpec::text("sccNumber"),
                FieldSpec::number("sanctionedHP"),
            ])
            .with_child(machinery.clone());

        let partners = CollectionSpec::new("partners", "PartnerDetails").with_fields(vec![
            FieldSpec::text("partnerName"),
            FieldSpec::text("partnerAadharNo"),
            FieldSpec::text("partnerPanNo"),
            FieldSpec::text("contactNumber"),
            FieldSpec::text("emailId"),
            FieldSpec::boolean("isManagingPartner"),
        ]);

        let labour = CollectionSpec::new("labour", "LabourDetails").with_fields(vec![
            FieldSpec::text("name"),
            FieldSpec::text("aadharNumber"),
            FieldSpec::text("phoneNumber"),
            FieldSpec::text("esiNumber"),
            FieldSpec::text("pfNumber"),
            FieldSpec::date("joiningDate"),
            FieldSpec::number("dailyWage"),
        ]);

        let documents = CollectionSpec::new("additionalDocuments", "AdditionalDocument").with_fields(vec![
            FieldSpec::text("documentName"),
            FieldSpec::text("documentPath"),
        ]);

        Self {
            identity_key: Some("membershipId".to_string()),
            fields: vec![
                FieldSpec::text("applicantName"),
                FieldSpec::text("firmName"),
                FieldSpec::text("proprietorName"),
                FieldSpec::text("mobileNumber"),
                FieldSpec::text("alternateMobileNumber"),
                FieldSpec::text("email"),
                FieldSpec::text("gstNumber"),
                FieldSpec::text("panNumber"),
                FieldSpec::text("aadharNumber"),
                FieldSpec::text("address"),
                FieldSpec::text("city"),
                FieldSpec::text("district"),
                FieldSpec::text("state"),
                FieldSpec::text("pinCode"),
                FieldSpec::text("membershipType"),
                FieldSpec::text("businessCategory"),
                FieldSpec::text("electricalUscNumber"),
                FieldSpec::number("sanctionedHP"),
                FieldSpec::number("establishmentYear"),
                FieldSpec::date("membershipDate"),
                FieldSpec::date("establishmentDate"),
                FieldSpec::boolean("isExecutiveMember"),
                FieldSpec::text("proposer.proposerID"),
                FieldSpec::text("proposer.proposerName"),
                FieldSpec::text("executiveProposer.proposerID").renamed("executiveProposerID"),
                FieldSpec::text("executiveProposer.proposerName").renamed("executiveProposerName"),
            ],
            collections: vec![branches, partners, machinery, labour, documents],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_spec_target_defaults_to_last_segment() {
        assert_eq!(FieldSpec::text("proposer.proposerID").target, "proposerID");
        assert_eq!(FieldSpec::text("firmName").target, "firmName");
        assert_eq!(
            FieldSpec::text("executiveProposer.proposerID").renamed("executiveProposerID").target,
            "executiveProposerID"
        );
    }

    #[test]
    fn test_field_lookup() {
        let record = json!({"firmName": "Acme", "proposer": {"proposerID": "M1"}, "flat": 3});
        assert_eq!(FieldSpec::text("firmName").lookup(&record), Some(&json!("Acme")));
        assert_eq!(FieldSpec::text("proposer.proposerID").lookup(&record), Some(&json!("M1")));
        assert_eq!(FieldSpec::text("proposer.missing").lookup(&record), None);
        assert_eq!(FieldSpec::text("flat.deeper").lookup(&record), None);
    }

    #[test]
    fn test_collection_keys() {
        let spec = CollectionSpec::new("branches", "BranchSchema");
        assert_eq!(spec.new_key(), "newBranchSchema");
        assert_eq!(spec.update_key(), "updateBranchSchema");
        assert_eq!(spec.delete_key(), "deleteBranchSchema");
        assert_eq!(spec.id_key, "id");
    }

    #[test]
    fn test_member_schema_nests_machinery_per_branch() {
        let schema = DiffSchema::member();
        let branches = schema
            .collections
            .iter()
            .find(|c| c.source == "branches")
            .expect("member schema should track branches");
        assert_eq!(branches.children.len(), 1);
        assert_eq!(branches.children[0].target, "Machinery");
        assert_eq!(schema.identity_key.as_deref(), Some("membershipId"));
    }
}
