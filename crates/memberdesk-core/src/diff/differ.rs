use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::normalize::{coerce, same_value};
use super::schema::{CollectionSpec, DiffSchema, FieldKind};
use crate::changes::{classify, ValueClass};

/// Add/update/delete buckets for one sub-entity collection.
///
/// An item never appears in more than one bucket. Updated items carry their
/// full current shape, not just the fields that changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDiff {
    pub new_items: Vec<Value>,
    pub update_items: Vec<Value>,
    /// `{id}` objects
    pub delete_items: Vec<Value>,
}

impl EntityDiff {
    pub fn is_empty(&self) -> bool {
        self.new_items.is_empty() && self.update_items.is_empty() && self.delete_items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.new_items.len() + self.update_items.len() + self.delete_items.len()
    }

    /// Write the three buckets into `out` under the collection's patch keys
    fn write_into(self, spec: &CollectionSpec, out: &mut Map<String, Value>) {
        out.insert(spec.new_key(), Value::Array(self.new_items));
        out.insert(spec.update_key(), Value::Array(self.update_items));
        out.insert(spec.delete_key(), Value::Array(self.delete_items));
    }
}

/// The diff of one top-level collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPatch {
    pub spec: CollectionSpec,
    pub diff: EntityDiff,
}

/// Everything that changed between two snapshots of a record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchPayload {
    /// Changed flat fields, keyed by backend name, holding the current value
    pub fields: Map<String, Value>,
    /// Only collections with at least one change
    pub collections: Vec<CollectionPatch>,
}

impl PatchPayload {
    pub fn has_changes(&self) -> bool {
        !self.fields.is_empty() || !self.collections.is_empty()
    }

    /// Diff of the collection emitted as `target`, if it changed
    pub fn collection(&self, target: &str) -> Option<&EntityDiff> {
        self.collections
            .iter()
            .find(|c| c.spec.target == target)
            .map(|c| &c.diff)
    }

    /// Flatten into the JSON object the backend accepts
    pub fn into_json(self) -> Map<String, Value> {
        let mut out = self.fields;
        for patch in self.collections {
            patch.diff.write_into(&patch.spec, &mut out);
        }
        out
    }
}

/// Compute the minimal patch turning `original` into `current`.
///
/// Flat fields are included only when they differ after normalization.
/// Collections are included only when at least one item is new, updated or
/// deleted; child collections are diffed inside each parent item.
pub fn compute_diff(original: &Value, current: &Value, schema: &DiffSchema) -> PatchPayload {
    let mut payload = PatchPayload::default();

    for field in &schema.fields {
        let before = field.lookup(original);
        let after = field.lookup(current);
        if !same_value(field.kind, before, after) {
            debug!(field = %field.path, "Field changed");
            payload.fields.insert(field.target.clone(), coerce(field.kind, after));
        }
    }

    for spec in &schema.collections {
        let diff = diff_collection(spec, items(original, &spec.source), items(current, &spec.source));
        if !diff.is_empty() {
            debug!(
                collection = %spec.source,
                new = diff.new_items.len(),
                updated = diff.update_items.len(),
                deleted = diff.delete_items.len(),
                "Collection changed"
            );
            payload.collections.push(CollectionPatch {
                spec: spec.clone(),
                diff,
            });
        }
    }

    payload
}

/// Whether anything tracked by `schema` differs between the two snapshots.
/// Stops at the first difference without building a payload.
pub fn has_changes(original: &Value, current: &Value, schema: &DiffSchema) -> bool {
    schema
        .fields
        .iter()
        .any(|field| !same_value(field.kind, field.lookup(original), field.lookup(current)))
        || schema.collections.iter().any(|spec| {
            collection_has_changes(spec, items(original, &spec.source), items(current, &spec.source))
        })
}

/// Partition one collection into new, updated and deleted items
pub fn diff_collection(spec: &CollectionSpec, original: &[Value], current: &[Value]) -> EntityDiff {
    let originals = index_by_id(spec, original);
    let mut seen: HashSet<String> = HashSet::new();
    let mut diff = EntityDiff::default();

    for item in current {
        match item_id(spec, item) {
            None => diff.new_items.push(item_payload(spec, item, None)),
            Some(id) if !seen.insert(id.clone()) => {
                warn!(collection = %spec.source, id = %id, "Duplicate item id, sending as new item");
                let mut payload = item_payload(spec, item, None);
                if let Some(obj) = payload.as_object_mut() {
                    obj.remove(&spec.id_key);
                }
                diff.new_items.push(payload);
            }
            Some(id) => match originals.get(&id) {
                Some(before) => {
                    if item_has_changes(spec, before, item) {
                        diff.update_items.push(item_payload(spec, item, Some(before)));
                    }
                }
                None => {
                    debug!(collection = %spec.source, id = %id, "Item id unknown to original, sending as new item");
                    diff.new_items.push(item_payload(spec, item, None));
                }
            },
        }
    }

    for item in original {
        if let Some(id) = item_id(spec, item) {
            // Mark deleted ids as seen so repeats in the original delete once
            if seen.insert(id) {
                let mut deleted = Map::new();
                deleted.insert(spec.id_key.clone(), item[spec.id_key.as_str()].clone());
                diff.delete_items.push(Value::Object(deleted));
            }
        }
    }

    diff
}

fn collection_has_changes(spec: &CollectionSpec, original: &[Value], current: &[Value]) -> bool {
    let originals = index_by_id(spec, original);
    let mut seen: HashSet<String> = HashSet::new();

    for item in current {
        let Some(id) = item_id(spec, item) else {
            return true;
        };
        if !seen.insert(id.clone()) {
            return true;
        }
        match originals.get(&id) {
            Some(before) if !item_has_changes(spec, before, item) => {}
            _ => return true,
        }
    }

    originals.keys().any(|id| !seen.contains(id))
}

fn item_has_changes(spec: &CollectionSpec, before: &Value, after: &Value) -> bool {
    let field_changed = if spec.fields.is_empty() {
        untracked_keys(spec, before, after)
            .iter()
            .any(|key| !same_value(FieldKind::Any, before.get(key.as_str()), after.get(key.as_str())))
    } else {
        spec.fields
            .iter()
            .any(|field| !same_value(field.kind, field.lookup(before), field.lookup(after)))
    };

    field_changed
        || spec.children.iter().any(|child| {
            collection_has_changes(child, items(before, &child.source), items(after, &child.source))
        })
}

/// Every property of either item except its id and child collections
fn untracked_keys(spec: &CollectionSpec, before: &Value, after: &Value) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for obj in [before, after].into_iter().filter_map(Value::as_object) {
        for key in obj.keys() {
            let is_child = spec.children.iter().any(|c| &c.source == key);
            if key != &spec.id_key && !is_child && !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }
    keys
}

/// Full current shape of an item, with tracked fields coerced and each child
/// collection replaced by its own new/update/delete buckets
fn item_payload(spec: &CollectionSpec, item: &Value, before: Option<&Value>) -> Value {
    let Some(obj) = item.as_object() else {
        return item.clone();
    };

    let mut payload = obj.clone();
    for field in &spec.fields {
        if let Some(value) = field.lookup(item) {
            payload.insert(field.target.clone(), coerce(field.kind, Some(value)));
        }
    }

    for child in &spec.children {
        payload.remove(&child.source);
        let child_before = before.map(|b| items(b, &child.source)).unwrap_or(&[]);
        diff_collection(child, child_before, items(item, &child.source)).write_into(child, &mut payload);
    }

    Value::Object(payload)
}

/// Items keyed by id; a repeated id keeps its first occurrence
fn index_by_id<'a>(spec: &CollectionSpec, items: &'a [Value]) -> HashMap<String, &'a Value> {
    let mut index = HashMap::with_capacity(items.len());
    for item in items {
        if let Some(id) = item_id(spec, item) {
            index.entry(id).or_insert(item);
        }
    }
    index
}

/// Identity of an item; blank or missing ids mean the item is new
fn item_id(spec: &CollectionSpec, item: &Value) -> Option<String> {
    match classify(item.get(spec.id_key.as_str())) {
        ValueClass::Scalar(Value::String(s)) => Some(s.trim().to_string()),
        ValueClass::Scalar(other) => Some(other.to_string()),
        _ => None,
    }
}

fn items<'a>(record: &'a Value, key: &str) -> &'a [Value] {
    record
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
