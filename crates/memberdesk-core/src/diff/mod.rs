//! Minimal patch computation between two snapshots of a record.
//!
//! The edit-member form holds the record as loaded from the backend and the
//! record as the admin left it. The backend only accepts partial patches, so
//! this module works out which flat fields changed and, for every repeated
//! sub-entity collection (branches, partners, machinery, labour, documents),
//! which items are new, updated or deleted.
//!
//! Which fields take part, and how they compare, is described by a
//! `DiffSchema`. Child collections (machinery inside a branch) are diffed
//! separately for every parent item.

pub mod differ;
pub mod normalize;
pub mod schema;

pub use differ::{compute_diff, diff_collection, has_changes, CollectionPatch, EntityDiff, PatchPayload};
pub use normalize::{coerce, same_value};
pub use schema::{CollectionSpec, DiffSchema, FieldKind, FieldSpec};
