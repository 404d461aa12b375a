//! Human-readable change extraction for pending edits.
//!
//! Approval screens receive an `updatedData` object holding only the fields a
//! user touched, nested arbitrarily deep. This module turns that object into a
//! flat, ordered list of `ChangeDescriptor`s an operator can review before
//! approving or declining the change.
//!
//! One extractor serves every record family; the per-family differences
//! (labels, bookkeeping keys, currency and percent fields) live in an
//! `ExtractorProfile`.

pub mod classify;
pub mod extract;
pub mod profile;

pub use classify::{classify, is_meaningful, ValueClass};
pub use extract::{extract_changes, extract_record_changes, ChangeDescriptor, ChangeType};
pub use profile::ExtractorProfile;
