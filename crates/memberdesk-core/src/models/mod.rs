//! Data models for membership administration entities.
//!
//! This module contains the request/response shaped structures exchanged
//! with the backend:
//!
//! - `PendingChangeRecord`: a proposed edit awaiting admin approval
//! - `ChangeKind`: which record family a change belongs to
//! - `Decision`: an approve/decline verdict for one pending change
//! - `SystemHealth`: backend health metrics shown on the dashboard

pub mod change;
pub mod health;

pub use change::{ApprovalStatus, ChangeKind, Decision, DecisionAction, PendingChangeRecord, RecordId};
pub use health::SystemHealth;
