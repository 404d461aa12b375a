//! memberdesk core library.
//!
//! Review and apply pending changes to membership, billing, invoice and
//! labour records held by the membership backend:
//!
//! - `changes` turns a pending `updatedData` object into readable descriptors
//! - `diff` computes the minimal patch between two snapshots of a member
//! - `workflow` drives approve/decline and member edits against a backend
//! - `listing` and `dashboard` back the list and overview screens

pub mod api;
pub mod changes;
pub mod config;
pub mod dashboard;
pub mod diff;
pub mod listing;
pub mod models;
pub mod utils;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError};
pub use config::Config;
