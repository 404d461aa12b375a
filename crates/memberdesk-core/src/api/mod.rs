//! REST API client module for the membership backend.
//!
//! This module provides the `ApiClient` for fetching pending changes,
//! submitting approve/decline decisions, loading and patching member
//! records, and reading backend health.
//!
//! Requests carry an optional bearer token supplied by configuration;
//! the client never logs in by itself.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
