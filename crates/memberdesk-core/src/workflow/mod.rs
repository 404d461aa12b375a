//! Admin workflows over the backend: deciding pending changes and editing
//! member records.
//!
//! Both workflows take a `ChangeBackend` so they can run against the real
//! `ApiClient` or an in-memory stand-in. Validation failures are reported
//! before any request is sent.

pub mod approval;
pub mod backend;
pub mod edit;
pub mod error;
pub mod queue;

pub use approval::ApprovalWorkflow;
pub use backend::ChangeBackend;
pub use edit::EditSession;
pub use error::{ValidationError, WorkflowError};
pub use queue::{ApprovalQueue, QueueEvent};
