//! Storage port for the lodgeflow workflow engine.
//!
//! The engine never talks to a database directly; it holds a
//! [`WorkflowStore`] trait object. This crate defines the trait, the record
//! types, the error taxonomy, an in-memory backend, and a backend-agnostic
//! conformance suite any implementation can run.

pub mod conformance;
mod error;
mod memory;
mod record;
mod traits;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use record::{NotificationRecord, ScheduleRecord, UserRecord};
pub use traits::WorkflowStore;
