//! The lodgeflow approval engine.
//!
//! Ties the pure domain model to a storage backend: entity creation with the
//! creator-skip rule, guarded transitions persisted with a
//! status-conditional write, post-approval effects (leave quota, schedule
//! overwrites, shift materialization) and asynchronous notification fan-out.

mod effects;
mod engine;
mod error;
mod notify;

pub use engine::WorkflowEngine;
pub use error::EngineError;
pub use notify::{LogMailer, MailError, Mailer, NotificationHub, Outbound};
