//! lodgeflow domain model -- roles, statuses, approval chains, the
//! transition engine and the visibility resolver.
//!
//! Everything in this crate is pure and synchronous. An entity moves through
//! an ordered chain of approver roles; each transition is computed here and
//! persisted by the caller (the engine crate) with a status-conditional
//! write, so two racing approvals cannot both succeed.

pub mod actor;
pub mod chain;
pub mod entity;
pub mod error;
pub mod shift;
pub mod status;
pub mod transition;
pub mod visibility;

pub use actor::{Actor, Role};
pub use chain::{chain, first_pending, initial_state, next_status};
pub use entity::{
    AttendancePayload, EntityKind, MonthlySchedulePayload, Payload, ProcurementItem,
    ProcurementPayload, RequestPayload, RequestType, ScheduleGridRow, WorkflowEntity,
};
pub use error::WorkflowError;
pub use status::Status;
pub use transition::{apply, Action, Transition, TransitionOutcome};
pub use visibility::{history_for, owned_by, pending_for, EntityFilter, FilterRule};
