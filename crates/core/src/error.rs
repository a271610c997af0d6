//! Workflow error taxonomy.
//!
//! Every variant is a caller-recoverable validation failure; the HTTP layer
//! maps them to 4xx responses. Storage failures live in the storage crate
//! and surface as 5xx.

use uuid::Uuid;

use crate::actor::Role;
use crate::entity::EntityKind;
use crate::status::Status;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    /// The entity already reached a terminal state; no transition possible.
    #[error("entity is terminal ({status}); no further transitions permitted")]
    TerminalState { status: Status },

    /// The acting role does not hold the entity's current pending stage.
    #[error("role {role} cannot act on an entity in status {status}")]
    StageMismatch { role: Role, status: Status },

    /// A HOD may only act on entities owned within their own department.
    #[error("department mismatch: entity belongs to '{entity_department}', actor heads '{actor_department}'")]
    DepartmentMismatch {
        entity_department: String,
        actor_department: String,
    },

    /// Rejections must carry a non-empty reason.
    #[error("a rejection reason is required")]
    MissingReason,

    /// The role class can never act here (e.g. STAFF on an approval queue).
    #[error("role {role} is not authorized for this operation")]
    Unauthorized { role: Role },

    /// No entity with the given id.
    #[error("entity not found: {id}")]
    NotFound { id: Uuid },

    /// A status token that does not correspond to any position in the
    /// entity kind's chain was fed to the chain walker.
    #[error("status {status} is not a stage of the {kind} chain")]
    NotInChain { kind: EntityKind, status: Status },

    /// Malformed creation payload (empty procurement items, month out of
    /// range, inverted date range, ...).
    #[error("invalid payload: {message}")]
    InvalidPayload { message: String },
}
