use lodgeflow_core::Status;
use uuid::Uuid;

/// All errors a `WorkflowStore` implementation can return.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Status-conditional update lost a race -- another transition advanced
    /// the entity first. The engine surfaces this as a stage mismatch.
    #[error("status conflict on entity {id}: expected {expected}, found {actual}")]
    StatusConflict {
        id: Uuid,
        expected: Status,
        actual: Status,
    },

    /// No entity with the given id.
    #[error("entity not found: {id}")]
    EntityNotFound { id: Uuid },

    /// An entity with this id already exists.
    #[error("entity already exists: {id}")]
    AlreadyExists { id: Uuid },

    /// No user with the given id in the directory.
    #[error("user not found: {id}")]
    UserNotFound { id: String },

    /// No notification with the given id.
    #[error("notification not found: {id}")]
    NotificationNotFound { id: Uuid },

    /// A backend-specific failure (connection loss, serialization, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
}
