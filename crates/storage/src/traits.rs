use async_trait::async_trait;
use lodgeflow_core::{EntityFilter, Role, Status, WorkflowEntity};
use time::Date;
use uuid::Uuid;

use crate::error::StorageError;
use crate::record::{NotificationRecord, ScheduleRecord, UserRecord};

/// The storage port for workflow entities, schedules, notifications and the
/// user directory.
///
/// ## Write serialization
///
/// `update_entity` is a status-conditional write: the stored entity's status
/// must equal `expected_status` or the call fails with
/// [`StorageError::StatusConflict`]. Implementations must make the
/// compare-and-swap atomic per entity id (`UPDATE ... WHERE status = ?`, a
/// row lock, or -- for the in-memory backend -- a write lock held across the
/// check and the write), so that of two racing transitions exactly one
/// succeeds.
///
/// `replace_schedule_range` must be atomic per call: either every listed day
/// is overwritten or none are.
///
/// ## Thread safety
///
/// Implementations must be `Send + Sync + 'static` to live in axum
/// application state and cross async task boundaries.
#[async_trait]
pub trait WorkflowStore: Send + Sync + 'static {
    // ── Workflow entities ────────────────────────────────────────────────

    /// Insert a freshly created entity. Fails with `AlreadyExists` on id
    /// collision.
    async fn insert_entity(&self, entity: &WorkflowEntity) -> Result<(), StorageError>;

    /// Fetch one entity by id.
    async fn get_entity(&self, id: Uuid) -> Result<WorkflowEntity, StorageError>;

    /// Status-conditional replace: persist `entity` only if the stored
    /// status still equals `expected_status`.
    async fn update_entity(
        &self,
        expected_status: &Status,
        entity: &WorkflowEntity,
    ) -> Result<(), StorageError>;

    /// All entities matching the filter, oldest first (creation order).
    async fn find_entities(
        &self,
        filter: &EntityFilter,
    ) -> Result<Vec<WorkflowEntity>, StorageError>;

    // ── Shift schedules ──────────────────────────────────────────────────

    /// Batch-insert materialized shift records.
    async fn insert_schedules(&self, records: &[ScheduleRecord]) -> Result<(), StorageError>;

    /// Atomically drop any schedule rows for (`user_id`, day) across `days`
    /// and insert the given replacements (the absence overwrite).
    async fn replace_schedule_range(
        &self,
        user_id: &str,
        days: &[Date],
        replacements: &[ScheduleRecord],
    ) -> Result<(), StorageError>;

    /// A user's schedule rows, date ascending.
    async fn schedules_for(&self, user_id: &str) -> Result<Vec<ScheduleRecord>, StorageError>;

    // ── In-app notifications ─────────────────────────────────────────────

    async fn insert_notification(&self, record: &NotificationRecord) -> Result<(), StorageError>;

    /// A user's notifications, newest first, at most `limit`.
    async fn notifications_for(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<NotificationRecord>, StorageError>;

    async fn mark_notification_read(&self, id: Uuid) -> Result<(), StorageError>;

    async fn mark_all_notifications_read(&self, user_id: &str) -> Result<(), StorageError>;

    // ── User directory ───────────────────────────────────────────────────

    async fn get_user(&self, id: &str) -> Result<UserRecord, StorageError>;

    /// Users holding a role, optionally scoped to a department (HOD
    /// fan-out).
    async fn users_by_role(
        &self,
        role: Role,
        department: Option<&str>,
    ) -> Result<Vec<UserRecord>, StorageError>;

    /// Adjust a user's leave quota by `delta` (negative to deduct).
    async fn adjust_leave_quota(&self, id: &str, delta: i32) -> Result<(), StorageError>;
}
