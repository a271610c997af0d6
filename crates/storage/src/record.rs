use lodgeflow_core::{Actor, Role};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

/// One day's shift (or absence) assignment for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub id: Uuid,
    pub user_id: String,
    pub date: Date,
    pub shift_start: PrimitiveDateTime,
    pub shift_end: PrimitiveDateTime,
    /// "Shift M", "Cuti / Leave", ...
    pub description: String,
}

/// An in-app notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub user_id: String,
    pub message: String,
    pub read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A directory user. Owned by the identity collaborator; the engine reads
/// it for recipient resolution and only ever writes `leave_quota`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default)]
    pub leave_quota: i32,
}

impl UserRecord {
    /// The acting identity this user presents to the workflow engine.
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id.clone(),
            role: self.role,
            department: self.department.clone(),
        }
    }
}
