//! In-memory `WorkflowStore` backend.
//!
//! Replaces the original system's module-level database client with an
//! injected port, so the engine is testable without a live database. All
//! tables sit behind one `tokio::sync::RwLock`; a write lock held across
//! check-and-write makes the status-conditional update and the range
//! replace atomic.

use std::collections::BTreeMap;

use async_trait::async_trait;
use lodgeflow_core::{EntityFilter, Role, Status, WorkflowEntity};
use time::Date;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StorageError;
use crate::record::{NotificationRecord, ScheduleRecord, UserRecord};
use crate::traits::WorkflowStore;

#[derive(Default)]
struct Tables {
    /// Insertion-ordered entity log; the id index points into it.
    entities: Vec<WorkflowEntity>,
    entity_index: BTreeMap<Uuid, usize>,
    schedules: Vec<ScheduleRecord>,
    notifications: Vec<NotificationRecord>,
    users: BTreeMap<String, UserRecord>,
}

/// In-memory backend. Cheap to construct per test; shared via `Arc` in the
/// server.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load the user directory (serve startup, tests).
    pub async fn load_users(&self, users: impl IntoIterator<Item = UserRecord>) {
        let mut tables = self.tables.write().await;
        for user in users {
            tables.users.insert(user.id.clone(), user);
        }
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn insert_entity(&self, entity: &WorkflowEntity) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        if tables.entity_index.contains_key(&entity.id) {
            return Err(StorageError::AlreadyExists { id: entity.id });
        }
        let slot = tables.entities.len();
        tables.entities.push(entity.clone());
        tables.entity_index.insert(entity.id, slot);
        Ok(())
    }

    async fn get_entity(&self, id: Uuid) -> Result<WorkflowEntity, StorageError> {
        let tables = self.tables.read().await;
        tables
            .entity_index
            .get(&id)
            .map(|slot| tables.entities[*slot].clone())
            .ok_or(StorageError::EntityNotFound { id })
    }

    async fn update_entity(
        &self,
        expected_status: &Status,
        entity: &WorkflowEntity,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        let slot = *tables
            .entity_index
            .get(&entity.id)
            .ok_or(StorageError::EntityNotFound { id: entity.id })?;
        let stored = &mut tables.entities[slot];
        if stored.status != *expected_status {
            return Err(StorageError::StatusConflict {
                id: entity.id,
                expected: *expected_status,
                actual: stored.status,
            });
        }
        *stored = entity.clone();
        Ok(())
    }

    async fn find_entities(
        &self,
        filter: &EntityFilter,
    ) -> Result<Vec<WorkflowEntity>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .entities
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn insert_schedules(&self, records: &[ScheduleRecord]) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        tables.schedules.extend_from_slice(records);
        Ok(())
    }

    async fn replace_schedule_range(
        &self,
        user_id: &str,
        days: &[Date],
        replacements: &[ScheduleRecord],
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        tables
            .schedules
            .retain(|r| !(r.user_id == user_id && days.contains(&r.date)));
        tables.schedules.extend_from_slice(replacements);
        Ok(())
    }

    async fn schedules_for(&self, user_id: &str) -> Result<Vec<ScheduleRecord>, StorageError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<ScheduleRecord> = tables
            .schedules
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.date);
        Ok(rows)
    }

    async fn insert_notification(&self, record: &NotificationRecord) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        tables.notifications.push(record.clone());
        Ok(())
    }

    async fn notifications_for(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<NotificationRecord>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        let record = tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(StorageError::NotificationNotFound { id })?;
        record.read = true;
        Ok(())
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        for record in tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id)
        {
            record.read = true;
        }
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<UserRecord, StorageError> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::UserNotFound { id: id.to_string() })
    }

    async fn users_by_role(
        &self,
        role: Role,
        department: Option<&str>,
    ) -> Result<Vec<UserRecord>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|u| u.role == role)
            .filter(|u| department.is_none_or(|d| u.department.as_deref() == Some(d)))
            .cloned()
            .collect())
    }

    async fn adjust_leave_quota(&self, id: &str, delta: i32) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(id)
            .ok_or_else(|| StorageError::UserNotFound { id: id.to_string() })?;
        user.leave_quota += delta;
        Ok(())
    }
}
