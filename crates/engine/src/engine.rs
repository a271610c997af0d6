//! The engine facade: creation, transitions and role-scoped reads.

use std::sync::Arc;

use lodgeflow_core::{
    history_for, owned_by, pending_for, Action, Actor, EntityFilter, EntityKind, FilterRule,
    Payload, Role, Status, Transition, TransitionOutcome, WorkflowEntity, WorkflowError,
};
use lodgeflow_storage::{NotificationRecord, StorageError, WorkflowStore};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::effects;
use crate::error::EngineError;
use crate::notify::{NotificationHub, Outbound};

/// The approval engine. One instance per process; clone-cheap via `Arc`
/// internals.
#[derive(Clone)]
pub struct WorkflowEngine {
    store: Arc<dyn WorkflowStore>,
    hub: NotificationHub,
}

impl WorkflowEngine {
    pub fn new(store: Arc<dyn WorkflowStore>, hub: NotificationHub) -> Self {
        Self { store, hub }
    }

    /// Create an entity at its skip-adjusted initial status and persist it.
    ///
    /// A creator at the final chain stage produces a born-approved entity;
    /// post-approval effects fire immediately in that case.
    pub async fn create(
        &self,
        actor: &Actor,
        payload: Payload,
    ) -> Result<WorkflowEntity, EngineError> {
        self.validate(&payload).await?;

        let now = OffsetDateTime::now_utc();
        let entity = WorkflowEntity::create(actor, payload, now);
        self.store.insert_entity(&entity).await?;

        match entity.status {
            Status::Approved => {
                effects::run_post_approval(self.store.as_ref(), &entity).await;
                self.announce_approved(&entity).await;
            }
            Status::Pending(next) => self.announce_queued(&entity, next).await,
            // create never yields REJECTED or COMPLETED.
            _ => {}
        }

        Ok(entity)
    }

    /// Apply an approval action and persist it with a status-conditional
    /// write. A racing transition that loses the write surfaces as a stage
    /// mismatch, same as if the loser had observed the new status up front.
    pub async fn transition(
        &self,
        actor: &Actor,
        id: Uuid,
        action: Action,
        note: Option<&str>,
    ) -> Result<Transition, EngineError> {
        let entity = self.load(id).await?;
        let observed = entity.status;

        let transition = lodgeflow_core::apply(
            entity,
            actor,
            action,
            note,
            OffsetDateTime::now_utc(),
        )?;

        match self.store.update_entity(&observed, &transition.entity).await {
            Ok(()) => {}
            Err(StorageError::StatusConflict { actual, .. }) => {
                return Err(WorkflowError::StageMismatch {
                    role: actor.role,
                    status: actual,
                }
                .into());
            }
            Err(other) => return Err(other.into()),
        }

        match transition.outcome {
            TransitionOutcome::Advanced { next } => {
                self.announce_advanced(&transition.entity, actor.role, next)
                    .await;
            }
            TransitionOutcome::FullyApproved => {
                effects::run_post_approval(self.store.as_ref(), &transition.entity).await;
                self.announce_approved(&transition.entity).await;
            }
            TransitionOutcome::Rejected => self.announce_rejected(&transition.entity).await,
            TransitionOutcome::Fulfilled => self.announce_fulfilled(&transition.entity).await,
        }

        Ok(transition)
    }

    /// The actor's approval queue, oldest first.
    pub async fn pending(
        &self,
        kind: EntityKind,
        actor: &Actor,
    ) -> Result<Vec<WorkflowEntity>, EngineError> {
        let filter = pending_for(kind, actor)?;
        Ok(self.store.find_entities(&filter).await?)
    }

    /// Entities the actor has acted on, most recently touched first.
    pub async fn history(
        &self,
        kind: EntityKind,
        actor: &Actor,
    ) -> Result<Vec<WorkflowEntity>, EngineError> {
        let filter = history_for(kind, actor)?;
        let mut entities = self.store.find_entities(&filter).await?;
        entities.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(entities)
    }

    /// The actor's own submissions, newest first.
    pub async fn mine(
        &self,
        kind: EntityKind,
        actor: &Actor,
    ) -> Result<Vec<WorkflowEntity>, EngineError> {
        let filter = owned_by(kind, actor);
        let mut entities = self.store.find_entities(&filter).await?;
        entities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entities)
    }

    /// Fetch one entity, any role. Ownership/visibility checks belong to the
    /// HTTP layer's listing endpoints; direct fetch is for detail views.
    pub async fn get(&self, id: Uuid) -> Result<WorkflowEntity, EngineError> {
        self.load(id).await
    }

    pub async fn notifications(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<NotificationRecord>, EngineError> {
        Ok(self.store.notifications_for(user_id, limit).await?)
    }

    pub async fn mark_notification_read(&self, id: Uuid) -> Result<(), EngineError> {
        Ok(self.store.mark_notification_read(id).await?)
    }

    pub async fn mark_all_notifications_read(&self, user_id: &str) -> Result<(), EngineError> {
        Ok(self.store.mark_all_notifications_read(user_id).await?)
    }

    /// Wait for every notification queued so far to be dispatched. Called on
    /// shutdown; tests use it for determinism.
    pub async fn flush_notifications(&self) {
        self.hub.flush().await;
    }

    async fn load(&self, id: Uuid) -> Result<WorkflowEntity, EngineError> {
        match self.store.get_entity(id).await {
            Ok(entity) => Ok(entity),
            Err(StorageError::EntityNotFound { id }) => {
                Err(WorkflowError::NotFound { id }.into())
            }
            Err(other) => Err(other.into()),
        }
    }

    // ── Creation validation ──────────────────────────────────────────────

    async fn validate(&self, payload: &Payload) -> Result<(), EngineError> {
        match payload {
            Payload::Request(request) => {
                if request.end_date < request.start_date {
                    return Err(invalid("end_date precedes start_date"));
                }
                Ok(())
            }
            Payload::Attendance(_) => Ok(()),
            Payload::Procurement(procurement) => {
                if procurement.items.is_empty() {
                    return Err(invalid("procurement requires at least one item"));
                }
                let mut grand_total = Decimal::ZERO;
                for item in &procurement.items {
                    if item.quantity == 0 {
                        return Err(invalid("item quantity must be at least 1"));
                    }
                    let expected = item.unit_price * Decimal::from(item.quantity);
                    if item.total_price != expected {
                        return Err(invalid(format!(
                            "item '{}' total {} does not match {} x {}",
                            item.item_name, item.total_price, item.quantity, item.unit_price
                        )));
                    }
                    grand_total += item.total_price;
                }
                if procurement.total_price != grand_total {
                    return Err(invalid(format!(
                        "grand total {} does not match item sum {}",
                        procurement.total_price, grand_total
                    )));
                }
                Ok(())
            }
            Payload::MonthlySchedule(grid) => {
                if !(1..=12).contains(&grid.month) {
                    return Err(invalid(format!("month {} out of range", grid.month)));
                }
                if grid.rows.is_empty() {
                    return Err(invalid("schedule grid has no rows"));
                }
                // One live schedule per department-month; a rejected one may
                // be resubmitted.
                let filter = EntityFilter {
                    kind: EntityKind::MonthlySchedule,
                    rule: FilterRule::All,
                };
                let existing = self.store.find_entities(&filter).await?;
                let duplicate = existing.iter().any(|e| {
                    e.status != Status::Rejected
                        && matches!(
                            &e.payload,
                            Payload::MonthlySchedule(other)
                                if other.department == grid.department
                                    && other.month == grid.month
                                    && other.year == grid.year
                        )
                });
                if duplicate {
                    return Err(invalid(format!(
                        "schedule for {} {}/{} already submitted",
                        grid.department, grid.month, grid.year
                    )));
                }
                Ok(())
            }
        }
    }

    // ── Notification fan-out ─────────────────────────────────────────────
    //
    // All best-effort: directory lookups that fail are logged and the
    // operation stands.

    async fn announce_queued(&self, entity: &WorkflowEntity, next: Role) {
        let message = format!(
            "New {} pending {} approval",
            kind_label(entity.kind()),
            next
        );
        self.notify_stage(entity, next, &message).await;
    }

    async fn announce_advanced(&self, entity: &WorkflowEntity, approver: Role, next: Role) {
        self.hub.push(Outbound::InApp {
            user_id: entity.owner_id.clone(),
            message: format!(
                "{} has approved your {}.",
                role_label(approver),
                kind_label(entity.kind())
            ),
        });
        let message = format!(
            "{} pending {} approval",
            kind_title(entity.kind()),
            next
        );
        self.notify_stage(entity, next, &message).await;
    }

    async fn announce_approved(&self, entity: &WorkflowEntity) {
        let kind = entity.kind();
        self.hub.push(Outbound::InApp {
            user_id: entity.owner_id.clone(),
            message: format!("Your {} has been fully approved.", kind_label(kind)),
        });
        self.email_owner(
            entity,
            &format!("{} approved", kind_title(kind)),
            &format!("Your {} has been approved at every stage.", kind_label(kind)),
        )
        .await;

        if kind == EntityKind::Procurement {
            self.notify_stage(
                entity,
                Role::Store,
                "New approved procurement ready for fulfillment.",
            )
            .await;
        }
    }

    async fn announce_rejected(&self, entity: &WorkflowEntity) {
        let kind = entity.kind();
        let by = entity
            .rejected_by
            .map(role_label)
            .unwrap_or("an approver");
        let reason = entity.rejection_reason.as_deref().unwrap_or("");
        self.hub.push(Outbound::InApp {
            user_id: entity.owner_id.clone(),
            message: format!("Your {} was rejected by {by}: {reason}", kind_label(kind)),
        });
        self.email_owner(
            entity,
            &format!("{} rejected", kind_title(kind)),
            &format!("Your {} was rejected by {by}. Reason: {reason}", kind_label(kind)),
        )
        .await;
    }

    async fn announce_fulfilled(&self, entity: &WorkflowEntity) {
        self.hub.push(Outbound::InApp {
            user_id: entity.owner_id.clone(),
            message: "Your procurement has been fulfilled by the store.".to_string(),
        });
    }

    /// In-app message to every user holding the given stage. HOD stages are
    /// scoped to the entity's department.
    async fn notify_stage(&self, entity: &WorkflowEntity, stage: Role, message: &str) {
        let department = if stage == Role::Hod {
            entity.owner_department.as_deref()
        } else {
            None
        };
        match self.store.users_by_role(stage, department).await {
            Ok(users) => {
                for user in users {
                    self.hub.push(Outbound::InApp {
                        user_id: user.id,
                        message: message.to_string(),
                    });
                }
            }
            Err(err) => {
                tracing::warn!(%stage, %err, "stage fan-out skipped: directory lookup failed");
            }
        }
    }

    async fn email_owner(&self, entity: &WorkflowEntity, subject: &str, body: &str) {
        match self.store.get_user(&entity.owner_id).await {
            Ok(owner) => self.hub.push(Outbound::Email {
                to: owner.email,
                subject: subject.to_string(),
                body: body.to_string(),
            }),
            Err(err) => {
                tracing::debug!(owner = %entity.owner_id, %err, "owner email skipped");
            }
        }
    }
}

fn invalid(message: impl Into<String>) -> EngineError {
    WorkflowError::InvalidPayload {
        message: message.into(),
    }
    .into()
}

fn kind_label(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Request => "request",
        EntityKind::AttendanceExternal => "external attendance",
        EntityKind::Procurement => "procurement",
        EntityKind::MonthlySchedule => "monthly schedule",
    }
}

fn kind_title(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Request => "Request",
        EntityKind::AttendanceExternal => "External attendance",
        EntityKind::Procurement => "Procurement",
        EntityKind::MonthlySchedule => "Monthly schedule",
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Staff => "Staff",
        Role::Hod => "Head of Department",
        Role::Supervisor => "Supervisor Operational",
        Role::Finance => "Finance",
        Role::Hr => "Human Resources",
        Role::Gm => "General Manager",
        Role::Store => "Store",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodgeflow_core::{ProcurementItem, ProcurementPayload};
    use lodgeflow_storage::MemoryStore;
    use rust_decimal::Decimal;

    use crate::notify::LogMailer;

    fn engine() -> WorkflowEngine {
        let store: Arc<dyn WorkflowStore> = Arc::new(MemoryStore::new());
        let hub = NotificationHub::spawn(store.clone(), Arc::new(LogMailer));
        WorkflowEngine::new(store, hub)
    }

    fn procurement(items: Vec<ProcurementItem>, total: Decimal) -> Payload {
        Payload::Procurement(ProcurementPayload {
            items,
            reason: None,
            required_date: None,
            attachment_url: None,
            total_price: total,
        })
    }

    fn item(name: &str, quantity: u32, unit: Decimal, total: Decimal) -> ProcurementItem {
        ProcurementItem {
            item_name: name.to_string(),
            description: None,
            category: None,
            quantity,
            unit_price: unit,
            total_price: total,
        }
    }

    #[tokio::test]
    async fn empty_procurement_is_rejected() {
        let engine = engine();
        let staff = Actor::new("alice", Role::Staff, Some("Housekeeping"));
        let err = engine
            .create(&staff, procurement(Vec::new(), Decimal::ZERO))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Workflow(WorkflowError::InvalidPayload { .. })
        ));
    }

    #[tokio::test]
    async fn procurement_totals_must_be_consistent() {
        let engine = engine();
        let staff = Actor::new("alice", Role::Staff, Some("Housekeeping"));

        // Line total disagrees with quantity x unit price.
        let err = engine
            .create(
                &staff,
                procurement(
                    vec![item("mop", 3, Decimal::new(500, 2), Decimal::new(1600, 2))],
                    Decimal::new(1600, 2),
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Workflow(WorkflowError::InvalidPayload { .. })
        ));

        // Consistent lines but wrong grand total.
        let err = engine
            .create(
                &staff,
                procurement(
                    vec![item("mop", 3, Decimal::new(500, 2), Decimal::new(1500, 2))],
                    Decimal::new(9900, 2),
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Workflow(WorkflowError::InvalidPayload { .. })
        ));

        // Fully consistent passes.
        let entity = engine
            .create(
                &staff,
                procurement(
                    vec![item("mop", 3, Decimal::new(500, 2), Decimal::new(1500, 2))],
                    Decimal::new(1500, 2),
                ),
            )
            .await
            .unwrap();
        assert_eq!(entity.status, Status::Pending(Role::Hod));
    }

    #[tokio::test]
    async fn transition_on_unknown_entity_is_not_found() {
        let engine = engine();
        let hod = Actor::new("hod", Role::Hod, Some("Housekeeping"));
        let err = engine
            .transition(&hod, Uuid::new_v4(), Action::Approve, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Workflow(WorkflowError::NotFound { .. })
        ));
    }
}
