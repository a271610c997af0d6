//! The visibility resolver: role-scoped read projections over the workflow
//! store.
//!
//! `pending_for` and `history_for` produce data-level filters the storage
//! port evaluates, so any backend (in-memory tables here, SQL WHERE clauses
//! elsewhere) can apply the same predicate. For a given actor the two
//! projections are disjoint: an entity the actor may still act on never
//! appears in their history, and vice versa.

use serde::{Deserialize, Serialize};

use crate::actor::{Actor, Role};
use crate::entity::{EntityKind, WorkflowEntity};
use crate::error::WorkflowError;
use crate::status::Status;

/// One visibility rule over the shared envelope fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterRule {
    /// Entities sitting at exactly this status, optionally department-scoped
    /// (HOD queues).
    Status {
        status: Status,
        department: Option<String>,
    },
    /// Entities the role has acted on: signed off, or rejected at that
    /// role's stage (`rejected_by` is authoritative).
    ActedOn {
        role: Role,
        department: Option<String>,
    },
    /// Entities owned by a given user ("my submissions").
    Owner { owner_id: String },
    /// Every entity of the kind (duplicate checks, admin listings).
    All,
}

/// A kind-scoped predicate over workflow entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFilter {
    pub kind: EntityKind,
    pub rule: FilterRule,
}

impl EntityFilter {
    /// Evaluate the filter against one entity.
    pub fn matches(&self, entity: &WorkflowEntity) -> bool {
        if entity.kind() != self.kind {
            return false;
        }
        match &self.rule {
            FilterRule::Status { status, department } => {
                entity.status == *status
                    && department
                        .as_ref()
                        .is_none_or(|d| entity.owner_department.as_ref() == Some(d))
            }
            FilterRule::ActedOn { role, department } => {
                let acted = entity.approved_by(*role)
                    || (entity.status == Status::Rejected && entity.rejected_by == Some(*role));
                acted
                    && department
                        .as_ref()
                        .is_none_or(|d| entity.owner_department.as_ref() == Some(d))
            }
            FilterRule::Owner { owner_id } => entity.owner_id == *owner_id,
            FilterRule::All => true,
        }
    }
}

/// The "pending for me" queue.
///
/// HOD queues are department-scoped; HR, SUPERVISOR, FINANCE and GM see
/// cross-department. STORE's queue is the approved-procurement fulfillment
/// backlog. STAFF never approve.
pub fn pending_for(kind: EntityKind, actor: &Actor) -> Result<EntityFilter, WorkflowError> {
    let rule = match actor.role {
        Role::Hod => FilterRule::Status {
            status: Status::Pending(Role::Hod),
            department: actor.department.clone(),
        },
        Role::Hr | Role::Supervisor | Role::Finance | Role::Gm => FilterRule::Status {
            status: Status::Pending(actor.role),
            department: None,
        },
        Role::Store if kind == EntityKind::Procurement => FilterRule::Status {
            status: Status::Approved,
            department: None,
        },
        role => return Err(WorkflowError::Unauthorized { role }),
    };
    Ok(EntityFilter { kind, rule })
}

/// The "already acted on by me" history.
///
/// For STORE this is the completed-procurement set, keeping it disjoint from
/// the fulfillment queue.
pub fn history_for(kind: EntityKind, actor: &Actor) -> Result<EntityFilter, WorkflowError> {
    let rule = match actor.role {
        Role::Hod => FilterRule::ActedOn {
            role: Role::Hod,
            department: actor.department.clone(),
        },
        Role::Hr | Role::Supervisor | Role::Finance | Role::Gm => FilterRule::ActedOn {
            role: actor.role,
            department: None,
        },
        Role::Store if kind == EntityKind::Procurement => FilterRule::Status {
            status: Status::Completed,
            department: None,
        },
        role => return Err(WorkflowError::Unauthorized { role }),
    };
    Ok(EntityFilter { kind, rule })
}

/// The actor's own submissions, any role.
pub fn owned_by(kind: EntityKind, actor: &Actor) -> EntityFilter {
    EntityFilter {
        kind,
        rule: FilterRule::Owner {
            owner_id: actor.id.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Payload, RequestPayload, RequestType, WorkflowEntity};
    use crate::transition::{apply, Action};
    use time::macros::{date, datetime};

    fn request_owned_by(owner: &Actor) -> WorkflowEntity {
        WorkflowEntity::create(
            owner,
            Payload::Request(RequestPayload {
                request_type: RequestType::Sick,
                start_date: date!(2026 - 04 - 01),
                end_date: date!(2026 - 04 - 01),
                reason: None,
                quantity: None,
                return_date: None,
                replacement_name: None,
                start_time: None,
                end_time: None,
                new_employee_name: None,
                target_department: None,
            }),
            datetime!(2026-03-20 10:00 UTC),
        )
    }

    fn staff(dept: &str) -> Actor {
        Actor::new(format!("staff-{dept}"), Role::Staff, Some(dept))
    }

    #[test]
    fn hod_pending_is_department_scoped() {
        let housekeeping_hod = Actor::new("h1", Role::Hod, Some("Housekeeping"));
        let filter = pending_for(EntityKind::Request, &housekeeping_hod).unwrap();

        let ours = request_owned_by(&staff("Housekeeping"));
        let theirs = request_owned_by(&staff("Cashier"));
        assert!(filter.matches(&ours));
        assert!(!filter.matches(&theirs));
    }

    #[test]
    fn hr_pending_is_cross_department() {
        let hr = Actor::new("hr1", Role::Hr, Some("Human Resources"));
        let filter = pending_for(EntityKind::Request, &hr).unwrap();

        let entity = request_owned_by(&staff("Cashier"));
        // Still PENDING_HOD, so not in HR's queue yet.
        assert!(!filter.matches(&entity));

        let hod = Actor::new("h2", Role::Hod, Some("Cashier"));
        let t = apply(entity, &hod, Action::Approve, None, datetime!(2026-03-20 11:00 UTC))
            .unwrap();
        assert!(filter.matches(&t.entity));
    }

    #[test]
    fn staff_have_no_approval_queue() {
        let err = pending_for(EntityKind::Request, &staff("Cashier")).unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthorized { .. }));
        let err = history_for(EntityKind::Request, &staff("Cashier")).unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthorized { .. }));
    }

    #[test]
    fn store_queue_is_procurement_only() {
        let store = Actor::new("s1", Role::Store, None);
        assert!(pending_for(EntityKind::Procurement, &store).is_ok());
        assert!(matches!(
            pending_for(EntityKind::Request, &store),
            Err(WorkflowError::Unauthorized { .. })
        ));
    }

    #[test]
    fn history_covers_signed_off_and_rejected_at_stage() {
        let hod = Actor::new("h1", Role::Hod, Some("Housekeeping"));
        let history = history_for(EntityKind::Request, &hod).unwrap();

        let fresh = request_owned_by(&staff("Housekeeping"));
        assert!(!history.matches(&fresh));

        let approved = apply(
            fresh.clone(),
            &hod,
            Action::Approve,
            None,
            datetime!(2026-03-20 11:00 UTC),
        )
        .unwrap()
        .entity;
        assert!(history.matches(&approved));

        let rejected = apply(
            fresh,
            &hod,
            Action::Reject,
            Some("no cover"),
            datetime!(2026-03-20 11:00 UTC),
        )
        .unwrap()
        .entity;
        assert!(history.matches(&rejected));
    }

    #[test]
    fn pending_and_history_are_disjoint_along_the_whole_chain() {
        let hod = Actor::new("h1", Role::Hod, Some("Housekeeping"));
        let hr = Actor::new("hr1", Role::Hr, None);
        let gm = Actor::new("gm1", Role::Gm, None);
        let actors = [&hod, &hr, &gm];

        let mut entity = request_owned_by(&staff("Housekeeping"));
        let mut states = vec![entity.clone()];
        for approver in actors {
            entity = apply(
                entity,
                approver,
                Action::Approve,
                None,
                datetime!(2026-03-20 12:00 UTC),
            )
            .unwrap()
            .entity;
            states.push(entity.clone());
        }

        for actor in actors {
            let pending = pending_for(EntityKind::Request, actor).unwrap();
            let history = history_for(EntityKind::Request, actor).unwrap();
            for state in &states {
                assert!(
                    !(pending.matches(state) && history.matches(state)),
                    "entity at {} visible in both projections for {}",
                    state.status,
                    actor.role
                );
            }
        }
    }

    #[test]
    fn owned_by_sees_only_own_submissions() {
        let alice = staff("Housekeeping");
        let filter = owned_by(EntityKind::Request, &alice);
        assert!(filter.matches(&request_owned_by(&alice)));
        assert!(!filter.matches(&request_owned_by(&staff("Cashier"))));
    }
}
