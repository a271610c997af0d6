//! The transition engine: given an entity, an acting role and an action,
//! compute the updated entity or refuse.
//!
//! `apply` is pure -- it consumes the loaded entity and returns the updated
//! copy. Persistence (the status-conditional write that makes racing
//! approvals lose) belongs to the caller.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::actor::{Actor, Role};
use crate::chain;
use crate::entity::{EntityKind, WorkflowEntity};
use crate::error::WorkflowError;
use crate::status::Status;

/// An approval decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Approve,
    Reject,
}

/// What a successful transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Moved to the next stage; `next` now holds the entity.
    Advanced { next: Role },
    /// Final stage signed off. The caller must run post-approval effects.
    FullyApproved,
    /// Rejected by the acting stage. Short-circuits the chain.
    Rejected,
    /// Store moved an approved procurement to `COMPLETED`.
    Fulfilled,
}

/// A computed transition: the updated entity plus its disposition.
#[derive(Debug, Clone)]
pub struct Transition {
    pub entity: WorkflowEntity,
    pub outcome: TransitionOutcome,
}

/// Apply an approval action to an entity.
///
/// Checks, in order: the Store fulfillment special case, terminal-state
/// refusal, stage/role match, HOD department scoping, and the non-empty
/// reason requirement for rejections. Not idempotent by design: once a stage
/// advances, re-submitting the same approval observes the new status and
/// fails with `StageMismatch`.
pub fn apply(
    mut entity: WorkflowEntity,
    actor: &Actor,
    action: Action,
    note: Option<&str>,
    now: OffsetDateTime,
) -> Result<Transition, WorkflowError> {
    // Fulfillment is the one permitted move out of a terminal state:
    // STORE takes an APPROVED procurement to COMPLETED.
    if actor.role == Role::Store {
        if entity.kind() == EntityKind::Procurement
            && entity.status == Status::Approved
            && action == Action::Approve
        {
            entity.status = Status::Completed;
            entity.updated_at = now;
            return Ok(Transition {
                entity,
                outcome: TransitionOutcome::Fulfilled,
            });
        }
        return Err(WorkflowError::Unauthorized { role: Role::Store });
    }

    let Status::Pending(pending) = entity.status else {
        return Err(WorkflowError::TerminalState {
            status: entity.status,
        });
    };
    if pending != actor.role {
        return Err(WorkflowError::StageMismatch {
            role: actor.role,
            status: entity.status,
        });
    }

    if actor.role == Role::Hod && entity.owner_department != actor.department {
        return Err(WorkflowError::DepartmentMismatch {
            entity_department: entity.owner_department.clone().unwrap_or_default(),
            actor_department: actor.department.clone().unwrap_or_default(),
        });
    }

    let note = note.map(str::trim).filter(|n| !n.is_empty());

    match action {
        Action::Reject => {
            let reason = note.ok_or(WorkflowError::MissingReason)?;
            entity.status = Status::Rejected;
            entity.rejection_reason = Some(reason.to_string());
            entity.rejected_by = Some(actor.role);
            entity.updated_at = now;
            Ok(Transition {
                entity,
                outcome: TransitionOutcome::Rejected,
            })
        }
        Action::Approve => {
            let kind = entity.kind();
            let next = chain::next_status(kind, chain::chain(kind), &entity.status)?;
            entity.stage_approved.insert(actor.role, true);
            if let Some(n) = note {
                entity.stage_note.insert(actor.role, n.to_string());
            }
            entity.status = next;
            entity.updated_at = now;
            let outcome = match next {
                Status::Approved => TransitionOutcome::FullyApproved,
                Status::Pending(role) => TransitionOutcome::Advanced { next: role },
                // next_status never yields Rejected or Completed.
                _ => unreachable!("chain walker yields pending or approved"),
            };
            Ok(Transition { entity, outcome })
        }
    }
}
