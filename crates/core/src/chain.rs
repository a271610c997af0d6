//! Approval chain definitions: one static ordered role list per entity kind,
//! plus the chain walker and the creation-time skip rule.

use crate::actor::Role;
use crate::entity::EntityKind;
use crate::error::WorkflowError;
use crate::status::Status;

const REQUEST_CHAIN: &[Role] = &[Role::Hod, Role::Hr, Role::Gm];
const ATTENDANCE_CHAIN: &[Role] = &[Role::Hod, Role::Hr, Role::Gm];
const PROCUREMENT_CHAIN: &[Role] = &[Role::Hod, Role::Supervisor, Role::Finance, Role::Gm];
// Monthly schedules are submitted by HOD-or-above, so the HOD stage is
// implicit and pre-approved.
const MONTHLY_SCHEDULE_CHAIN: &[Role] = &[Role::Hr, Role::Gm];

/// The ordered approver roles for an entity kind.
pub fn chain(kind: EntityKind) -> &'static [Role] {
    match kind {
        EntityKind::Request => REQUEST_CHAIN,
        EntityKind::AttendanceExternal => ATTENDANCE_CHAIN,
        EntityKind::Procurement => PROCUREMENT_CHAIN,
        EntityKind::MonthlySchedule => MONTHLY_SCHEDULE_CHAIN,
    }
}

/// The status a chain starts in when nothing is skipped.
pub fn first_pending(chain: &[Role]) -> Status {
    Status::Pending(chain[0])
}

/// Advance one stage: the next pending status, or `Approved` after the last
/// stage. `current` must sit on the chain.
pub fn next_status(
    kind: EntityKind,
    chain: &[Role],
    current: &Status,
) -> Result<Status, WorkflowError> {
    let role = current.pending_role().ok_or(WorkflowError::NotInChain {
        kind,
        status: *current,
    })?;
    let position = chain
        .iter()
        .position(|r| *r == role)
        .ok_or(WorkflowError::NotInChain {
            kind,
            status: *current,
        })?;
    Ok(match chain.get(position + 1) {
        Some(next) => Status::Pending(*next),
        None => Status::Approved,
    })
}

/// Creation-time status and pre-approved stages for a creator role.
///
/// A creator found in the chain at position `i` pre-approves stages `0..=i`
/// and the entity enters at stage `i + 1` (or `Approved` when `i` is last).
/// A creator role not in the chain starts at the first stage with nothing
/// pre-approved -- this is how a HOD-submitted monthly schedule lands at
/// `PENDING_HR` and a staff request at `PENDING_HOD`.
pub fn initial_state(kind: EntityKind, creator: Role) -> (Status, Vec<Role>) {
    let chain = chain(kind);
    match chain.iter().position(|r| *r == creator) {
        Some(position) => {
            let pre_approved = chain[..=position].to_vec();
            let status = match chain.get(position + 1) {
                Some(next) => Status::Pending(*next),
                None => Status::Approved,
            };
            (status, pre_approved)
        }
        None => (first_pending(chain), Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_match_the_published_ladders() {
        assert_eq!(chain(EntityKind::Request), [Role::Hod, Role::Hr, Role::Gm]);
        assert_eq!(
            chain(EntityKind::Procurement),
            [Role::Hod, Role::Supervisor, Role::Finance, Role::Gm]
        );
        assert_eq!(chain(EntityKind::MonthlySchedule), [Role::Hr, Role::Gm]);
    }

    #[test]
    fn walker_visits_every_stage_in_order() {
        let kind = EntityKind::Procurement;
        let chain = chain(kind);
        let mut status = first_pending(chain);
        let mut visited = vec![status];
        while let Ok(next) = next_status(kind, chain, &status) {
            visited.push(next);
            if next == Status::Approved {
                break;
            }
            status = next;
        }
        assert_eq!(
            visited,
            [
                Status::Pending(Role::Hod),
                Status::Pending(Role::Supervisor),
                Status::Pending(Role::Finance),
                Status::Pending(Role::Gm),
                Status::Approved,
            ]
        );
    }

    #[test]
    fn walker_rejects_off_chain_status() {
        let kind = EntityKind::Request;
        let err = next_status(kind, chain(kind), &Status::Pending(Role::Finance)).unwrap_err();
        assert!(matches!(err, WorkflowError::NotInChain { .. }));
        let err = next_status(kind, chain(kind), &Status::Approved).unwrap_err();
        assert!(matches!(err, WorkflowError::NotInChain { .. }));
    }

    #[test]
    fn supervisor_created_procurement_skips_two_stages() {
        let (status, pre) = initial_state(EntityKind::Procurement, Role::Supervisor);
        assert_eq!(status, Status::Pending(Role::Finance));
        assert_eq!(pre, [Role::Hod, Role::Supervisor]);
    }

    #[test]
    fn gm_created_procurement_is_born_approved() {
        let (status, pre) = initial_state(EntityKind::Procurement, Role::Gm);
        assert_eq!(status, Status::Approved);
        assert_eq!(pre, [Role::Hod, Role::Supervisor, Role::Finance, Role::Gm]);
    }

    #[test]
    fn hod_monthly_schedule_enters_at_hr() {
        let (status, pre) = initial_state(EntityKind::MonthlySchedule, Role::Hod);
        assert_eq!(status, Status::Pending(Role::Hr));
        assert!(pre.is_empty());
    }

    #[test]
    fn hr_monthly_schedule_skips_to_gm() {
        let (status, pre) = initial_state(EntityKind::MonthlySchedule, Role::Hr);
        assert_eq!(status, Status::Pending(Role::Gm));
        assert_eq!(pre, [Role::Hr]);
    }

    #[test]
    fn staff_never_skips() {
        for kind in [
            EntityKind::Request,
            EntityKind::AttendanceExternal,
            EntityKind::Procurement,
            EntityKind::MonthlySchedule,
        ] {
            let (status, pre) = initial_state(kind, Role::Staff);
            assert_eq!(status, first_pending(chain(kind)));
            assert!(pre.is_empty());
        }
    }
}
