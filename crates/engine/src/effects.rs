//! Post-approval effects.
//!
//! Fired exactly once, when an entity's final stage signs off (or when a
//! creator at the final stage produces a born-approved entity). Every effect
//! is best-effort: by the time this runs the status write has already
//! committed, so quota and schedule failures are logged and the approval
//! stands.

use lodgeflow_core::shift;
use lodgeflow_core::{Payload, RequestType, WorkflowEntity};
use lodgeflow_storage::{ScheduleRecord, WorkflowStore};
use time::macros::time;
use time::PrimitiveDateTime;
use uuid::Uuid;

pub(crate) async fn run_post_approval(store: &dyn WorkflowStore, entity: &WorkflowEntity) {
    match &entity.payload {
        Payload::Request(request) if shift::is_absence(request.request_type) => {
            let days = shift::days_inclusive(request.start_date, request.end_date);

            if request.request_type == RequestType::Leave {
                let deducted = request.quantity.unwrap_or(days.len() as u32);
                if let Err(err) = store
                    .adjust_leave_quota(&entity.owner_id, -(deducted as i32))
                    .await
                {
                    tracing::warn!(
                        owner = %entity.owner_id,
                        %err,
                        "leave quota not deducted; approval stands"
                    );
                }
            }

            let label = shift::absence_label(request.request_type);
            let replacements: Vec<ScheduleRecord> = days
                .iter()
                .map(|day| ScheduleRecord {
                    id: Uuid::new_v4(),
                    user_id: entity.owner_id.clone(),
                    date: *day,
                    shift_start: PrimitiveDateTime::new(*day, time!(0:00)),
                    shift_end: PrimitiveDateTime::new(*day, time!(23:59:59)),
                    description: label.to_string(),
                })
                .collect();
            if let Err(err) = store
                .replace_schedule_range(&entity.owner_id, &days, &replacements)
                .await
            {
                tracing::warn!(
                    entity = %entity.id,
                    owner = %entity.owner_id,
                    %err,
                    "absence schedule not written; approval stands"
                );
            }
        }
        Payload::MonthlySchedule(grid) => {
            let records: Vec<ScheduleRecord> = shift::materialize(grid)
                .into_iter()
                .map(|assignment| ScheduleRecord {
                    id: Uuid::new_v4(),
                    user_id: assignment.user_id,
                    date: assignment.date,
                    shift_start: assignment.start,
                    shift_end: assignment.end,
                    description: assignment.description,
                })
                .collect();
            if let Err(err) = store.insert_schedules(&records).await {
                tracing::warn!(
                    entity = %entity.id,
                    %err,
                    "shift materialization not written; approval stands"
                );
            }
        }
        // Non-absence requests, external attendance and procurement leave
        // the schedule tables alone.
        _ => {}
    }
}
