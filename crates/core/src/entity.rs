//! Workflow entities: the shared approval envelope plus kind-specific
//! payloads for requests, external-duty attendance, procurement and monthly
//! schedules.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::actor::{Actor, Role};
use crate::chain;
use crate::status::Status;

/// The four entity kinds that carry an approval chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Request,
    AttendanceExternal,
    Procurement,
    MonthlySchedule,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            EntityKind::Request => "REQUEST",
            EntityKind::AttendanceExternal => "ATTENDANCE_EXTERNAL",
            EntityKind::Procurement => "PROCUREMENT",
            EntityKind::MonthlySchedule => "MONTHLY_SCHEDULE",
        };
        f.write_str(token)
    }
}

/// Request subtypes. The absence subtypes overwrite the owner's shift
/// schedule on approval; the others do not touch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    Leave,
    Sick,
    Permission,
    Off,
    ExternalDuty,
    ShiftExchange,
    AddManpower,
    Overtime,
    UnpaidLeave,
}

/// Leave/overtime/shift request payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPayload {
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub start_date: Date,
    pub end_date: Date,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Number of leave days to deduct from the quota (LEAVE only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_employee_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_department: Option<String>,
}

/// External-duty check-in payload (geotagged, with photo proof).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendancePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One procurement line item. Prices are exact decimals, not floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcurementItem {
    pub item_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Procurement requisition payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcurementPayload {
    pub items: Vec<ProcurementItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    pub total_price: Decimal,
}

/// One row of the monthly grid: a user's shift code per day-of-month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleGridRow {
    pub user_id: String,
    /// Day-of-month (1-based) to shift code ("M", "A", "N", "OFF").
    pub shifts: BTreeMap<u8, String>,
}

/// Monthly shift schedule payload submitted for a whole department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySchedulePayload {
    pub department: String,
    pub month: u8,
    pub year: i32,
    pub rows: Vec<ScheduleGridRow>,
}

/// Kind-specific payload; the kind is derived from the variant, so an entity
/// can never disagree with its own chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Payload {
    Request(RequestPayload),
    #[serde(rename = "ATTENDANCE_EXTERNAL")]
    Attendance(AttendancePayload),
    Procurement(ProcurementPayload),
    MonthlySchedule(MonthlySchedulePayload),
}

impl Payload {
    pub fn kind(&self) -> EntityKind {
        match self {
            Payload::Request(_) => EntityKind::Request,
            Payload::Attendance(_) => EntityKind::AttendanceExternal,
            Payload::Procurement(_) => EntityKind::Procurement,
            Payload::MonthlySchedule(_) => EntityKind::MonthlySchedule,
        }
    }
}

/// The shared approval envelope. Mutated only through the transition engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEntity {
    pub id: Uuid,
    pub owner_id: String,
    /// Denormalized from the owner at creation; used for HOD scoping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_department: Option<String>,
    pub status: Status,
    /// Per chain role: has this stage signed off. Append-only; a rejection
    /// does not retroactively clear earlier stages.
    pub stage_approved: BTreeMap<Role, bool>,
    /// Optional free-text note left by each stage on approval.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stage_note: BTreeMap<Role, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// Which stage rejected. Authoritative for history visibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<Role>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub payload: Payload,
}

impl WorkflowEntity {
    /// Create a new entity at its skip-adjusted initial status.
    ///
    /// Stages at or before the creator's own chain position are pre-approved
    /// and the entity enters at the first stage strictly after it. A creator
    /// whose role holds the final stage produces an entity that is born
    /// `APPROVED`; the caller is responsible for firing post-approval
    /// effects in that case.
    pub fn create(owner: &Actor, payload: Payload, now: OffsetDateTime) -> Self {
        let kind = payload.kind();
        let (status, pre_approved) = chain::initial_state(kind, owner.role);

        let mut stage_approved: BTreeMap<Role, bool> = chain::chain(kind)
            .iter()
            .map(|role| (*role, false))
            .collect();
        for role in pre_approved {
            stage_approved.insert(role, true);
        }

        Self {
            id: Uuid::new_v4(),
            owner_id: owner.id.clone(),
            owner_department: owner.department.clone(),
            status,
            stage_approved,
            stage_note: BTreeMap::new(),
            rejection_reason: None,
            rejected_by: None,
            created_at: now,
            updated_at: now,
            payload,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.payload.kind()
    }

    /// Has the given role signed off on this entity.
    pub fn approved_by(&self, role: Role) -> bool {
        self.stage_approved.get(&role).copied().unwrap_or(false)
    }
}
