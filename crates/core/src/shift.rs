//! Shift-code tables and schedule expansion.
//!
//! Two post-approval effects produce schedule rows: absence requests
//! overwrite the owner's shifts for a date range, and an approved monthly
//! schedule materializes its per-user/per-day grid into concrete shift
//! assignments.

use time::{Date, Duration, Month, PrimitiveDateTime, Time};

use crate::entity::{MonthlySchedulePayload, RequestType};

/// Request subtypes that replace the owner's shift schedule on approval.
pub const ABSENCE_TYPES: &[RequestType] = &[
    RequestType::Leave,
    RequestType::Sick,
    RequestType::Permission,
    RequestType::Off,
    RequestType::ExternalDuty,
    RequestType::UnpaidLeave,
];

/// Human-readable (bilingual) schedule label for a request subtype.
pub fn absence_label(request_type: RequestType) -> &'static str {
    match request_type {
        RequestType::Leave => "Cuti / Leave",
        RequestType::Sick => "Sakit / Sick",
        RequestType::Permission => "Izin / Permission",
        RequestType::Off => "OFF",
        RequestType::ExternalDuty => "Dinas Luar / External Duty",
        RequestType::UnpaidLeave => "Cuti Tanpa Gaji / Unpaid Leave",
        RequestType::ShiftExchange => "Tukar Jadwal / Shift Exchange",
        RequestType::AddManpower => "Extra Manpower",
        RequestType::Overtime => "Lembur / Overtime",
    }
}

/// Does the subtype overwrite the shift schedule on approval.
pub fn is_absence(request_type: RequestType) -> bool {
    ABSENCE_TYPES.contains(&request_type)
}

/// The working window of a recognized shift code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    pub start: Time,
    pub end: Time,
}

/// Fixed shift-code table. Unrecognized codes (and "OFF") yield nothing.
pub fn shift_window(code: &str) -> Option<ShiftWindow> {
    let window = match code {
        "M" => ShiftWindow {
            start: Time::from_hms(7, 0, 0).ok()?,
            end: Time::from_hms(15, 0, 0).ok()?,
        },
        "A" => ShiftWindow {
            start: Time::from_hms(15, 0, 0).ok()?,
            end: Time::from_hms(23, 0, 0).ok()?,
        },
        "N" => ShiftWindow {
            start: Time::from_hms(23, 0, 0).ok()?,
            end: Time::from_hms(7, 0, 0).ok()?,
        },
        _ => return None,
    };
    Some(window)
}

/// A concrete shift produced from the monthly grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftAssignment {
    pub user_id: String,
    pub date: Date,
    pub start: PrimitiveDateTime,
    pub end: PrimitiveDateTime,
    pub description: String,
}

/// All calendar days in `[start, end]` inclusive. Empty when inverted.
pub fn days_inclusive(start: Date, end: Date) -> Vec<Date> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        days.push(day);
        match day.next_day() {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

/// Expand a monthly grid into concrete shift assignments.
///
/// Day keys outside the month and unrecognized shift codes are skipped. A
/// window whose end time precedes its start time (the night shift) ends on
/// the following calendar day.
pub fn materialize(payload: &MonthlySchedulePayload) -> Vec<ShiftAssignment> {
    let Ok(month) = Month::try_from(payload.month) else {
        return Vec::new();
    };

    let mut assignments = Vec::new();
    for row in &payload.rows {
        for (day, code) in &row.shifts {
            let Ok(date) = Date::from_calendar_date(payload.year, month, *day) else {
                continue;
            };
            let Some(window) = shift_window(code) else {
                continue;
            };
            let start = PrimitiveDateTime::new(date, window.start);
            let mut end = PrimitiveDateTime::new(date, window.end);
            if window.end < window.start {
                end += Duration::days(1);
            }
            assignments.push(ShiftAssignment {
                user_id: row.user_id.clone(),
                date,
                start,
                end,
                description: format!("Shift {code}"),
            });
        }
    }
    assignments
}
