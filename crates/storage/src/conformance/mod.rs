//! Conformance test suite for `WorkflowStore` implementations.
//!
//! A backend-agnostic suite any `WorkflowStore` implementation can run to
//! verify correctness. The suite covers:
//!
//! - **Entities**: insert, duplicate detection, fetch, plain update
//! - **Status-conditional update / OCC**: conflict detection, racing
//!   transitions with exactly one winner
//! - **Filters**: the visibility predicates evaluated server-side
//! - **Schedules**: batch insert, atomic range replace, read ordering
//! - **Notifications**: ordering, limit, read marking
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty store for each test:
//!
//! ```ignore
//! use lodgeflow_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn postgres_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_postgres_store().await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod concurrent;
mod entity;
mod filter;
mod notification;
mod schedule;

use std::fmt;
use std::future::Future;

use lodgeflow_core::{
    Actor, Payload, RequestPayload, RequestType, Role, WorkflowEntity,
};
use time::macros::{date, datetime, time};
use time::{OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

use crate::record::{NotificationRecord, ScheduleRecord};
use crate::WorkflowStore;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "entity", "concurrent", "filter").
    pub category: String,
    /// Test name (e.g. "update_with_stale_status_conflicts").
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// store, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(entity::run_entity_tests(&factory).await);
    results.extend(filter::run_filter_tests(&factory).await);
    results.extend(schedule::run_schedule_tests(&factory).await);
    results.extend(notification::run_notification_tests(&factory).await);
    results.extend(concurrent::run_concurrent_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers: record constructors with sensible defaults ──────────────────────

fn test_now() -> OffsetDateTime {
    datetime!(2026-05-01 08:00 UTC)
}

/// A staff-owned leave request sitting at PENDING_HOD.
fn make_request(owner_id: &str, department: &str) -> WorkflowEntity {
    let owner = Actor::new(owner_id, Role::Staff, Some(department));
    WorkflowEntity::create(
        &owner,
        Payload::Request(RequestPayload {
            request_type: RequestType::Leave,
            start_date: date!(2026 - 06 - 01),
            end_date: date!(2026 - 06 - 03),
            reason: Some("conformance".to_string()),
            quantity: Some(3),
            return_date: None,
            replacement_name: None,
            start_time: None,
            end_time: None,
            new_employee_name: None,
            target_department: None,
        }),
        test_now(),
    )
}

fn make_schedule(user_id: &str, date: time::Date, description: &str) -> ScheduleRecord {
    ScheduleRecord {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        date,
        shift_start: PrimitiveDateTime::new(date, time!(7:00)),
        shift_end: PrimitiveDateTime::new(date, time!(15:00)),
        description: description.to_string(),
    }
}

fn make_notification(user_id: &str, message: &str, created_at: OffsetDateTime) -> NotificationRecord {
    NotificationRecord {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        message: message.to_string(),
        read: false,
        created_at,
    }
}
