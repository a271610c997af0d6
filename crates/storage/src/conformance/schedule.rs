use std::future::Future;

use time::macros::date;

use super::{make_schedule, TestResult};
use crate::WorkflowStore;

pub(super) async fn run_schedule_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "schedule",
        "batch_insert_then_read_date_ascending",
        batch_insert_then_read_date_ascending(factory).await,
    ));
    results.push(TestResult::from_result(
        "schedule",
        "replace_range_overwrites_only_listed_days",
        replace_range_overwrites_only_listed_days(factory).await,
    ));
    results.push(TestResult::from_result(
        "schedule",
        "replace_range_scoped_to_one_user",
        replace_range_scoped_to_one_user(factory).await,
    ));

    results
}

async fn batch_insert_then_read_date_ascending<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;

    // Insert out of date order.
    let rows = vec![
        make_schedule("alice", date!(2026 - 06 - 03), "Shift N"),
        make_schedule("alice", date!(2026 - 06 - 01), "Shift M"),
        make_schedule("alice", date!(2026 - 06 - 02), "Shift A"),
    ];
    store
        .insert_schedules(&rows)
        .await
        .map_err(|e| format!("insert: {e}"))?;

    let fetched = store
        .schedules_for("alice")
        .await
        .map_err(|e| format!("read: {e}"))?;
    let dates: Vec<_> = fetched.iter().map(|r| r.date).collect();
    if dates
        != vec![
            date!(2026 - 06 - 01),
            date!(2026 - 06 - 02),
            date!(2026 - 06 - 03),
        ]
    {
        return Err(format!("not date ascending: {dates:?}"));
    }
    Ok(())
}

async fn replace_range_overwrites_only_listed_days<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;

    store
        .insert_schedules(&[
            make_schedule("alice", date!(2026 - 06 - 01), "Shift M"),
            make_schedule("alice", date!(2026 - 06 - 02), "Shift M"),
            make_schedule("alice", date!(2026 - 06 - 03), "Shift M"),
        ])
        .await
        .map_err(|e| format!("insert: {e}"))?;

    // The leave overwrite: days 1-2 become absences, day 3 stays a shift.
    let days = [date!(2026 - 06 - 01), date!(2026 - 06 - 02)];
    let replacements = vec![
        make_schedule("alice", date!(2026 - 06 - 01), "Cuti / Leave"),
        make_schedule("alice", date!(2026 - 06 - 02), "Cuti / Leave"),
    ];
    store
        .replace_schedule_range("alice", &days, &replacements)
        .await
        .map_err(|e| format!("replace: {e}"))?;

    let fetched = store
        .schedules_for("alice")
        .await
        .map_err(|e| format!("read: {e}"))?;
    if fetched.len() != 3 {
        return Err(format!("expected 3 rows, got {}", fetched.len()));
    }
    let descriptions: Vec<_> = fetched.iter().map(|r| r.description.as_str()).collect();
    if descriptions != vec!["Cuti / Leave", "Cuti / Leave", "Shift M"] {
        return Err(format!("unexpected descriptions: {descriptions:?}"));
    }
    Ok(())
}

async fn replace_range_scoped_to_one_user<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;

    store
        .insert_schedules(&[
            make_schedule("alice", date!(2026 - 06 - 01), "Shift M"),
            make_schedule("bob", date!(2026 - 06 - 01), "Shift A"),
        ])
        .await
        .map_err(|e| format!("insert: {e}"))?;

    let days = [date!(2026 - 06 - 01)];
    store
        .replace_schedule_range(
            "alice",
            &days,
            &[make_schedule("alice", date!(2026 - 06 - 01), "Sakit / Sick")],
        )
        .await
        .map_err(|e| format!("replace: {e}"))?;

    let bobs = store
        .schedules_for("bob")
        .await
        .map_err(|e| format!("read bob: {e}"))?;
    if bobs.len() != 1 || bobs[0].description != "Shift A" {
        return Err("replace leaked into another user's schedule".to_string());
    }
    Ok(())
}
