use std::future::Future;

use time::macros::datetime;
use uuid::Uuid;

use super::{make_notification, TestResult};
use crate::{StorageError, WorkflowStore};

pub(super) async fn run_notification_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "notification",
        "listing_is_newest_first_and_limited",
        listing_is_newest_first_and_limited(factory).await,
    ));
    results.push(TestResult::from_result(
        "notification",
        "mark_read_flips_one_record",
        mark_read_flips_one_record(factory).await,
    ));
    results.push(TestResult::from_result(
        "notification",
        "mark_all_read_scoped_to_user",
        mark_all_read_scoped_to_user(factory).await,
    ));
    results.push(TestResult::from_result(
        "notification",
        "mark_read_unknown_id_is_not_found",
        mark_read_unknown_id_is_not_found(factory).await,
    ));

    results
}

async fn listing_is_newest_first_and_limited<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;

    for (i, ts) in [
        datetime!(2026-05-01 09:00 UTC),
        datetime!(2026-05-01 10:00 UTC),
        datetime!(2026-05-01 11:00 UTC),
    ]
    .into_iter()
    .enumerate()
    {
        store
            .insert_notification(&make_notification("alice", &format!("message {i}"), ts))
            .await
            .map_err(|e| format!("insert {i}: {e}"))?;
    }

    let listed = store
        .notifications_for("alice", 2)
        .await
        .map_err(|e| format!("list: {e}"))?;
    if listed.len() != 2 {
        return Err(format!("expected 2 records, got {}", listed.len()));
    }
    if listed[0].message != "message 2" || listed[1].message != "message 1" {
        return Err(format!(
            "not newest first: [{}, {}]",
            listed[0].message, listed[1].message
        ));
    }
    Ok(())
}

async fn mark_read_flips_one_record<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;

    let first = make_notification("alice", "first", datetime!(2026-05-01 09:00 UTC));
    let second = make_notification("alice", "second", datetime!(2026-05-01 10:00 UTC));
    store
        .insert_notification(&first)
        .await
        .map_err(|e| format!("insert: {e}"))?;
    store
        .insert_notification(&second)
        .await
        .map_err(|e| format!("insert: {e}"))?;

    store
        .mark_notification_read(first.id)
        .await
        .map_err(|e| format!("mark: {e}"))?;

    let listed = store
        .notifications_for("alice", 10)
        .await
        .map_err(|e| format!("list: {e}"))?;
    for record in &listed {
        let expected = record.id == first.id;
        if record.read != expected {
            return Err(format!(
                "record '{}' read={}, expected {}",
                record.message, record.read, expected
            ));
        }
    }
    Ok(())
}

async fn mark_all_read_scoped_to_user<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;

    store
        .insert_notification(&make_notification(
            "alice",
            "for alice",
            datetime!(2026-05-01 09:00 UTC),
        ))
        .await
        .map_err(|e| format!("insert: {e}"))?;
    store
        .insert_notification(&make_notification(
            "bob",
            "for bob",
            datetime!(2026-05-01 09:00 UTC),
        ))
        .await
        .map_err(|e| format!("insert: {e}"))?;

    store
        .mark_all_notifications_read("alice")
        .await
        .map_err(|e| format!("mark all: {e}"))?;

    let alices = store
        .notifications_for("alice", 10)
        .await
        .map_err(|e| format!("list alice: {e}"))?;
    if !alices.iter().all(|n| n.read) {
        return Err("alice still has unread notifications".to_string());
    }
    let bobs = store
        .notifications_for("bob", 10)
        .await
        .map_err(|e| format!("list bob: {e}"))?;
    if bobs.iter().any(|n| n.read) {
        return Err("mark-all leaked into another user".to_string());
    }
    Ok(())
}

async fn mark_read_unknown_id_is_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let id = Uuid::new_v4();
    match store.mark_notification_read(id).await {
        Err(StorageError::NotificationNotFound { id: missing }) if missing == id => Ok(()),
        Err(other) => Err(format!("expected NotificationNotFound, got {other}")),
        Ok(()) => Err("mark on empty store succeeded".to_string()),
    }
}
