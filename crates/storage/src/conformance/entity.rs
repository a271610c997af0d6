use std::future::Future;

use lodgeflow_core::{Role, Status};
use uuid::Uuid;

use super::{make_request, test_now, TestResult};
use crate::{StorageError, WorkflowStore};

pub(super) async fn run_entity_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "entity",
        "insert_then_get_roundtrips",
        insert_then_get_roundtrips(factory).await,
    ));
    results.push(TestResult::from_result(
        "entity",
        "duplicate_insert_rejected",
        duplicate_insert_rejected(factory).await,
    ));
    results.push(TestResult::from_result(
        "entity",
        "get_unknown_id_is_not_found",
        get_unknown_id_is_not_found(factory).await,
    ));
    results.push(TestResult::from_result(
        "entity",
        "update_with_matching_status_succeeds",
        update_with_matching_status_succeeds(factory).await,
    ));
    results.push(TestResult::from_result(
        "entity",
        "update_with_stale_status_conflicts",
        update_with_stale_status_conflicts(factory).await,
    ));
    results.push(TestResult::from_result(
        "entity",
        "update_unknown_entity_is_not_found",
        update_unknown_entity_is_not_found(factory).await,
    ));

    results
}

async fn insert_then_get_roundtrips<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let entity = make_request("alice", "Housekeeping");

    store
        .insert_entity(&entity)
        .await
        .map_err(|e| format!("insert: {e}"))?;
    let fetched = store
        .get_entity(entity.id)
        .await
        .map_err(|e| format!("get: {e}"))?;

    if fetched != entity {
        return Err("fetched entity differs from inserted".to_string());
    }
    Ok(())
}

async fn duplicate_insert_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let entity = make_request("alice", "Housekeeping");

    store
        .insert_entity(&entity)
        .await
        .map_err(|e| format!("first insert: {e}"))?;
    match store.insert_entity(&entity).await {
        Err(StorageError::AlreadyExists { id }) if id == entity.id => Ok(()),
        Err(other) => Err(format!("expected AlreadyExists, got {other}")),
        Ok(()) => Err("duplicate insert succeeded".to_string()),
    }
}

async fn get_unknown_id_is_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let id = Uuid::new_v4();
    match store.get_entity(id).await {
        Err(StorageError::EntityNotFound { id: missing }) if missing == id => Ok(()),
        Err(other) => Err(format!("expected EntityNotFound, got {other}")),
        Ok(_) => Err("get on empty store succeeded".to_string()),
    }
}

async fn update_with_matching_status_succeeds<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let entity = make_request("alice", "Housekeeping");
    store
        .insert_entity(&entity)
        .await
        .map_err(|e| format!("insert: {e}"))?;

    let mut advanced = entity.clone();
    advanced.status = Status::Pending(Role::Hr);
    advanced.stage_approved.insert(Role::Hod, true);
    advanced.updated_at = test_now();

    store
        .update_entity(&Status::Pending(Role::Hod), &advanced)
        .await
        .map_err(|e| format!("update: {e}"))?;

    let fetched = store
        .get_entity(entity.id)
        .await
        .map_err(|e| format!("get: {e}"))?;
    if fetched.status != Status::Pending(Role::Hr) {
        return Err(format!("expected PENDING_HR, got {}", fetched.status));
    }
    if !fetched.approved_by(Role::Hod) {
        return Err("HOD sign-off not persisted".to_string());
    }
    Ok(())
}

async fn update_with_stale_status_conflicts<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let entity = make_request("alice", "Housekeeping");
    store
        .insert_entity(&entity)
        .await
        .map_err(|e| format!("insert: {e}"))?;

    // First transition wins.
    let mut advanced = entity.clone();
    advanced.status = Status::Pending(Role::Hr);
    store
        .update_entity(&Status::Pending(Role::Hod), &advanced)
        .await
        .map_err(|e| format!("first update: {e}"))?;

    // A second writer still holding the PENDING_HOD view must lose.
    let mut stale = entity.clone();
    stale.status = Status::Rejected;
    match store
        .update_entity(&Status::Pending(Role::Hod), &stale)
        .await
    {
        Err(StorageError::StatusConflict {
            expected, actual, ..
        }) => {
            if expected != Status::Pending(Role::Hod) || actual != Status::Pending(Role::Hr) {
                return Err(format!(
                    "conflict fields wrong: expected={expected} actual={actual}"
                ));
            }
        }
        Err(other) => return Err(format!("expected StatusConflict, got {other}")),
        Ok(()) => return Err("stale update succeeded".to_string()),
    }

    // The winner's write must be untouched.
    let fetched = store
        .get_entity(entity.id)
        .await
        .map_err(|e| format!("get: {e}"))?;
    if fetched.status != Status::Pending(Role::Hr) {
        return Err(format!(
            "stale update clobbered winner: status {}",
            fetched.status
        ));
    }
    Ok(())
}

async fn update_unknown_entity_is_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;
    let entity = make_request("alice", "Housekeeping");
    match store
        .update_entity(&Status::Pending(Role::Hod), &entity)
        .await
    {
        Err(StorageError::EntityNotFound { id }) if id == entity.id => Ok(()),
        Err(other) => Err(format!("expected EntityNotFound, got {other}")),
        Ok(()) => Err("update of unknown entity succeeded".to_string()),
    }
}
