use std::future::Future;
use std::sync::Arc;

use lodgeflow_core::{Role, Status};

use super::{make_request, TestResult};
use crate::{StorageError, WorkflowStore};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "concurrent",
        "racing_transitions_exactly_one_wins",
        racing_transitions_exactly_one_wins(factory).await,
    ));
    results.push(TestResult::from_result(
        "concurrent",
        "transitions_on_different_entities_all_succeed",
        transitions_on_different_entities_all_succeed(factory).await,
    ));

    results
}

/// N tasks all observe the same entity at PENDING_HOD and race the
/// status-conditional update. Exactly one wins; the rest must get
/// StatusConflict.
///
/// This exercises real concurrency -- `tokio::spawn` creates parallel tasks
/// that race the compare-and-swap, unlike the sequential simulation in the
/// `entity` module.
async fn racing_transitions_exactly_one_wins<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = Arc::new(factory().await);

    let entity = make_request("alice", "Housekeeping");
    store
        .insert_entity(&entity)
        .await
        .map_err(|e| format!("insert: {e}"))?;

    let mut handles = Vec::new();
    for _ in 0..N {
        let s = store.clone();
        let snapshot = entity.clone();
        handles.push(tokio::spawn(async move {
            let mut advanced = snapshot;
            advanced.status = Status::Pending(Role::Hr);
            advanced.stage_approved.insert(Role::Hod, true);
            match s
                .update_entity(&Status::Pending(Role::Hod), &advanced)
                .await
            {
                Ok(()) => Ok(true), // won the race
                Err(StorageError::StatusConflict { .. }) => Ok(false), // lost
                Err(e) => Err(e),
            }
        }));
    }

    let mut winners = 0usize;
    let mut losers = 0usize;
    for handle in handles {
        let won = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: StorageError| format!("storage error: {e}"))?;
        if won {
            winners += 1;
        } else {
            losers += 1;
        }
    }

    if winners != 1 {
        return Err(format!("expected exactly 1 winner, got {winners}"));
    }
    if losers != N - 1 {
        return Err(format!("expected {} losers, got {losers}", N - 1));
    }

    // Final state consistent with the single winning transition.
    let fetched = store
        .get_entity(entity.id)
        .await
        .map_err(|e| format!("get: {e}"))?;
    if fetched.status != Status::Pending(Role::Hr) {
        return Err(format!("expected PENDING_HR, got {}", fetched.status));
    }

    Ok(())
}

/// N tasks each transition a different entity. All should succeed -- no false
/// conflicts when there is no contention.
async fn transitions_on_different_entities_all_succeed<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = Arc::new(factory().await);

    let mut entities = Vec::new();
    for i in 0..N {
        let entity = make_request(&format!("user-{i}"), "Housekeeping");
        store
            .insert_entity(&entity)
            .await
            .map_err(|e| format!("insert user-{i}: {e}"))?;
        entities.push(entity);
    }

    let mut handles = Vec::new();
    for entity in &entities {
        let s = store.clone();
        let snapshot = entity.clone();
        handles.push(tokio::spawn(async move {
            let mut advanced = snapshot;
            advanced.status = Status::Pending(Role::Hr);
            s.update_entity(&Status::Pending(Role::Hod), &advanced).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        handle
            .await
            .map_err(|e| format!("task {i} panic: {e}"))?
            .map_err(|e| format!("task {i} failed: {e}"))?;
    }

    for entity in &entities {
        let fetched = store
            .get_entity(entity.id)
            .await
            .map_err(|e| format!("get: {e}"))?;
        if fetched.status != Status::Pending(Role::Hr) {
            return Err(format!(
                "entity {}: expected PENDING_HR, got {}",
                entity.id, fetched.status
            ));
        }
    }

    Ok(())
}
