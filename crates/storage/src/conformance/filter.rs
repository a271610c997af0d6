use std::future::Future;

use lodgeflow_core::{
    apply, history_for, owned_by, pending_for, Action, Actor, EntityKind, Role,
};

use super::{make_request, test_now, TestResult};
use crate::WorkflowStore;

pub(super) async fn run_filter_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "filter",
        "pending_queue_is_department_scoped_for_hod",
        pending_queue_is_department_scoped_for_hod(factory).await,
    ));
    results.push(TestResult::from_result(
        "filter",
        "owner_filter_returns_own_submissions_oldest_first",
        owner_filter_returns_own_submissions_oldest_first(factory).await,
    ));
    results.push(TestResult::from_result(
        "filter",
        "acted_on_history_excludes_untouched_entities",
        acted_on_history_excludes_untouched_entities(factory).await,
    ));

    results
}

async fn pending_queue_is_department_scoped_for_hod<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;

    let ours = make_request("alice", "Housekeeping");
    let theirs = make_request("bob", "Cashier");
    store
        .insert_entity(&ours)
        .await
        .map_err(|e| format!("insert ours: {e}"))?;
    store
        .insert_entity(&theirs)
        .await
        .map_err(|e| format!("insert theirs: {e}"))?;

    let hod = Actor::new("hod-hk", Role::Hod, Some("Housekeeping"));
    let filter =
        pending_for(EntityKind::Request, &hod).map_err(|e| format!("pending_for: {e}"))?;
    let queue = store
        .find_entities(&filter)
        .await
        .map_err(|e| format!("find: {e}"))?;

    if queue.len() != 1 {
        return Err(format!("expected 1 queued entity, got {}", queue.len()));
    }
    if queue[0].id != ours.id {
        return Err("wrong department's entity in queue".to_string());
    }
    Ok(())
}

async fn owner_filter_returns_own_submissions_oldest_first<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;

    let first = make_request("alice", "Housekeeping");
    let second = make_request("alice", "Housekeeping");
    let other = make_request("bob", "Housekeeping");
    for e in [&first, &second, &other] {
        store
            .insert_entity(e)
            .await
            .map_err(|err| format!("insert: {err}"))?;
    }

    let alice = Actor::new("alice", Role::Staff, Some("Housekeeping"));
    let mine = store
        .find_entities(&owned_by(EntityKind::Request, &alice))
        .await
        .map_err(|e| format!("find: {e}"))?;

    if mine.len() != 2 {
        return Err(format!("expected 2 submissions, got {}", mine.len()));
    }
    if mine[0].id != first.id || mine[1].id != second.id {
        return Err("owner filter not in insertion order".to_string());
    }
    Ok(())
}

async fn acted_on_history_excludes_untouched_entities<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = factory().await;

    let touched = make_request("alice", "Housekeeping");
    let untouched = make_request("bob", "Housekeeping");
    store
        .insert_entity(&touched)
        .await
        .map_err(|e| format!("insert: {e}"))?;
    store
        .insert_entity(&untouched)
        .await
        .map_err(|e| format!("insert: {e}"))?;

    let hod = Actor::new("hod-hk", Role::Hod, Some("Housekeeping"));
    let transition = apply(touched.clone(), &hod, Action::Approve, None, test_now())
        .map_err(|e| format!("apply: {e}"))?;
    store
        .update_entity(&touched.status, &transition.entity)
        .await
        .map_err(|e| format!("update: {e}"))?;

    let filter =
        history_for(EntityKind::Request, &hod).map_err(|e| format!("history_for: {e}"))?;
    let history = store
        .find_entities(&filter)
        .await
        .map_err(|e| format!("find: {e}"))?;

    if history.len() != 1 {
        return Err(format!("expected 1 history entity, got {}", history.len()));
    }
    if history[0].id != touched.id {
        return Err("untouched entity leaked into history".to_string());
    }
    Ok(())
}
