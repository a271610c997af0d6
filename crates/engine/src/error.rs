use lodgeflow_core::WorkflowError;
use lodgeflow_storage::StorageError;

/// Everything an engine operation can fail with.
///
/// `Workflow` variants are caller mistakes the HTTP layer maps to 4xx;
/// `Storage` is a backend failure surfaced as 5xx (except the not-found
/// variants, which stay 404).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
