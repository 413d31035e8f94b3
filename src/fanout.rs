//! Fail-fast fan-out/fan-in over spawned tasks.
//!
//! Every branch runs as its own tokio task. Results come back in spawn
//! order. The first branch error observed is returned as-is; the remaining
//! join handles are dropped, which detaches their tasks rather than aborting
//! them, so siblings run to completion and their outcomes are discarded.

use futures::future::try_join_all;
use std::future::Future;
use tokio::task::{JoinError, JoinHandle};

/// Spawn one task per future and join them with fail-fast semantics.
///
/// A branch that panics is reported through `E::from(JoinError)`.
pub async fn join_fail_fast<T, E, F>(branches: Vec<F>) -> Result<Vec<T>, E>
where
    T: Send + 'static,
    E: From<JoinError> + Send + 'static,
    F: Future<Output = Result<T, E>> + Send + 'static,
{
    let handles: Vec<JoinHandle<Result<T, E>>> =
        branches.into_iter().map(tokio::spawn).collect();

    try_join_all(handles.into_iter().map(|handle| async move {
        match handle.await {
            Ok(result) => result,
            Err(e) => Err(E::from(e)),
        }
    }))
    .await
}
