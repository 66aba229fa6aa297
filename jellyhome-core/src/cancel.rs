//! Cooperative cancellation at network suspension points.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{HomeError, HomeResult, RemoteResult};

/// Drives `request` to completion unless `token` fires first.
///
/// The token is checked again after the request resolves, so a response that
/// raced with cancellation is discarded rather than handed to the caller.
pub async fn guarded<T, F>(token: &CancellationToken, request: F) -> HomeResult<T>
where
    F: Future<Output = RemoteResult<T>>,
{
    let outcome = tokio::select! {
        biased;
        _ = token.cancelled() => return Err(HomeError::Cancelled),
        outcome = request => outcome,
    };

    ensure_live(token)?;
    outcome.map_err(HomeError::from)
}

/// Fails with [`HomeError::Cancelled`] once `token` has fired.
pub fn ensure_live(token: &CancellationToken) -> HomeResult<()> {
    if token.is_cancelled() {
        Err(HomeError::Cancelled)
    } else {
        Ok(())
    }
}
