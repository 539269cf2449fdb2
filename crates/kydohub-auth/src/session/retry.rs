//! Client-side recovery from a stale or expired session.

use kydohub_core::result::AppResult;

/// Run `attempt`; if it fails with a refreshable error, run `refresh` once
/// and `attempt` once more.
///
/// Any error from the refresh or the second attempt is returned as is.
/// There is no further retry.
pub async fn with_refresh_retry<T, A, AFut, R, RFut>(mut attempt: A, refresh: R) -> AppResult<T>
where
    A: FnMut() -> AFut,
    AFut: Future<Output = AppResult<T>>,
    R: FnOnce() -> RFut,
    RFut: Future<Output = AppResult<()>>,
{
    match attempt().await {
        Err(err) if err.kind.is_refreshable() => {
            tracing::debug!(kind = %err.kind, "Refreshing session before a single retry");
            refresh().await?;
            attempt().await
        }
        other => other,
    }
}
