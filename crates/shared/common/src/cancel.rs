//! Cooperative cancellation for client calls.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};

/// Run `fut` until it completes or `token` is cancelled.
///
/// A token that is already cancelled short-circuits without polling `fut`.
pub async fn with_cancel<T, F>(token: &CancellationToken, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    if token.is_cancelled() {
        return Err(AppError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(AppError::Cancelled),
        result = fut => result,
    }
}
