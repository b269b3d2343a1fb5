//! Optional deadlines for monitor calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::error::Elapsed;

/// Run `fut`, giving up after `limit` when one is set.
pub async fn with_timeout<F: Future>(limit: Option<Duration>, fut: F) -> Result<F::Output, Elapsed> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await,
        None => Ok(fut.await),
    }
}
