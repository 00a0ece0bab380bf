use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt::Debug;

use crate::{
    error::StatusError,
    model::{StatusUpdateRequest, StatusUpdateResult},
    shutdown::Shutdown,
};

pub mod github;

pub use github::GithubStatusClient;

/// Destination of the status update.
#[async_trait]
pub trait StatusPublisher: Send + Sync + Debug {
    /// Send `request` once. Returns [`StatusError::Cancelled`] if `shutdown`
    /// fires while the request is in flight.
    async fn update_status(
        &self,
        request: &StatusUpdateRequest,
        shutdown: &Shutdown,
    ) -> Result<StatusUpdateResult, StatusError>;
}

/// Reject an acknowledgement whose `updated_at` is older than `window`
/// at `now`. A `None` window accepts anything.
pub fn ensure_recent(
    result: &StatusUpdateResult,
    now: DateTime<Utc>,
    window: Option<TimeDelta>,
) -> Result<(), StatusError> {
    let Some(window) = window else {
        return Ok(());
    };

    // A window reaching past the representable range accepts everything.
    let Some(oldest) = now.checked_sub_signed(window) else {
        return Ok(());
    };

    if result.updated_at < oldest {
        return Err(StatusError::Stale {
            updated_at: result.updated_at,
            checked_at: now,
        });
    }

    Ok(())
}
