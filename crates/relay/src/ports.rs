//! Port traits implemented by infrastructure crates.

use async_trait::async_trait;

use crate::{AppliedStatus, RelayError, StatusUpdateRequest};

/// Writes a commit status for the head commit of a pull request.
///
/// Implementations resolve the head commit and post the status as two strictly
/// sequential calls. A failure in either step fails the whole update; nothing
/// is retried.
#[async_trait]
pub trait StatusUpdater: Send + Sync {
    async fn update_status(
        &self,
        request: &StatusUpdateRequest,
    ) -> Result<AppliedStatus, RelayError>;
}
