//! Per-process wiring and per-event invocation.

use std::sync::Arc;

use github::{GitHubHttpClient, GitHubStatusClient};
use relay::{
    process_event, InboundEvent, InvocationId, InvocationResult, RelayError, StatusUpdater,
};
use settings::Settings;
use tracing::{error, info, Instrument};

/// Modules assembled once per process and shared by every invocation.
///
/// Holds no request-scoped state: each call to [`App::handle`] starts from
/// the event alone.
#[derive(Clone)]
pub struct App {
    updater: Arc<dyn StatusUpdater>,
}

impl App {
    /// Settings → HTTP client → status client.
    pub fn from_settings(settings: &Settings) -> Result<Self, RelayError> {
        let http = GitHubHttpClient::from_settings(settings)?;
        let status = GitHubStatusClient::from_settings(http, settings)?;
        Ok(Self::with_updater(Arc::new(status)))
    }

    pub fn with_updater(updater: Arc<dyn StatusUpdater>) -> Self {
        Self { updater }
    }

    /// Handles one event and reports the sentinel for the hosting runtime.
    ///
    /// Every error is logged here, once, and reported as
    /// [`InvocationResult::Error`].
    pub async fn handle(&self, event: InboundEvent) -> InvocationResult {
        let invocation_id = InvocationId::new_random();
        let span = tracing::info_span!(
            "invocation",
            invocation_id = %invocation_id,
            event_id = event.id().unwrap_or_default(),
            event_time = ?event.time(),
        );

        async move {
            match process_event(&event, self.updater.as_ref()).await {
                Ok(outcome) => {
                    let result = outcome.invocation_result();
                    info!(outcome = ?outcome, "{}", result);
                    result
                }
                Err(err) => {
                    error!(
                        error = %err,
                        upstream = err.is_upstream(),
                        "{}",
                        InvocationResult::Error
                    );
                    InvocationResult::Error
                }
            }
        }
        .instrument(span)
        .await
    }
}
