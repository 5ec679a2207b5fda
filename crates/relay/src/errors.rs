//! Error type for the build-status relay.
//!
//! [`RelayError`] covers every condition that turns an invocation into
//! `event:error`. Irrelevant events are not errors; they are reported as
//! [`crate::Outcome::Skipped`].
//!
//! Nothing here is retried. Each variant propagates unchanged to the
//! entrypoint, which logs it and reports failure to the hosting runtime.

use thiserror::Error;

use crate::{ProjectName, PullRequestNumber};

/// Errors that fail a single invocation.
#[derive(Debug, Error)]
pub enum RelayError {
    /// GitHub answered with a non-2xx status.
    ///
    /// The full request/response context has already been logged at the HTTP
    /// boundary by the time this error is observed.
    #[error("{method} {url} failed with status {status}")]
    Upstream {
        /// HTTP method of the failed request.
        method: String,
        /// Absolute URL of the failed request.
        url: String,
        /// Response status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The request never produced a response (timeout, DNS, connection reset).
    #[error("{method} {url} failed: {message}")]
    Transport {
        method: String,
        url: String,
        message: String,
    },

    /// GitHub answered 2xx but the body was not valid JSON.
    #[error("Malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    /// The pull request metadata carried no `head.sha`.
    #[error("Pull request {number} in '{project}' has no head commit")]
    MissingHeadCommit {
        project: ProjectName,
        number: PullRequestNumber,
    },

    /// The source version starts with `pr/` but has no pull request number.
    #[error("Source version '{version}' does not name a pull request number")]
    InvalidSourceVersion { version: String },

    /// An outbound request body could not be serialised.
    #[error("Request body for {path} could not be encoded: {message}")]
    RequestEncoding { path: String, message: String },

    /// A field required to address the update is missing from the event.
    #[error("Malformed event: {message}")]
    MalformedEvent { message: String },

    /// Required configuration is missing or unusable.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl RelayError {
    /// Returns `true` for errors caused by the GitHub API rather than the event.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Upstream { .. }
                | Self::Transport { .. }
                | Self::MalformedResponse { .. }
                | Self::MissingHeadCommit { .. }
        )
    }
}
