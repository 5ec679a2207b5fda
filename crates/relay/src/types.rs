//! Shared value types for the build-status relay.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! the meaning of an update: which state a commit moves to, what the status
//! line says, and what the handler reports back to its caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BuildId, CommitSha, ProjectName, PullRequestNumber, SourceVersion};

// ---------------------------------------------------------------------------
// Commit status
// ---------------------------------------------------------------------------

/// State of a GitHub commit status.
///
/// GitHub also accepts `error`; the relay never produces it because every
/// unrecognised build outcome is reported as [`CommitState::Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    /// The build is still running.
    Pending,
    /// The build finished successfully.
    Success,
    /// The build finished with any other status.
    Failure,
}

impl CommitState {
    /// Returns the wire representation (`"pending"`, `"success"`, `"failure"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl std::fmt::Display for CommitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------

/// The body of a GitHub "create commit status" request.
///
/// Field order matches the GitHub API documentation. `target_url` is omitted
/// entirely when the event carried no log link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatus {
    pub state: CommitState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    pub description: String,
    pub context: BuildId,
}

// ---------------------------------------------------------------------------

/// A request to update the status of a pull request's head commit.
///
/// Built fresh by the translator for every eligible event and handed to a
/// [`crate::StatusUpdater`]. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdateRequest {
    /// Repository (CodeBuild project) the pull request belongs to.
    pub project: ProjectName,
    /// Source version identifying the pull request (`pr/<number>`).
    pub version: SourceVersion,
    /// Status context; the CodeBuild build id.
    pub context: BuildId,
    /// Target state of the commit status.
    pub state: CommitState,
    /// Human-readable status line.
    pub description: String,
    /// Link to the build logs, when the event carried one.
    pub target_url: Option<String>,
}

impl StatusUpdateRequest {
    /// Returns the outbound status body for this request.
    pub fn to_commit_status(&self) -> CommitStatus {
        CommitStatus {
            state: self.state,
            target_url: self.target_url.clone(),
            description: self.description.clone(),
            context: self.context.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Describes a status update that GitHub accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedStatus {
    pub project: ProjectName,
    pub pull_request: PullRequestNumber,
    pub commit: CommitSha,
    pub state: CommitState,
    pub description: String,
    pub context: BuildId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
}

/// Why an event produced no update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The source version is missing or does not start with `pr/`.
    NotPullRequest { version: Option<String> },
    /// The `detail-type` is neither a phase change nor a state change.
    UnknownEventType { detail_type: Option<String> },
}

/// Result of processing one inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Exactly one commit status was written.
    Updated(AppliedStatus),
    /// The event was irrelevant; no external call was made.
    Skipped(SkipReason),
}

impl Outcome {
    /// Maps the outcome onto the sentinel reported to the hosting runtime.
    pub fn invocation_result(&self) -> InvocationResult {
        match self {
            Self::Updated(_) => InvocationResult::Success,
            Self::Skipped(_) => InvocationResult::Noop,
        }
    }
}

// ---------------------------------------------------------------------------

/// Sentinel reported to the hosting runtime once per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationResult {
    Success,
    Noop,
    Error,
}

impl InvocationResult {
    /// Returns the sentinel string (`event:success`, `event:noop`, `event:error`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "event:success",
            Self::Noop => "event:noop",
            Self::Error => "event:error",
        }
    }

    /// Returns `true` unless the invocation failed.
    pub fn is_ok(self) -> bool {
        !matches!(self, Self::Error)
    }
}

impl std::fmt::Display for InvocationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Parses an RFC 3339 timestamp such as `2017-09-01T16:14:21Z`.
    pub fn parse_rfc3339(value: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| Self(dt.with_timezone(&Utc)))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
