//! Core domain of the build-status relay.
//!
//! Turns one CodeBuild lifecycle event into at most one GitHub commit status
//! update. This crate decides *whether* and *what* to update; the `github`
//! infrastructure crate decides *how*, by implementing [`StatusUpdater`].
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`BuildId`, `ProjectName`, `SourceVersion`, etc.) |
//! | [`types`] | Value types (`CommitState`, `StatusUpdateRequest`, `Outcome`, etc.) |
//! | [`errors`] | [`RelayError`] |
//! | [`event`] | Read-only accessors over the inbound event payload |
//! | [`translate`] | Classification and translation into status updates |
//! | [`ports`] | [`StatusUpdater`] |

pub mod errors;
pub mod event;
pub mod identifiers;
pub mod ports;
pub mod translate;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::RelayError;
pub use event::{EventKind, InboundEvent, PHASE_CHANGE_DETAIL_TYPE, STATE_CHANGE_DETAIL_TYPE};
pub use identifiers::{
    BuildId, CommitSha, InvocationId, ProjectName, PullRequestNumber, RepositoryOwner,
    SourceVersion, PULL_REQUEST_PREFIX,
};
pub use ports::StatusUpdater;
pub use translate::{build_status_to_state, process_event, translate, Translation};
pub use types::{
    AppliedStatus, CommitState, CommitStatus, InvocationResult, Outcome, SkipReason,
    StatusUpdateRequest, Timestamp,
};
