//! Newtype domain identifiers.
//!
//! Every name that crosses the CodeBuild/GitHub boundary is wrapped in its own
//! newtype so that, for example, a [`ProjectName`] cannot be passed where a
//! [`RepositoryOwner`] is expected even though both are plain strings on the
//! wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: CodeBuild side
// ---------------------------------------------------------------------------

string_id! {
    /// The CodeBuild build identifier (usually the full build ARN).
    ///
    /// Used verbatim as the GitHub status `context`, so every build gets its
    /// own status line on the commit.
    BuildId
}

string_id! {
    /// The CodeBuild project name.
    ///
    /// Projects are named after the GitHub repository they build, so this is
    /// also the `{repo}` segment of every GitHub API path.
    ProjectName
}

// ---------------------------------------------------------------------------
// Identifiers: GitHub side
// ---------------------------------------------------------------------------

string_id! {
    /// The GitHub account or organisation that owns every built repository.
    RepositoryOwner
}

string_id! {
    /// A Git commit SHA as returned by GitHub (`head.sha`).
    CommitSha
}

string_id! {
    /// A pull request number, kept exactly as it appears in the source version.
    ///
    /// It is only ever used as a URL path segment, so it is not parsed.
    PullRequestNumber
}

// ---------------------------------------------------------------------------
// Source version
// ---------------------------------------------------------------------------

/// Prefix that marks a CodeBuild source version as a pull-request build.
pub const PULL_REQUEST_PREFIX: &str = "pr/";

/// The CodeBuild source version of a build, e.g. `pr/6`.
///
/// Only versions starting with [`PULL_REQUEST_PREFIX`] can be constructed;
/// branch names, tags and commit ids are rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceVersion(String);

impl SourceVersion {
    /// Creates a [`SourceVersion`], returning `None` unless `value` starts with `pr/`.
    pub fn pull_request(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.starts_with(PULL_REQUEST_PREFIX) {
            Some(Self(v))
        } else {
            None
        }
    }

    /// Returns the pull request number: the second `/`-delimited token.
    ///
    /// `pr/6` yields `6`; `pr/` yields `None`.
    pub fn pull_request_number(&self) -> Option<PullRequestNumber> {
        self.0.split('/').nth(1).and_then(PullRequestNumber::new)
    }

    /// Returns the raw version string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single handler invocation.
///
/// Generated fresh for every event and attached to the invocation span so all
/// log records from one event can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a new random invocation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
