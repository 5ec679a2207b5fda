//! GitHub infrastructure adapter for the build-status relay.
//!
//! Implements [`relay::StatusUpdater`] over the GitHub REST API:
//!
//! - [`GitHubHttpClient`]: a `reqwest` client bound to the API base URL,
//!   token, media type and a fixed 1 s timeout. Every non-2xx response is
//!   logged once at this boundary before the error propagates.
//! - [`GitHubStatusClient`]: resolves a pull request's head commit and posts
//!   a commit status against it.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. Which events
//! produce which statuses is decided in the [`relay`] crate.

pub mod http;
pub mod status;

pub use http::{GitHubHttpClient, GITHUB_ACCEPT, REQUEST_TIMEOUT};
pub use status::GitHubStatusClient;
