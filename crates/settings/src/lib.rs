//! Configuration provider for the build-status relay.
//!
//! Configuration is a single JSON document held in an external parameter
//! store. The hosting runtime hands it to the process either inline (usually
//! through an environment variable) or as a file; a [`ParameterSource`]
//! abstracts over the two. The document is fetched and parsed once per
//! process into [`Settings`], which answers dotted-path lookups such as
//! `github.token`.
//!
//! ```json
//! {
//!   "github": { "url": "https://api.github.com", "token": "…", "owner": "example" },
//!   "log": { "level": "debug" }
//! }
//! ```

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

/// Well-known configuration keys.
pub mod keys {
    /// Base URL of the GitHub REST API.
    pub const GITHUB_URL: &str = "github.url";
    /// Token sent as `Authorization: token {token}`.
    pub const GITHUB_TOKEN: &str = "github.token";
    /// Account or organisation owning every built repository.
    pub const GITHUB_OWNER: &str = "github.owner";
    /// Default log filter when `RUST_LOG` is not set.
    pub const LOG_LEVEL: &str = "log.level";
}

/// Errors produced while loading or reading configuration.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The parameter source could not be read.
    #[error("Failed to read parameters from {source_name}: {message}")]
    Source {
        source_name: String,
        message: String,
    },

    /// The parameter document is not valid JSON.
    #[error("Parameters from {source_name} are not valid JSON: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// A required key is absent.
    #[error("Missing configuration key '{key}'")]
    MissingKey { key: String },

    /// A key is present but holds the wrong kind of value.
    #[error("Configuration key '{key}' must be a {expected}")]
    WrongType { key: String, expected: &'static str },
}

// ---------------------------------------------------------------------------
// Parameter sources
// ---------------------------------------------------------------------------

/// Supplies the raw configuration document.
pub trait ParameterSource {
    /// Short label used in error messages and logs.
    fn name(&self) -> String;

    /// Returns the raw JSON document.
    fn fetch(&self) -> Result<String, SettingsError>;
}

/// A document that was handed to the process as a string.
#[derive(Clone)]
pub struct InlineParameterSource {
    document: String,
}

impl InlineParameterSource {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }
}

// The document contains the GitHub token.
impl std::fmt::Debug for InlineParameterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineParameterSource")
            .field("document", &"<redacted>")
            .finish()
    }
}

impl ParameterSource for InlineParameterSource {
    fn name(&self) -> String {
        "inline parameters".to_owned()
    }

    fn fetch(&self) -> Result<String, SettingsError> {
        Ok(self.document.clone())
    }
}

/// A document read from a JSON file.
#[derive(Debug, Clone)]
pub struct FileParameterSource {
    path: PathBuf,
}

impl FileParameterSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ParameterSource for FileParameterSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<String, SettingsError> {
        std::fs::read_to_string(&self.path).map_err(|e| SettingsError::Source {
            source_name: self.name(),
            message: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Parsed configuration, loaded once per process.
#[derive(Clone, PartialEq)]
pub struct Settings {
    root: Value,
}

impl Settings {
    /// Fetches and parses the document from `source`.
    pub fn load(source: &dyn ParameterSource) -> Result<Self, SettingsError> {
        let document = source.fetch()?;
        let root: Value = serde_json::from_str(&document).map_err(|e| SettingsError::Parse {
            source_name: source.name(),
            message: e.to_string(),
        })?;
        tracing::debug!(source = %source.name(), "configuration loaded");
        Ok(Self { root })
    }

    /// Wraps an already-parsed document.
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Resolves a dotted path such as `github.owner`.
    ///
    /// Returns `None` when any segment is missing or an intermediate value is
    /// not an object.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.root, |node, segment| node.as_object()?.get(segment))
    }

    /// Resolves a dotted path that must hold a non-empty string.
    pub fn get_str(&self, path: &str) -> Result<&str, SettingsError> {
        match self.get(path) {
            None | Some(Value::Null) => Err(SettingsError::MissingKey {
                key: path.to_owned(),
            }),
            Some(Value::String(s)) if !s.is_empty() => Ok(s.as_str()),
            Some(_) => Err(SettingsError::WrongType {
                key: path.to_owned(),
                expected: "non-empty string",
            }),
        }
    }

    /// The configured log filter, if any.
    pub fn log_level(&self) -> Option<&str> {
        self.get(keys::LOG_LEVEL)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

// Never print the document: it holds credentials.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings").finish_non_exhaustive()
    }
}
