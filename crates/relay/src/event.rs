//! Read-only view of an inbound CodeBuild event.
//!
//! The payload is kept as a raw [`serde_json::Value`] and every field is read
//! through an explicit accessor. A missing or mistyped field yields `None`
//! from its accessor instead of failing the whole event, so the pull-request
//! filter can run before anything else is inspected.

use serde_json::Value;

use crate::Timestamp;

/// `detail-type` of a CodeBuild phase-change notification.
pub const PHASE_CHANGE_DETAIL_TYPE: &str = "CodeBuild Build Phase Change";

/// `detail-type` of a CodeBuild state-change notification.
pub const STATE_CHANGE_DETAIL_TYPE: &str = "CodeBuild Build State Change";

/// Recognised event subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A build completed one phase of its pipeline.
    PhaseChange,
    /// A build's overall status transitioned.
    StateChange,
}

impl EventKind {
    /// Classifies a `detail-type` value; `None` for anything unrecognised.
    pub fn from_detail_type(detail_type: &str) -> Option<Self> {
        match detail_type {
            PHASE_CHANGE_DETAIL_TYPE => Some(Self::PhaseChange),
            STATE_CHANGE_DETAIL_TYPE => Some(Self::StateChange),
            _ => None,
        }
    }
}

/// An inbound build lifecycle event. Immutable; lives for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    raw: Value,
}

impl InboundEvent {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// `id`: the event bus identifier, used for log correlation only.
    pub fn id(&self) -> Option<&str> {
        self.str_at("/id")
    }

    /// `time`: when the event was emitted.
    pub fn time(&self) -> Option<Timestamp> {
        self.str_at("/time").and_then(Timestamp::parse_rfc3339)
    }

    /// `detail-type`: the subtype discriminator.
    pub fn detail_type(&self) -> Option<&str> {
        self.str_at("/detail-type")
    }

    /// `detail.additional-information.source-version`.
    pub fn source_version(&self) -> Option<&str> {
        self.str_at("/detail/additional-information/source-version")
    }

    /// `detail.build-id`.
    pub fn build_id(&self) -> Option<&str> {
        self.str_at("/detail/build-id")
    }

    /// `detail.project-name`.
    pub fn project_name(&self) -> Option<&str> {
        self.str_at("/detail/project-name")
    }

    /// `detail.additional-information.logs.deep-link`.
    pub fn deep_link(&self) -> Option<&str> {
        self.str_at("/detail/additional-information/logs/deep-link")
    }

    /// `detail.completed-phase`.
    pub fn completed_phase(&self) -> Option<&str> {
        self.str_at("/detail/completed-phase")
    }

    /// `detail.completed-phase-status`.
    pub fn completed_phase_status(&self) -> Option<&str> {
        self.str_at("/detail/completed-phase-status")
    }

    /// `detail.completed-phase-duration-seconds`, rendered for display.
    ///
    /// CodeBuild sends a number; a string is accepted as-is.
    pub fn completed_phase_duration(&self) -> Option<String> {
        match self.raw.pointer("/detail/completed-phase-duration-seconds")? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// `detail.build-status`.
    pub fn build_status(&self) -> Option<&str> {
        self.str_at("/detail/build-status")
    }

    fn str_at(&self, pointer: &str) -> Option<&str> {
        self.raw.pointer(pointer).and_then(Value::as_str)
    }
}
