//! Event classification and translation into commit status updates.
//!
//! [`translate`] is pure: it decides whether an event is relevant and, if so,
//! builds the [`StatusUpdateRequest`]. [`process_event`] adds logging and hands
//! the request to a [`StatusUpdater`].

use tracing::{debug, info, warn};

use crate::{
    BuildId, CommitState, EventKind, InboundEvent, Outcome, ProjectName, RelayError, SkipReason,
    SourceVersion, StatusUpdateRequest, StatusUpdater,
};

/// Placeholder rendered for descriptive fields the event did not carry.
pub const UNKNOWN_FIELD: &str = "UNKNOWN";

/// Result of classifying an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// The event maps to exactly one status update.
    Update(StatusUpdateRequest),
    /// The event is irrelevant.
    Skip(SkipReason),
}

/// Fields shared by every recognised event subtype.
struct Common {
    project: ProjectName,
    version: SourceVersion,
    context: BuildId,
}

/// Classifies `event` and builds the status update it implies.
///
/// The source version is checked first; a non pull-request build is skipped
/// before any other field is read. Build id and project name are required
/// only once the event is known to be relevant.
pub fn translate(event: &InboundEvent) -> Result<Translation, RelayError> {
    let raw_version = event.source_version();
    let Some(version) = raw_version.and_then(SourceVersion::pull_request) else {
        return Ok(Translation::Skip(SkipReason::NotPullRequest {
            version: raw_version.map(str::to_owned),
        }));
    };

    let Some(kind) = event.detail_type().and_then(EventKind::from_detail_type) else {
        return Ok(Translation::Skip(SkipReason::UnknownEventType {
            detail_type: event.detail_type().map(str::to_owned),
        }));
    };

    let common = Common {
        project: event
            .project_name()
            .and_then(ProjectName::new)
            .ok_or_else(|| missing_field("detail.project-name"))?,
        context: event
            .build_id()
            .and_then(BuildId::new)
            .ok_or_else(|| missing_field("detail.build-id"))?,
        version,
    };

    let request = match kind {
        EventKind::PhaseChange => phase_change(event, common),
        EventKind::StateChange => state_change(event, common),
    };
    Ok(Translation::Update(request))
}

/// Processes one event end to end.
///
/// Skipped events make no call on `updater`. Errors from the updater are
/// returned unchanged.
pub async fn process_event(
    event: &InboundEvent,
    updater: &dyn StatusUpdater,
) -> Result<Outcome, RelayError> {
    match translate(event)? {
        Translation::Skip(reason) => {
            match &reason {
                SkipReason::NotPullRequest { version } => {
                    debug!(source_version = ?version, "skipping non PR event");
                }
                SkipReason::UnknownEventType { detail_type } => {
                    warn!(detail_type = ?detail_type, "unknown event type");
                }
            }
            Ok(Outcome::Skipped(reason))
        }
        Translation::Update(request) => {
            info!(
                project = %request.project,
                source_version = %request.version,
                state = %request.state,
                description = %request.description,
                "updating pull request status"
            );
            let applied = updater.update_status(&request).await?;
            Ok(Outcome::Updated(applied))
        }
    }
}

/// Phase changes always leave the commit pending.
fn phase_change(event: &InboundEvent, common: Common) -> StatusUpdateRequest {
    let phase = event.completed_phase().unwrap_or(UNKNOWN_FIELD);
    let phase_status = event.completed_phase_status().unwrap_or(UNKNOWN_FIELD);
    let duration = event
        .completed_phase_duration()
        .unwrap_or_else(|| UNKNOWN_FIELD.to_owned());

    StatusUpdateRequest {
        project: common.project,
        version: common.version,
        context: common.context,
        state: CommitState::Pending,
        description: format!("{phase} phase {phase_status} after {duration} second(s)"),
        target_url: event.deep_link().map(str::to_owned),
    }
}

fn state_change(event: &InboundEvent, common: Common) -> StatusUpdateRequest {
    let raw_state = event.build_status().unwrap_or(UNKNOWN_FIELD);
    let state = build_status_to_state(raw_state);
    let description = match state {
        CommitState::Pending => "AWS Codebuild build in progress...".to_owned(),
        CommitState::Failure => format!("AWS Codebuild build failed with status {raw_state}"),
        CommitState::Success => "AWS Codebuild build succeeded.".to_owned(),
    };

    StatusUpdateRequest {
        project: common.project,
        version: common.version,
        context: common.context,
        state,
        description,
        target_url: event.deep_link().map(str::to_owned),
    }
}

/// Maps a CodeBuild build status onto a commit state. Fails closed: anything
/// other than `IN_PROGRESS` or `SUCCEEDED` is a failure.
pub fn build_status_to_state(build_status: &str) -> CommitState {
    match build_status {
        "IN_PROGRESS" => CommitState::Pending,
        "SUCCEEDED" => CommitState::Success,
        _ => CommitState::Failure,
    }
}

fn missing_field(field: &str) -> RelayError {
    RelayError::MalformedEvent {
        message: format!("missing {field}"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::{AppliedStatus, CommitSha};

    const BUILD_ARN: &str = "arn:aws:codebuild:us-west-2:123456789012:build/my-repo:b1";

    /// Records every request and answers with a fixed sha.
    #[derive(Default)]
    struct RecordingUpdater {
        requests: Mutex<Vec<StatusUpdateRequest>>,
        fail: bool,
    }

    impl RecordingUpdater {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<StatusUpdateRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatusUpdater for RecordingUpdater {
        async fn update_status(
            &self,
            request: &StatusUpdateRequest,
        ) -> Result<AppliedStatus, RelayError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(RelayError::Upstream {
                    method: "GET".into(),
                    url: "https://api.example.com/repos/example/my-repo/pulls/6".into(),
                    status: 404,
                    body: "{}".into(),
                });
            }
            Ok(AppliedStatus {
                project: request.project.clone(),
                pull_request: request.version.pull_request_number().unwrap(),
                commit: CommitSha::new("6dcb09b5b57875f334f61aebed695e2e4193db5e").unwrap(),
                state: request.state,
                description: request.description.clone(),
                context: request.context.clone(),
                target_url: request.target_url.clone(),
            })
        }
    }

    fn state_event(status: &str, version: &str) -> InboundEvent {
        InboundEvent::new(json!({
            "detail-type": "CodeBuild Build State Change",
            "detail": {
                "build-status": status,
                "build-id": BUILD_ARN,
                "project-name": "my-repo",
                "additional-information": {
                    "source-version": version,
                    "logs": { "deep-link": "https://console.aws.amazon.com/logs/b1" }
                }
            }
        }))
    }

    fn phase_event(detail: Value) -> InboundEvent {
        let mut event = json!({
            "detail-type": "CodeBuild Build Phase Change",
            "detail": {
                "build-id": BUILD_ARN,
                "project-name": "my-repo",
                "additional-information": { "source-version": "pr/6" }
            }
        });
        if let (Some(target), Value::Object(extra)) = (event["detail"].as_object_mut(), detail) {
            target.extend(extra);
        }
        InboundEvent::new(event)
    }

    fn expect_update(event: &InboundEvent) -> StatusUpdateRequest {
        match translate(event).unwrap() {
            Translation::Update(request) => request,
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn non_pr_versions_are_skipped() {
        for version in ["v1.0.0", "main", "refs/heads/pr/6", "PR/6"] {
            let event = state_event("SUCCEEDED", version);
            assert_eq!(
                translate(&event).unwrap(),
                Translation::Skip(SkipReason::NotPullRequest {
                    version: Some(version.to_owned())
                })
            );
        }
    }

    #[test]
    fn missing_version_is_skipped_before_other_fields() {
        // No build id, project or type: the version filter must win.
        let event = InboundEvent::new(json!({ "detail": {} }));
        assert_eq!(
            translate(&event).unwrap(),
            Translation::Skip(SkipReason::NotPullRequest { version: None })
        );
    }

    #[test]
    fn unknown_detail_type_is_skipped() {
        let event = InboundEvent::new(json!({
            "detail-type": "CodeBuild Build Retry",
            "detail": { "additional-information": { "source-version": "pr/6" } }
        }));
        assert_eq!(
            translate(&event).unwrap(),
            Translation::Skip(SkipReason::UnknownEventType {
                detail_type: Some("CodeBuild Build Retry".to_owned())
            })
        );
    }

    #[test]
    fn phase_change_is_always_pending() {
        for phase_status in ["SUCCEEDED", "FAILED", "TIMED_OUT"] {
            let request = expect_update(&phase_event(json!({
                "completed-phase": "BUILD",
                "completed-phase-status": phase_status,
                "completed-phase-duration-seconds": 3,
            })));
            assert_eq!(request.state, CommitState::Pending);
            assert_eq!(
                request.description,
                format!("BUILD phase {phase_status} after 3 second(s)")
            );
        }
    }

    #[test]
    fn provisioning_phase_description() {
        let request = expect_update(&phase_event(json!({
            "completed-phase": "PROVISIONING",
            "completed-phase-status": "SUCCEEDED",
            "completed-phase-duration-seconds": 21,
        })));
        assert_eq!(request.description, "PROVISIONING phase SUCCEEDED after 21 second(s)");
        assert_eq!(request.context.as_str(), BUILD_ARN);
        assert_eq!(request.project.as_str(), "my-repo");
        assert_eq!(request.version.as_str(), "pr/6");
        assert_eq!(request.target_url, None);
    }

    #[test]
    fn phase_change_defaults_missing_fields() {
        let request = expect_update(&phase_event(json!({})));
        assert_eq!(request.description, "UNKNOWN phase UNKNOWN after UNKNOWN second(s)");
    }

    #[test]
    fn state_change_mapping() {
        let cases = [
            ("IN_PROGRESS", CommitState::Pending, "AWS Codebuild build in progress..."),
            ("SUCCEEDED", CommitState::Success, "AWS Codebuild build succeeded."),
            ("FAILED", CommitState::Failure, "AWS Codebuild build failed with status FAILED"),
            ("STOPPED", CommitState::Failure, "AWS Codebuild build failed with status STOPPED"),
            ("succeeded", CommitState::Failure, "AWS Codebuild build failed with status succeeded"),
        ];
        for (status, state, description) in cases {
            let request = expect_update(&state_event(status, "pr/6"));
            assert_eq!(request.state, state, "build status {status}");
            assert_eq!(request.description, description);
            assert_eq!(
                request.target_url.as_deref(),
                Some("https://console.aws.amazon.com/logs/b1")
            );
        }
    }

    #[test]
    fn missing_build_status_fails_closed() {
        let event = InboundEvent::new(json!({
            "detail-type": "CodeBuild Build State Change",
            "detail": {
                "build-id": BUILD_ARN,
                "project-name": "my-repo",
                "additional-information": { "source-version": "pr/6" }
            }
        }));
        let request = expect_update(&event);
        assert_eq!(request.state, CommitState::Failure);
        assert_eq!(request.description, "AWS Codebuild build failed with status UNKNOWN");
    }

    #[test]
    fn relevant_event_without_project_is_malformed() {
        let event = InboundEvent::new(json!({
            "detail-type": "CodeBuild Build State Change",
            "detail": {
                "build-id": BUILD_ARN,
                "additional-information": { "source-version": "pr/6" }
            }
        }));
        let err = translate(&event).unwrap_err();
        assert!(matches!(err, RelayError::MalformedEvent { .. }));
        assert!(err.to_string().contains("detail.project-name"));
    }

    #[tokio::test]
    async fn skipped_events_make_no_update_call() {
        let updater = RecordingUpdater::default();
        let outcome = process_event(&state_event("SUCCEEDED", "v1.0.0"), &updater)
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Skipped(_)));
        assert!(updater.requests().is_empty());
    }

    #[tokio::test]
    async fn eligible_event_updates_exactly_once() {
        let updater = RecordingUpdater::default();
        let outcome = process_event(&state_event("SUCCEEDED", "pr/6"), &updater)
            .await
            .unwrap();

        let requests = updater.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].state, CommitState::Success);
        match outcome {
            Outcome::Updated(applied) => {
                assert_eq!(applied.pull_request.as_str(), "6");
                assert_eq!(applied.state, CommitState::Success);
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn updater_errors_propagate_unchanged() {
        let updater = RecordingUpdater::failing();
        let err = process_event(&state_event("FAILED", "pr/6"), &updater)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Upstream { status: 404, .. }));
        assert_eq!(updater.requests().len(), 1);
    }
}
