//! Commit status updates for pull request head commits.

use async_trait::async_trait;
use serde_json::Value;
use settings::{keys, Settings};
use tracing::{debug, instrument};

use relay::{
    AppliedStatus, CommitSha, CommitStatus, ProjectName, PullRequestNumber, RelayError,
    RepositoryOwner, SourceVersion, StatusUpdateRequest, StatusUpdater,
};

use crate::GitHubHttpClient;

/// Resolves pull request head commits and writes statuses against them.
///
/// The head commit is looked up on every call and never cached: a push to the
/// pull request between two events must move the status to the new commit.
#[derive(Debug, Clone)]
pub struct GitHubStatusClient {
    http: GitHubHttpClient,
    owner: RepositoryOwner,
}

impl GitHubStatusClient {
    pub fn new(http: GitHubHttpClient, owner: RepositoryOwner) -> Self {
        Self { http, owner }
    }

    /// Builds a client for the repository owner named by `github.owner`.
    pub fn from_settings(http: GitHubHttpClient, settings: &Settings) -> Result<Self, RelayError> {
        let owner = settings
            .get_str(keys::GITHUB_OWNER)
            .ok()
            .and_then(RepositoryOwner::new)
            .ok_or_else(|| RelayError::Configuration {
                message: format!("{} must be a non-empty string", keys::GITHUB_OWNER),
            })?;
        Ok(Self::new(http, owner))
    }

    /// Looks up the head commit of the pull request named by `version`.
    ///
    /// `GET /repos/{owner}/{project}/pulls/{number}` and read `head.sha`.
    #[instrument(skip(self), fields(owner = %self.owner))]
    pub async fn resolve_head_commit(
        &self,
        project: &ProjectName,
        version: &SourceVersion,
    ) -> Result<CommitSha, RelayError> {
        let number = pull_request_number(version)?;
        let path = format!("/repos/{}/{}/pulls/{}", self.owner, project, number);
        let pull_request = self.http.get(&path).await?;

        let sha = pull_request
            .pointer("/head/sha")
            .and_then(Value::as_str)
            .and_then(CommitSha::new)
            .ok_or_else(|| RelayError::MissingHeadCommit {
                project: project.clone(),
                number,
            })?;
        debug!(sha = %sha, "resolved head commit");
        Ok(sha)
    }

    /// Creates a status on `sha`.
    ///
    /// `POST /repos/{owner}/{project}/statuses/{sha}`.
    #[instrument(skip(self, status), fields(owner = %self.owner, state = %status.state))]
    pub async fn post_status(
        &self,
        project: &ProjectName,
        sha: &CommitSha,
        status: &CommitStatus,
    ) -> Result<(), RelayError> {
        let path = format!("/repos/{}/{}/statuses/{}", self.owner, project, sha);
        self.http.post(&path, status).await?;
        Ok(())
    }
}

#[async_trait]
impl StatusUpdater for GitHubStatusClient {
    /// Resolves the head commit, then posts the status. Either failure fails
    /// the update; nothing is retried.
    async fn update_status(
        &self,
        request: &StatusUpdateRequest,
    ) -> Result<AppliedStatus, RelayError> {
        let pull_request = pull_request_number(&request.version)?;
        let commit = self
            .resolve_head_commit(&request.project, &request.version)
            .await?;
        let status = request.to_commit_status();
        self.post_status(&request.project, &commit, &status).await?;

        Ok(AppliedStatus {
            project: request.project.clone(),
            pull_request,
            commit,
            state: status.state,
            description: status.description,
            context: status.context,
            target_url: status.target_url,
        })
    }
}

fn pull_request_number(version: &SourceVersion) -> Result<PullRequestNumber, RelayError> {
    version
        .pull_request_number()
        .ok_or_else(|| RelayError::InvalidSourceVersion {
            version: version.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use relay::{BuildId, CommitState};
    use serde_json::json;

    use super::*;

    const SHA: &str = "6dcb09b5b57875f334f61aebed695e2e4193db5e";

    fn client(server: &MockServer) -> GitHubStatusClient {
        let settings = Settings::from_value(json!({
            "github": { "url": server.base_url(), "token": "xxxxxxxx", "owner": "example" }
        }));
        let http = GitHubHttpClient::from_settings(&settings).unwrap();
        GitHubStatusClient::from_settings(http, &settings).unwrap()
    }

    fn project() -> ProjectName {
        ProjectName::new("my-repo").unwrap()
    }

    fn version(v: &str) -> SourceVersion {
        SourceVersion::pull_request(v).unwrap()
    }

    fn request(state: CommitState, description: &str) -> StatusUpdateRequest {
        StatusUpdateRequest {
            project: project(),
            version: version("pr/6"),
            context: BuildId::new("arn:aws:codebuild:us-west-2:123456789012:build/my-repo:b1")
                .unwrap(),
            state,
            description: description.to_owned(),
            target_url: Some("https://console.aws.amazon.com/logs/b1".to_owned()),
        }
    }

    #[tokio::test]
    async fn resolves_head_commit_from_pull_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/example/my-repo/pulls/6");
                then.status(200).json_body(json!({ "number": 6, "head": { "sha": SHA } }));
            })
            .await;

        let sha = client(&server)
            .resolve_head_commit(&project(), &version("pr/6"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(sha.as_str(), SHA);
    }

    #[tokio::test]
    async fn missing_head_sha_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/example/my-repo/pulls/6");
                then.status(200).json_body(json!({ "number": 6, "head": {} }));
            })
            .await;

        let err = client(&server)
            .resolve_head_commit(&project(), &version("pr/6"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::MissingHeadCommit { .. }));
    }

    #[tokio::test]
    async fn version_without_number_makes_no_call() {
        let server = MockServer::start_async().await;
        let any = server
            .mock_async(|when, then| {
                when.path_contains("/repos");
                then.status(200).json_body(json!({}));
            })
            .await;

        let err = client(&server)
            .resolve_head_commit(&project(), &version("pr/"))
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::InvalidSourceVersion { .. }));
        assert_eq!(any.hits_async().await, 0);
    }

    #[tokio::test]
    async fn update_status_resolves_then_posts() {
        let server = MockServer::start_async().await;
        let get = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/example/my-repo/pulls/6")
                    .header("Authorization", "token xxxxxxxx");
                then.status(200).json_body(json!({ "head": { "sha": SHA } }));
            })
            .await;
        let post = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("/repos/example/my-repo/statuses/{SHA}"))
                    .header("Authorization", "token xxxxxxxx")
                    .json_body(json!({
                        "state": "success",
                        "target_url": "https://console.aws.amazon.com/logs/b1",
                        "description": "AWS Codebuild build succeeded.",
                        "context": "arn:aws:codebuild:us-west-2:123456789012:build/my-repo:b1",
                    }));
                then.status(201).json_body(json!({ "id": 1, "state": "success" }));
            })
            .await;

        let applied = client(&server)
            .update_status(&request(CommitState::Success, "AWS Codebuild build succeeded."))
            .await
            .unwrap();

        get.assert_async().await;
        post.assert_async().await;
        assert_eq!(applied.commit.as_str(), SHA);
        assert_eq!(applied.pull_request.as_str(), "6");
        assert_eq!(applied.state, CommitState::Success);
    }

    #[tokio::test]
    async fn failed_lookup_skips_the_post() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/example/my-repo/pulls/6");
                then.status(404).json_body(json!({ "message": "Not Found" }));
            })
            .await;
        let post = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(201);
            })
            .await;

        let err = client(&server)
            .update_status(&request(CommitState::Pending, "AWS Codebuild build in progress..."))
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Upstream { status: 404, .. }));
        assert_eq!(post.hits_async().await, 0);
    }

    #[tokio::test]
    async fn rejected_post_fails_the_update() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/example/my-repo/pulls/6");
                then.status(200).json_body(json!({ "head": { "sha": SHA } }));
            })
            .await;
        let post = server
            .mock_async(|when, then| {
                when.method(POST).path(format!("/repos/example/my-repo/statuses/{SHA}"));
                then.status(422).json_body(json!({ "message": "Validation Failed" }));
            })
            .await;

        let err = client(&server)
            .update_status(&request(
                CommitState::Failure,
                "AWS Codebuild build failed with status FAILED",
            ))
            .await
            .unwrap_err();

        post.assert_async().await;
        assert!(matches!(err, RelayError::Upstream { status: 422, .. }));
    }

    #[test]
    fn owner_is_required() {
        let settings = Settings::from_value(json!({
            "github": { "url": "https://api.github.com", "token": "t" }
        }));
        let http = GitHubHttpClient::from_settings(&settings).unwrap();
        let err = GitHubStatusClient::from_settings(http, &settings).unwrap_err();
        assert!(err.to_string().contains("github.owner"));
    }
}
