use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use super::models::{DispatchPayload, Job, JobList, WorkflowRun, WorkflowRunList};
use super::repo::RepoSlug;
use crate::errors::ApiError;

/// Public GitHub REST endpoint.
pub const GITHUB_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("wfrelay/", env!("CARGO_PKG_VERSION"));

/// Runs requested per listing call. Recent dispatches land on the first page.
const RUNS_PER_PAGE: &str = "50";
const JOBS_PER_PAGE: &str = "100";

/// The four Actions operations the engine needs.
/// Real implementation: `GitHubClient`. Test double: `engine::testing::FakeActions`.
#[async_trait]
pub trait ActionsApi: Send + Sync {
    /// Trigger a `workflow_dispatch` event. GitHub answers 204 without a run id.
    async fn dispatch_workflow(
        &self,
        repo: &RepoSlug,
        workflow_id: &str,
        payload: &DispatchPayload,
    ) -> Result<(), ApiError>;

    /// Recent runs created by `workflow_dispatch` events.
    async fn list_dispatch_runs(&self, repo: &RepoSlug) -> Result<Vec<WorkflowRun>, ApiError>;

    async fn list_jobs(&self, repo: &RepoSlug, run_id: u64) -> Result<Vec<Job>, ApiError>;

    async fn get_run(&self, repo: &RepoSlug, run_id: u64) -> Result<WorkflowRun, ApiError>;
}

/// Bearer-authenticated client for the GitHub Actions REST API.
///
/// Cloning is cheap; the underlying `reqwest::Client` shares its pool.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .field("token", &super::token::redact(&self.token))
            .finish()
    }
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(API_VERSION),
        );

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn repo_url(&self, repo: &RepoSlug, path: &str) -> String {
        format!("{}/repos/{}/{}", self.api_url, repo, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        let resp = error_for_status(resp).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Turn a non-2xx response into `ApiError::Status`, keeping the body for diagnostics.
async fn error_for_status(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ActionsApi for GitHubClient {
    async fn dispatch_workflow(
        &self,
        repo: &RepoSlug,
        workflow_id: &str,
        payload: &DispatchPayload,
    ) -> Result<(), ApiError> {
        let url = self.repo_url(repo, &format!("actions/workflows/{}/dispatches", workflow_id));
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await?;
        error_for_status(resp).await?;
        Ok(())
    }

    async fn list_dispatch_runs(&self, repo: &RepoSlug) -> Result<Vec<WorkflowRun>, ApiError> {
        let url = self.repo_url(repo, "actions/runs");
        let list: WorkflowRunList = self
            .get_json(
                &url,
                &[("event", "workflow_dispatch"), ("per_page", RUNS_PER_PAGE)],
            )
            .await?;
        Ok(list.workflow_runs)
    }

    async fn list_jobs(&self, repo: &RepoSlug, run_id: u64) -> Result<Vec<Job>, ApiError> {
        let url = self.repo_url(repo, &format!("actions/runs/{}/jobs", run_id));
        let list: JobList = self.get_json(&url, &[("per_page", JOBS_PER_PAGE)]).await?;
        Ok(list.jobs)
    }

    async fn get_run(&self, repo: &RepoSlug, run_id: u64) -> Result<WorkflowRun, ApiError> {
        let url = self.repo_url(repo, &format!("actions/runs/{}", run_id));
        self.get_json(&url, &[]).await
    }
}
