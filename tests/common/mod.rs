//! A wiremock stand-in for the GitHub Actions REST API.
//!
//! The dispatch endpoint captures the correlation token from the request body
//! and the jobs endpoint echoes it back in a job name, the way a workflow that
//! uses `${{ inputs.correlation_id }}` in its job name would.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use serde_json::json;
use tracing_subscriber::{EnvFilter, fmt};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const RUN_ID: u64 = 4242;
pub const WORKFLOW: &str = "ci.yaml";

static INIT: Once = Once::new();

/// Capture logs per test; shown only for failures unless `--nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt().with_env_filter(filter).with_test_writer().init();
    });
}

pub fn run_url() -> String {
    format!("https://github.com/org/repo/actions/runs/{}", RUN_ID)
}

#[derive(Clone, Default)]
pub struct CapturedToken(Arc<Mutex<Option<String>>>);

impl CapturedToken {
    pub fn get(&self) -> Option<String> {
        self.0.lock().unwrap().clone()
    }
}

struct CaptureDispatch {
    token: CapturedToken,
    input_key: String,
}

impl Respond for CaptureDispatch {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400),
        };
        *self.token.0.lock().unwrap() = body["inputs"][&self.input_key]
            .as_str()
            .map(str::to_string);
        ResponseTemplate::new(204)
    }
}

struct JobsWithToken {
    token: CapturedToken,
}

impl Respond for JobsWithToken {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let token = self.token.get().unwrap_or_default();
        ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 1,
            "jobs": [{
                "id": 1,
                "name": format!("build-{}", token),
                "status": "completed",
                "steps": [
                    {"name": "checkout", "status": "completed", "conclusion": "success", "number": 1},
                    {"name": "test", "status": "completed", "conclusion": "success", "number": 2}
                ]
            }]
        }))
    }
}

/// Mount a repository whose `ci.yaml` run finishes with `conclusion`.
pub async fn mount_github(server: &MockServer, input_key: &str, conclusion: &str) -> CapturedToken {
    let token = CapturedToken::default();

    Mock::given(method("POST"))
        .and(path(format!("/repos/org/repo/actions/workflows/{}/dispatches", WORKFLOW)))
        .respond_with(CaptureDispatch {
            token: token.clone(),
            input_key: input_key.to_string(),
        })
        .mount(server)
        .await;

    // Far-future creation time so the run is never older than the dispatch.
    Mock::given(method("GET"))
        .and(path("/repos/org/repo/actions/runs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 2,
            "workflow_runs": [
                {
                    "id": 1,
                    "path": ".github/workflows/ci.yaml",
                    "created_at": "2020-01-01T00:00:00Z",
                    "status": "completed",
                    "conclusion": "success",
                    "html_url": "https://github.com/org/repo/actions/runs/1"
                },
                {
                    "id": RUN_ID,
                    "path": ".github/workflows/ci.yaml",
                    "created_at": "2099-01-01T00:00:00Z",
                    "status": "in_progress",
                    "html_url": run_url()
                }
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/org/repo/actions/runs/{}/jobs", RUN_ID)))
        .respond_with(JobsWithToken {
            token: token.clone(),
        })
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/org/repo/actions/runs/{}", RUN_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": RUN_ID,
            "path": ".github/workflows/ci.yaml",
            "created_at": "2099-01-01T00:00:00Z",
            "status": "completed",
            "conclusion": conclusion,
            "html_url": run_url()
        })))
        .mount(server)
        .await;

    token
}
