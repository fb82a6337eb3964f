//! GitHub Actions REST surface.
//!
//! | Module   | Responsibility                                           |
//! |----------|----------------------------------------------------------|
//! | `client` | `ActionsApi` trait + `GitHubClient` (reqwest)            |
//! | `models` | Serde types for runs, jobs, steps and dispatch payloads  |
//! | `repo`   | `RepoSlug` parsing from `owner/repo` or GitHub URLs      |
//! | `token`  | Token prefix checks and log redaction                    |

pub mod client;
pub mod models;
pub mod repo;
pub mod token;

pub use client::{ActionsApi, GITHUB_API_URL, GitHubClient};
pub use models::{DispatchPayload, Job, Step, WorkflowRun};
pub use repo::RepoSlug;

/// REST base URL for a GitHub host: the public API for `github.com`,
/// `https://<host>/api/v3` for Enterprise Server.
pub fn api_url_for_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() || host == "github.com" || host == "api.github.com" {
        GITHUB_API_URL.to_string()
    } else {
        format!("https://{}/api/v3", host)
    }
}
