//! Dispatch a workflow and follow it to completion: `wfrelay run`.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::super::Cli;

/// What `--json` prints on success.
#[derive(Serialize)]
struct JsonOutput<'a> {
    workflow_url: &'a str,
    correlation_token: &'a str,
    run_id: u64,
}

pub async fn cmd_run(
    cli: &Cli,
    project_dir: PathBuf,
    repo: &str,
    workflow: &str,
    git_ref: &str,
    timeout: Option<Duration>,
    json: bool,
) -> Result<()> {
    use wfrelay::config::RelayConfig;
    use wfrelay::credentials::ConfigCredentials;
    use wfrelay::engine::cancel_after;
    use wfrelay::ui::RunUI;

    let config = RelayConfig::with_cli_args(project_dir, cli.verbose)?;
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    config.check_repo_host(repo)?;
    let credentials = ConfigCredentials::from_toml(&config.toml);
    let orchestrator = config.connect(&credentials)?;

    let cancel = CancellationToken::new();
    if let Some(limit) = timeout.or_else(|| config.max_duration()) {
        cancel_after(cancel.clone(), limit);
    }
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = tokio::signal::ctrl_c() => {
                    if result.is_ok() {
                        tracing::warn!("Interrupted, cancelling (the remote run keeps going)");
                        cancel.cancel();
                    }
                }
            }
        });
    }

    let ui = if json {
        RunUI::hidden()
    } else {
        RunUI::new(cli.verbose)
    };
    ui.start(repo, workflow, git_ref);

    let result = orchestrator
        .run_workflow(repo, workflow, git_ref, &ui, &cancel)
        .await;
    // Stops the timer and signal tasks.
    cancel.cancel();

    match result {
        Ok(output) => {
            if json {
                let out = JsonOutput {
                    workflow_url: &output.workflow_url,
                    correlation_token: output.correlation_token.as_str(),
                    run_id: output.run_id,
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                ui.finish_success(&output);
            }
            Ok(())
        }
        Err(e) => {
            ui.finish_error(&e);
            Err(e.into())
        }
    }
}
