use crate::engine::{EventSink, Outcome, RunEvent, StepCompleted, WorkflowRunOutput};
use crate::errors::WorkflowError;
use crate::ui::icons::{CHECK, CLOCK, CROSS, LINK, ROCKET, SKIP, SPARKLE, STOP};
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Terminal UI for one workflow call: a spinner with the current stage and
/// one printed line per completed step.
///
/// Implements [`EventSink`], so it is handed straight to `run_workflow`.
/// Everything is drawn on stderr; stdout stays free for `--json` output.
pub struct RunUI {
    bar: ProgressBar,
    verbose: bool,
    steps: AtomicUsize,
}

impl RunUI {
    pub fn new(verbose: bool) -> Self {
        Self::with_target(ProgressDrawTarget::stderr(), verbose)
    }

    /// UI that renders nothing. Used when output must stay machine-readable.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden(), false)
    }

    fn with_target(target: ProgressDrawTarget, verbose: bool) -> Self {
        let spinner_style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg} {elapsed:.dim}")
            .expect("progress bar template is a valid static string");

        let bar = ProgressBar::with_draw_target(None, target);
        bar.set_style(spinner_style);
        bar.set_prefix("wfrelay");

        Self {
            bar,
            verbose,
            steps: AtomicUsize::new(0),
        }
    }

    /// Print the request header and start the spinner.
    pub fn start(&self, repo: &str, workflow_id: &str, git_ref: &str) {
        self.print_line(format!(
            "{} {} {} {}",
            style("▶").green().bold(),
            style(workflow_id).yellow().bold(),
            style("on").dim(),
            style(format!("{}@{}", repo, git_ref)).cyan()
        ));
        self.bar.set_message("Dispatching workflow...");
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    /// Number of step lines printed so far.
    pub fn steps_shown(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }

    fn print_line(&self, msg: impl AsRef<str>) {
        if self.bar.is_hidden() {
            return;
        }
        self.bar.println(msg.as_ref());
    }

    pub fn finish_success(&self, output: &WorkflowRunOutput) {
        self.bar.finish_and_clear();
        self.print_line(format!(
            "\n{} Workflow succeeded: {}",
            SPARKLE,
            style(&output.workflow_url).green().bold()
        ));
    }

    pub fn finish_error(&self, err: &WorkflowError) {
        self.bar.finish_and_clear();
        let icon = if err.is_cancelled() { STOP } else { CROSS };
        self.print_line(format!("\n{} {}", icon, style(err).red().bold()));
        if let Some(token) = err.correlation_token() {
            self.print_line(format!(
                "   {} {}",
                style("Correlation token:").dim(),
                token
            ));
        }
    }
}

/// One line for a completed step, coloured by conclusion.
pub fn format_step(step: &StepCompleted) -> String {
    let conclusion = step.conclusion.as_deref().unwrap_or("unknown");
    let (icon, name) = match conclusion {
        "success" => (CHECK, style(&step.step_name).green()),
        "skipped" => (SKIP, style(&step.step_name).dim()),
        _ => (CROSS, style(&step.step_name).red()),
    };
    let suffix = if conclusion == "success" {
        String::new()
    } else {
        format!(" {}", style(format!("({})", conclusion)).dim())
    };
    format!(
        "    {}{} {} {}{}",
        icon,
        style(&step.job_name).dim(),
        style("›").dim(),
        name,
        suffix
    )
}

impl EventSink for RunUI {
    fn emit(&self, event: RunEvent) {
        match event {
            RunEvent::Dispatched {
                token,
                dispatched_at,
            } => {
                self.print_line(format!(
                    "  {} Dispatched at {} {}",
                    ROCKET,
                    dispatched_at.format("%H:%M:%S"),
                    style(format!("(token {})", token)).dim()
                ));
                self.bar.set_message("Waiting for the run to appear...");
            }
            RunEvent::Resolved { run_id, html_url } => {
                self.print_line(format!(
                    "  {} Run {} {}",
                    LINK,
                    style(run_id).cyan(),
                    style(&html_url).underlined()
                ));
                self.bar.set_message("Running");
            }
            RunEvent::StepCompleted(step) => {
                let n = self.steps.fetch_add(1, Ordering::SeqCst) + 1;
                self.print_line(format_step(&step));
                self.bar.set_message(format!(
                    "Running {}",
                    style(format!("({} steps done)", n)).dim()
                ));
            }
            RunEvent::Finished { outcome } => {
                let msg = match outcome {
                    Outcome::Success => format!("{} Run completed", CHECK),
                    Outcome::Failure(reason) => format!("{} Run finished: {}", CROSS, reason),
                };
                if self.verbose {
                    self.print_line(format!("  {} {}", CLOCK, msg));
                }
                self.bar.set_message(msg);
            }
        }
    }
}
