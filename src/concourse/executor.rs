use crate::concourse::client::{CiClient, Client, Connector};
use crate::concourse::outcome::{self, interpret_output, OperationKind, OperationOutput};
use crate::concourse::parser;
use crate::error::{Error, Result};
use crate::model::{Build, Job, Pipeline, Resource, Team};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

const FLY_TIMEOUT: Duration = Duration::from_secs(30);
const CLIPBOARD_TIMEOUT: Duration = Duration::from_secs(10);

pub const INSTALL_HINT: &str = "Install it from https://concourse-ci.org/download.html";

pub struct FlyClient {
    target: String,
}

impl FlyClient {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    fn scoped<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut scoped = Vec::with_capacity(args.len() + 2);
        if !self.target.is_empty() {
            scoped.push("-t");
            scoped.push(self.target.as_str());
        }
        scoped.extend_from_slice(args);
        scoped
    }

    async fn read(&self, args: &[&str]) -> Result<String> {
        run_fly(&self.scoped(args)).await
    }

    async fn mutate(&self, kind: OperationKind, args: &[&str]) -> Result<OperationOutput> {
        let (exit_ok, raw) = run_fly_combined(&self.scoped(args)).await?;
        let result = interpret_output(kind, &raw, exit_ok);
        tracing::info!(
            target_name = %self.target,
            operation = ?kind,
            success = result.success,
            "fly operation finished"
        );
        Ok(result)
    }
}

#[async_trait]
impl CiClient for FlyClient {
    fn target(&self) -> &str {
        &self.target
    }

    async fn pipelines(&self) -> Result<Vec<Pipeline>> {
        let json = self.read(&["pipelines", "--json"]).await?;
        parser::parse_pipelines(&json)
    }

    async fn jobs(&self, pipeline: &str) -> Result<Vec<Job>> {
        let json = self.read(&["jobs", "-p", pipeline, "--json"]).await?;
        parser::parse_jobs(&json)
    }

    async fn resources(&self, pipeline: &str) -> Result<Vec<Resource>> {
        let json = self.read(&["resources", "-p", pipeline, "--json"]).await?;
        parser::parse_resources(&json)
    }

    async fn builds(&self, pipeline: &str, job: &str, count: usize) -> Result<Vec<Build>> {
        let job_ref = format!("{pipeline}/{job}");
        let count = count.to_string();
        let json = self
            .read(&["builds", "-j", &job_ref, "--json", "--count", &count])
            .await?;
        parser::parse_builds(&json)
    }

    async fn teams(&self) -> Result<Vec<Team>> {
        let json = self.read(&["teams", "--json"]).await?;
        parser::parse_teams(&json)
    }

    async fn status(&self) -> Result<OperationOutput> {
        self.mutate(OperationKind::Status, &["status"]).await
    }

    async fn trigger_job(&self, pipeline: &str, job: &str) -> Result<OperationOutput> {
        let job_ref = format!("{pipeline}/{job}");
        self.mutate(OperationKind::Trigger, &["trigger-job", "-j", &job_ref])
            .await
    }

    async fn rerun_build(&self, pipeline: &str, job: &str, build: u64) -> Result<OperationOutput> {
        let job_ref = format!("{pipeline}/{job}");
        let build = build.to_string();
        self.mutate(
            OperationKind::Rerun,
            &["rerun-build", "--job", &job_ref, "--build", &build],
        )
        .await
    }

    async fn check_resource(&self, pipeline: &str, resource: &str) -> Result<OperationOutput> {
        let resource_ref = format!("{pipeline}/{resource}");
        self.mutate(OperationKind::Check, &["check-resource", "-r", &resource_ref])
            .await
    }

    async fn pause_pipeline(&self, pipeline: &str) -> Result<OperationOutput> {
        self.mutate(OperationKind::Pause, &["pause-pipeline", "-p", pipeline])
            .await
    }

    async fn unpause_pipeline(&self, pipeline: &str) -> Result<OperationOutput> {
        self.mutate(OperationKind::Unpause, &["unpause-pipeline", "-p", pipeline])
            .await
    }

    async fn login(&self, team: &str, username: &str, password: &str) -> Result<OperationOutput> {
        self.mutate(
            OperationKind::Login,
            &["login", "-n", team, "-u", username, "-p", password],
        )
        .await
    }

    async fn sync(&self) -> Result<OperationOutput> {
        self.mutate(OperationKind::Sync, &["sync"]).await
    }
}

#[derive(Debug, Default)]
pub struct FlyConnector;

#[async_trait]
impl Connector for FlyConnector {
    fn connect(&self, target: &str) -> Client {
        Arc::new(FlyClient::new(target))
    }

    fn login_interactive(&self, target: &str, api_url: &str, team: &str) -> Result<()> {
        use std::process::Stdio;

        tracing::info!(target_name = %target, api_url = %api_url, team = %team, "starting interactive login");
        let status = std::process::Command::new("fly")
            .args(["-t", target, "login", "-c", api_url, "-n", team])
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(spawn_error)?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::OperationRejected(format!(
                "fly login exited with {status}"
            )))
        }
    }

    async fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        copy_to_clipboard_impl(text).await
    }
}

pub fn check_fly_available() -> Result<PathBuf> {
    which::which("fly")
        .map_err(|_| Error::CommandExecution(format!("fly CLI not found in PATH. {INSTALL_HINT}")))
}

/// The command a user can paste to finish adding a target by hand.
pub fn manual_login_command(target: &str, api_url: &str, team: &str) -> String {
    format!("fly -t {target} login -c {api_url} -n {team}")
}

/// The check command for `pipeline/resource`, shown while a check runs.
pub fn manual_check_command(target: &str, resource_path: &str) -> String {
    format!("fly -t {target} check-resource -r {resource_path}")
}

fn spawn_error(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        Error::CommandExecution(format!("fly CLI not found. {INSTALL_HINT}"))
    } else {
        Error::CommandExecution(format!("Failed to run fly: {e}"))
    }
}

async fn spawn_fly(args: &[&str]) -> Result<std::process::Output> {
    tokio::time::timeout(FLY_TIMEOUT, Command::new("fly").args(args).output())
        .await
        .map_err(|_| {
            Error::CommandExecution(format!(
                "fly command timed out after {}s",
                FLY_TIMEOUT.as_secs()
            ))
        })?
        .map_err(spawn_error)
}

async fn run_fly(args: &[&str]) -> Result<String> {
    let start = std::time::Instant::now();
    let output = spawn_fly(args).await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let diagnostic = if stderr.trim().is_empty() { stdout } else { stderr };
        tracing::debug!(args = ?redact(args), status = %output.status, "fly command failed");
        return Err(classify_fly_error(&diagnostic));
    }

    tracing::debug!(
        args = ?redact(args),
        elapsed_ms = start.elapsed().as_millis(),
        "fly command completed"
    );
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Runs `fly` and returns its exit status together with stdout and stderr
/// joined, for commands whose result is only expressed as text.
async fn run_fly_combined(args: &[&str]) -> Result<(bool, String)> {
    let start = std::time::Instant::now();
    let output = spawn_fly(args).await?;
    let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    tracing::debug!(
        args = ?redact(args),
        elapsed_ms = start.elapsed().as_millis(),
        exit_ok = output.status.success(),
        "fly command completed"
    );
    Ok((output.status.success(), combined))
}

pub fn classify_fly_error(stderr: &str) -> Error {
    let trimmed = stderr.trim();
    if outcome::is_auth_error(trimmed) {
        return Error::AuthenticationRequired(trimmed.to_string());
    }
    if trimmed.is_empty() {
        Error::CommandExecution("fly command failed".to_string())
    } else {
        Error::CommandExecution(format!("fly command failed: {trimmed}"))
    }
}

/// Masks the value following `-p` when it is a password for `login`.
fn redact<'a>(args: &[&'a str]) -> Vec<&'a str> {
    let is_login = args.contains(&"login");
    let mut out = Vec::with_capacity(args.len());
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            out.push("***");
            mask_next = false;
            continue;
        }
        mask_next = is_login && *arg == "-p";
        out.push(*arg);
    }
    out
}

async fn copy_to_clipboard_impl(text: &str) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let candidates: &[(&str, &[&str])] = if cfg!(target_os = "macos") {
        &[("pbcopy", &[])]
    } else if cfg!(target_os = "windows") {
        &[("clip.exe", &[])]
    } else {
        &[
            ("clip.exe", &[]),
            ("wl-copy", &[]),
            ("xclip", &["-selection", "clipboard"]),
        ]
    };

    for (cmd, args) in candidates {
        let child = Command::new(cmd)
            .args(*args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn();

        let Ok(mut child) = child else { continue };
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| Error::CommandExecution(format!("Failed to write to clipboard: {e}")))?;
        }
        let status = tokio::time::timeout(CLIPBOARD_TIMEOUT, child.wait())
            .await
            .map_err(|_| {
                Error::CommandExecution(format!(
                    "clipboard command timed out after {}s",
                    CLIPBOARD_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| Error::CommandExecution(format!("clipboard command failed: {e}")))?;
        if status.success() {
            return Ok(());
        }
    }

    Err(Error::CommandExecution(
        "No clipboard tool found. Install xclip, wl-copy, or use WSL with clip.exe".to_string(),
    ))
}
