// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-host action pipeline.
//!
//! ```text
//! INIT -> PING -> UNREACHABLE                       (outcome "Unreachable")
//!              -> REACHABLE -> [DEPLOY] -> [COMMANDS] -> DONE
//! ```
//!
//! Steps run strictly in order for one host. Every failure past the probe
//! is folded into the host's outcome text; nothing escapes the pipeline.

use anyhow::{Context, Result};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::action::ActionConfig;
use super::result_types::HostResult;
use crate::host::HostDescriptor;
use crate::probe::ReachabilityProbe;
use crate::ssh::{RemoteConnector, RemotePlatform, RemoteSession};

pub const LOCAL_PATH_MISSING: &str = "Local path does not exist.";
pub const CANCELLED: &str = "Cancelled";
pub const STEP_SEPARATOR: &str = "\n---\n";

/// Collaborators and limits shared by every host task of one run.
#[derive(Clone)]
pub struct PipelineContext {
    pub probe: Arc<dyn ReachabilityProbe>,
    pub connector: Arc<dyn RemoteConnector>,
    pub ping_timeout: Duration,
    pub connect_timeout: Duration,
    pub cancel: CancellationToken,
}

impl PipelineContext {
    /// Probe the host unless the run was cancelled first.
    pub(crate) async fn ping(&self, host: &HostDescriptor) -> bool {
        if self.cancel.is_cancelled() {
            tracing::debug!("Run cancelled, not probing {}", host.hostname());
            return false;
        }
        self.probe.probe(host.hostname(), self.ping_timeout).await
    }

    /// Open a session unless the run was cancelled first.
    pub(crate) async fn connect(&self, host: &HostDescriptor) -> Result<Box<dyn RemoteSession>> {
        check_cancelled(&self.cancel)?;
        self.connector.connect(host, self.connect_timeout).await
    }
}

/// Close a session, logging instead of failing.
pub(crate) async fn close_session(mut session: Box<dyn RemoteSession>, host: &HostDescriptor) {
    if let Err(e) = session.close().await {
        tracing::debug!("Error closing session for {}: {:#}", host.hostname(), e);
    }
}

/// Run the full pipeline for one host.
pub async fn run_action_pipeline(
    index: usize,
    host: HostDescriptor,
    actions: Arc<ActionConfig>,
    ctx: Arc<PipelineContext>,
) -> HostResult {
    tracing::debug!("[{}] Pinging {}", index + 1, host.hostname());
    if !ctx.ping(&host).await {
        tracing::debug!("[{}] {} unreachable, skipping", index + 1, host.hostname());
        return HostResult::unreachable(index, &host);
    }
    tracing::debug!("[{}] {} reachable", index + 1, host.hostname());

    // Session work catches its own panics; this covers the rest of the steps
    let steps = AssertUnwindSafe(run_steps(index, &host, &actions, &ctx)).catch_unwind();
    let outcome = match steps.await {
        Ok(outcome) => outcome,
        Err(panic) => task_panicked(&host, panic.as_ref()),
    };

    tracing::debug!("[{}] Pipeline completed for {}", index + 1, host.hostname());
    HostResult::reachable(index, &host, outcome)
}

async fn run_steps(
    index: usize,
    host: &HostDescriptor,
    actions: &ActionConfig,
    ctx: &PipelineContext,
) -> String {
    let deploy_outcome = if actions.run_deploy {
        tracing::debug!("[{}] Deploying to {}", index + 1, host.hostname());
        Some(run_deploy(host, actions, ctx).await)
    } else {
        None
    };

    let commands_outcome = if actions.run_commands {
        tracing::debug!("[{}] Running commands on {}", index + 1, host.hostname());
        Some(run_commands(host, &actions.command_sequence, ctx).await)
    } else {
        None
    };

    combine_outcomes(deploy_outcome, commands_outcome)
}

/// Join step outcomes the way results are reported.
pub fn combine_outcomes(deploy: Option<String>, commands: Option<String>) -> String {
    match (deploy, commands) {
        (Some(deploy), Some(commands)) => format!("{deploy}{STEP_SEPARATOR}{commands}"),
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocalKind {
    File,
    Directory,
}

async fn local_kind(path: &Path) -> Option<LocalKind> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => Some(LocalKind::File),
        Ok(metadata) if metadata.is_dir() => Some(LocalKind::Directory),
        _ => None,
    }
}

/// Deploy step: copy the local file or directory to the host.
async fn run_deploy(
    host: &HostDescriptor,
    actions: &ActionConfig,
    ctx: &PipelineContext,
) -> String {
    let Some(kind) = local_kind(&actions.local_path).await else {
        tracing::warn!("Local path {:?} does not exist", actions.local_path);
        return LOCAL_PATH_MISSING.to_string();
    };

    let mut session = match ctx.connect(host).await {
        Ok(session) => session,
        Err(e) if is_cancellation(&e) => {
            tracing::debug!("Deploy skipped on {}: run cancelled", host.hostname());
            return CANCELLED.to_string();
        }
        Err(e) => return format!("Copy failed: {e:#}"),
    };

    let work = deploy_with_session(session.as_mut(), host, kind, actions, ctx);
    let finished = AssertUnwindSafe(work).catch_unwind().await;
    let outcome = match finished {
        Ok(Ok(message)) => message,
        Ok(Err(e)) if is_cancellation(&e) => {
            tracing::debug!("Deploy to {} stopped: run cancelled", host.hostname());
            CANCELLED.to_string()
        }
        Ok(Err(e)) => {
            tracing::debug!("Copy to {} failed: {:#}", host.hostname(), e);
            format!("Copy failed: {e:#}")
        }
        Err(panic) => task_panicked(host, panic.as_ref()),
    };

    close_session(session, host).await;
    outcome
}

async fn deploy_with_session(
    session: &mut dyn RemoteSession,
    host: &HostDescriptor,
    kind: LocalKind,
    actions: &ActionConfig,
    ctx: &PipelineContext,
) -> Result<String> {
    let destination = actions.remote_destination.as_str();
    let platform = actions.platform;

    // Best effort: a failed mkdir shows up later as a failed upload
    check_cancelled(&ctx.cancel)?;
    let mkdir = platform.mkdir_command(destination);
    match session.exec(&mkdir).await {
        Ok(output) if !output.stderr.trim().is_empty() => {
            tracing::warn!(
                "Creating {} on {} reported: {}",
                destination,
                host.hostname(),
                output.stderr.trim()
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(
                "Failed to create {} on {}: {:#}",
                destination,
                host.hostname(),
                e
            );
        }
    }

    match kind {
        LocalKind::File => {
            let file_name = actions
                .local_path
                .file_name()
                .with_context(|| format!("{:?} has no file name", actions.local_path))?
                .to_string_lossy();
            let remote_file = platform.join(destination, &file_name);
            check_cancelled(&ctx.cancel)?;
            session
                .upload_file(&actions.local_path, &remote_file)
                .await
                .with_context(|| format!("Failed to upload {:?}", actions.local_path))?;
            Ok(format!("File copied to {remote_file}"))
        }
        LocalKind::Directory => {
            upload_tree(
                session,
                actions.local_path.clone(),
                destination.to_string(),
                platform,
                &ctx.cancel,
            )
            .await?;
            Ok(format!("Folder copied to {destination}"))
        }
    }
}

/// Mirror `local_dir` into `remote_dir`, depth first, siblings in name order.
fn upload_tree<'a>(
    session: &'a mut dyn RemoteSession,
    local_dir: PathBuf,
    remote_dir: String,
    platform: RemotePlatform,
    cancel: &'a CancellationToken,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        check_cancelled(cancel)?;
        session
            .make_dir(&remote_dir)
            .await
            .with_context(|| format!("Failed to create remote directory {remote_dir}"))?;

        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&local_dir)
            .await
            .with_context(|| format!("Failed to read local directory {local_dir:?}"))?;
        while let Some(entry) = dir.next_entry().await? {
            entries.push(entry);
        }
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let name = entry.file_name();
            let remote_path = platform.join(&remote_dir, &name.to_string_lossy());
            let file_type = entry.file_type().await?;

            // Follow symlinks the way a plain copy would
            let is_dir = if file_type.is_symlink() {
                tokio::fs::metadata(&path).await?.is_dir()
            } else {
                file_type.is_dir()
            };

            if is_dir {
                upload_tree(&mut *session, path, remote_path, platform, cancel).await?;
            } else {
                check_cancelled(cancel)?;
                session
                    .upload_file(&path, &remote_path)
                    .await
                    .with_context(|| format!("Failed to upload {path:?}"))?;
            }
        }

        Ok(())
    })
}

/// Commands step: run the sequence in one session, one output line each.
///
/// A cancelled run keeps the lines of the commands that already ran and ends
/// with a `Cancelled` line.
async fn run_commands(
    host: &HostDescriptor,
    commands: &[String],
    ctx: &PipelineContext,
) -> String {
    let mut session = match ctx.connect(host).await {
        Ok(session) => session,
        Err(e) if is_cancellation(&e) => {
            tracing::debug!("Commands skipped on {}: run cancelled", host.hostname());
            return CANCELLED.to_string();
        }
        Err(e) => return format!("SSH ERR: {e:#}"),
    };

    let mut lines = Vec::with_capacity(commands.len());
    let work = exec_sequence(session.as_mut(), host, commands, &ctx.cancel, &mut lines);
    let finished = AssertUnwindSafe(work).catch_unwind().await;
    let outcome = match finished {
        Ok(Ok(())) => lines.join("\n"),
        Ok(Err(e)) if is_cancellation(&e) => {
            tracing::debug!(
                "Command sequence on {} stopped after {} of {}: run cancelled",
                host.hostname(),
                lines.len(),
                commands.len()
            );
            lines.push(CANCELLED.to_string());
            lines.join("\n")
        }
        Ok(Err(e)) => {
            tracing::debug!("SSH exception for {}: {:#}", host.hostname(), e);
            format!("SSH ERR: {e:#}")
        }
        Err(panic) => task_panicked(host, panic.as_ref()),
    };

    close_session(session, host).await;
    outcome
}

async fn exec_sequence(
    session: &mut dyn RemoteSession,
    host: &HostDescriptor,
    commands: &[String],
    cancel: &CancellationToken,
    lines: &mut Vec<String>,
) -> Result<()> {
    for command in commands {
        check_cancelled(cancel)?;
        tracing::debug!("Running command on {}: {}", host.hostname(), command);
        let output = session.exec(command).await?;
        lines.push(command_line(&output.stdout, &output.stderr));
    }
    Ok(())
}

/// Output line for one command: stderr wins when there is any.
pub fn command_line(stdout: &str, stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        stdout.trim().to_string()
    } else {
        format!("ERR: {stderr}")
    }
}

/// Raised when a step stops because the run was cancelled.
#[derive(Debug, thiserror::Error)]
#[error("Cancelled")]
pub(crate) struct Cancelled;

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Cancelled.into());
    }
    Ok(())
}

pub(crate) fn is_cancellation(error: &anyhow::Error) -> bool {
    error.downcast_ref::<Cancelled>().is_some()
}

/// Outcome for a step that panicked; the panic is logged with the host.
fn task_panicked(host: &HostDescriptor, panic: &(dyn std::any::Any + Send)) -> String {
    let message = panic_message(panic);
    tracing::error!("Task for {} panicked: {}", host.hostname(), message);
    format!("Task failed: {message}")
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_outcomes() {
        assert_eq!(
            combine_outcomes(Some("File copied to C:\\sthi\\a".into()), Some("ok".into())),
            "File copied to C:\\sthi\\a\n---\nok"
        );
        assert_eq!(combine_outcomes(Some("d".into()), None), "d");
        assert_eq!(combine_outcomes(None, Some("c".into())), "c");
        assert_eq!(combine_outcomes(None, None), "");
    }

    #[test]
    fn test_command_line_prefers_stderr() {
        assert_eq!(command_line("  out \r\n", ""), "out");
        assert_eq!(command_line("out", " denied \n"), "ERR: denied");
        assert_eq!(command_line("", "   "), "");
    }

    #[test]
    fn test_cancellation_survives_context() {
        let wrapped = anyhow::Error::from(Cancelled).context("Failed to upload a.txt");
        assert!(is_cancellation(&wrapped));
        assert!(!is_cancellation(&anyhow::anyhow!("Cancelled")));
        assert!(check_cancelled(&CancellationToken::new()).is_ok());
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "task panicked");
    }
}
