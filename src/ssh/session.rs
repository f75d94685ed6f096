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

//! Remote session abstraction used by the host pipelines.
//!
//! [`RemoteConnector`] opens a [`RemoteSession`] for a host descriptor.
//! The pipeline only ever talks to these traits, which keeps the SSH
//! transport replaceable in tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use russh_sftp::client::SftpSession;
use std::path::Path;
use std::time::Duration;

use super::tokio_client::{self, AuthMethod, Client};
use crate::host::HostDescriptor;

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Captured output of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: u32,
}

impl From<tokio_client::CommandExecutedResult> for CommandOutput {
    fn from(result: tokio_client::CommandExecutedResult) -> Self {
        Self {
            stdout: result.stdout,
            stderr: result.stderr,
            exit_status: result.exit_status,
        }
    }
}

/// Opens authenticated sessions to fleet hosts.
#[async_trait]
pub trait RemoteConnector: Send + Sync {
    /// Connect and authenticate with the descriptor's credentials.
    async fn connect(
        &self,
        host: &HostDescriptor,
        timeout: Duration,
    ) -> Result<Box<dyn RemoteSession>>;
}

/// An open, authenticated session owned by a single host task.
#[async_trait]
pub trait RemoteSession: Send {
    /// Run a command and capture stdout and stderr separately.
    async fn exec(&mut self, command: &str) -> Result<CommandOutput>;

    /// Copy a local file to `remote_path`, replacing any existing file.
    async fn upload_file(&mut self, local_file: &Path, remote_path: &str) -> Result<()>;

    /// Create a remote directory. An existing directory is not an error.
    async fn make_dir(&mut self, remote_path: &str) -> Result<()>;

    /// Close the session. Further calls are not allowed.
    async fn close(&mut self) -> Result<()>;
}

/// Connector backed by russh password authentication.
#[derive(Debug, Clone)]
pub struct SshConnector {
    port: u16,
}

impl SshConnector {
    pub fn new() -> Self {
        Self {
            port: DEFAULT_SSH_PORT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteConnector for SshConnector {
    async fn connect(
        &self,
        host: &HostDescriptor,
        timeout: Duration,
    ) -> Result<Box<dyn RemoteSession>> {
        tracing::debug!(
            "Connecting to {}:{} as {}",
            host.hostname(),
            self.port,
            host.username()
        );
        let client = Client::connect(
            host.hostname(),
            self.port,
            host.username(),
            AuthMethod::with_password(host.password()),
            timeout,
        )
        .await?;
        tracing::debug!(
            "Connected to {} ({}) as {}",
            host.hostname(),
            client.get_connection_address(),
            client.get_connection_username()
        );

        Ok(Box::new(SshSession {
            hostname: host.hostname().to_string(),
            client,
            sftp: None,
        }))
    }
}

/// Live SSH session with a lazily opened SFTP channel.
pub struct SshSession {
    hostname: String,
    client: Client,
    sftp: Option<SftpSession>,
}

impl SshSession {
    async fn sftp(&mut self) -> Result<&SftpSession> {
        if self.sftp.is_none() {
            let sftp = self
                .client
                .open_sftp()
                .await
                .with_context(|| format!("Failed to open SFTP session on {}", self.hostname))?;
            self.sftp = Some(sftp);
        }
        self.sftp
            .as_ref()
            .context("SFTP session unavailable after opening")
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn exec(&mut self, command: &str) -> Result<CommandOutput> {
        tracing::trace!("Running on {}: {}", self.hostname, command);
        let result = self.client.execute(command).await?;
        Ok(result.into())
    }

    async fn upload_file(&mut self, local_file: &Path, remote_path: &str) -> Result<()> {
        let sftp = self.sftp().await?;
        tokio_client::upload_file(sftp, local_file, remote_path).await?;
        Ok(())
    }

    async fn make_dir(&mut self, remote_path: &str) -> Result<()> {
        let sftp = self.sftp().await?;
        tokio_client::create_dir(sftp, remote_path).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(sftp) = self.sftp.take() {
            if let Err(e) = sftp.close().await {
                tracing::debug!("Error closing SFTP for {}: {}", self.hostname, e);
            }
        }
        if !self.client.is_closed() {
            self.client.disconnect().await?;
        }
        tracing::debug!("Session closed for {}", self.hostname);
        Ok(())
    }
}
