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

//! Remote command execution over SSH channels.

use super::connection::Client;

/// Initial capacity for captured stdout
const SSH_CMD_BUFFER_SIZE: usize = 8192;

/// Initial capacity for captured stderr
const SSH_RESPONSE_BUFFER_SIZE: usize = 1024;

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandExecutedResult {
    /// The stdout output of the command.
    pub stdout: String,
    /// The stderr output of the command.
    pub stderr: String,
    /// The unix exit status (`$?` in bash).
    pub exit_status: u32,
}

impl Client {
    /// Execute a remote command via the ssh connection.
    ///
    /// Returns stdout, stderr and the exit code of the command.
    /// Every invocation opens a new channel and therefore a new shell
    /// context: `cd` or variables set in one call are gone in the next.
    ///
    /// There is no timeout on the command itself. Make sure commands don't
    /// read from stdin and exit after bounded time.
    pub async fn execute(&self, command: &str) -> Result<CommandExecutedResult, super::Error> {
        let mut stdout_buffer = Vec::with_capacity(SSH_CMD_BUFFER_SIZE);
        let mut stderr_buffer = Vec::with_capacity(SSH_RESPONSE_BUFFER_SIZE);
        let mut channel = self.connection_handle.channel_open_session().await?;
        channel.exec(true, command).await?;

        let mut result: Option<u32> = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                russh::ChannelMsg::Data { ref data } => stdout_buffer.extend_from_slice(data),
                russh::ChannelMsg::ExtendedData { ref data, ext } => {
                    if ext == 1 {
                        stderr_buffer.extend_from_slice(data)
                    }
                }

                // The exit status can arrive before the last data packet,
                // so keep draining until the channel closes
                russh::ChannelMsg::ExitStatus { exit_status } => result = Some(exit_status),

                _ => {}
            }
        }

        match result {
            Some(exit_status) => Ok(CommandExecutedResult {
                stdout: String::from_utf8_lossy(&stdout_buffer).into_owned(),
                stderr: String::from_utf8_lossy(&stderr_buffer).into_owned(),
                exit_status,
            }),
            None => Err(super::Error::CommandDidntExit),
        }
    }
}
