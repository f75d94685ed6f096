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

//! Per-batch action configuration.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ssh::RemotePlatform;

/// Delimiter joining commands in a raw command string
pub const COMMAND_DELIMITER: &str = "&&";

/// What to do on every reachable host.
///
/// Built once per batch and shared read-only by all host tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionConfig {
    pub run_deploy: bool,
    pub local_path: PathBuf,
    pub remote_destination: String,
    pub run_commands: bool,
    pub command_sequence: Vec<String>,
    pub platform: RemotePlatform,
}

/// Reasons a run request cannot start.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionConfigError {
    #[error("provide a deploy source, a command, or both")]
    NoAction,

    #[error("deploy source path cannot be empty")]
    EmptySourcePath,
}

impl ActionConfig {
    /// Configuration that only probes reachability.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_platform(mut self, platform: RemotePlatform) -> Self {
        self.platform = platform;
        self
    }

    /// Enable the deploy step.
    ///
    /// A blank destination falls back to the platform default. Call
    /// [`with_platform`](Self::with_platform) first when targeting a
    /// non-default platform.
    pub fn with_deploy(mut self, local_path: impl AsRef<Path>, remote_destination: &str) -> Self {
        let destination = remote_destination.trim();
        self.run_deploy = true;
        self.local_path = local_path.as_ref().to_path_buf();
        self.remote_destination = if destination.is_empty() {
            self.platform.default_destination().to_string()
        } else {
            destination.to_string()
        };
        self
    }

    /// Enable the command step from a raw `a && b && c` string.
    ///
    /// The step stays disabled when no command survives splitting.
    pub fn with_commands(mut self, raw: &str) -> Self {
        self.command_sequence = split_commands(raw);
        self.run_commands = !self.command_sequence.is_empty();
        self
    }

    /// Check that a run has something to do.
    pub fn validate(&self) -> Result<(), ActionConfigError> {
        if !self.run_deploy && !self.run_commands {
            return Err(ActionConfigError::NoAction);
        }
        if self.run_deploy && self.local_path.as_os_str().is_empty() {
            return Err(ActionConfigError::EmptySourcePath);
        }
        Ok(())
    }
}

/// Split a raw command string on [`COMMAND_DELIMITER`], dropping blanks.
pub fn split_commands(raw: &str) -> Vec<String> {
    raw.split(COMMAND_DELIMITER)
        .map(str::trim)
        .filter(|cmd| !cmd.is_empty())
        .map(str::to_string)
        .collect()
}
