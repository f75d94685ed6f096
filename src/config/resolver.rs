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

//! Merging of command line overrides, file values and built-in defaults.

use std::path::PathBuf;
use std::time::Duration;

use super::types::{Config, SettingsOverrides};
use super::utils::{expand_env_vars, expand_tilde};
use crate::executor::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_PARALLEL, DEFAULT_PING_TIMEOUT};
use crate::ssh::{RemotePlatform, DEFAULT_SSH_PORT};

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub max_parallel: usize,
    pub ping_timeout: Duration,
    pub connect_timeout: Duration,
    pub port: u16,
    pub platform: RemotePlatform,
    pub remote_destination: String,
    pub export_dir: PathBuf,
}

impl Config {
    /// Resolve settings with priority: command line, then file, then defaults.
    pub fn resolve(&self, overrides: &SettingsOverrides) -> RunSettings {
        let defaults = &self.defaults;

        let platform = overrides
            .remote_platform
            .or(defaults.remote_platform)
            .unwrap_or_default();

        let remote_destination = defaults
            .remote_destination
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| platform.default_destination().to_string());

        let export_dir = overrides
            .export_dir
            .as_ref()
            .or(defaults.export_dir.as_ref())
            .map(|dir| expand_tilde(&PathBuf::from(expand_env_vars(dir))))
            .unwrap_or_else(|| PathBuf::from("."));

        RunSettings {
            max_parallel: overrides
                .parallel
                .or(defaults.parallel)
                .unwrap_or(DEFAULT_MAX_PARALLEL),
            ping_timeout: overrides
                .ping_timeout
                .or(defaults.ping_timeout)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_PING_TIMEOUT),
            connect_timeout: overrides
                .connect_timeout
                .or(defaults.connect_timeout)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            port: overrides
                .port
                .or(defaults.port)
                .unwrap_or(DEFAULT_SSH_PORT),
            platform,
            remote_destination,
            export_dir,
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Config::default().resolve(&SettingsOverrides::default())
    }
}
