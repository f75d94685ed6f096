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

//! Configuration type definitions.

use serde::{Deserialize, Serialize};

use crate::ssh::RemotePlatform;

/// Main configuration structure.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
}

/// Global default settings. Unset keys fall back to built-in values.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Defaults {
    /// Number of hosts worked on at once.
    pub parallel: Option<usize>,
    /// Reachability probe timeout in seconds.
    pub ping_timeout: Option<u64>,
    /// SSH connect timeout in seconds.
    pub connect_timeout: Option<u64>,
    pub port: Option<u16>,
    /// Operating system family of the managed hosts.
    pub remote_platform: Option<RemotePlatform>,
    /// Deploy destination used when none is given on the command line.
    pub remote_destination: Option<String>,
    /// Directory receiving automatic scan exports. Supports `~` and `$VAR`.
    pub export_dir: Option<String>,
}

/// Values given on the command line. They win over the configuration file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SettingsOverrides {
    pub parallel: Option<usize>,
    pub ping_timeout: Option<u64>,
    pub connect_timeout: Option<u64>,
    pub port: Option<u16>,
    pub remote_platform: Option<RemotePlatform>,
    pub export_dir: Option<String>,
}
