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

//! Configuration loading.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::types::Config;
use super::utils::expand_tilde;

/// Default value of the `--config` option
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/fleetssh/config.yaml";

impl Config {
    /// Load configuration from a file. A missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        let expanded_path = expand_tilde(path);

        if !expanded_path.exists() {
            tracing::debug!(
                "Config file not found at {:?}, using defaults",
                expanded_path
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&expanded_path)
            .await
            .with_context(|| format!("Failed to read configuration file at {}. Please check file permissions and ensure the file is accessible.", expanded_path.display()))?;

        Self::from_yaml(&content).with_context(|| {
            format!(
                "Failed to parse YAML configuration file at {}. Please check the YAML syntax is valid.",
                expanded_path.display()
            )
        })
    }

    /// Parse configuration from YAML text. Empty text yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load configuration with priority order:
    /// 1. The `--config` path, when that file exists
    /// 2. The platform configuration directory (`fleetssh/config.yaml`)
    /// 3. Built-in defaults
    pub async fn load_with_priority(cli_config_path: &Path) -> Result<Self> {
        let expanded_cli_path = expand_tilde(cli_config_path);
        if expanded_cli_path.exists() {
            tracing::debug!("Using config file: {:?}", expanded_cli_path);
            return Self::load(&expanded_cli_path).await;
        }

        if let Some(platform_path) = platform_config_path() {
            if platform_path != expanded_cli_path && platform_path.exists() {
                tracing::debug!("Using platform config file: {:?}", platform_path);
                return Self::load(&platform_path).await;
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }
}

/// `config.yaml` inside the platform specific configuration directory.
pub fn platform_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fleetssh").map(|dirs| dirs.config_dir().join("config.yaml"))
}
