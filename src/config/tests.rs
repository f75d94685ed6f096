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

//! Configuration tests.

use serial_test::serial;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

use super::resolver::RunSettings;
use super::types::{Config, SettingsOverrides};
use super::utils::{expand_env_vars, expand_tilde};
use crate::ssh::RemotePlatform;

#[test]
#[serial]
fn test_expand_env_vars() {
    std::env::set_var("FLEETSSH_TEST_VAR", "test_value");
    std::env::remove_var("FLEETSSH_NONEXISTENT");

    assert_eq!(
        expand_env_vars("Hello ${FLEETSSH_TEST_VAR}!"),
        "Hello test_value!"
    );
    assert_eq!(
        expand_env_vars("$FLEETSSH_TEST_VAR/scans"),
        "test_value/scans"
    );
    assert_eq!(
        expand_env_vars("${FLEETSSH_NONEXISTENT}"),
        "${FLEETSSH_NONEXISTENT}"
    );
    assert_eq!(expand_env_vars("$FLEETSSH_NONEXISTENT"), "$FLEETSSH_NONEXISTENT");
    assert_eq!(expand_env_vars("cost: 5$"), "cost: 5$");
    assert_eq!(expand_env_vars("${unclosed"), "${unclosed");
    assert_eq!(expand_env_vars("no variables here"), "no variables here");

    std::env::remove_var("FLEETSSH_TEST_VAR");
}

#[test]
#[serial]
fn test_expand_tilde() {
    let original_home = std::env::var("HOME").ok();
    std::env::set_var("HOME", "/home/user");

    assert_eq!(
        expand_tilde(Path::new("~/.config/fleetssh/config.yaml")),
        PathBuf::from("/home/user/.config/fleetssh/config.yaml")
    );
    assert_eq!(
        expand_tilde(Path::new("/absolute/path")),
        PathBuf::from("/absolute/path")
    );
    assert_eq!(expand_tilde(Path::new("relative")), PathBuf::from("relative"));

    match original_home {
        Some(home) => std::env::set_var("HOME", home),
        None => std::env::remove_var("HOME"),
    }
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
defaults:
  parallel: 12
  ping_timeout: 2
  connect_timeout: 5
  port: 2222
  remote_platform: posix
  remote_destination: /opt/sthi
  export_dir: /var/lib/fleetssh
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.defaults.parallel, Some(12));
    assert_eq!(config.defaults.remote_platform, Some(RemotePlatform::Posix));

    let settings = config.resolve(&SettingsOverrides::default());
    assert_eq!(settings.max_parallel, 12);
    assert_eq!(settings.ping_timeout, Duration::from_secs(2));
    assert_eq!(settings.connect_timeout, Duration::from_secs(5));
    assert_eq!(settings.port, 2222);
    assert_eq!(settings.platform, RemotePlatform::Posix);
    assert_eq!(settings.remote_destination, "/opt/sthi");
    assert_eq!(settings.export_dir, PathBuf::from("/var/lib/fleetssh"));
}

#[test]
fn test_builtin_defaults() {
    let settings = RunSettings::default();
    assert_eq!(settings.max_parallel, 30);
    assert_eq!(settings.ping_timeout, Duration::from_secs(1));
    assert_eq!(settings.connect_timeout, Duration::from_secs(10));
    assert_eq!(settings.port, 22);
    assert_eq!(settings.platform, RemotePlatform::Windows);
    assert_eq!(settings.remote_destination, "C:\\sthi");
    assert_eq!(settings.export_dir, PathBuf::from("."));
}

#[test]
fn test_overrides_win_over_file() {
    let config = Config::from_yaml("defaults:\n  parallel: 12\n  port: 2222\n").unwrap();
    let overrides = SettingsOverrides {
        parallel: Some(4),
        remote_platform: Some(RemotePlatform::Posix),
        ..SettingsOverrides::default()
    };
    let settings = config.resolve(&overrides);
    assert_eq!(settings.max_parallel, 4);
    assert_eq!(settings.port, 2222);
    // Destination follows the platform when the file leaves it unset
    assert_eq!(settings.remote_destination, "sthi");
}

#[test]
fn test_empty_and_invalid_yaml() {
    assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    assert_eq!(Config::from_yaml("defaults: {}").unwrap(), Config::default());
    assert!(Config::from_yaml("defaults:\n  parallel: many\n").is_err());
}

#[tokio::test]
async fn test_load_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load(&dir.path().join("absent.yaml")).await.unwrap();
    assert_eq!(config, Config::default());
}

#[tokio::test]
async fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "defaults:\n  parallel: 7\n").unwrap();

    let config = Config::load_with_priority(&path).await.unwrap();
    assert_eq!(config.defaults.parallel, Some(7));
}

#[tokio::test]
async fn test_load_reports_parse_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "defaults: [not, a, map]\n").unwrap();

    let err = Config::load(&path).await.unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse YAML"));
}
