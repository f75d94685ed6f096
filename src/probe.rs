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

//! Network liveness checks that gate all remote work on a host.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Extra time granted to the `ping` process on top of its own reply timeout
const PROCESS_GRACE: Duration = Duration::from_secs(2);

/// Best-effort liveness check.
///
/// Implementations never fail: anything that goes wrong while probing
/// is reported as `false`.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self, hostname: &str, timeout: Duration) -> bool;
}

/// Probe backed by the system `ping` binary sending a single echo request.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPing;

impl SystemPing {
    pub fn new() -> Self {
        Self
    }

    /// Arguments for one echo request with the given reply timeout.
    pub(crate) fn ping_args(hostname: &str, timeout: Duration) -> Vec<String> {
        if cfg!(target_os = "windows") {
            let millis = timeout.as_millis().max(1);
            vec![
                "-n".into(),
                "1".into(),
                "-w".into(),
                millis.to_string(),
                hostname.into(),
            ]
        } else if cfg!(target_os = "macos") {
            // BSD ping takes the reply wait in milliseconds
            let millis = timeout.as_millis().max(1);
            vec![
                "-c".into(),
                "1".into(),
                "-W".into(),
                millis.to_string(),
                hostname.into(),
            ]
        } else {
            let secs = timeout.as_secs().max(1);
            vec![
                "-c".into(),
                "1".into(),
                "-W".into(),
                secs.to_string(),
                hostname.into(),
            ]
        }
    }
}

#[async_trait]
impl ReachabilityProbe for SystemPing {
    async fn probe(&self, hostname: &str, timeout: Duration) -> bool {
        let mut cmd = Command::new("ping");
        cmd.args(Self::ping_args(hostname, timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(timeout + PROCESS_GRACE, cmd.status()).await {
            Ok(Ok(status)) => {
                tracing::trace!("ping {} exited with {}", hostname, status);
                status.success()
            }
            Ok(Err(e)) => {
                tracing::debug!("Failed to run ping for {}: {}", hostname, e);
                false
            }
            Err(_) => {
                tracing::debug!("ping for {} did not finish in time", hostname);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_args_single_request() {
        let args = SystemPing::ping_args("css01sth005ts01", Duration::from_secs(1));
        assert_eq!(args.last().map(String::as_str), Some("css01sth005ts01"));
        assert!(args.iter().any(|a| a == "1"));
        assert_eq!(args.len(), 5);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_ping_args_linux_timeout_is_whole_seconds() {
        let args = SystemPing::ping_args("h", Duration::from_millis(200));
        assert_eq!(args, vec!["-c", "1", "-W", "1", "h"]);
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_unreachable() {
        let probe = SystemPing::new();
        // Reserved TLD, never resolves; also covers a missing ping binary
        let reachable = probe
            .probe("no-such-host.invalid", Duration::from_secs(1))
            .await;
        assert!(!reachable);
    }
}
