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

//! Scan workflow: probe each host and prove an SSH login works.

use std::sync::Arc;

use super::pipeline::{close_session, is_cancellation, PipelineContext, CANCELLED};
use super::result_types::{HostResult, ScanResult};
use crate::host::HostDescriptor;

/// Command run on every reachable host during a scan.
pub fn scan_command(hostname: &str) -> String {
    format!("echo hello {hostname}")
}

/// Probe one host and, when it answers, log in and run [`scan_command`].
pub async fn run_scan_pipeline(
    index: usize,
    host: HostDescriptor,
    ctx: Arc<PipelineContext>,
) -> ScanResult {
    tracing::debug!("[{}] Scanning {}", index + 1, host.hostname());

    if !ctx.ping(&host).await {
        return ScanResult::new(&host, HostResult::unreachable(index, &host));
    }

    let outcome = match ctx.connect(&host).await {
        Ok(mut session) => {
            let outcome = match session.exec(&scan_command(host.hostname())).await {
                Ok(output) => {
                    let stderr = output.stderr.trim();
                    if stderr.is_empty() {
                        output.stdout.trim().to_string()
                    } else {
                        format!("Error: {stderr}")
                    }
                }
                Err(e) => format!("SSH Error: {e:#}"),
            };
            close_session(session, &host).await;
            outcome
        }
        Err(e) if is_cancellation(&e) => CANCELLED.to_string(),
        Err(e) => format!("SSH Error: {e:#}"),
    };

    tracing::debug!("[{}] Scan completed for {}", index + 1, host.hostname());
    ScanResult::new(&host, HostResult::reachable(index, &host, outcome))
}
