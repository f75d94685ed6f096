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

//! Result types for host runs.

use crate::host::HostDescriptor;

/// Outcome reported for every host that fails its reachability probe
pub const UNREACHABLE: &str = "Unreachable";

/// Common view over per-host results, used by the executor and aggregator.
pub trait HostOutcome: Send + 'static {
    fn hostname(&self) -> &str;
    fn pingable(&self) -> bool;
    fn outcome(&self) -> &str;
    fn original_index(&self) -> usize;

    /// Result recorded when the task for `host` died before producing one.
    fn task_failed(index: usize, host: &HostDescriptor, message: String) -> Self
    where
        Self: Sized;
}

/// Result of running the action pipeline on one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostResult {
    pub hostname: String,
    pub pingable: bool,
    pub outcome: String,
    /// Position of the descriptor in the submitted batch
    pub original_index: usize,
}

impl HostResult {
    pub fn unreachable(index: usize, host: &HostDescriptor) -> Self {
        Self {
            hostname: host.hostname().to_string(),
            pingable: false,
            outcome: UNREACHABLE.to_string(),
            original_index: index,
        }
    }

    pub fn reachable(index: usize, host: &HostDescriptor, outcome: String) -> Self {
        Self {
            hostname: host.hostname().to_string(),
            pingable: true,
            outcome,
            original_index: index,
        }
    }
}

impl HostOutcome for HostResult {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn pingable(&self) -> bool {
        self.pingable
    }

    fn outcome(&self) -> &str {
        &self.outcome
    }

    fn original_index(&self) -> usize {
        self.original_index
    }

    fn task_failed(index: usize, host: &HostDescriptor, message: String) -> Self {
        // Whether the probe passed is unknown, so nothing is claimed about the host
        tracing::error!("Host task for {} failed: {}", host.hostname(), message);
        Self::unreachable(index, host)
    }
}

/// Result of the scan workflow, carrying credentials for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub result: HostResult,
    pub username: String,
    pub password: String,
}

impl ScanResult {
    pub fn new(host: &HostDescriptor, result: HostResult) -> Self {
        Self {
            result,
            username: host.username().to_string(),
            password: host.password().to_string(),
        }
    }
}

impl HostOutcome for ScanResult {
    fn hostname(&self) -> &str {
        &self.result.hostname
    }

    fn pingable(&self) -> bool {
        self.result.pingable
    }

    fn outcome(&self) -> &str {
        &self.result.outcome
    }

    fn original_index(&self) -> usize {
        self.result.original_index
    }

    fn task_failed(index: usize, host: &HostDescriptor, message: String) -> Self {
        Self::new(host, HostResult::task_failed(index, host, message))
    }
}
