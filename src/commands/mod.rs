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

//! Subcommand implementations.

pub mod exec;
pub mod scan;

use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::RunSettings;
use crate::executor::{HostExecutor, HostOutcome, RunHandle};
use crate::probe::SystemPing;
use crate::ssh::SshConnector;
use crate::ui::create_progress_bar;

/// Executor wired to the system ping and SSH for the given settings.
pub(crate) fn build_executor(settings: &RunSettings, cancel: CancellationToken) -> HostExecutor {
    HostExecutor::new(
        Arc::new(SystemPing::new()),
        Arc::new(SshConnector::new().with_port(settings.port)),
    )
    .with_max_parallel(settings.max_parallel)
    .with_ping_timeout(settings.ping_timeout)
    .with_connect_timeout(settings.connect_timeout)
    .with_cancellation(cancel)
}

/// Show a progress bar until the run finishes, then return its results.
pub(crate) async fn follow_run<T: HostOutcome>(
    mut handle: RunHandle<T>,
    prefix: &str,
    cancel: &CancellationToken,
) -> Result<Vec<T>> {
    let pb = create_progress_bar(handle.total(), prefix)?;

    while let Some(completed) = handle.next_progress().await {
        pb.set_position(completed as u64);
    }

    if cancel.is_cancelled() {
        pb.abandon_with_message("cancelled");
    } else {
        pb.finish_and_clear();
    }

    handle.wait().await
}
