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

//! Bounded-concurrency fan-out of host pipelines with ordered fan-in.

use anyhow::{bail, Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::action::ActionConfig;
use super::pipeline::{run_action_pipeline, PipelineContext};
use super::result_types::{HostOutcome, HostResult, ScanResult};
use super::scan::run_scan_pipeline;
use crate::host::HostDescriptor;
use crate::probe::ReachabilityProbe;
use crate::ssh::RemoteConnector;

/// Default number of hosts worked on at the same time
pub const DEFAULT_MAX_PARALLEL: usize = 30;
/// Default reply timeout for the reachability probe
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(1);
/// Default SSH connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs one pipeline per host descriptor with at most `max_parallel` in flight.
pub struct HostExecutor {
    probe: Arc<dyn ReachabilityProbe>,
    connector: Arc<dyn RemoteConnector>,
    max_parallel: usize,
    ping_timeout: Duration,
    connect_timeout: Duration,
    cancel: CancellationToken,
}

impl HostExecutor {
    pub fn new(probe: Arc<dyn ReachabilityProbe>, connector: Arc<dyn RemoteConnector>) -> Self {
        Self {
            probe,
            connector,
            max_parallel: DEFAULT_MAX_PARALLEL,
            ping_timeout: DEFAULT_PING_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the worker pool size.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    /// Set the reachability probe timeout.
    pub fn with_ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    /// Set the SSH connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the run when cancelled.
    ///
    /// Cancelling prevents new network calls and further progress reports;
    /// calls already in flight run until their own timeout.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Start the action pipeline on every host.
    pub fn start(
        &self,
        hosts: Vec<HostDescriptor>,
        actions: ActionConfig,
    ) -> Result<RunHandle<HostResult>> {
        tracing::info!(
            "Starting run on {} hosts (deploy: {}, commands: {})",
            hosts.len(),
            actions.run_deploy,
            actions.run_commands
        );
        let actions = Arc::new(actions);
        self.spawn_run(hosts, move |index, host, ctx| {
            run_action_pipeline(index, host, Arc::clone(&actions), ctx)
        })
    }

    /// Run the action pipeline on every host and wait for all results.
    pub async fn execute(
        &self,
        hosts: Vec<HostDescriptor>,
        actions: ActionConfig,
    ) -> Result<Vec<HostResult>> {
        self.start(hosts, actions)?.wait().await
    }

    /// Start the scan workflow on every host.
    pub fn start_scan(&self, hosts: Vec<HostDescriptor>) -> Result<RunHandle<ScanResult>> {
        tracing::info!("Starting scan of {} hosts", hosts.len());
        self.spawn_run(hosts, run_scan_pipeline)
    }

    /// Scan every host and wait for all results.
    pub async fn scan(&self, hosts: Vec<HostDescriptor>) -> Result<Vec<ScanResult>> {
        self.start_scan(hosts)?.wait().await
    }

    fn spawn_run<T, F, Fut>(&self, hosts: Vec<HostDescriptor>, task: F) -> Result<RunHandle<T>>
    where
        T: HostOutcome,
        F: Fn(usize, HostDescriptor, Arc<PipelineContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        if self.max_parallel == 0 {
            bail!("Maximum parallel tasks must be at least 1");
        }

        let total = hosts.len();
        let ctx = Arc::new(PipelineContext {
            probe: Arc::clone(&self.probe),
            connector: Arc::clone(&self.connector),
            ping_timeout: self.ping_timeout,
            connect_timeout: self.connect_timeout,
            cancel: self.cancel.clone(),
        });
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let cancel = self.cancel.clone();
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();

        tracing::debug!("Fanning out {} tasks over {} workers", total, self.max_parallel);

        let results = tokio::spawn(async move {
            let mut in_flight = FuturesUnordered::new();
            for (index, host) in hosts.iter().cloned().enumerate() {
                let semaphore = Arc::clone(&semaphore);
                let ctx = Arc::clone(&ctx);
                let job = task(index, host, ctx);
                let handle = tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .context("Semaphore acquisition failed")?;
                    Ok::<T, anyhow::Error>(job.await)
                });
                in_flight.push(async move { (index, handle.await) });
            }

            collect_in_order(hosts, in_flight, progress_tx, cancel).await
        });

        Ok(RunHandle {
            total,
            progress: progress_rx,
            results,
        })
    }
}

/// Write each finished task into its submission slot and report progress.
async fn collect_in_order<T, S>(
    hosts: Vec<HostDescriptor>,
    mut in_flight: S,
    progress_tx: mpsc::UnboundedSender<usize>,
    cancel: CancellationToken,
) -> Vec<T>
where
    T: HostOutcome,
    S: futures::Stream<Item = (usize, Result<Result<T>, tokio::task::JoinError>)> + Unpin,
{
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(hosts.len()).collect();
    let mut completed = 0usize;

    while let Some((index, joined)) = in_flight.next().await {
        let outcome = match joined {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => T::task_failed(index, &hosts[index], format!("{e:#}")),
            Err(e) => {
                T::task_failed(index, &hosts[index], format!("Task execution failed: {e}"))
            }
        };
        slots[index] = Some(outcome);
        completed += 1;

        if !cancel.is_cancelled() {
            // The receiver may be gone; results are still collected
            let _ = progress_tx.send(completed);
        }
        tracing::debug!("Progress: {}/{} completed", completed, hosts.len());
    }

    tracing::info!("All {} host tasks completed", completed);

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                T::task_failed(index, &hosts[index], "no result recorded".to_string())
            })
        })
        .collect()
}

/// A started run: a progress stream plus the final ordered results.
pub struct RunHandle<T> {
    total: usize,
    progress: mpsc::UnboundedReceiver<usize>,
    results: JoinHandle<Vec<T>>,
}

impl<T: HostOutcome> RunHandle<T> {
    /// Number of host descriptors in the run.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Next completed-count update, or `None` once the run is over.
    pub async fn next_progress(&mut self) -> Option<usize> {
        self.progress.recv().await
    }

    /// Wait for every task and return results in submission order.
    pub async fn wait(self) -> Result<Vec<T>> {
        drop(self.progress);
        self.results.await.context("Result collector task failed")
    }
}
