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

//! In-memory stand-ins for the network collaborators.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use fleetssh::executor::HostExecutor;
use fleetssh::probe::ReachabilityProbe;
use fleetssh::ssh::{CommandOutput, RemoteConnector, RemoteSession};
use fleetssh::HostDescriptor;

/// Counts hosts currently being probed or holding an open session.
#[derive(Default)]
pub struct InFlight {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl InFlight {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

/// Probe answering from a fixed set of reachable hostnames.
#[derive(Default)]
pub struct FakeProbe {
    /// `None` means every host answers
    reachable: Option<HashSet<String>>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    gauge: Arc<InFlight>,
}

impl FakeProbe {
    pub fn all_reachable() -> Self {
        Self::default()
    }

    pub fn none_reachable() -> Self {
        Self {
            reachable: Some(HashSet::new()),
            ..Self::default()
        }
    }

    pub fn only(hostnames: &[&str]) -> Self {
        Self {
            reachable: Some(hostnames.iter().map(|h| h.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Count probes in flight on `gauge`.
    pub fn with_gauge(mut self, gauge: Arc<InFlight>) -> Self {
        self.gauge = gauge;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.gauge.max()
    }
}

#[async_trait]
impl ReachabilityProbe for FakeProbe {
    async fn probe(&self, hostname: &str, _timeout: Duration) -> bool {
        self.calls.lock().unwrap().push(hostname.to_string());

        self.gauge.enter();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.gauge.leave();

        match &self.reachable {
            None => true,
            Some(set) => set.contains(hostname),
        }
    }
}

/// Everything a fake session was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect(String),
    Exec(String, String),
    Upload(String, PathBuf, String),
    MakeDir(String, String),
    Close(String),
}

impl Event {
    pub fn hostname(&self) -> &str {
        match self {
            Event::Connect(h)
            | Event::Exec(h, _)
            | Event::Upload(h, _, _)
            | Event::MakeDir(h, _)
            | Event::Close(h) => h,
        }
    }
}

/// Shared state behind [`FakeConnector`] and its sessions.
#[derive(Default)]
pub struct FakeRemote {
    events: Mutex<Vec<Event>>,
    open_sessions: AtomicUsize,
    connect_failures: HashSet<String>,
    stderr_for: HashMap<String, String>,
    exec_failures: HashSet<String>,
    upload_failures: HashSet<String>,
    exec_panics: HashSet<String>,
    cancel_after: Option<(String, CancellationToken)>,
    exec_delay: Duration,
    gauge: Option<Arc<InFlight>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse logins on `hostname`.
    pub fn with_connect_failure(mut self, hostname: &str) -> Self {
        self.connect_failures.insert(hostname.to_string());
        self
    }

    /// Make `command` write `stderr`.
    pub fn with_stderr(mut self, command: &str, stderr: &str) -> Self {
        self.stderr_for
            .insert(command.to_string(), stderr.to_string());
        self
    }

    /// Make `command` fail at the transport level.
    pub fn with_exec_failure(mut self, command: &str) -> Self {
        self.exec_failures.insert(command.to_string());
        self
    }

    /// Fail uploads whose remote path ends with `suffix`.
    pub fn with_upload_failure(mut self, suffix: &str) -> Self {
        self.upload_failures.insert(suffix.to_string());
        self
    }

    /// Panic while running `command`.
    pub fn with_exec_panic(mut self, command: &str) -> Self {
        self.exec_panics.insert(command.to_string());
        self
    }

    /// Cancel `token` once `command` has run.
    pub fn cancelling_after(mut self, command: &str, token: CancellationToken) -> Self {
        self.cancel_after = Some((command.to_string(), token));
        self
    }

    /// Make every command take `delay`.
    pub fn with_exec_delay(mut self, delay: Duration) -> Self {
        self.exec_delay = delay;
        self
    }

    /// Count open sessions on `gauge`.
    pub fn with_gauge(mut self, gauge: Arc<InFlight>) -> Self {
        self.gauge = Some(gauge);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn events_for(&self, hostname: &str) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.hostname() == hostname)
            .collect()
    }

    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct FakeConnector {
    remote: Arc<FakeRemote>,
}

impl FakeConnector {
    pub fn new(remote: Arc<FakeRemote>) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl RemoteConnector for FakeConnector {
    async fn connect(
        &self,
        host: &HostDescriptor,
        _timeout: Duration,
    ) -> Result<Box<dyn RemoteSession>> {
        let hostname = host.hostname().to_string();
        self.remote.record(Event::Connect(hostname.clone()));
        if self.remote.connect_failures.contains(&hostname) {
            bail!("Authentication failed for {}", host.username());
        }
        self.remote.open_sessions.fetch_add(1, Ordering::SeqCst);
        if let Some(gauge) = &self.remote.gauge {
            gauge.enter();
        }
        Ok(Box::new(FakeSession {
            hostname,
            remote: Arc::clone(&self.remote),
            closed: false,
        }))
    }
}

struct FakeSession {
    hostname: String,
    remote: Arc<FakeRemote>,
    closed: bool,
}

#[async_trait]
impl RemoteSession for FakeSession {
    async fn exec(&mut self, command: &str) -> Result<CommandOutput> {
        self.remote
            .record(Event::Exec(self.hostname.clone(), command.to_string()));
        if self.remote.exec_failures.contains(command) {
            bail!("Channel closed while running {command}");
        }
        if self.remote.exec_panics.contains(command) {
            panic!("session handler bug while running {command}");
        }
        if !self.remote.exec_delay.is_zero() {
            tokio::time::sleep(self.remote.exec_delay).await;
        }
        if let Some((trigger, token)) = &self.remote.cancel_after {
            if trigger == command {
                token.cancel();
            }
        }
        let stderr = self.remote.stderr_for.get(command).cloned().unwrap_or_default();
        let stdout = match command.strip_prefix("echo ") {
            Some(text) => format!("{text}\r\n"),
            None => format!("{command} done\n"),
        };
        Ok(CommandOutput {
            stdout,
            stderr,
            exit_status: 0,
        })
    }

    async fn upload_file(&mut self, local_file: &Path, remote_path: &str) -> Result<()> {
        if self
            .remote
            .upload_failures
            .iter()
            .any(|suffix| remote_path.ends_with(suffix.as_str()))
        {
            bail!("Permission denied");
        }
        self.remote.record(Event::Upload(
            self.hostname.clone(),
            local_file.to_path_buf(),
            remote_path.to_string(),
        ));
        Ok(())
    }

    async fn make_dir(&mut self, remote_path: &str) -> Result<()> {
        self.remote
            .record(Event::MakeDir(self.hostname.clone(), remote_path.to_string()));
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.remote.open_sessions.fetch_sub(1, Ordering::SeqCst);
            if let Some(gauge) = &self.remote.gauge {
                gauge.leave();
            }
            self.remote.record(Event::Close(self.hostname.clone()));
        }
        Ok(())
    }
}

/// Executor wired to the given fakes.
pub fn executor(probe: Arc<FakeProbe>, remote: Arc<FakeRemote>) -> HostExecutor {
    HostExecutor::new(probe, Arc::new(FakeConnector::new(remote)))
}

pub fn host(hostname: &str) -> HostDescriptor {
    HostDescriptor::new(hostname, "uss01sth001ts01", "sth@TS001")
}
