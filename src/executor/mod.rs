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

//! Parallel execution of per-host pipelines.

mod action;
mod aggregator;
mod parallel;
mod pipeline;
mod result_types;
mod scan;

pub use action::{split_commands, ActionConfig, ActionConfigError, COMMAND_DELIMITER};
pub use aggregator::{order_by_submission, presentation_view, RunSummary};
pub use parallel::{
    HostExecutor, RunHandle, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_PARALLEL, DEFAULT_PING_TIMEOUT,
};
pub use pipeline::{
    combine_outcomes, command_line, run_action_pipeline, PipelineContext, CANCELLED,
    LOCAL_PATH_MISSING, STEP_SEPARATOR,
};
pub use result_types::{HostOutcome, HostResult, ScanResult, UNREACHABLE};
pub use scan::{run_scan_pipeline, scan_command};
