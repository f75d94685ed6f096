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

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use super::{build_executor, follow_run};
use crate::config::RunSettings;
use crate::executor::{presentation_view, ActionConfig, HostResult, RunSummary};
use crate::export::export_results_table;
use crate::host::HostDescriptor;
use crate::ui::OutputFormatter;

pub struct ExecuteActionsParams<'a> {
    pub hosts: Vec<HostDescriptor>,
    pub actions: ActionConfig,
    pub settings: &'a RunSettings,
    pub export: Option<&'a Path>,
}

/// Build and validate the per-host actions from command line values.
pub fn build_actions(
    settings: &RunSettings,
    copy_from: Option<&Path>,
    copy_to: Option<&str>,
    command: Option<&str>,
) -> Result<ActionConfig> {
    let mut actions = ActionConfig::new().with_platform(settings.platform);
    if let Some(source) = copy_from {
        let destination = copy_to.unwrap_or(&settings.remote_destination);
        actions = actions.with_deploy(source, destination);
    }
    if let Some(command) = command {
        actions = actions.with_commands(command);
    }
    actions.validate().context("Nothing to do")?;
    Ok(actions)
}

pub async fn execute_actions(
    params: ExecuteActionsParams<'_>,
    cancel: CancellationToken,
) -> Result<Vec<HostResult>> {
    let action = describe_actions(&params.actions);
    println!(
        "{}",
        OutputFormatter::format_run_header(&action, params.hosts.len())
    );

    let executor = build_executor(params.settings, cancel.clone());
    let handle = executor.start(params.hosts, params.actions)?;
    let results = follow_run(handle, "exec", &cancel).await?;

    println!("\n{} {}\n", "▶".cyan(), "Results".bold());
    for result in presentation_view(&results) {
        print!("{}", OutputFormatter::format_host_result(result));
    }
    println!(
        "{}",
        OutputFormatter::format_summary(&RunSummary::from_results(&results))
    );

    if let Some(path) = params.export {
        match export_results_table(&results, path).await {
            Ok(path) => println!("{} Results exported to {:?}", "●".green(), path),
            Err(warning) => eprintln!("{} {}", "⚠".yellow(), warning),
        }
    }

    Ok(results)
}

fn describe_actions(actions: &ActionConfig) -> String {
    match (actions.run_deploy, actions.run_commands) {
        (true, true) => format!(
            "Deploying {} and running {} command(s)",
            actions.local_path.display(),
            actions.command_sequence.len()
        ),
        (true, false) => format!("Deploying {}", actions.local_path.display()),
        (false, true) => format!("Running {} command(s)", actions.command_sequence.len()),
        (false, false) => "Pinging".to_string(),
    }
}
