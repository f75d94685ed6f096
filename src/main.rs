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
use clap::Parser;
use owo_colors::OwoColorize;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use fleetssh::{
    cli::{Cli, Commands},
    commands::{
        exec::{build_actions, execute_actions, ExecuteActionsParams},
        scan::scan_hosts,
    },
    config::Config,
    utils::init_logging,
};

/// Format a Duration into a human-readable string
fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs_f64();

    if total_seconds < 1.0 {
        format!("{:.1} ms", total_seconds * 1000.0)
    } else if total_seconds < 60.0 {
        format!("{total_seconds:.2} s")
    } else {
        let minutes = duration.as_secs() / 60;
        let seconds = duration.as_secs() % 60;
        if seconds == 0 {
            format!("{minutes}m")
        } else {
            format!("{minutes}m {seconds}s")
        }
    }
}

/// Cancel the run on the first Ctrl-C.
fn install_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!(
                "\n{} Cancelling: no new hosts will be contacted, waiting for running calls",
                "⚠".yellow()
            );
            cancel.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config::load_with_priority(&cli.config).await?;
    let settings = config.resolve(&cli.overrides());
    tracing::debug!("Resolved settings: {:?}", settings);

    // Selection errors are reported before any host is touched
    let selection = cli
        .host_args()
        .selection()
        .context("Invalid host selection")?;
    let hosts = selection.expand();
    tracing::info!(
        "Selected {} ids expanding to {} hosts",
        selection.id_count(),
        hosts.len()
    );

    let cancel = CancellationToken::new();
    let started = Instant::now();

    match &cli.command {
        Commands::Exec {
            copy_from,
            copy_to,
            command,
            export,
            ..
        } => {
            let actions = build_actions(
                &settings,
                copy_from.as_deref(),
                copy_to.as_deref(),
                command.as_deref(),
            )?;
            install_ctrl_c_handler(cancel.clone());
            execute_actions(
                ExecuteActionsParams {
                    hosts,
                    actions,
                    settings: &settings,
                    export: export.as_deref(),
                },
                cancel,
            )
            .await?;
        }
        Commands::Scan { .. } => {
            install_ctrl_c_handler(cancel.clone());
            scan_hosts(hosts, &settings, &settings.export_dir, cancel).await?;
        }
    }

    println!("Finished in {}", format_duration(started.elapsed()).bold());
    Ok(())
}
