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

use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use super::{build_executor, follow_run};
use crate::config::RunSettings;
use crate::executor::{presentation_view, RunSummary, ScanResult};
use crate::export::export_scan_results;
use crate::host::HostDescriptor;
use crate::ui::OutputFormatter;

/// Scan every host, print the outcome and export the record file.
///
/// A failed export is reported as a warning; the scan results are still
/// returned.
pub async fn scan_hosts(
    hosts: Vec<HostDescriptor>,
    settings: &RunSettings,
    export_dir: &Path,
    cancel: CancellationToken,
) -> Result<Vec<ScanResult>> {
    println!(
        "{}",
        OutputFormatter::format_run_header("Scanning", hosts.len())
    );

    let executor = build_executor(settings, cancel.clone());
    let handle = executor.start_scan(hosts)?;
    let results = follow_run(handle, "scan", &cancel).await?;

    println!("\n{} {}\n", "▶".cyan(), "Scan Results".bold());
    for result in presentation_view(&results) {
        print!("{}", OutputFormatter::format_scan_result(result));
    }
    println!(
        "{}",
        OutputFormatter::format_summary(&RunSummary::from_results(&results))
    );

    match export_scan_results(&results, export_dir).await {
        Ok(path) => println!("{} Scan exported to {:?}", "●".green(), path),
        Err(warning) => eprintln!("{} {}", "⚠".yellow(), warning),
    }

    Ok(results)
}
