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
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::executor::{HostOutcome, RunSummary, CANCELLED, LOCAL_PATH_MISSING, UNREACHABLE};
use crate::export::ssh_able;

const PROGRESS_BAR_TICK_RATE_MS: u64 = 80;

/// Outcome prefixes that mark a failed step
const FAILURE_PREFIXES: [&str; 6] = [
    "ERR:",
    "SSH ERR:",
    "SSH Error:",
    "Error:",
    "Copy failed:",
    "Task failed:",
];

/// How a finished host is shown in the results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    Unreachable,
    Failed,
    Success,
}

impl HostStatus {
    pub fn of<T: HostOutcome>(result: &T) -> Self {
        if !result.pingable() || result.outcome() == UNREACHABLE {
            return HostStatus::Unreachable;
        }
        let failed = result.outcome().lines().any(|line| {
            line == LOCAL_PATH_MISSING
                || line == CANCELLED
                || FAILURE_PREFIXES.iter().any(|p| line.starts_with(p))
        });
        if failed {
            HostStatus::Failed
        } else {
            HostStatus::Success
        }
    }

    pub fn symbol(&self) -> String {
        match self {
            HostStatus::Unreachable => "○".dimmed().to_string(),
            HostStatus::Failed => "●".yellow().to_string(),
            HostStatus::Success => "●".green().to_string(),
        }
    }
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Progress bar counting finished hosts.
pub fn create_progress_bar(total: usize, prefix: &str) -> Result<ProgressBar> {
    let style = ProgressStyle::default_bar()
        .template("{prefix:.bold} {spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .map_err(|e| anyhow::anyhow!("Failed to create progress bar template: {e}"))?
        .tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷ ")
        .progress_chars("=> ");

    let pb = ProgressBar::new(total as u64);
    pb.set_style(style);
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(PROGRESS_BAR_TICK_RATE_MS));
    Ok(pb)
}

pub struct OutputFormatter;

impl OutputFormatter {
    pub fn format_header(title: &str) -> String {
        let terminal_width = terminal_width();

        let border = "─".repeat(terminal_width);
        let title_styled = format!(" {title} ").cyan().bold().to_string();
        let padding = (terminal_width.saturating_sub(title.width() + 2)) / 2;

        format!(
            "{}\n{}{}\n{}",
            border.dimmed(),
            " ".repeat(padding),
            title_styled,
            border.dimmed()
        )
    }

    pub fn format_run_header(action: &str, host_count: usize) -> String {
        format!(
            "\n{} {} on {} {}\n",
            "►".cyan().bold(),
            action.cyan(),
            host_count.to_string().bold(),
            if host_count == 1 { "host" } else { "hosts" },
        )
    }

    /// One entry of the results table: status line plus indented outcome.
    pub fn format_host_result<T: HostOutcome>(result: &T) -> String {
        let status = HostStatus::of(result);
        let pingable = if result.pingable() {
            "reachable".green().to_string()
        } else {
            "unreachable".dimmed().to_string()
        };

        let mut output = format!(
            "{} {} ({})\n",
            status.symbol(),
            result.hostname().bold(),
            pingable
        );
        if status != HostStatus::Unreachable && !result.outcome().is_empty() {
            output.push_str(&Self::format_output_box(
                result.outcome(),
                status == HostStatus::Failed,
            ));
        }
        output
    }

    /// One scan line: host, login check and outcome.
    pub fn format_scan_result<T: HostOutcome>(result: &T) -> String {
        let login = if ssh_able(result) {
            "ssh ok".green().to_string()
        } else if result.pingable() {
            "ssh failed".red().to_string()
        } else {
            "unreachable".dimmed().to_string()
        };
        format!(
            "{} {:<20} {} {}\n",
            HostStatus::of(result).symbol(),
            result.hostname().bold(),
            login,
            result.outcome().dimmed()
        )
    }

    fn format_output_box(content: &str, is_error: bool) -> String {
        let mut output = String::new();
        let indent = "    ";
        let max_width = terminal_width().saturating_sub(6).max(20);

        for line in content.lines() {
            let mut remaining = line;
            loop {
                let (chunk, rest) = Self::split_at_width(remaining, max_width);
                if is_error {
                    output.push_str(&format!("{}{}\n", indent, chunk.yellow()));
                } else {
                    output.push_str(&format!("{indent}{chunk}\n"));
                }
                if rest.is_empty() || chunk.is_empty() {
                    break;
                }
                remaining = rest;
            }
        }

        output
    }

    fn split_at_width(s: &str, max_width: usize) -> (&str, &str) {
        let mut width = 0;
        let mut split_pos = 0;

        for (i, ch) in s.char_indices() {
            let ch_width = ch.width().unwrap_or(0);
            if width + ch_width > max_width {
                break;
            }
            width += ch_width;
            split_pos = i + ch.len_utf8();
        }

        s.split_at(split_pos)
    }

    pub fn format_summary(summary: &RunSummary) -> String {
        let mut parts = vec![format!("{} hosts", summary.total.to_string().bold())];

        if summary.reachable > 0 {
            parts.push(format!(
                "{} {}",
                summary.reachable.to_string().green().bold(),
                "reachable".green()
            ));
        }

        if summary.unreachable > 0 {
            parts.push(format!(
                "{} {}",
                summary.unreachable.to_string().red().bold(),
                "unreachable".red()
            ));
        }

        let rule = "═".repeat(terminal_width());
        format!(
            "\n{}\n{}\n{}\n",
            rule.dimmed(),
            format!(" Summary: {} ", parts.join(" • ")).bold(),
            rule.dimmed()
        )
    }
}
