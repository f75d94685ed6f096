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

//! CSV export of run results.
//!
//! Two record files are produced:
//!
//! - the scan record, `host,username,password,pingable,ssh_able`, one row per
//!   scanned descriptor in submission order, written automatically after a
//!   scan as `scan_results_{timestamp}.csv`;
//! - the results table, `hostname,pingable,cmd_result`, in presentation order.
//!
//! Export failures never invalidate results. They are logged and handed back
//! as an [`ExportWarning`] for the caller to display.

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::executor::{presentation_view, HostOutcome, HostResult, ScanResult, UNREACHABLE};

pub const SCAN_HEADER: [&str; 5] = ["host", "username", "password", "pingable", "ssh_able"];
pub const RESULTS_HEADER: [&str; 3] = ["hostname", "pingable", "cmd_result"];

/// A failed export. Results remain valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportWarning {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to export to {:?}: {}", self.path, self.message)
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Whether a scanned host accepted an SSH login.
pub fn ssh_able<T: HostOutcome>(result: &T) -> bool {
    let outcome = result.outcome();
    result.pingable()
        && !outcome.is_empty()
        && !outcome.starts_with("SSH Error:")
        && !outcome.starts_with("Error:")
        && outcome != UNREACHABLE
}

/// Quote a field when it holds a delimiter, a quote or a line break.
pub fn quote_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn push_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    let line = fields
        .into_iter()
        .map(quote_field)
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push('\n');
}

/// Render the scan record file.
pub fn render_scan_csv(results: &[ScanResult]) -> String {
    let mut out = String::new();
    push_record(&mut out, SCAN_HEADER);
    for result in results {
        push_record(
            &mut out,
            [
                result.hostname(),
                result.username.as_str(),
                result.password.as_str(),
                yes_no(result.pingable()),
                yes_no(ssh_able(result)),
            ],
        );
    }
    out
}

/// Render the results table in presentation order.
pub fn render_results_csv(results: &[HostResult]) -> String {
    let mut out = String::new();
    push_record(&mut out, RESULTS_HEADER);
    for result in presentation_view(results) {
        push_record(
            &mut out,
            [
                result.hostname.as_str(),
                yes_no(result.pingable),
                result.outcome.as_str(),
            ],
        );
    }
    out
}

async fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create export directory: {parent:?}"))?;
    }

    let mut file = fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create export file: {path:?}"))?;
    file.write_all(content.as_bytes())
        .await
        .with_context(|| format!("Failed to write export file: {path:?}"))?;
    file.flush().await?;
    Ok(())
}

/// Write the scan record file to `path`.
pub async fn write_scan_csv(path: &Path, results: &[ScanResult]) -> Result<()> {
    write_file(path, &render_scan_csv(results)).await
}

/// Write the results table to `path`.
pub async fn write_results_csv(path: &Path, results: &[HostResult]) -> Result<()> {
    write_file(path, &render_results_csv(results)).await
}

/// File name used for the automatic scan export.
pub fn scan_export_file_name(timestamp: &chrono::DateTime<chrono::Local>) -> String {
    format!("scan_results_{}.csv", timestamp.format("%Y%m%d_%H%M%S"))
}

/// Export scan results into `dir` under a timestamped name.
pub async fn export_scan_results(
    results: &[ScanResult],
    dir: &Path,
) -> Result<PathBuf, ExportWarning> {
    let path = dir.join(scan_export_file_name(&chrono::Local::now()));
    match write_scan_csv(&path, results).await {
        Ok(()) => {
            tracing::info!("Exported {} scan results to {:?}", results.len(), path);
            Ok(path)
        }
        Err(e) => Err(soft_failure(path, e)),
    }
}

/// Export the results table to `path`.
pub async fn export_results_table(
    results: &[HostResult],
    path: &Path,
) -> Result<PathBuf, ExportWarning> {
    match write_results_csv(path, results).await {
        Ok(()) => {
            tracing::info!("Exported {} results to {:?}", results.len(), path);
            Ok(path.to_path_buf())
        }
        Err(e) => Err(soft_failure(path.to_path_buf(), e)),
    }
}

fn soft_failure(path: PathBuf, error: anyhow::Error) -> ExportWarning {
    tracing::warn!("Export to {:?} failed: {:#}", path, error);
    ExportWarning {
        path,
        message: format!("{error:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostDescriptor;
    use tempfile::TempDir;

    fn scan_result(index: usize, id: &str, pingable: bool, outcome: &str) -> ScanResult {
        let host = HostDescriptor::new(
            format!("css01sth{id}ts01"),
            format!("uss01sth{id}ts01"),
            format!("sth@TS{id}"),
        );
        let result = if pingable {
            HostResult::reachable(index, &host, outcome.to_string())
        } else {
            HostResult::unreachable(index, &host)
        };
        ScanResult::new(&host, result)
    }

    #[test]
    fn test_ssh_able_rules() {
        assert!(ssh_able(&scan_result(0, "001", true, "hello css01sth001ts01")));
        assert!(!ssh_able(&scan_result(0, "001", false, "")));
        assert!(!ssh_able(&scan_result(0, "001", true, "")));
        assert!(!ssh_able(&scan_result(0, "001", true, "SSH Error: auth failed")));
        assert!(!ssh_able(&scan_result(0, "001", true, "Error: denied")));
        assert!(!ssh_able(&scan_result(0, "001", true, "Unreachable")));
    }

    #[test]
    fn test_quote_field() {
        assert_eq!(quote_field("plain"), "plain");
        assert_eq!(quote_field("a,b"), "\"a,b\"");
        assert_eq!(quote_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_render_scan_csv() {
        let results = vec![
            scan_result(0, "001", false, ""),
            scan_result(1, "002", true, "hello css01sth002ts01"),
        ];
        let csv = render_scan_csv(&results);
        assert_eq!(
            csv,
            "host,username,password,pingable,ssh_able\n\
             css01sth001ts01,uss01sth001ts01,sth@TS001,No,No\n\
             css01sth002ts01,uss01sth002ts01,sth@TS002,Yes,Yes\n"
        );
    }

    #[test]
    fn test_render_results_csv_uses_presentation_order() {
        let a = HostDescriptor::new("b-host", "u", "p");
        let b = HostDescriptor::new("a-host", "u", "p");
        let c = HostDescriptor::new("c-host", "u", "p");
        let results = vec![
            HostResult::unreachable(0, &a),
            HostResult::reachable(1, &c, "line1\nline2".to_string()),
            HostResult::reachable(2, &b, "ok".to_string()),
        ];
        let csv = render_results_csv(&results);
        assert_eq!(
            csv,
            "hostname,pingable,cmd_result\n\
             a-host,Yes,ok\n\
             c-host,Yes,\"line1\nline2\"\n\
             b-host,No,Unreachable\n"
        );
    }

    #[test]
    fn test_scan_export_file_name() {
        use chrono::TimeZone;
        let ts = chrono::Local
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
            .single()
            .unwrap();
        assert_eq!(scan_export_file_name(&ts), "scan_results_20240309_140507.csv");
    }

    #[tokio::test]
    async fn test_export_scan_results_writes_file() {
        let dir = TempDir::new().unwrap();
        let results = vec![
            scan_result(0, "001", false, ""),
            scan_result(1, "002", false, ""),
            scan_result(2, "003", false, ""),
        ];

        let path = export_scan_results(&results, dir.path()).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("scan_results_"));
        assert!(name.ends_with(".csv"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), results.len() + 1);
        assert!(content.lines().skip(1).all(|l| l.ends_with(",No,No")));
    }

    #[tokio::test]
    async fn test_export_failure_is_a_warning() {
        let dir = TempDir::new().unwrap();
        // A regular file where a directory is expected
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let results = vec![scan_result(0, "001", false, "")];
        let warning = export_scan_results(&results, &blocker.join("sub"))
            .await
            .unwrap_err();
        assert!(warning.path.starts_with(&blocker));
        assert!(!warning.message.is_empty());
        assert!(warning.to_string().contains("failed to export"));
    }

    #[tokio::test]
    async fn test_export_results_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("results.csv");
        let host = HostDescriptor::new("css01sth001ts01", "u", "p");
        let results = vec![HostResult::reachable(0, &host, "done".to_string())];

        export_results_table(&results, &path).await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "hostname,pingable,cmd_result\ncss01sth001ts01,Yes,done\n"
        );
    }
}
