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

//! Ordering of finished results for export and display.

use std::cmp::Ordering;

use super::result_types::HostOutcome;

/// Canonical order: by position in the submitted batch.
///
/// The executor already returns results in this order; this is for callers
/// that assembled results themselves.
pub fn order_by_submission<T: HostOutcome>(mut results: Vec<T>) -> Vec<T> {
    results.sort_by_key(|r| r.original_index());
    results
}

/// Presentation order: reachable hosts first, then by hostname.
///
/// Ties keep their canonical relative order.
pub fn presentation_view<T: HostOutcome>(results: &[T]) -> Vec<&T> {
    let mut view: Vec<&T> = results.iter().collect();
    view.sort_by(|a, b| presentation_cmp(*a, *b));
    view
}

fn presentation_cmp<T: HostOutcome>(a: &T, b: &T) -> Ordering {
    b.pingable()
        .cmp(&a.pingable())
        .then_with(|| a.hostname().cmp(b.hostname()))
}

/// Counts shown after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub reachable: usize,
    pub unreachable: usize,
}

impl RunSummary {
    pub fn from_results<T: HostOutcome>(results: &[T]) -> Self {
        let reachable = results.iter().filter(|r| r.pingable()).count();
        Self {
            total: results.len(),
            reachable,
            unreachable: results.len() - reachable,
        }
    }
}
