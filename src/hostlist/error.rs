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

//! Error types for host selection parsing and expansion

use thiserror::Error;

/// Errors that can occur while turning user input into host descriptors.
///
/// All of these are raised before any host task is started.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostlistError {
    /// A range bound was left blank
    #[error("range fields cannot be empty")]
    EmptyRange,

    /// The id list had no usable entries
    #[error("list must contain at least one number")]
    EmptyList,

    /// Token that does not parse as an integer (e.g., `abc`)
    #[error("invalid number '{value}': input must be an integer")]
    InvalidNumber { value: String },

    /// Range expression without a `FROM-TO` shape (e.g., `5`)
    #[error("invalid range '{expression}': expected FROM-TO")]
    InvalidRange { expression: String },

    /// Reversed range (e.g., `9-3`)
    #[error("reversed range '{from}-{to}' (from must be <= to)")]
    ReversedRange { from: i64, to: i64 },

    /// Range produces too many ids
    #[error("range {from}-{to} would produce {count} ids, exceeding limit of {limit}")]
    RangeTooLarge {
        from: i64,
        to: i64,
        count: u64,
        limit: u64,
    },
}
