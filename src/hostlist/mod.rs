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

//! Host selection by numeric station id
//!
//! Hosts are picked either with an inclusive range or with an explicit
//! comma separated list. Every member of the selection is expanded through
//! [`crate::credentials::derive_id`], so a selection of `n` ids can yield
//! more than `n` descriptors (ids 10..=99 produce two).
//!
//! # Examples
//!
//! ```rust
//! use fleetssh::hostlist::HostSelection;
//!
//! let selection = HostSelection::parse_range("1-3").unwrap();
//! let hosts = selection.expand();
//! assert_eq!(hosts.len(), 3);
//!
//! let selection = HostSelection::parse_list("5, 23").unwrap();
//! assert_eq!(selection.expand().len(), 3);
//! ```

mod error;
mod parser;

pub use error::HostlistError;

use crate::credentials::derive_id;
use crate::host::HostDescriptor;

/// A validated set of station ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSelection {
    /// Inclusive id range, `from <= to`
    Range { from: i64, to: i64 },
    /// Explicit ids in submission order
    List(Vec<i64>),
}

impl HostSelection {
    /// Build a range selection from already-parsed bounds.
    pub fn range(from: i64, to: i64) -> Result<Self, HostlistError> {
        parser::validate_range(from, to)?;
        Ok(Self::Range { from, to })
    }

    /// Build a range selection from two free-text fields.
    pub fn from_range_fields(from: &str, to: &str) -> Result<Self, HostlistError> {
        let (from, to) = parser::parse_range_fields(from, to)?;
        Ok(Self::Range { from, to })
    }

    /// Parse a `FROM-TO` range expression.
    pub fn parse_range(expr: &str) -> Result<Self, HostlistError> {
        let (from, to) = parser::parse_range_expression(expr)?;
        Ok(Self::Range { from, to })
    }

    /// Parse a comma separated id list such as `1,5,23`.
    pub fn parse_list(text: &str) -> Result<Self, HostlistError> {
        let ids = parser::parse_list(text)?
            .iter()
            .map(|item| parser::parse_id(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::List(ids))
    }

    /// Number of ids in the selection (not descriptors).
    pub fn id_count(&self) -> usize {
        match self {
            Self::Range { from, to } if from > to => 0,
            Self::Range { from, to } => {
                usize::try_from(to.abs_diff(*from).saturating_add(1)).unwrap_or(usize::MAX)
            }
            Self::List(ids) => ids.len(),
        }
    }

    /// Expand every id into its host descriptors, in selection order.
    pub fn expand(&self) -> Vec<HostDescriptor> {
        match self {
            Self::Range { from, to } => (*from..=*to).flat_map(derive_id).collect(),
            Self::List(ids) => ids.iter().copied().flat_map(derive_id).collect(),
        }
    }
}
