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

//! Parsing of range and list selections

use super::error::HostlistError;

/// Largest number of ids a single range may cover
pub(crate) const MAX_RANGE_SIZE: u64 = 10_000;

/// Parse one integer bound or list entry.
pub(crate) fn parse_id(value: &str) -> Result<i64, HostlistError> {
    let value = value.trim();
    value
        .parse::<i64>()
        .map_err(|_| HostlistError::InvalidNumber {
            value: value.to_string(),
        })
}

/// Parse the two fields of a range form.
///
/// Both fields must be present; blank fields are reported before
/// either is parsed.
pub(crate) fn parse_range_fields(from: &str, to: &str) -> Result<(i64, i64), HostlistError> {
    if from.trim().is_empty() || to.trim().is_empty() {
        return Err(HostlistError::EmptyRange);
    }
    let from = parse_id(from)?;
    let to = parse_id(to)?;
    validate_range(from, to)?;
    Ok((from, to))
}

/// Parse a `FROM-TO` expression such as `1-30`.
///
/// The separator is the first `-` that is not a leading sign, so
/// `-3-4` is read as the range from -3 to 4.
pub(crate) fn parse_range_expression(expr: &str) -> Result<(i64, i64), HostlistError> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(HostlistError::EmptyRange);
    }

    let split_at = expr
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '-')
        .map(|(idx, _)| idx)
        .ok_or_else(|| HostlistError::InvalidRange {
            expression: expr.to_string(),
        })?;

    parse_range_fields(&expr[..split_at], &expr[split_at + 1..])
}

/// Split a comma separated id list, skipping empty segments.
pub(crate) fn parse_list(text: &str) -> Result<Vec<String>, HostlistError> {
    let items: Vec<String> = text
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        return Err(HostlistError::EmptyList);
    }

    // Reject bad tokens here so the caller hears about them before any work starts
    for item in &items {
        parse_id(item)?;
    }

    Ok(items)
}

pub(crate) fn validate_range(from: i64, to: i64) -> Result<(), HostlistError> {
    if from > to {
        return Err(HostlistError::ReversedRange { from, to });
    }
    let count = to.abs_diff(from).saturating_add(1);
    if count > MAX_RANGE_SIZE {
        return Err(HostlistError::RangeTooLarge {
            from,
            to,
            count,
            limit: MAX_RANGE_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_fields() {
        assert_eq!(parse_range_fields("1", "3").unwrap(), (1, 3));
        assert_eq!(parse_range_fields(" 4 ", "4").unwrap(), (4, 4));
        assert_eq!(
            parse_range_fields("", "3").unwrap_err(),
            HostlistError::EmptyRange
        );
        assert_eq!(
            parse_range_fields("5", "2").unwrap_err(),
            HostlistError::ReversedRange { from: 5, to: 2 }
        );
        assert!(matches!(
            parse_range_fields("x", "2").unwrap_err(),
            HostlistError::InvalidNumber { .. }
        ));
    }

    #[test]
    fn test_parse_range_expression() {
        assert_eq!(parse_range_expression("1-30").unwrap(), (1, 30));
        assert_eq!(parse_range_expression(" 10 - 12 ").unwrap(), (10, 12));
        assert_eq!(parse_range_expression("-3-4").unwrap(), (-3, 4));
        assert!(matches!(
            parse_range_expression("7").unwrap_err(),
            HostlistError::InvalidRange { .. }
        ));
        assert_eq!(
            parse_range_expression("").unwrap_err(),
            HostlistError::EmptyRange
        );
    }

    #[test]
    fn test_range_too_large() {
        let err = parse_range_expression("1-20000").unwrap_err();
        assert!(matches!(err, HostlistError::RangeTooLarge { count: 20000, .. }));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("1, 2,,3 ").unwrap(), vec!["1", "2", "3"]);
        assert_eq!(parse_list(" , ,").unwrap_err(), HostlistError::EmptyList);
        assert_eq!(
            parse_list("1,abc").unwrap_err(),
            HostlistError::InvalidNumber {
                value: "abc".to_string()
            }
        );
    }
}
