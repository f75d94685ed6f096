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

//! Hostname and credential derivation from numeric fleet ids.
//!
//! Every station id maps to a fixed naming scheme:
//!
//! | id        | hostnames                                   |
//! |-----------|---------------------------------------------|
//! | 1..=9     | `css01sth00Nts01`                           |
//! | 10..=99   | `css01sth0NNts01` and `css01sthNNts01`      |
//! | 100..     | `css01sthNNNts01`                           |
//!
//! Username and password always use the three digit zero-padded id.

use crate::host::HostDescriptor;
use crate::hostlist::HostlistError;

const HOST_PREFIX: &str = "css01sth";
const USER_PREFIX: &str = "uss01sth";
const NAME_SUFFIX: &str = "ts01";
const PASSWORD_PREFIX: &str = "sth@TS";

/// Derive descriptors for a textual id token.
///
/// Leading and trailing whitespace is ignored. Anything else that does not
/// parse as an integer is rejected.
pub fn derive(token: &str) -> Result<Vec<HostDescriptor>, HostlistError> {
    let trimmed = token.trim();
    let id = trimmed
        .parse::<i64>()
        .map_err(|_| HostlistError::InvalidNumber {
            value: trimmed.to_string(),
        })?;
    Ok(derive_id(id))
}

/// Derive descriptors for a numeric id.
///
/// Ids below 1 are not part of the fleet numbering but are passed through
/// unpadded rather than rejected.
pub fn derive_id(id: i64) -> Vec<HostDescriptor> {
    let padded = format!("{id:03}");
    let username = format!("{USER_PREFIX}{padded}{NAME_SUFFIX}");
    let password = format!("{PASSWORD_PREFIX}{padded}");

    let padded_host = format!("{HOST_PREFIX}{padded}{NAME_SUFFIX}");
    let bare_host = format!("{HOST_PREFIX}{id}{NAME_SUFFIX}");

    match id {
        1..=9 => vec![HostDescriptor::new(padded_host, username, password)],
        // Two-digit stations answer under both spellings
        10..=99 => vec![
            HostDescriptor::new(padded_host, username.clone(), password.clone()),
            HostDescriptor::new(bare_host, username, password),
        ],
        _ => vec![HostDescriptor::new(bare_host, username, password)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hostnames(hosts: &[HostDescriptor]) -> Vec<&str> {
        hosts.iter().map(|h| h.hostname()).collect()
    }

    #[test]
    fn test_single_digit_is_padded() {
        let hosts = derive_id(5);
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].hostname(), "css01sth005ts01");
        assert_eq!(hosts[0].username(), "uss01sth005ts01");
        assert_eq!(hosts[0].password(), "sth@TS005");
    }

    #[test]
    fn test_two_digit_yields_both_spellings() {
        let hosts = derive_id(23);
        assert_eq!(hostnames(&hosts), vec!["css01sth023ts01", "css01sth23ts01"]);
        for host in &hosts {
            assert_eq!(host.username(), "uss01sth023ts01");
            assert_eq!(host.password(), "sth@TS023");
        }
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(hostnames(&derive_id(9)), vec!["css01sth009ts01"]);
        assert_eq!(
            hostnames(&derive_id(10)),
            vec!["css01sth010ts01", "css01sth10ts01"]
        );
        assert_eq!(
            hostnames(&derive_id(99)),
            vec!["css01sth099ts01", "css01sth99ts01"]
        );
        assert_eq!(hostnames(&derive_id(100)), vec!["css01sth100ts01"]);
    }

    #[test]
    fn test_three_digit_and_beyond() {
        let hosts = derive_id(250);
        assert_eq!(hostnames(&hosts), vec!["css01sth250ts01"]);
        assert_eq!(hosts[0].username(), "uss01sth250ts01");

        let hosts = derive_id(1234);
        assert_eq!(hostnames(&hosts), vec!["css01sth1234ts01"]);
        assert_eq!(hosts[0].password(), "sth@TS1234");
    }

    #[test]
    fn test_zero_and_negative_fall_through_unpadded() {
        // Outside the fleet numbering; kept permissive on purpose
        let zero = derive_id(0);
        assert_eq!(hostnames(&zero), vec!["css01sth0ts01"]);
        assert_eq!(zero[0].username(), "uss01sth000ts01");

        let negative = derive_id(-5);
        assert_eq!(hostnames(&negative), vec!["css01sth-5ts01"]);
        assert_eq!(negative[0].username(), "uss01sth-05ts01");
        assert_eq!(negative[0].password(), "sth@TS-05");
    }

    #[test]
    fn test_token_parsing() {
        assert_eq!(hostnames(&derive(" 7 ").unwrap()), vec!["css01sth007ts01"]);
        assert_eq!(
            derive("abc").unwrap_err(),
            HostlistError::InvalidNumber {
                value: "abc".to_string()
            }
        );
        assert!(derive("").is_err());
        assert!(derive("1.5").is_err());
    }
}
