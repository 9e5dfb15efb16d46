// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Regex-mode instance derivation
//!
//! Instance names are `<prefix>-<name>`; the pattern is evaluated against
//! the part after the first `-`.

use regex::Regex;

use super::selection::Selection;
use crate::logicmonitor::response::InstanceRecord;

const INSTANCE_DELIMITER: char = '-';

/// Instance name with everything up to and including the first `-` removed
pub fn comparison_token(name: &str) -> &str {
    match name.split_once(INSTANCE_DELIMITER) {
        Some((_, rest)) => rest,
        None => name,
    }
}

/// Every instance whose comparison token matches `pattern`, in listing order
pub fn filter_instances(
    pattern: &str,
    instances: &[InstanceRecord],
) -> Result<Vec<Selection>, regex::Error> {
    let re = Regex::new(pattern)?;
    Ok(instances
        .iter()
        .filter_map(|instance| {
            let token = comparison_token(&instance.name);
            re.is_match(token)
                .then(|| Selection::picked(instance.id.clone(), token))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(names: &[&str]) -> Vec<InstanceRecord> {
        names
            .iter()
            .enumerate()
            .map(|(idx, name)| InstanceRecord {
                id: (idx + 1).to_string(),
                name: name.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_comparison_token() {
        assert_eq!(comparison_token("host-eth0"), "eth0");
        assert_eq!(comparison_token("host-vlan-10"), "vlan-10");
        assert_eq!(comparison_token("lo"), "lo");
        assert_eq!(comparison_token("-x"), "x");
    }

    #[test]
    fn test_filter_matches_subset() {
        let instances = listing(&["host-eth0", "host-eth1", "host-lo"]);
        let selected = filter_instances(r"eth\d", &instances).unwrap();
        assert_eq!(
            selected,
            vec![Selection::picked("1", "eth0"), Selection::picked("2", "eth1")]
        );
    }

    #[test]
    fn test_prefix_is_not_matched() {
        let instances = listing(&["host-eth0"]);
        assert!(filter_instances("^host", &instances).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let instances = listing(&["host-eth0"]);
        assert!(filter_instances("eth(", &instances).is_err());
    }

    #[test]
    fn test_empty_pattern_matches_all() {
        let instances = listing(&["a-1", "b-2"]);
        assert_eq!(filter_instances("", &instances).unwrap().len(), 2);
    }
}
