//! Deterministic key order for a task's output.
//!
//! Keys compare byte-wise, so the order is the same on every platform and in
//! every run. Downstream merging relies on it.

use crate::aggregate::AggregationTable;
use itertools::Itertools;

/// A key together with all of its values, ready for the reduce function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: String,
    pub values: Vec<String>,
}

pub fn sorted_keys<'a, I>(keys: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter().sorted().collect()
}

/// Drains `table` into groups in ascending key order.
pub fn into_sorted_groups(table: AggregationTable) -> Vec<Group> {
    table
        .into_iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(key, values)| Group { key, values })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::KeyValue;

    #[test]
    fn byte_wise_ascending() {
        let keys = ["b", "a", "B", "ab", "", "é", "z"];
        assert_eq!(sorted_keys(keys), vec!["", "B", "a", "ab", "b", "z", "é"]);
    }

    #[test]
    fn repeated_sequencing_is_identical() {
        let table: AggregationTable = (0..200)
            .map(|i| KeyValue::new(format!("k{}", (i * 37) % 101), i.to_string()))
            .collect();
        let first = sorted_keys(table.keys());
        let second = sorted_keys(table.keys());
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn groups_carry_their_values() {
        let table: AggregationTable = vec![
            KeyValue::new("b", "2"),
            KeyValue::new("a", "1"),
            KeyValue::new("a", "3"),
        ]
        .into_iter()
        .collect();
        let groups = into_sorted_groups(table);
        assert_eq!(
            groups,
            vec![
                Group { key: "a".into(), values: vec!["1".into(), "3".into()] },
                Group { key: "b".into(), values: vec!["2".into()] },
            ]
        );
    }
}
