use common::KeyValue;
use std::collections::HashMap;

/// Key to every value seen for it, built fresh for each task.
///
/// Values keep arrival order within a run. Nothing is deduplicated: the same
/// `(key, value)` pair arriving twice is stored twice.
#[derive(Debug, Default)]
pub struct AggregationTable {
    groups: HashMap<String, Vec<String>>,
    records: usize,
}

impl AggregationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: KeyValue) {
        self.groups.entry(record.key).or_default().push(record.value);
        self.records += 1;
    }

    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of records inserted.
    pub fn records(&self) -> usize {
        self.records
    }
}

impl Extend<KeyValue> for AggregationTable {
    fn extend<I: IntoIterator<Item = KeyValue>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<KeyValue> for AggregationTable {
    fn from_iter<I: IntoIterator<Item = KeyValue>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl IntoIterator for AggregationTable {
    type Item = (String, Vec<String>);
    type IntoIter = std::collections::hash_map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_values_by_key() {
        let table: AggregationTable = vec![
            KeyValue::new("a", "1"),
            KeyValue::new("b", "2"),
            KeyValue::new("a", "3"),
        ]
        .into_iter()
        .collect();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records(), 3);
        assert_eq!(table.values("a").unwrap(), ["1", "3"]);
        assert_eq!(table.values("b").unwrap(), ["2"]);
        assert!(table.values("c").is_none());
    }

    #[test]
    fn keeps_duplicate_pairs() {
        let mut table = AggregationTable::new();
        table.insert(KeyValue::new("x", "same"));
        table.insert(KeyValue::new("x", "same"));
        assert_eq!(table.values("x").unwrap(), ["same", "same"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn empty_key_and_value_are_ordinary() {
        let table: AggregationTable = std::iter::once(KeyValue::new("", "")).collect();
        assert_eq!(table.values("").unwrap(), [""]);
    }
}
