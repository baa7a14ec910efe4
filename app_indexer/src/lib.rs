//! Inverted index: for each word, the documents containing it.

use common::KeyValue;
use itertools::Itertools;

#[no_mangle]
pub fn map(filename: &str, contents: &str) -> Vec<KeyValue> {
    contents
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .unique()
        .map(|w| KeyValue::new(w, filename))
        .collect()
}

/// `"<count> <doc>,<doc>,..."` with documents sorted so the result does not
/// depend on the order values arrived in.
#[no_mangle]
pub fn reduce(_key: &str, values: Vec<String>) -> String {
    let docs = values.into_iter().sorted().dedup().collect_vec();
    format!("{} {}", docs.len(), docs.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_word_once_per_document() {
        let kvs = map("pg-1.txt", "to be or not to be");
        let keys = kvs.iter().map(|kv| kv.key.as_str()).collect_vec();
        assert_eq!(keys, ["to", "be", "or", "not"]);
        assert!(kvs.iter().all(|kv| kv.value == "pg-1.txt"));
    }

    #[test]
    fn reduce_is_order_independent() {
        let a = reduce("be", vec!["b.txt".into(), "a.txt".into()]);
        let b = reduce("be", vec!["a.txt".into(), "b.txt".into()]);
        assert_eq!(a, "2 a.txt,b.txt");
        assert_eq!(a, b);
    }
}
