//! Word count: how many times each word appears across all inputs.

use common::KeyValue;

fn words(contents: &str) -> impl Iterator<Item = &str> {
    contents
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
}

#[no_mangle]
pub fn map(_filename: &str, contents: &str) -> Vec<KeyValue> {
    words(contents).map(|w| KeyValue::new(w, "1")).collect()
}

#[no_mangle]
pub fn reduce(_key: &str, values: Vec<String>) -> String {
    values.len().to_string()
}
