//! Types shared by the job plugins, the reduce worker and the local driver.

use serde::{Deserialize, Serialize};

mod app;
mod logging;

pub use app::App;
pub use logging::init_logger;

/// One intermediate or output record.
///
/// Serialized with PascalCase field names (`{"Key": .., "Value": ..}`), the
/// shape the merge tooling downstream of the reduce phase reads.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The map half of a job definition.
pub trait Mapper {
    fn map(&self, filename: &str, contents: &str) -> Vec<KeyValue>;
}

impl<F> Mapper for F
where
    F: Fn(&str, &str) -> Vec<KeyValue>,
{
    fn map(&self, filename: &str, contents: &str) -> Vec<KeyValue> {
        self(filename, contents)
    }
}

/// The reduce half of a job definition.
///
/// Called exactly once per distinct key with every value emitted for that
/// key. The order of `values` carries no meaning.
pub trait Reducer {
    fn reduce(&self, key: &str, values: Vec<String>) -> anyhow::Result<String>;
}

impl<F> Reducer for F
where
    F: Fn(&str, Vec<String>) -> String,
{
    fn reduce(&self, key: &str, values: Vec<String>) -> anyhow::Result<String> {
        Ok(self(key, values))
    }
}
