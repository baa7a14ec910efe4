use crate::error::{ReduceError, Result};
use crate::sequence::Group;
use common::{KeyValue, Reducer};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Runs the reduce function once per group, in the order given.
///
/// Stops at the first failure; nothing reduced so far is returned.
pub fn reduce_groups<R>(reducer: &R, groups: Vec<Group>) -> Result<Vec<KeyValue>>
where
    R: Reducer + ?Sized,
{
    groups
        .into_iter()
        .map(|Group { key, values }| {
            let value = reduce_one(reducer, &key, values)?;
            Ok(KeyValue { key, value })
        })
        .collect()
}

/// Calls the reduce function for a single key. An `Err` or a panic from the
/// function both become [`ReduceError::Reduction`].
pub fn reduce_one<R>(reducer: &R, key: &str, values: Vec<String>) -> Result<String>
where
    R: Reducer + ?Sized,
{
    match panic::catch_unwind(AssertUnwindSafe(|| reducer.reduce(key, values))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ReduceError::Reduction {
            key: key.to_string(),
            message: format!("{e:#}"),
        }),
        Err(payload) => Err(ReduceError::Reduction {
            key: key.to_string(),
            message: format!("panicked: {}", panic_message(payload.as_ref())),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
