//! Reduce side of a MapReduce job.
//!
//! A reduce task reads the partition every map task wrote for it, groups the
//! records by key, calls the job's reduce function once per key and writes the
//! results sorted by key:
//!
//! ```text
//! PartitionSet -> RecordDecoder -> AggregationTable -> sorted groups
//!              -> reduce function -> OutputWriter
//! ```
//!
//! Each task owns all of its state, so any number of tasks may run at once as
//! long as they read different partitions and write different outputs.

pub mod aggregate;
pub mod decode;
pub mod error;
pub mod invoke;
pub mod naming;
pub mod output;
pub mod partition;
pub mod sequence;
pub mod task;

pub use aggregate::AggregationTable;
pub use decode::RecordDecoder;
pub use error::{ReduceError, Result, Stage};
pub use naming::{MrTmpNaming, PartitionNaming};
pub use output::{OutputWriter, RecordEncoder};
pub use partition::{PartitionSet, PartitionSource};
pub use task::{do_reduce, execute_reduce_task, ReduceTask, TaskReport, TaskSpec, TaskState};
