use crate::aggregate::AggregationTable;
use crate::error::Result;
use crate::invoke;
use crate::naming::{MrTmpNaming, PartitionNaming};
use crate::output::OutputWriter;
use crate::partition::PartitionSet;
use crate::sequence;
use common::{KeyValue, Reducer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// Identity and parameters of one reduce task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub job: String,
    pub reduce_index: usize,
    pub output: PathBuf,
    /// Number of map tasks, i.e. partitions to read.
    pub producer_count: usize,
}

impl TaskSpec {
    pub fn new(
        job: impl Into<String>,
        reduce_index: usize,
        output: impl Into<PathBuf>,
        producer_count: usize,
    ) -> Self {
        Self {
            job: job.into(),
            reduce_index,
            output: output.into(),
            producer_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Init,
    OpeningSources,
    Decoding,
    Aggregating,
    Sequencing,
    Reducing,
    Writing,
    Done,
    Failed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a finished task did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReport {
    pub partitions: usize,
    pub records_in: usize,
    pub keys: usize,
    pub records_out: usize,
    pub bytes_out: u64,
    pub decode_ms: u64,
    pub aggregate_ms: u64,
    pub sort_ms: u64,
    pub reduce_ms: u64,
    pub write_ms: u64,
    pub wall_ms: u64,
}

/// A single execution of a reduce task.
///
/// Every stage consumes its whole input before the next starts. A failed run
/// ends in [`TaskState::Failed`]; running again starts over from `Init`.
#[derive(Debug)]
pub struct ReduceTask<'a> {
    spec: &'a TaskSpec,
    state: TaskState,
}

impl<'a> ReduceTask<'a> {
    pub fn new(spec: &'a TaskSpec) -> Self {
        Self {
            spec,
            state: TaskState::Init,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn run<N, R>(&mut self, naming: &N, reducer: &R) -> Result<TaskReport>
    where
        N: PartitionNaming + ?Sized,
        R: Reducer + ?Sized,
    {
        let spec = self.spec;
        self.state = TaskState::Init;
        info!(
            job = %spec.job,
            task = spec.reduce_index,
            n_map = spec.producer_count,
            output = %spec.output.display(),
            "reduce task starting"
        );

        match self.stages(naming, reducer) {
            Ok(report) => {
                self.advance(TaskState::Done);
                info!(
                    job = %spec.job,
                    task = spec.reduce_index,
                    partitions = report.partitions,
                    records_in = report.records_in,
                    keys = report.keys,
                    bytes_out = report.bytes_out,
                    decode_ms = report.decode_ms,
                    aggregate_ms = report.aggregate_ms,
                    sort_ms = report.sort_ms,
                    reduce_ms = report.reduce_ms,
                    write_ms = report.write_ms,
                    wall_ms = report.wall_ms,
                    "reduce task complete"
                );
                Ok(report)
            }
            Err(e) => {
                let failed_in = self.state;
                self.advance(TaskState::Failed);
                error!(
                    job = %spec.job,
                    task = spec.reduce_index,
                    state = %failed_in,
                    stage = %e.stage(),
                    "reduce task failed: {}",
                    e
                );
                Err(e)
            }
        }
    }

    fn advance(&mut self, next: TaskState) {
        debug!(
            job = %self.spec.job,
            task = self.spec.reduce_index,
            from = %self.state,
            to = %next,
            "task state"
        );
        self.state = next;
    }

    fn stages<N, R>(&mut self, naming: &N, reducer: &R) -> Result<TaskReport>
    where
        N: PartitionNaming + ?Sized,
        R: Reducer + ?Sized,
    {
        let spec = self.spec;
        let task_start = Instant::now();
        let mut report = TaskReport::default();

        self.advance(TaskState::OpeningSources);
        let sources = PartitionSet::open(&spec.job, spec.reduce_index, spec.producer_count, naming)?;
        report.partitions = sources.len();

        self.advance(TaskState::Decoding);
        let started = Instant::now();
        let decoded = sources
            .into_iter()
            .map(|source| {
                let producer = source.producer();
                let records = source.records().collect::<Result<Vec<KeyValue>>>()?;
                debug!(producer, records = records.len(), "partition decoded");
                Ok(records)
            })
            .collect::<Result<Vec<_>>>()?;
        report.decode_ms = elapsed_ms(started);

        self.advance(TaskState::Aggregating);
        let started = Instant::now();
        let table: AggregationTable = decoded.into_iter().flatten().collect();
        report.records_in = table.records();
        report.keys = table.len();
        report.aggregate_ms = elapsed_ms(started);

        self.advance(TaskState::Sequencing);
        let started = Instant::now();
        let groups = sequence::into_sorted_groups(table);
        report.sort_ms = elapsed_ms(started);

        self.advance(TaskState::Reducing);
        let started = Instant::now();
        let output = invoke::reduce_groups(reducer, groups)?;
        report.records_out = output.len();
        report.reduce_ms = elapsed_ms(started);

        self.advance(TaskState::Writing);
        let started = Instant::now();
        let mut writer = OutputWriter::create(&spec.output)?;
        writer.write_all(&output)?;
        report.bytes_out = writer.commit()?;
        report.write_ms = elapsed_ms(started);

        report.wall_ms = elapsed_ms(task_start);
        Ok(report)
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

/// Runs one reduce task to completion or failure.
///
/// On success the output at `spec.output` holds one record per distinct key,
/// in ascending key order. On failure nothing new is left at `spec.output`.
pub fn execute_reduce_task<N, R>(spec: &TaskSpec, naming: &N, reducer: &R) -> Result<TaskReport>
where
    N: PartitionNaming + ?Sized,
    R: Reducer + ?Sized,
{
    ReduceTask::new(spec).run(naming, reducer)
}

/// Reduce task `reduce_index` of `job`, reading `mrtmp.<job>-<m>-<reduce_index>`
/// for every `m < n_map` from the current directory.
pub fn do_reduce<R>(
    job: &str,
    reduce_index: usize,
    out_file: impl AsRef<Path>,
    n_map: usize,
    reducer: &R,
) -> Result<TaskReport>
where
    R: Reducer + ?Sized,
{
    let spec = TaskSpec::new(job, reduce_index, out_file.as_ref(), n_map);
    execute_reduce_task(&spec, &MrTmpNaming::default(), reducer)
}
