use anyhow::{ensure, Context, Result};
use common::{KeyValue, Mapper, Reducer};
use itertools::Itertools;
use std::collections::hash_map::DefaultHasher;
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use worker::{
    execute_reduce_task, MrTmpNaming, OutputWriter, PartitionNaming, RecordDecoder, TaskReport,
    TaskSpec,
};

/// Reduce partition for `key`.
pub fn ihash(key: &str, n_reduce: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % n_reduce as u64) as usize
}

/// A whole MapReduce job run inside one process.
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub n_reduce: usize,
    pub inputs: Vec<PathBuf>,
    naming: MrTmpNaming,
}

impl Job {
    pub fn new(
        name: impl Into<String>,
        n_reduce: usize,
        inputs: Vec<PathBuf>,
        work_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        ensure!(n_reduce > 0, "n_reduce must be at least 1");
        Ok(Self {
            name: name.into(),
            n_reduce,
            inputs,
            naming: MrTmpNaming::new(work_dir),
        })
    }

    pub fn naming(&self) -> &MrTmpNaming {
        &self.naming
    }

    pub fn n_map(&self) -> usize {
        self.inputs.len()
    }

    /// Maps every input and writes one partition per reduce task, empty ones
    /// included, so that every reduce task finds all of its inputs.
    pub fn map_phase<M: Mapper + ?Sized>(&self, mapper: &M) -> Result<()> {
        for (m, input) in self.inputs.iter().enumerate() {
            let contents = fs::read_to_string(input)
                .with_context(|| format!("read input {}", input.display()))?;
            let mut buckets: Vec<Vec<KeyValue>> = vec![Vec::new(); self.n_reduce];
            for kv in mapper.map(&input.to_string_lossy(), &contents) {
                buckets[ihash(&kv.key, self.n_reduce)].push(kv);
            }
            for (r, bucket) in buckets.iter().enumerate() {
                let path = self.naming.partition_path(&self.name, m, r);
                let mut writer = OutputWriter::create(&path)?;
                writer.write_all(bucket)?;
                writer.commit()?;
            }
            debug!(
                job = %self.name,
                map = m,
                input = %input.display(),
                records = buckets.iter().map(Vec::len).sum::<usize>(),
                "map task complete"
            );
        }
        Ok(())
    }

    /// Runs every reduce task, each on its own blocking thread.
    ///
    /// `make_reducer` is called once per task, on that task's thread.
    pub async fn reduce_phase<F, R>(&self, make_reducer: F) -> Result<Vec<TaskReport>>
    where
        F: Fn() -> Result<R> + Send + Sync + 'static,
        R: Reducer + 'static,
    {
        let make_reducer = Arc::new(make_reducer);
        let mut tasks = JoinSet::new();
        for r in 0..self.n_reduce {
            let spec = TaskSpec::new(
                self.name.clone(),
                r,
                self.naming.merge_path(&self.name, r),
                self.n_map(),
            );
            let naming = self.naming.clone();
            let make_reducer = Arc::clone(&make_reducer);
            tasks.spawn_blocking(move || -> Result<(usize, TaskReport)> {
                let reducer = (*make_reducer)()?;
                let report = execute_reduce_task(&spec, &naming, &reducer)
                    .with_context(|| format!("reduce task {r}"))?;
                Ok((r, report))
            });
        }

        let mut reports = Vec::with_capacity(self.n_reduce);
        while let Some(joined) = tasks.join_next().await {
            reports.push(joined.context("reduce task did not complete")??);
        }
        reports.sort_by_key(|(r, _)| *r);
        Ok(reports.into_iter().map(|(_, report)| report).collect())
    }

    /// Merges the sorted per-task outputs into `mrtmp.<job>` as `key: value`
    /// lines.
    pub fn merge(&self) -> Result<PathBuf> {
        let decoders = (0..self.n_reduce)
            .map(|r| {
                let path = self.naming.merge_path(&self.name, r);
                let file = File::open(&path)
                    .with_context(|| format!("open reduce output {}", path.display()))?;
                Ok(RecordDecoder::new(path, std::io::BufReader::new(file)))
            })
            .collect::<Result<Vec<_>>>()?;

        let final_path = self.naming.final_path(&self.name);
        let mut out = BufWriter::new(
            File::create(&final_path)
                .with_context(|| format!("create {}", final_path.display()))?,
        );
        // errors sort first so a bad input stops the merge immediately
        let merged = decoders.into_iter().kmerge_by(|a, b| match (a, b) {
            (Ok(a), Ok(b)) => a.key < b.key,
            (Err(_), _) => true,
            (Ok(_), Err(_)) => false,
        });
        let mut lines = 0usize;
        for record in merged {
            let KeyValue { key, value } = record?;
            writeln!(out, "{key}: {value}")?;
            lines += 1;
        }
        out.flush()?;
        info!(job = %self.name, lines, output = %final_path.display(), "merge complete");
        Ok(final_path)
    }

    /// Removes partitions and per-task outputs.
    pub fn cleanup(&self) {
        let partitions = (0..self.n_map())
            .cartesian_product(0..self.n_reduce)
            .map(|(m, r)| self.naming.partition_path(&self.name, m, r));
        let outputs = (0..self.n_reduce).map(|r| self.naming.merge_path(&self.name, r));
        for path in partitions.chain(outputs) {
            remove_quietly(&path);
        }
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), "cleanup failed: {}", e);
        }
    }
}
