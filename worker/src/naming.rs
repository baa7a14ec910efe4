//! Where a reduce task finds its inputs.
//!
//! The scheme belongs to whoever runs the map phase; the worker only needs a
//! deterministic `(job, producer, reduce) -> path` mapping.

use std::path::{Path, PathBuf};

pub trait PartitionNaming {
    fn partition_path(&self, job: &str, producer: usize, reduce: usize) -> PathBuf;
}

impl<F> PartitionNaming for F
where
    F: Fn(&str, usize, usize) -> PathBuf,
{
    fn partition_path(&self, job: &str, producer: usize, reduce: usize) -> PathBuf {
        self(job, producer, reduce)
    }
}

/// The `mrtmp.<job>-<producer>-<reduce>` layout, rooted at `dir`.
#[derive(Debug, Clone)]
pub struct MrTmpNaming {
    dir: PathBuf,
}

impl MrTmpNaming {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Output of reduce task `reduce`.
    pub fn merge_path(&self, job: &str, reduce: usize) -> PathBuf {
        self.dir.join(format!("mrtmp.{job}-res-{reduce}"))
    }

    /// Result of merging every reduce task's output.
    pub fn final_path(&self, job: &str) -> PathBuf {
        self.dir.join(format!("mrtmp.{job}"))
    }
}

impl Default for MrTmpNaming {
    fn default() -> Self {
        Self::new(".")
    }
}

impl PartitionNaming for MrTmpNaming {
    fn partition_path(&self, job: &str, producer: usize, reduce: usize) -> PathBuf {
        self.dir.join(format!("mrtmp.{job}-{producer}-{reduce}"))
    }
}
