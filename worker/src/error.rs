use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The part of a reduce task an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    OpeningSources,
    Decoding,
    Reducing,
    Writing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::OpeningSources => "opening-sources",
            Stage::Decoding => "decoding",
            Stage::Reducing => "reducing",
            Stage::Writing => "writing",
        };
        f.write_str(name)
    }
}

/// Every way a reduce task can fail. All of them are fatal to the task.
#[derive(Debug, Error)]
pub enum ReduceError {
    #[error("job {job}: partition of producer {producer} unavailable at {}", .path.display())]
    SourceUnavailable {
        job: String,
        producer: usize,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed record in {} at byte {offset}", .path.display())]
    Decode {
        path: PathBuf,
        offset: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("reduce function failed for key {key:?}: {message}")]
    Reduction { key: String, message: String },

    #[error("cannot write output {}", .path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ReduceError {
    pub fn stage(&self) -> Stage {
        match self {
            ReduceError::SourceUnavailable { .. } => Stage::OpeningSources,
            ReduceError::Decode { .. } => Stage::Decoding,
            ReduceError::Reduction { .. } => Stage::Reducing,
            ReduceError::Sink { .. } => Stage::Writing,
        }
    }

    pub(crate) fn sink(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| ReduceError::Sink { path, source }
    }
}

pub type Result<T, E = ReduceError> = std::result::Result<T, E>;
