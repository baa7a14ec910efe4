use crate::decode::RecordDecoder;
use crate::error::{ReduceError, Result};
use crate::naming::PartitionNaming;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One producer's partition for this reduce task, open for reading.
///
/// The file is closed when the source, or the decoder made from it, is dropped.
#[derive(Debug)]
pub struct PartitionSource {
    producer: usize,
    path: PathBuf,
    reader: BufReader<File>,
}

impl PartitionSource {
    pub fn open(job: &str, producer: usize, path: PathBuf) -> Result<Self> {
        let unavailable = |source: io::Error, path: PathBuf| ReduceError::SourceUnavailable {
            job: job.to_string(),
            producer,
            path,
            source,
        };
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => return Err(unavailable(e, path)),
        };
        // a directory opens fine on unix but can never be read as records
        match file.metadata() {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(unavailable(io::Error::other("not a regular file"), path)),
            Err(e) => return Err(unavailable(e, path)),
        }
        Ok(Self {
            producer,
            path,
            reader: BufReader::new(file),
        })
    }

    pub fn producer(&self) -> usize {
        self.producer
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(self) -> RecordDecoder<BufReader<File>> {
        RecordDecoder::new(self.path, self.reader)
    }
}

/// Every partition a reduce task consumes, one per upstream producer.
///
/// Opening is all-or-nothing: if any producer's partition cannot be opened,
/// the ones already opened are closed and the error is returned.
#[derive(Debug)]
pub struct PartitionSet {
    sources: Vec<PartitionSource>,
}

impl PartitionSet {
    pub fn open<N>(job: &str, reduce: usize, producer_count: usize, naming: &N) -> Result<Self>
    where
        N: PartitionNaming + ?Sized,
    {
        let sources = (0..producer_count)
            .map(|producer| {
                let path = naming.partition_path(job, producer, reduce);
                let source = PartitionSource::open(job, producer, path)?;
                debug!(job, reduce, producer, path = %source.path().display(), "partition opened");
                Ok(source)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { sources })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl IntoIterator for PartitionSet {
    type Item = PartitionSource;
    type IntoIter = std::vec::IntoIter<PartitionSource>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::MrTmpNaming;
    use std::fs;

    #[test]
    fn opens_one_source_per_producer_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let naming = MrTmpNaming::new(dir.path());
        for m in 0..3 {
            fs::write(naming.partition_path("job", m, 1), "").unwrap();
        }
        let set = PartitionSet::open("job", 1, 3, &naming).unwrap();
        assert_eq!(set.len(), 3);
        let producers: Vec<usize> = set.into_iter().map(|s| s.producer()).collect();
        assert_eq!(producers, vec![0, 1, 2]);
    }

    #[test]
    fn zero_producers_is_an_empty_set() {
        let naming = |_: &str, _: usize, _: usize| PathBuf::from("/does/not/matter");
        let set = PartitionSet::open("job", 0, 0, &naming).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn missing_partition_names_its_producer() {
        let dir = tempfile::tempdir().unwrap();
        let naming = MrTmpNaming::new(dir.path());
        fs::write(naming.partition_path("job", 0, 0), "").unwrap();
        let err = PartitionSet::open("job", 0, 2, &naming).unwrap_err();
        match err {
            ReduceError::SourceUnavailable { producer, path, .. } => {
                assert_eq!(producer, 1);
                assert_eq!(path, naming.partition_path("job", 1, 0));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn directory_is_not_a_partition() {
        let dir = tempfile::tempdir().unwrap();
        let naming = MrTmpNaming::new(dir.path());
        fs::create_dir(naming.partition_path("job", 0, 0)).unwrap();
        let err = PartitionSet::open("job", 0, 1, &naming).unwrap_err();
        assert!(matches!(err, ReduceError::SourceUnavailable { producer: 0, .. }));
    }
}
