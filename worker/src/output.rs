use crate::error::{ReduceError, Result};
use common::KeyValue;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Writes records in the same line-delimited JSON the decoder reads.
pub struct RecordEncoder<W: Write> {
    writer: W,
    records: usize,
    bytes: u64,
}

impl<W: Write> RecordEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            records: 0,
            bytes: 0,
        }
    }

    pub fn encode(&mut self, record: &KeyValue) -> io::Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.records += 1;
        self.bytes += line.len() as u64;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Flushes and hands back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Removes the staging file unless it was published.
struct Staged {
    path: PathBuf,
    published: bool,
}

impl Drop for Staged {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), "failed to remove staged output: {}", e);
            }
        }
    }
}

/// The destination of one reduce task.
///
/// Records go to a uniquely named file next to the destination, which is
/// renamed over it by [`OutputWriter::commit`]. Dropping the writer without
/// committing leaves the destination untouched.
pub struct OutputWriter {
    dest: PathBuf,
    staged: Staged,
    encoder: RecordEncoder<BufWriter<File>>,
}

impl OutputWriter {
    pub fn create(dest: impl Into<PathBuf>) -> Result<Self> {
        let dest = dest.into();
        let staged_path = staging_path(&dest).map_err(ReduceError::sink(&dest))?;
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(ReduceError::sink(&dest))?;
        }
        let file = File::create(&staged_path).map_err(ReduceError::sink(&dest))?;
        debug!(dest = %dest.display(), staged = %staged_path.display(), "output staged");
        Ok(Self {
            dest,
            staged: Staged {
                path: staged_path,
                published: false,
            },
            encoder: RecordEncoder::new(BufWriter::new(file)),
        })
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn write(&mut self, record: &KeyValue) -> Result<()> {
        self.encoder.encode(record).map_err(|source| ReduceError::Sink {
            path: self.dest.clone(),
            source,
        })
    }

    pub fn write_all<'a, I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a KeyValue>,
    {
        records.into_iter().try_for_each(|record| self.write(record))
    }

    /// Makes the output durable and visible at the destination. Returns the
    /// number of bytes written.
    pub fn commit(self) -> Result<u64> {
        let OutputWriter {
            dest,
            mut staged,
            encoder,
        } = self;
        let bytes = encoder.bytes_written();
        let sink = |e: io::Error| ReduceError::Sink {
            path: dest.clone(),
            source: e,
        };

        let file = encoder
            .finish()
            .map_err(sink)?
            .into_inner()
            .map_err(|e| sink(e.into_error()))?;
        file.sync_all().map_err(sink)?;
        drop(file);

        fs::rename(&staged.path, &dest).map_err(sink)?;
        staged.published = true;
        Ok(bytes)
    }
}

fn staging_path(dest: &Path) -> io::Result<PathBuf> {
    let name = dest.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name")
    })?;
    let staged = format!(".{}.{}.tmp", name.to_string_lossy(), Uuid::new_v4());
    Ok(dest.with_file_name(staged))
}
