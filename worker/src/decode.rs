use crate::error::{ReduceError, Result};
use common::KeyValue;
use serde_json::de::IoRead;
use serde_json::StreamDeserializer;
use std::io::Read;
use std::path::PathBuf;

/// Streams the records of one partition.
///
/// Records are JSON objects one after another; end of input ends the
/// iteration. The first malformed record yields a [`ReduceError::Decode`]
/// and the decoder is exhausted from then on.
pub struct RecordDecoder<R: Read> {
    path: PathBuf,
    stream: StreamDeserializer<'static, IoRead<R>, KeyValue>,
    failed: bool,
}

impl<R: Read> RecordDecoder<R> {
    pub fn new(path: impl Into<PathBuf>, reader: R) -> Self {
        Self {
            path: path.into(),
            stream: serde_json::Deserializer::from_reader(reader).into_iter(),
            failed: false,
        }
    }
}

impl<R: Read> Iterator for RecordDecoder<R> {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.stream.next()? {
            Ok(record) => Some(Ok(record)),
            Err(source) => {
                self.failed = true;
                // start of the record that failed to parse
                let offset = self.stream.byte_offset();
                Some(Err(ReduceError::Decode {
                    path: self.path.clone(),
                    offset,
                    source,
                }))
            }
        }
    }
}
