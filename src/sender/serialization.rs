use crate::buffer::Batch;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use thiserror::Error;

// Compressing tiny payloads costs more than it saves
const GZIP_MIN_BODY_BYTES: usize = 1024;

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error during serialization: {0}")]
    IoError(#[from] std::io::Error),
    #[error("batch is empty")]
    EmptyBatch,
}

#[derive(Debug, Clone)]
pub struct SerializedBody {
    pub bytes: Vec<u8>,
    pub compressed: bool,
}

/// Turns one batch into the JSON body of the ingestion POST: the write key,
/// the batch timestamp and the ordered action array, optionally gzipped.
#[derive(Debug, Clone)]
pub struct BatchSerializer {
    gzip: bool,
}

impl BatchSerializer {
    pub fn new(gzip: bool) -> Self {
        Self { gzip }
    }

    pub fn serialize(&self, batch: &Batch) -> Result<SerializedBody, SerializationError> {
        if batch.is_empty() {
            return Err(SerializationError::EmptyBatch);
        }

        let json = serde_json::to_vec(batch)?;

        if self.gzip && json.len() >= GZIP_MIN_BODY_BYTES {
            let mut encoder =
                GzEncoder::new(Vec::with_capacity(json.len() / 2), Compression::default());
            encoder.write_all(&json)?;
            Ok(SerializedBody {
                bytes: encoder.finish()?,
                compressed: true,
            })
        } else {
            Ok(SerializedBody {
                bytes: json,
                compressed: false,
            })
        }
    }
}
