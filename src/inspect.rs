use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use aletheia_core::{codec, DatumEnvelope, EnvelopeError};

/// Human-readable view of an envelope's metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvelopeSummary {
    pub datum_type_id: String,
    pub datum_schema_version: i32,
    pub datum_key: Option<String>,
    pub datum_unique_id: Option<String>,
    pub incarnation: i32,
    pub logical_time: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub source_host: String,
    pub payload_len: usize,
}

impl From<&DatumEnvelope> for EnvelopeSummary {
    fn from(envelope: &DatumEnvelope) -> Self {
        Self {
            datum_type_id: envelope.datum_type_id.clone(),
            datum_schema_version: envelope.datum_schema_version,
            datum_key: envelope.datum_key.clone(),
            datum_unique_id: envelope.datum_unique_id.map(|id| id.to_string()),
            incarnation: envelope.incarnation,
            logical_time: envelope.logical_time(),
            created_at: envelope.created_at(),
            source_host: envelope.source_host.clone(),
            payload_len: envelope.datum_bytes.len(),
        }
    }
}

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed envelope in {path}: {source}")]
    Malformed { path: PathBuf, source: EnvelopeError },
}

/// Decode the envelope stored in `path`.
pub fn inspect_file(path: &Path) -> Result<EnvelopeSummary, InspectError> {
    let bytes = std::fs::read(path).map_err(|source| InspectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let envelope = codec::decode(&bytes).map_err(|source| InspectError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(EnvelopeSummary::from(&envelope))
}
