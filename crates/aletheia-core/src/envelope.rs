use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::datum::{SerializedDatum, TypeVersion};

/// Self-describing wire wrapper around a serialized datum.
///
/// Field order here matches the wire order in [`crate::codec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatumEnvelope {
    pub datum_type_id: String,
    pub datum_schema_version: i32,
    pub datum_key: Option<String>,
    pub datum_unique_id: Option<Uuid>,
    /// Producer incarnation, bumped by the writer on restart.
    pub incarnation: i32,
    /// Milliseconds since epoch.
    pub logical_timestamp: i64,
    /// Milliseconds since epoch.
    pub creation_time: i64,
    pub source_host: String,
    pub datum_bytes: Bytes,
}

impl DatumEnvelope {
    /// Create an envelope with empty metadata around a serialized datum.
    pub fn new(datum: SerializedDatum) -> Self {
        Self {
            datum_type_id: datum.type_version.datum_type_id,
            datum_schema_version: datum.type_version.datum_schema_version,
            datum_key: None,
            datum_unique_id: None,
            incarnation: 0,
            logical_timestamp: 0,
            creation_time: 0,
            source_host: String::new(),
            datum_bytes: datum.payload,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.datum_key = Some(key.into());
        self
    }

    pub fn with_unique_id(mut self, id: Uuid) -> Self {
        self.datum_unique_id = Some(id);
        self
    }

    pub fn with_incarnation(mut self, incarnation: i32) -> Self {
        self.incarnation = incarnation;
        self
    }

    pub fn with_logical_timestamp(mut self, millis: i64) -> Self {
        self.logical_timestamp = millis;
        self
    }

    pub fn with_creation_time(mut self, millis: i64) -> Self {
        self.creation_time = millis;
        self
    }

    pub fn with_source_host(mut self, host: impl Into<String>) -> Self {
        self.source_host = host.into();
        self
    }

    /// The type version declared by this envelope.
    pub fn type_version(&self) -> TypeVersion {
        TypeVersion::new(self.datum_type_id.clone(), self.datum_schema_version)
    }

    /// The payload paired with its declared type version.
    pub fn serialized_datum(&self) -> SerializedDatum {
        SerializedDatum::new(self.datum_bytes.clone(), self.type_version())
    }

    pub fn logical_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.logical_timestamp)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.creation_time)
    }
}
