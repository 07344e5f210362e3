use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::codec;
use crate::datum::Datum;
use crate::envelope::DatumEnvelope;
use crate::error::SerDeError;
use crate::listener::{run_contained, NoopListener, SerDeListener};
use crate::strategy::DatumSerDe;

/// Wraps typed datums into envelopes ready to publish.
pub struct DatumSerializer<T> {
    serde: Arc<dyn DatumSerDe<T>>,
    listener: Arc<dyn SerDeListener<T>>,
    source_host: String,
    incarnation: i32,
}

impl<T: Datum> DatumSerializer<T> {
    pub fn new(serde: Arc<dyn DatumSerDe<T>>) -> Self {
        Self {
            serde,
            listener: Arc::new(NoopListener),
            source_host: String::new(),
            incarnation: 0,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn SerDeListener<T>>) -> Self {
        self.listener = listener;
        self
    }

    /// Host name stamped on every envelope.
    pub fn with_source_host(mut self, source_host: impl Into<String>) -> Self {
        self.source_host = source_host.into();
        self
    }

    pub fn with_incarnation(mut self, incarnation: i32) -> Self {
        self.incarnation = incarnation;
        self
    }

    /// Serialize a datum bound for `stream_name` into envelope bytes.
    pub fn serialize(&self, stream_name: &str, datum: &T) -> Result<Bytes, SerDeError> {
        let serialized = self.serde.serialize_datum(datum)?;
        let now = Utc::now();
        let logical = datum.logical_timestamp().unwrap_or(now);

        let mut envelope = DatumEnvelope::new(serialized)
            .with_unique_id(Uuid::new_v4())
            .with_incarnation(self.incarnation)
            .with_logical_timestamp(logical.timestamp_millis())
            .with_creation_time(now.timestamp_millis())
            .with_source_host(self.source_host.clone());
        envelope.datum_key = datum.datum_key();

        let bytes = codec::encode(&envelope);

        run_contained("on_serialize", stream_name, || {
            self.listener
                .on_serialize(stream_name, datum, &envelope, bytes.len())
        });

        Ok(bytes)
    }
}
