//! Aletheia Core - Datum envelopes, the envelope codec, and typed SerDes.
//!
//! This crate owns the wire envelope and everything needed to turn envelope
//! bytes into typed datums and back. It knows nothing about endpoints or
//! topologies.

pub mod codec;
pub mod datum;
pub mod deserializer;
pub mod envelope;
pub mod error;
pub mod listener;
pub mod serializer;
pub mod strategy;

// Re-exports for convenience
pub use datum::{Datum, SerializedDatum, TypeVersion};
pub use deserializer::{DatumDeserializer, EnvelopeDeserializer};
pub use envelope::DatumEnvelope;
pub use error::{DeserializeError, EnvelopeError, SerDeError};
pub use listener::{NoopListener, SerDeListener};
pub use serializer::DatumSerializer;
pub use strategy::{DatumSerDe, JsonDatumSerDe, VersionedSerDe};

#[cfg(any(test, feature = "test-utils"))]
pub use listener::recording::{RecordingListener, SerDeEvent, SerDeEventKind};
