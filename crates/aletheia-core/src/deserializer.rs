use std::sync::Arc;

use crate::codec;
use crate::envelope::DatumEnvelope;
use crate::error::{DeserializeError, EnvelopeError};
use crate::listener::{run_contained, NoopListener, SerDeListener};
use crate::strategy::DatumSerDe;

/// Turns envelope bytes into typed datums of one domain type.
///
/// Holds no mutable state, so a single instance can be shared by every
/// worker decoding messages for a stream.
pub struct DatumDeserializer<T> {
    serde: Arc<dyn DatumSerDe<T>>,
    listener: Arc<dyn SerDeListener<T>>,
}

impl<T: 'static> DatumDeserializer<T> {
    /// Create a deserializer that notifies nobody.
    pub fn new(serde: Arc<dyn DatumSerDe<T>>) -> Self {
        Self::with_listener(serde, Arc::new(NoopListener))
    }

    pub fn with_listener(
        serde: Arc<dyn DatumSerDe<T>>,
        listener: Arc<dyn SerDeListener<T>>,
    ) -> Self {
        Self { serde, listener }
    }

    /// Decode one message read from `stream_name`.
    ///
    /// The listener is only notified when decoding succeeds.
    pub fn deserialize(&self, stream_name: &str, data: &[u8]) -> Result<T, DeserializeError> {
        let envelope = codec::decode(data)?;
        let datum = self.serde.deserialize_datum(envelope.serialized_datum())?;

        run_contained("on_deserialize", stream_name, || {
            self.listener
                .on_deserialize(stream_name, &datum, &envelope, data.len())
        });

        Ok(datum)
    }
}

/// Decodes envelopes without interpreting their payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeDeserializer;

impl EnvelopeDeserializer {
    pub fn deserialize(
        &self,
        stream_name: &str,
        data: &[u8],
    ) -> Result<DatumEnvelope, EnvelopeError> {
        let envelope = codec::decode(data)?;
        tracing::trace!(
            stream = stream_name,
            type_version = %envelope.type_version(),
            "Decoded envelope"
        );
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{SerializedDatum, TypeVersion};
    use crate::listener::recording::{RecordingListener, SerDeEventKind};
    use crate::strategy::VersionedSerDe;
    use proptest::prelude::*;

    fn identity_serde() -> Arc<dyn DatumSerDe<Vec<u8>>> {
        Arc::new(
            VersionedSerDe::new().with_reader(TypeVersion::new("Order", 2), |b| Ok(b.to_vec())),
        )
    }

    fn encoded(type_id: &str, version: i32, payload: &[u8]) -> Vec<u8> {
        let envelope = DatumEnvelope::new(SerializedDatum::new(
            payload.to_vec(),
            TypeVersion::new(type_id, version),
        ))
        .with_source_host("producer-1");
        codec::encode(&envelope).to_vec()
    }

    #[test]
    fn test_decodes_payload_and_notifies_once() {
        let listener = Arc::new(RecordingListener::<Vec<u8>>::new());
        let deserializer = DatumDeserializer::with_listener(identity_serde(), listener.clone());
        let bytes = encoded("Order", 2, b"order-payload");

        let datum = deserializer.deserialize("orders", &bytes).unwrap();

        assert_eq!(datum, b"order-payload".to_vec());
        let events = listener.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, SerDeEventKind::Deserialize);
        assert_eq!(events[0].stream_name, "orders");
        assert_eq!(events[0].datum, datum);
        assert_eq!(events[0].envelope, codec::decode(&bytes).unwrap());
        assert_eq!(events[0].byte_len, bytes.len());
    }

    #[test]
    fn test_unknown_version_rejected_without_notification() {
        let listener = Arc::new(RecordingListener::<Vec<u8>>::new());
        let deserializer = DatumDeserializer::with_listener(identity_serde(), listener.clone());

        let err = deserializer
            .deserialize("orders", &encoded("Order", 3, b"x"))
            .unwrap_err();
        assert_eq!(
            err,
            DeserializeError::UnsupportedTypeVersion(TypeVersion::new("Order", 3))
        );

        let err = deserializer
            .deserialize("orders", &encoded("Refund", 2, b"x"))
            .unwrap_err();
        assert!(matches!(err, DeserializeError::UnsupportedTypeVersion(_)));

        assert!(listener.is_empty());
    }

    #[test]
    fn test_malformed_bytes_rejected() {
        let listener = Arc::new(RecordingListener::<Vec<u8>>::new());
        let deserializer = DatumDeserializer::with_listener(identity_serde(), listener.clone());

        let mut bytes = encoded("Order", 2, b"payload");
        bytes.truncate(bytes.len() - 3);

        assert!(matches!(
            deserializer.deserialize("orders", &bytes),
            Err(DeserializeError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            deserializer.deserialize("orders", b""),
            Err(DeserializeError::MalformedEnvelope(_))
        ));
        assert!(listener.is_empty());
    }

    #[test]
    fn test_same_input_same_result() {
        let deserializer = DatumDeserializer::new(identity_serde());
        let good = encoded("Order", 2, b"abc");
        let bad = encoded("Order", 9, b"abc");

        for _ in 0..3 {
            assert_eq!(deserializer.deserialize("orders", &good).unwrap(), b"abc");
            assert_eq!(
                deserializer.deserialize("orders", &bad),
                Err(DeserializeError::UnsupportedTypeVersion(TypeVersion::new(
                    "Order", 9
                )))
            );
        }
    }

    fn any_encoding() -> impl Strategy<Value = Vec<u8>> {
        (
            "[A-Za-z]{0,12}",
            any::<i32>(),
            proptest::option::of("[a-z0-9-]{0,12}"),
            any::<i64>(),
            proptest::collection::vec(any::<u8>(), 0..64),
        )
            .prop_map(|(type_id, version, key, logical, payload)| {
                let mut envelope = DatumEnvelope::new(SerializedDatum::new(
                    payload,
                    TypeVersion::new(type_id, version),
                ))
                .with_logical_timestamp(logical)
                .with_source_host("producer-1");
                envelope.datum_key = key;
                codec::encode(&envelope).to_vec()
            })
    }

    proptest! {
        #[test]
        fn prop_truncated_envelope_is_malformed(
            bytes in any_encoding(),
            cut in any::<prop::sample::Index>(),
        ) {
            let listener = Arc::new(RecordingListener::<Vec<u8>>::new());
            let deserializer =
                DatumDeserializer::with_listener(identity_serde(), listener.clone());
            let prefix = &bytes[..cut.index(bytes.len())];

            prop_assert!(matches!(
                deserializer.deserialize("orders", prefix),
                Err(DeserializeError::MalformedEnvelope(_))
            ));
            prop_assert!(listener.is_empty());
        }

        #[test]
        fn prop_trailing_bytes_are_malformed(
            bytes in any_encoding(),
            extra in proptest::collection::vec(any::<u8>(), 1..16),
        ) {
            let listener = Arc::new(RecordingListener::<Vec<u8>>::new());
            let deserializer =
                DatumDeserializer::with_listener(identity_serde(), listener.clone());
            let mut padded = bytes;
            padded.extend_from_slice(&extra);

            prop_assert!(matches!(
                deserializer.deserialize("orders", &padded),
                Err(DeserializeError::MalformedEnvelope(EnvelopeError::TrailingBytes(n))) if n == extra.len()
            ));
            prop_assert!(listener.is_empty());
        }

        #[test]
        fn prop_deserialize_is_deterministic(
            bytes in prop_oneof![
                proptest::collection::vec(any::<u8>(), 0..96),
                any_encoding(),
            ],
        ) {
            let deserializer = DatumDeserializer::new(identity_serde());

            prop_assert_eq!(
                deserializer.deserialize("orders", &bytes),
                deserializer.deserialize("orders", &bytes)
            );
        }
    }

    struct PanickingListener;

    impl SerDeListener<Vec<u8>> for PanickingListener {
        fn on_deserialize(&self, _: &str, _: &Vec<u8>, _: &DatumEnvelope, _: usize) {
            panic!("listener failure");
        }
    }

    #[test]
    fn test_listener_panic_does_not_replace_result() {
        let deserializer =
            DatumDeserializer::with_listener(identity_serde(), Arc::new(PanickingListener));

        let datum = deserializer
            .deserialize("orders", &encoded("Order", 2, b"kept"))
            .unwrap();
        assert_eq!(datum, b"kept".to_vec());
    }

    #[test]
    fn test_shared_across_threads() {
        let deserializer = Arc::new(DatumDeserializer::new(identity_serde()));
        let bytes = Arc::new(encoded("Order", 2, b"shared"));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let deserializer = deserializer.clone();
                let bytes = bytes.clone();
                std::thread::spawn(move || deserializer.deserialize("orders", &bytes).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), b"shared".to_vec());
        }
    }

    #[test]
    fn test_envelope_deserializer() {
        let bytes = encoded("Order", 2, b"raw");
        let envelope = EnvelopeDeserializer.deserialize("orders", &bytes).unwrap();

        assert_eq!(envelope.type_version(), TypeVersion::new("Order", 2));
        assert_eq!(envelope.source_host, "producer-1");
        assert_eq!(&envelope.datum_bytes[..], b"raw");
    }
}
