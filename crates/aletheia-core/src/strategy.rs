use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::datum::{Datum, SerializedDatum, TypeVersion};
use crate::error::SerDeError;

/// Pluggable logic converting between a typed datum and its serialized form.
pub trait DatumSerDe<T>: Send + Sync {
    /// Serialize a datum, declaring the type version it was written with.
    fn serialize_datum(&self, datum: &T) -> Result<SerializedDatum, SerDeError>;

    /// Deserialize a datum.
    /// Must fail with `UnsupportedTypeVersion` for type versions it cannot read.
    fn deserialize_datum(&self, datum: SerializedDatum) -> Result<T, SerDeError>;
}

/// JSON payloads for a single datum type at a single schema version.
pub struct JsonDatumSerDe<T> {
    schema_version: i32,
    _datum: PhantomData<fn() -> T>,
}

impl<T> JsonDatumSerDe<T>
where
    T: Datum + Serialize + DeserializeOwned,
{
    pub fn new(schema_version: i32) -> Self {
        Self {
            schema_version,
            _datum: PhantomData,
        }
    }

    pub fn type_version(&self) -> TypeVersion {
        TypeVersion::new(T::TYPE_ID, self.schema_version)
    }
}

impl<T> DatumSerDe<T> for JsonDatumSerDe<T>
where
    T: Datum + Serialize + DeserializeOwned,
{
    fn serialize_datum(&self, datum: &T) -> Result<SerializedDatum, SerDeError> {
        let type_version = self.type_version();
        let payload = serde_json::to_vec(datum).map_err(|e| SerDeError::InvalidPayload {
            type_version: type_version.clone(),
            reason: e.to_string(),
        })?;
        Ok(SerializedDatum::new(payload, type_version))
    }

    fn deserialize_datum(&self, datum: SerializedDatum) -> Result<T, SerDeError> {
        if datum.type_version != self.type_version() {
            return Err(SerDeError::UnsupportedTypeVersion(datum.type_version));
        }
        serde_json::from_slice(&datum.payload).map_err(|e| SerDeError::InvalidPayload {
            type_version: datum.type_version,
            reason: e.to_string(),
        })
    }
}

type ReadFn<T> = Arc<dyn Fn(&[u8]) -> Result<T, String> + Send + Sync>;
type WriteFn<T> = Arc<dyn Fn(&T) -> Result<Vec<u8>, String> + Send + Sync>;

/// Dispatch table from type version to reader, with at most one writer.
///
/// Lets one consumer read every schema version a producer has ever written
/// while writing only the current one.
pub struct VersionedSerDe<T> {
    readers: HashMap<TypeVersion, ReadFn<T>>,
    writer: Option<(TypeVersion, WriteFn<T>)>,
}

impl<T> Default for VersionedSerDe<T> {
    fn default() -> Self {
        Self {
            readers: HashMap::new(),
            writer: None,
        }
    }
}

impl<T> VersionedSerDe<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the reader for one type version, replacing any previous one.
    pub fn with_reader<F>(mut self, type_version: TypeVersion, read: F) -> Self
    where
        F: Fn(&[u8]) -> Result<T, String> + Send + Sync + 'static,
    {
        self.readers.insert(type_version, Arc::new(read));
        self
    }

    /// Set the type version new data is written with.
    pub fn with_writer<F>(mut self, type_version: TypeVersion, write: F) -> Self
    where
        F: Fn(&T) -> Result<Vec<u8>, String> + Send + Sync + 'static,
    {
        self.writer = Some((type_version, Arc::new(write)));
        self
    }

    pub fn supports(&self, type_version: &TypeVersion) -> bool {
        self.readers.contains_key(type_version)
    }
}

impl<T> DatumSerDe<T> for VersionedSerDe<T> {
    fn serialize_datum(&self, datum: &T) -> Result<SerializedDatum, SerDeError> {
        let (type_version, write) = self
            .writer
            .as_ref()
            .ok_or_else(|| SerDeError::NoWriter(std::any::type_name::<T>().to_string()))?;
        let payload = write(datum).map_err(|reason| SerDeError::InvalidPayload {
            type_version: type_version.clone(),
            reason,
        })?;
        Ok(SerializedDatum::new(payload, type_version.clone()))
    }

    fn deserialize_datum(&self, datum: SerializedDatum) -> Result<T, SerDeError> {
        let read = self
            .readers
            .get(&datum.type_version)
            .ok_or_else(|| SerDeError::UnsupportedTypeVersion(datum.type_version.clone()))?;
        read(&datum.payload).map_err(|reason| SerDeError::InvalidPayload {
            type_version: datum.type_version,
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct PageView {
        url: String,
        millis: u64,
    }

    impl Datum for PageView {
        const TYPE_ID: &'static str = "page_view";
    }

    #[test]
    fn test_json_serde_round_trip() {
        let serde = JsonDatumSerDe::<PageView>::new(3);
        let view = PageView {
            url: "/home".to_string(),
            millis: 42,
        };

        let serialized = serde.serialize_datum(&view).unwrap();
        assert_eq!(serialized.type_version, TypeVersion::new("page_view", 3));
        assert_eq!(serde.deserialize_datum(serialized).unwrap(), view);
    }

    #[test]
    fn test_json_serde_rejects_other_versions() {
        let serde = JsonDatumSerDe::<PageView>::new(3);
        let datum = SerializedDatum::new(b"{}".to_vec(), TypeVersion::new("page_view", 4));

        assert_eq!(
            serde.deserialize_datum(datum),
            Err(SerDeError::UnsupportedTypeVersion(TypeVersion::new(
                "page_view",
                4
            )))
        );
    }

    #[test]
    fn test_json_serde_reports_bad_payload() {
        let serde = JsonDatumSerDe::<PageView>::new(1);
        let datum = SerializedDatum::new(b"not json".to_vec(), TypeVersion::new("page_view", 1));

        assert!(matches!(
            serde.deserialize_datum(datum),
            Err(SerDeError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_versioned_serde_dispatches_by_version() {
        let serde = VersionedSerDe::<String>::new()
            .with_reader(TypeVersion::new("name", 1), |b| {
                Ok(String::from_utf8_lossy(b).to_uppercase())
            })
            .with_reader(TypeVersion::new("name", 2), |b| {
                Ok(String::from_utf8_lossy(b).into_owned())
            });

        let v1 = SerializedDatum::new(b"ada".to_vec(), TypeVersion::new("name", 1));
        let v2 = SerializedDatum::new(b"ada".to_vec(), TypeVersion::new("name", 2));
        let v3 = SerializedDatum::new(b"ada".to_vec(), TypeVersion::new("name", 3));

        assert!(serde.supports(&TypeVersion::new("name", 2)));
        assert!(!serde.supports(&TypeVersion::new("name", 3)));
        assert_eq!(serde.deserialize_datum(v1).unwrap(), "ADA");
        assert_eq!(serde.deserialize_datum(v2).unwrap(), "ada");
        assert_eq!(
            serde.deserialize_datum(v3),
            Err(SerDeError::UnsupportedTypeVersion(TypeVersion::new(
                "name", 3
            )))
        );
    }

    #[test]
    fn test_versioned_serde_without_writer() {
        let serde = VersionedSerDe::<String>::new();
        assert!(matches!(
            serde.serialize_datum(&"x".to_string()),
            Err(SerDeError::NoWriter(_))
        ));
    }

    #[test]
    fn test_versioned_serde_writer() {
        let serde = VersionedSerDe::<String>::new()
            .with_writer(TypeVersion::new("name", 2), |s| Ok(s.as_bytes().to_vec()));

        let serialized = serde.serialize_datum(&"ada".to_string()).unwrap();
        assert_eq!(serialized.type_version, TypeVersion::new("name", 2));
        assert_eq!(&serialized.payload[..], b"ada");
    }
}
