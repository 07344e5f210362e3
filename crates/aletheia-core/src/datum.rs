use bytes::Bytes;
use chrono::{DateTime, Utc};

/// A strongly typed application record that can travel inside an envelope.
///
/// ```
/// use aletheia_core::Datum;
///
/// struct Click {
///     url: String,
/// }
///
/// impl Datum for Click {
///     const TYPE_ID: &'static str = "click";
/// }
/// # let _ = Click { url: String::new() }.url;
/// ```
pub trait Datum: Send + Sync + 'static {
    /// Identifier written into every envelope carrying this type.
    const TYPE_ID: &'static str;

    /// Partitioning key, if the datum has one.
    fn datum_key(&self) -> Option<String> {
        None
    }

    /// Time the datum logically belongs to. Defaults to publish time.
    fn logical_timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// Identifies exactly one serialization strategy: a datum type at a schema version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVersion {
    pub datum_type_id: String,
    pub datum_schema_version: i32,
}

impl TypeVersion {
    pub fn new(datum_type_id: impl Into<String>, datum_schema_version: i32) -> Self {
        Self {
            datum_type_id: datum_type_id.into(),
            datum_schema_version,
        }
    }
}

impl std::fmt::Display for TypeVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@v{}", self.datum_type_id, self.datum_schema_version)
    }
}

/// Raw payload bytes paired with the type version they were written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedDatum {
    pub payload: Bytes,
    pub type_version: TypeVersion,
}

impl SerializedDatum {
    pub fn new(payload: impl Into<Bytes>, type_version: TypeVersion) -> Self {
        Self {
            payload: payload.into(),
            type_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_version_display() {
        let tv = TypeVersion::new("Order", 2);
        assert_eq!(tv.to_string(), "Order@v2");
    }

    #[test]
    fn test_type_version_structural_equality() {
        assert_eq!(TypeVersion::new("Order", 2), TypeVersion::new("Order".to_string(), 2));
        assert_ne!(TypeVersion::new("Order", 2), TypeVersion::new("Order", 3));
        assert_ne!(TypeVersion::new("Order", 2), TypeVersion::new("Refund", 2));
    }
}
