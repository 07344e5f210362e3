use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use aletheia_core::{
    DatumDeserializer, DatumEnvelope, DeserializeError, EnvelopeDeserializer, EnvelopeError,
    NoopListener, SerDeListener,
};

use crate::cluster::ClusterIdentitySet;
use crate::config::{AletheiaConfig, ConfigBuilder};
use crate::endpoint::{
    BrokerGroup, KafkaTopicEndpointTemplate, PhysicalCoordinates, KAFKA_TOPIC_TEMPLATE,
};
use crate::error::StreamsError;

/// Configuration key holding the broker list of the topology's cluster.
pub const BOOTSTRAP_SERVERS_CONFIG: &str = "bootstrap.servers";

/// What the values of a registered source decode to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Datum {
        type_name: &'static str,
        serde_id: String,
    },
    Envelope,
}

/// A named input the topology builder attaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub endpoint_id: String,
    pub topic_name: String,
    pub kind: SourceKind,
}

/// Typed input source produced by [`AletheiaStreams::stream`].
pub struct StreamHandle<T> {
    endpoint_id: String,
    coordinates: PhysicalCoordinates,
    deserializer: Arc<DatumDeserializer<T>>,
}

impl<T> Clone for StreamHandle<T> {
    fn clone(&self) -> Self {
        Self {
            endpoint_id: self.endpoint_id.clone(),
            coordinates: self.coordinates.clone(),
            deserializer: self.deserializer.clone(),
        }
    }
}

impl<T: 'static> StreamHandle<T> {
    pub fn endpoint_id(&self) -> &str {
        &self.endpoint_id
    }

    pub fn topic_name(&self) -> &str {
        &self.coordinates.topic_name
    }

    pub fn brokers(&self) -> &BrokerGroup {
        &self.coordinates.brokers
    }

    /// Shared value deserializer for the execution engine's workers.
    pub fn deserializer(&self) -> Arc<DatumDeserializer<T>> {
        self.deserializer.clone()
    }

    /// Decode one value read from this stream's topic.
    pub fn deserialize(&self, data: &[u8]) -> Result<T, DeserializeError> {
        self.deserializer
            .deserialize(&self.coordinates.topic_name, data)
    }
}

/// Envelope-valued input source produced by [`AletheiaStreams::envelope_stream`].
#[derive(Debug, Clone)]
pub struct EnvelopeStreamHandle {
    endpoint_id: String,
    coordinates: PhysicalCoordinates,
}

impl EnvelopeStreamHandle {
    pub fn endpoint_id(&self) -> &str {
        &self.endpoint_id
    }

    pub fn topic_name(&self) -> &str {
        &self.coordinates.topic_name
    }

    pub fn brokers(&self) -> &BrokerGroup {
        &self.coordinates.brokers
    }

    pub fn deserialize(&self, data: &[u8]) -> Result<DatumEnvelope, EnvelopeError> {
        EnvelopeDeserializer.deserialize(&self.coordinates.topic_name, data)
    }
}

/// Immutable configuration handed to the execution engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EffectiveConfig {
    entries: BTreeMap<String, Value>,
}

impl EffectiveConfig {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn bootstrap_servers(&self) -> Option<&str> {
        self.get(BOOTSTRAP_SERVERS_CONFIG).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<String, Value> {
        self.entries
    }
}

/// One topology-construction session.
///
/// Register every stream, then call [`AletheiaStreams::finalize_topology`].
/// All mutating calls take `&mut self`, so a session is driven from one
/// thread at a time. After a successful finalize no more streams can be
/// registered.
pub struct AletheiaStreams {
    app_config: BTreeMap<String, Value>,
    clusters: ClusterIdentitySet,
    sources: Vec<SourceDescriptor>,
    finalized: bool,
}

impl AletheiaStreams {
    /// Start a session. `app_config` entries take precedence over anything
    /// the session infers.
    pub fn new(app_config: BTreeMap<String, Value>) -> Self {
        Self {
            app_config,
            clusters: ClusterIdentitySet::new(),
            sources: Vec::new(),
            finalized: false,
        }
    }

    /// A config builder with the Kafka topic endpoint template registered.
    pub fn config_builder() -> ConfigBuilder {
        ConfigBuilder::new().register_endpoint_template(KAFKA_TOPIC_TEMPLATE, KafkaTopicEndpointTemplate)
    }

    /// Resolve a logical endpoint and record the cluster it lives on.
    pub fn resolve_consumption_endpoint(
        &mut self,
        config: &AletheiaConfig,
        endpoint_id: &str,
    ) -> Result<PhysicalCoordinates, StreamsError> {
        self.ensure_open()?;

        let coordinates = config
            .consumption_endpoint(endpoint_id)
            .cloned()
            .ok_or_else(|| StreamsError::UnresolvedEndpoint(endpoint_id.to_string()))?;

        if self.clusters.add(coordinates.brokers.clone()) {
            tracing::debug!(
                endpoint = endpoint_id,
                brokers = %coordinates.brokers,
                clusters = self.clusters.len(),
                "Observed new cluster"
            );
        }

        Ok(coordinates)
    }

    /// Register a typed stream whose values are decoded with the SerDe `serde_id`.
    pub fn stream<T: 'static>(
        &mut self,
        config: &AletheiaConfig,
        endpoint_id: &str,
        serde_id: &str,
    ) -> Result<StreamHandle<T>, StreamsError> {
        self.stream_with_listener(config, endpoint_id, serde_id, Arc::new(NoopListener))
    }

    /// Same as [`AletheiaStreams::stream`], notifying `listener` after each decode.
    pub fn stream_with_listener<T: 'static>(
        &mut self,
        config: &AletheiaConfig,
        endpoint_id: &str,
        serde_id: &str,
        listener: Arc<dyn SerDeListener<T>>,
    ) -> Result<StreamHandle<T>, StreamsError> {
        self.ensure_open()?;

        // Look the SerDe up first so a bad id does not leave a cluster behind.
        let serde = config.datum_serde::<T>(serde_id)?;
        let coordinates = self.resolve_consumption_endpoint(config, endpoint_id)?;

        self.sources.push(SourceDescriptor {
            endpoint_id: endpoint_id.to_string(),
            topic_name: coordinates.topic_name.clone(),
            kind: SourceKind::Datum {
                type_name: std::any::type_name::<T>(),
                serde_id: serde_id.to_string(),
            },
        });
        tracing::debug!(
            endpoint = endpoint_id,
            topic = %coordinates.topic_name,
            serde = serde_id,
            "Registered datum stream"
        );

        Ok(StreamHandle {
            endpoint_id: endpoint_id.to_string(),
            coordinates,
            deserializer: Arc::new(DatumDeserializer::with_listener(serde, listener)),
        })
    }

    /// Register a stream whose values are raw envelopes.
    pub fn envelope_stream(
        &mut self,
        config: &AletheiaConfig,
        endpoint_id: &str,
    ) -> Result<EnvelopeStreamHandle, StreamsError> {
        let coordinates = self.resolve_consumption_endpoint(config, endpoint_id)?;

        self.sources.push(SourceDescriptor {
            endpoint_id: endpoint_id.to_string(),
            topic_name: coordinates.topic_name.clone(),
            kind: SourceKind::Envelope,
        });
        tracing::debug!(
            endpoint = endpoint_id,
            topic = %coordinates.topic_name,
            "Registered envelope stream"
        );

        Ok(EnvelopeStreamHandle {
            endpoint_id: endpoint_id.to_string(),
            coordinates,
        })
    }

    /// Validate the registered streams and build the effective configuration.
    ///
    /// The broker setting is, in order of precedence: the application
    /// config's own `bootstrap.servers`, `broker_override`, or the single
    /// cluster every registered stream resides on. Supplied brokers skip the
    /// single-cluster check; a warning is logged when it would have failed.
    pub fn finalize_topology(
        &mut self,
        broker_override: Option<&BrokerGroup>,
    ) -> Result<EffectiveConfig, StreamsError> {
        let mut entries = BTreeMap::new();

        match self.app_config.get(BOOTSTRAP_SERVERS_CONFIG) {
            Some(brokers) => self.warn_unvalidated(brokers, "application config"),
            None => {
                let brokers = match broker_override {
                    Some(brokers) => {
                        self.warn_unvalidated(brokers, "broker override");
                        brokers
                    }
                    None => self.clusters.validate()?,
                };
                entries.insert(
                    BOOTSTRAP_SERVERS_CONFIG.to_string(),
                    Value::String(brokers.to_string()),
                );
            }
        }

        entries.extend(
            self.app_config
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        self.finalized = true;
        tracing::info!(
            streams = self.sources.len(),
            clusters = self.clusters.len(),
            "Topology finalized"
        );

        Ok(EffectiveConfig { entries })
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    pub fn clusters(&self) -> &ClusterIdentitySet {
        &self.clusters
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Brokers were supplied by the caller, so the registered streams are
    /// not checked against them. Say so unless exactly one cluster was seen.
    fn warn_unvalidated(&self, brokers: &dyn std::fmt::Display, source: &str) {
        if self.clusters.len() != 1 {
            tracing::warn!(
                clusters = self.clusters.len(),
                brokers = %brokers,
                source,
                "Streams do not reside on exactly one cluster; using supplied brokers"
            );
        }
    }

    fn ensure_open(&self) -> Result<(), StreamsError> {
        if self.finalized {
            return Err(StreamsError::TopologyFinalized);
        }
        Ok(())
    }
}
