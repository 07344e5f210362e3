//! Aletheia Streams - Endpoint resolution and single-cluster topology sessions.

pub mod cluster;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod topology;

pub use cluster::ClusterIdentitySet;
pub use config::{AletheiaConfig, ConfigBuilder};
pub use endpoint::{
    BrokerGroup, EndpointTemplate, KafkaTopicEndpointTemplate, PhysicalCoordinates,
    KAFKA_TOPIC_TEMPLATE,
};
pub use error::{ConfigError, StreamsError};
pub use topology::{
    AletheiaStreams, EffectiveConfig, EnvelopeStreamHandle, SourceDescriptor, SourceKind,
    StreamHandle, BOOTSTRAP_SERVERS_CONFIG,
};
