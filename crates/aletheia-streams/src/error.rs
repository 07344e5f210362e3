use thiserror::Error;

/// Invalid endpoint or SerDe configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Endpoint {0} has no \"type\" field")]
    MissingEndpointType(String),

    #[error("Endpoint {endpoint_id} uses unregistered template type {template}")]
    UnknownEndpointTemplate {
        endpoint_id: String,
        template: String,
    },

    #[error("Invalid endpoint {endpoint_id}: {reason}")]
    InvalidEndpoint { endpoint_id: String, reason: String },

    #[error("Invalid broker list {0:?}")]
    InvalidBrokers(String),

    #[error("Invalid endpoints document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No datum SerDe registered with id {0}")]
    UnknownSerDe(String),

    #[error("Datum SerDe {serde_id} does not produce {expected}")]
    SerDeTypeMismatch {
        serde_id: String,
        expected: &'static str,
    },
}

/// Topology construction failed.
#[derive(Error, Debug)]
pub enum StreamsError {
    #[error("Could not resolve consumption endpoint id: {0}")]
    UnresolvedEndpoint(String),

    #[error("At least one stream must be registered before finalizing the topology")]
    NoStreamsRegistered,

    #[error("All stream consumption endpoints must reside on the same cluster, found: {}", .0.join(" | "))]
    CrossClusterConfiguration(Vec<String>),

    #[error("Topology already finalized; no more streams can be registered")]
    TopologyFinalized,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
