use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use aletheia_streams::{AletheiaStreams, BrokerGroup, ConfigError, EffectiveConfig, StreamsError};

/// A topology described as JSON: application properties, endpoint specs,
/// and the endpoints to consume.
///
/// ```json
/// {
///   "properties": {"application.id": "billing"},
///   "endpoints": {
///     "orders": {"type": "kafka", "topic.name": "orders", "brokers": "b1:9092"}
///   },
///   "streams": ["orders"]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TopologyPlan {
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    pub endpoints: Map<String, Value>,
    #[serde(default)]
    pub streams: Vec<String>,
}

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid topology plan: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Streams(#[from] StreamsError),
}

/// A stream accepted by the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedSource {
    pub endpoint_id: String,
    pub topic_name: String,
    pub brokers: String,
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedTopology {
    pub sources: Vec<PlannedSource>,
    pub effective_config: EffectiveConfig,
}

impl TopologyPlan {
    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let json = std::fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Register every planned stream as an envelope stream and finalize.
    pub fn validate(
        &self,
        broker_override: Option<&BrokerGroup>,
    ) -> Result<ValidatedTopology, PlanError> {
        let config = AletheiaStreams::config_builder()
            .endpoints(self.endpoints.clone())
            .build()?;
        let mut session = AletheiaStreams::new(self.properties.clone());

        let mut sources = Vec::with_capacity(self.streams.len());
        for endpoint_id in &self.streams {
            let handle = session.envelope_stream(&config, endpoint_id)?;
            sources.push(PlannedSource {
                endpoint_id: handle.endpoint_id().to_string(),
                topic_name: handle.topic_name().to_string(),
                brokers: handle.brokers().to_string(),
            });
        }

        let effective_config = session.finalize_topology(broker_override)?;
        Ok(ValidatedTopology {
            sources,
            effective_config,
        })
    }
}
