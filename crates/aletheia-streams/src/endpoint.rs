use std::collections::BTreeSet;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ConfigError;

/// Broker addresses of one cluster.
///
/// Kept as a sorted set so that two endpoints listing the same brokers in a
/// different order identify the same cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BrokerGroup(BTreeSet<String>);

impl BrokerGroup {
    pub fn new<I, S>(addresses: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for address in addresses {
            let address = address.as_ref().trim();
            if address.is_empty() || address.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidBrokers(address.to_string()));
            }
            set.insert(address.to_string());
        }
        if set.is_empty() {
            return Err(ConfigError::InvalidBrokers(String::new()));
        }
        Ok(Self(set))
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for BrokerGroup {
    type Err = ConfigError;

    /// Parse a comma-separated broker list, e.g. `"b1:9092, b1:9093"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::InvalidBrokers(s.to_string()));
        }
        Self::new(parts)
    }
}

impl std::fmt::Display for BrokerGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined: Vec<&str> = self.addresses().collect();
        write!(f, "{}", joined.join(","))
    }
}

/// Where a logical endpoint physically lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalCoordinates {
    pub brokers: BrokerGroup,
    pub topic_name: String,
}

impl PhysicalCoordinates {
    pub fn new(brokers: BrokerGroup, topic_name: impl Into<String>) -> Self {
        Self {
            brokers,
            topic_name: topic_name.into(),
        }
    }
}

/// Turns the JSON description of an endpoint into physical coordinates.
///
/// One template is registered per endpoint `"type"` on a
/// [`ConfigBuilder`](crate::config::ConfigBuilder).
pub trait EndpointTemplate: Send + Sync {
    fn resolve(&self, endpoint_id: &str, spec: &Value)
        -> Result<PhysicalCoordinates, ConfigError>;
}

/// Type name of the built-in Kafka topic template.
pub const KAFKA_TOPIC_TEMPLATE: &str = "kafka";

/// Kafka topic endpoint: `{"type": "kafka", "topic.name": ..., "brokers": ...}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KafkaTopicEndpointTemplate;

#[derive(Deserialize)]
struct KafkaTopicSpec {
    #[serde(rename = "topic.name")]
    topic_name: String,
    brokers: String,
}

impl EndpointTemplate for KafkaTopicEndpointTemplate {
    fn resolve(
        &self,
        endpoint_id: &str,
        spec: &Value,
    ) -> Result<PhysicalCoordinates, ConfigError> {
        let spec = KafkaTopicSpec::deserialize(spec).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint_id: endpoint_id.to_string(),
            reason: e.to_string(),
        })?;
        if spec.topic_name.trim().is_empty() {
            return Err(ConfigError::InvalidEndpoint {
                endpoint_id: endpoint_id.to_string(),
                reason: "topic.name is empty".to_string(),
            });
        }
        Ok(PhysicalCoordinates::new(
            spec.brokers.parse()?,
            spec.topic_name,
        ))
    }
}
