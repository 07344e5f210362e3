use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use aletheia_core::DatumSerDe;

use crate::endpoint::{EndpointTemplate, PhysicalCoordinates};
use crate::error::ConfigError;

/// Resolved endpoints and registered SerDes for one topology build.
///
/// Built once by [`ConfigBuilder::build`]; every endpoint is resolved at
/// that point and never re-resolved.
pub struct AletheiaConfig {
    endpoints: HashMap<String, PhysicalCoordinates>,
    serdes: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl AletheiaConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Look up a consumption endpoint by id. Absence is not an error here.
    pub fn consumption_endpoint(&self, endpoint_id: &str) -> Option<&PhysicalCoordinates> {
        self.endpoints.get(endpoint_id)
    }

    /// Look up a datum SerDe by id, checking it produces `T`.
    pub fn datum_serde<T: 'static>(
        &self,
        serde_id: &str,
    ) -> Result<Arc<dyn DatumSerDe<T>>, ConfigError> {
        let entry = self
            .serdes
            .get(serde_id)
            .ok_or_else(|| ConfigError::UnknownSerDe(serde_id.to_string()))?;
        entry
            .downcast_ref::<Arc<dyn DatumSerDe<T>>>()
            .cloned()
            .ok_or_else(|| ConfigError::SerDeTypeMismatch {
                serde_id: serde_id.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn endpoint_ids(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }
}

/// Collects endpoint templates, endpoint specs, and SerDes for one session.
#[derive(Default)]
pub struct ConfigBuilder {
    templates: HashMap<String, Box<dyn EndpointTemplate>>,
    endpoint_specs: Vec<(String, Value)>,
    serdes: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl ConfigBuilder {
    /// A builder with no endpoint templates registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the template used for endpoints whose `"type"` is `type_name`.
    pub fn register_endpoint_template(
        mut self,
        type_name: impl Into<String>,
        template: impl EndpointTemplate + 'static,
    ) -> Self {
        self.templates.insert(type_name.into(), Box::new(template));
        self
    }

    /// Add one endpoint spec. A later spec with the same id replaces it.
    pub fn endpoint(mut self, endpoint_id: impl Into<String>, spec: Value) -> Self {
        self.endpoint_specs.push((endpoint_id.into(), spec));
        self
    }

    /// Add every endpoint of a JSON object keyed by endpoint id.
    pub fn endpoints(mut self, specs: Map<String, Value>) -> Self {
        self.endpoint_specs.extend(specs);
        self
    }

    /// Same as [`ConfigBuilder::endpoints`], parsing the object from text.
    pub fn endpoints_json(self, json: &str) -> Result<Self, ConfigError> {
        let specs: Map<String, Value> = serde_json::from_str(json)?;
        Ok(self.endpoints(specs))
    }

    /// Register a datum SerDe under `serde_id`.
    pub fn datum_serde<T: 'static>(
        mut self,
        serde_id: impl Into<String>,
        serde: Arc<dyn DatumSerDe<T>>,
    ) -> Self {
        self.serdes.insert(serde_id.into(), Arc::new(serde));
        self
    }

    /// Resolve every endpoint through its template.
    ///
    /// Resolution is eager: a single spec with a missing or unregistered
    /// `"type"`, or one its template rejects, fails the whole build even if
    /// no stream ever consumes from it.
    pub fn build(self) -> Result<AletheiaConfig, ConfigError> {
        let mut endpoints = HashMap::with_capacity(self.endpoint_specs.len());

        for (endpoint_id, spec) in self.endpoint_specs {
            let type_name = spec
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| ConfigError::MissingEndpointType(endpoint_id.clone()))?;
            let template = self.templates.get(type_name).ok_or_else(|| {
                ConfigError::UnknownEndpointTemplate {
                    endpoint_id: endpoint_id.clone(),
                    template: type_name.to_string(),
                }
            })?;
            let coordinates = template.resolve(&endpoint_id, &spec)?;
            endpoints.insert(endpoint_id, coordinates);
        }

        Ok(AletheiaConfig {
            endpoints,
            serdes: self.serdes,
        })
    }
}
