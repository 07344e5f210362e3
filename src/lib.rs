pub mod config;
pub mod inspect;
pub mod plan;

pub use config::{Config, ConfigError};
pub use inspect::{inspect_file, EnvelopeSummary, InspectError};
pub use plan::{PlanError, PlannedSource, TopologyPlan, ValidatedTopology};
