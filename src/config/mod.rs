//! Settings loaded from `config.yaml` and the registry built from them.

mod registry;
mod settings;

pub use registry::{ChainConfig, ChainRegistry};
pub use settings::{ChainSettings, DeploymentSettings, LoggingSettings, ReplaySettings, Settings};

#[cfg(test)]
pub(crate) use settings::TEST_SETTINGS;
