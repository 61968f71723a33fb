use std::path::Path;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::api::{ApiConfig, RefreshConfig};
use super::logging::LoggingConfig;
use super::store::StoreConfig;
use crate::error::ClientError;

/// Environment variables with this prefix override file values,
/// e.g. `TASKDESK_API__BASE_URL`.
pub const ENV_PREFIX: &str = "TASKDESK_";

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "./taskdesk.yaml";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub api: ApiConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConfigV1 {
    /// A config pointing at `base_url` with an in-memory token store.
    pub fn in_memory(base_url: impl Into<String>) -> Self {
        ConfigV1 {
            api: ApiConfig::new(base_url),
            refresh: RefreshConfig::default(),
            store: StoreConfig::Memory,
            logging: LoggingConfig::default(),
        }
    }
}

/// Load config from a YAML file, with `TASKDESK_` environment overrides on top.
pub fn load_config(path: impl AsRef<Path>) -> Result<ConfigV1, ClientError> {
    let figment = Figment::new()
        .merge(Yaml::file(path.as_ref()))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));
    extract(figment)
}

/// Parse config from an in-memory YAML document. Environment is not consulted.
pub fn load_config_str(yaml: &str) -> Result<ConfigV1, ClientError> {
    extract(Figment::new().merge(Yaml::string(yaml)))
}

fn extract(figment: Figment) -> Result<ConfigV1, ClientError> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
    // handle configuration migration between versions here when necessary
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), ClientError> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
