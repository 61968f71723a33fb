use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where the access and refresh tokens live between runs.
/// We differentiate the backends via a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum StoreConfig {
    /// Tokens are kept in process memory and lost on exit.
    #[serde(rename = "memory")]
    Memory,
    /// Tokens are written through to a JSON file.
    #[serde(rename = "file")]
    File(FileStoreConfig),
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq, Eq)]
pub struct FileStoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File(FileStoreConfig {
            path: "./.taskdesk-tokens.json".to_string(),
        })
    }
}
