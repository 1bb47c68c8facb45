//! Server metadata and readiness.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Information the service reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMeta {
    pub version: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub grpc_max_message_size: Option<u64>,
    /// Enabled modules by name.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub modules: BTreeMap<String, ModuleInfo>,
}

/// Details of one enabled module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub documentation_href: Option<String>,
}

impl ServerMeta {
    /// Whether the named module is enabled on the service.
    pub fn has_module(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, ModuleInfo>, D::Error> {
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}
