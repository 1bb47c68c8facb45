//! Collection and property definitions.
//!
//! A [`CollectionDefinition`] is the client-side view of a service class. It
//! converts to and from the service's class JSON, where the vectorizer is a
//! module name plus a `moduleConfig` block and each property carries its own
//! per-module `skip` flag.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::naming::{validate_collection_name, validate_property_name};

/// Vectorizer value the service uses for "no vectorization".
const NO_VECTORIZER: &str = "none";

/// Declared type of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Text,
    Int,
    Number,
    Boolean,
    Date,
    /// A service type the client does not model (cross references, arrays).
    Other(String),
}

impl DataType {
    /// The type name used on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Int => "int",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Other(name) => name,
        }
    }

    /// Parse a wire type name. `string` is the service's legacy text type.
    pub fn from_wire(name: &str) -> Self {
        match name {
            "text" | "string" => Self::Text,
            "int" => Self::Int,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&name))
    }
}

/// The embedding backend the service uses for a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Service module name (e.g. `text2vec-ollama`).
    pub module: String,
    /// Embedding model identifier (e.g. `bge-m3`).
    pub model: String,
    /// Endpoint of the embedding backend.
    pub endpoint: String,
}

impl VectorizerConfig {
    #[must_use]
    pub fn new(
        module: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            model: model.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// A single typed property of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    pub data_type: DataType,
    /// Whether the property's value feeds the collection's vector.
    pub vectorize: bool,
    pub description: Option<String>,
}

impl PropertyDefinition {
    /// Create a property. Text properties are vectorized by default.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let vectorize = data_type == DataType::Text;
        Self {
            name: name.into(),
            data_type,
            vectorize,
            description: None,
        }
    }

    #[must_use]
    pub fn vectorized(mut self, vectorize: bool) -> Self {
        self.vectorize = vectorize;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A named, typed collection of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDefinition {
    pub name: String,
    pub description: Option<String>,
    /// `None` means records carry no service-computed vector.
    pub vectorizer: Option<VectorizerConfig>,
    pub properties: Vec<PropertyDefinition>,
}

impl CollectionDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            vectorizer: None,
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_vectorizer(mut self, vectorizer: VectorizerConfig) -> Self {
        self.vectorizer = Some(vectorizer);
        self
    }

    #[must_use]
    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    /// Look up a declared property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Look up a declared property, failing with [`Error::UnknownProperty`].
    ///
    /// # Errors
    /// Returns an error when `name` is not declared on this collection.
    pub fn require_property(&self, name: &str) -> Result<&PropertyDefinition> {
        self.property(name).ok_or_else(|| Error::UnknownProperty {
            collection: self.name.clone(),
            property: name.to_string(),
        })
    }

    /// Check names and reject duplicate properties.
    ///
    /// # Errors
    /// Returns an error for an invalid collection or property name, or when
    /// two properties share a name.
    pub fn validate(&self) -> Result<()> {
        validate_collection_name(&self.name)?;

        let mut seen = HashSet::new();
        for property in &self.properties {
            validate_property_name(&property.name)?;
            if !seen.insert(property.name.as_str()) {
                return Err(Error::InvalidData(format!(
                    "property {} declared twice on {}",
                    property.name, self.name
                )));
            }
        }

        if let Some(vectorizer) = &self.vectorizer {
            if vectorizer.module.is_empty() || vectorizer.module == NO_VECTORIZER {
                return Err(Error::InvalidData(format!(
                    "collection {} names an empty vectorizer module",
                    self.name
                )));
            }
        }

        Ok(())
    }

    /// Encode as the service's class JSON.
    pub fn to_wire(&self) -> Value {
        let module = self.vectorizer.as_ref().map(|v| v.module.as_str());

        let properties = self
            .properties
            .iter()
            .map(|p| WireProperty {
                name: p.name.clone(),
                data_type: vec![p.data_type.as_str().to_string()],
                description: p.description.clone(),
                module_config: module.map(|m| {
                    let mut config = BTreeMap::new();
                    config.insert(
                        m.to_string(),
                        json!({ "skip": !p.vectorize, "vectorizePropertyName": false }),
                    );
                    config
                }),
            })
            .collect();

        let wire = WireClass {
            class: self.name.clone(),
            description: self.description.clone(),
            vectorizer: Some(module.unwrap_or(NO_VECTORIZER).to_string()),
            module_config: self.vectorizer.as_ref().map(|v| {
                let mut config = BTreeMap::new();
                config.insert(
                    v.module.clone(),
                    json!({ "model": v.model, "apiEndpoint": v.endpoint }),
                );
                config
            }),
            properties,
        };

        // Plain structs of strings and JSON values always serialize.
        serde_json::to_value(wire).unwrap_or(Value::Null)
    }

    /// Decode the service's class JSON.
    ///
    /// # Errors
    /// Returns an error when the JSON is not a class object or a property
    /// has no data type.
    pub fn from_wire(value: Value) -> Result<Self> {
        let wire: WireClass = serde_json::from_value(value)?;

        let vectorizer = wire
            .vectorizer
            .filter(|m| !m.is_empty() && m != NO_VECTORIZER)
            .map(|module| {
                let settings = wire
                    .module_config
                    .as_ref()
                    .and_then(|c| c.get(&module))
                    .and_then(Value::as_object);
                VectorizerConfig {
                    model: string_setting(settings, "model"),
                    endpoint: string_setting(settings, "apiEndpoint"),
                    module,
                }
            });

        let properties = wire
            .properties
            .into_iter()
            .map(|p| {
                let type_name = p.data_type.first().ok_or_else(|| {
                    Error::InvalidData(format!("property {} has no data type", p.name))
                })?;
                let data_type = DataType::from_wire(type_name);
                let vectorize = match &vectorizer {
                    Some(v) => !p
                        .module_config
                        .as_ref()
                        .and_then(|c| c.get(&v.module))
                        .and_then(|s| s.get("skip"))
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                    None => false,
                };
                Ok(PropertyDefinition {
                    name: p.name,
                    data_type,
                    vectorize,
                    description: p.description,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: wire.class,
            description: wire.description,
            vectorizer,
            properties,
        })
    }
}

fn string_setting(settings: Option<&Map<String, Value>>, key: &str) -> String {
    settings
        .and_then(|s| s.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireClass {
    class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    vectorizer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    module_config: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    properties: Vec<WireProperty>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireProperty {
    name: String,
    #[serde(default)]
    data_type: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    module_config: Option<BTreeMap<String, Value>>,
}
