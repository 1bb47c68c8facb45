use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::model::collection::CollectionDefinition;
use crate::model::ids::RecordId;
use crate::model::value::PropertyValue;

/// Property name to value mapping of a record.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A record stored in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Assigned by the service; `None` until the record is created.
    pub id: Option<RecordId>,
    pub collection: String,
    pub properties: Properties,
    /// Embedding computed by the service, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

impl Record {
    #[must_use]
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            id: None,
            collection: collection.into(),
            properties: Properties::new(),
            vector: None,
        }
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

/// A record returned by a similarity search together with its distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub record: Record,
    /// Service-reported distance; lower is more similar.
    pub distance: f32,
}

/// Check every property against the collection's declared types and apply
/// the allowed coercions.
///
/// # Errors
/// Returns [`Error::UnknownProperty`] for undeclared names and
/// [`Error::TypeMismatch`] for values that do not fit their declared type,
/// and [`Error::InvalidData`] for NaN or infinite numbers.
pub fn conform_properties(
    definition: &CollectionDefinition,
    properties: Properties,
) -> Result<Properties> {
    properties
        .into_iter()
        .map(|(name, value)| {
            let declared = &definition.require_property(&name)?.data_type;
            let value = value.coerce_to(&name, declared)?;
            if let PropertyValue::Number(n) = value {
                if !n.is_finite() {
                    return Err(Error::InvalidData(format!(
                        "property {name} is not a finite number"
                    )));
                }
            }
            Ok((name, value))
        })
        .collect()
}

/// Encode properties for a request body.
pub fn properties_to_json(properties: &Properties) -> Value {
    Value::Object(
        properties
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect(),
    )
}

/// Decode the property object of a service response.
///
/// Keys that are not declared on the collection (including the service's
/// `_additional` block) are ignored, as are `null` values.
///
/// # Errors
/// Returns [`Error::InvalidData`] when a declared property has the wrong
/// JSON shape.
pub fn decode_properties(
    definition: &CollectionDefinition,
    object: &Map<String, Value>,
) -> Result<Properties> {
    let mut properties = Properties::new();
    for (name, raw) in object {
        let Some(declared) = definition.property(name) else {
            continue;
        };
        if let Some(value) = PropertyValue::from_json(name, raw, &declared.data_type)? {
            properties.insert(name.clone(), value);
        }
    }
    Ok(properties)
}

/// Decode a JSON vector into `f32`s.
///
/// # Errors
/// Returns [`Error::InvalidData`] when the value is not an array of numbers.
#[allow(clippy::cast_possible_truncation)]
pub fn decode_vector(value: &Value) -> Result<Vec<f32>> {
    value
        .as_array()
        .ok_or_else(|| Error::InvalidData("vector is not an array".to_string()))?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| Error::InvalidData(format!("vector component {} is not a number", v)))
        })
        .collect()
}
