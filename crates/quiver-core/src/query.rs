//! Typed query documents.
//!
//! [`FilteredQuery`] and [`SimilarityQuery`] describe the two `Get` shapes the
//! client issues; [`count_document`] builds the `Aggregate` count. A query is
//! turned into a document with `prepare`, which validates every name, path
//! and value against the collection definition first. The decoders at the
//! bottom of the module read the matching result trees back into records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::filter::{float_literal, string_literal, FilterExpression};
use crate::model::collection::{CollectionDefinition, DataType};
use crate::model::ids::RecordId;
use crate::model::record::{decode_properties, decode_vector, Record, ScoredRecord};
use crate::naming::validate_collection_name;

/// Direction of a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(Error::InvalidQuery(format!(
                "sort order must be asc or desc, got {}",
                other
            ))),
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub property: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(property: impl Into<String>, order: SortOrder) -> Self {
        Self {
            property: property.into(),
            order,
        }
    }
}

impl FromStr for SortSpec {
    type Err = Error;

    /// Parse `property` or `property:asc|desc`; the order defaults to `asc`.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((property, order)) => Ok(Self::new(property, order.parse()?)),
            None => Ok(Self::new(s, SortOrder::Asc)),
        }
    }
}

/// Retrieval by filter, sort and limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredQuery {
    pub collection: String,
    pub filter: Option<FilterExpression>,
    pub sort: Vec<SortSpec>,
    pub limit: Option<usize>,
    /// Properties to return; empty means every declared scalar property.
    pub properties: Vec<String>,
}

impl FilteredQuery {
    #[must_use]
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: None,
            sort: Vec::new(),
            limit: None,
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: FilterExpression) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn sort_by(mut self, property: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push(SortSpec::new(property, order));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn select<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Validate against `definition` and build the query document.
    ///
    /// # Errors
    /// Returns an error for an unknown collection name, undeclared filter or
    /// sort paths, mistyped filter values, or a zero limit.
    pub fn prepare(&self, definition: &CollectionDefinition) -> Result<String> {
        check_collection(&self.collection, definition)?;

        let mut args = Vec::new();
        if let Some(filter) = &self.filter {
            args.push(format!("where: {}", filter.resolve(definition)?.to_graphql()));
        }
        if !self.sort.is_empty() {
            let keys = self
                .sort
                .iter()
                .map(|spec| {
                    definition.require_property(&spec.property)?;
                    Ok(format!(
                        "{{path: [{}], order: {}}}",
                        string_literal(&spec.property),
                        spec.order.as_str()
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            args.push(format!("sort: [{}]", keys.join(", ")));
        }
        if let Some(limit) = self.limit {
            args.push(format!("limit: {}", check_limit(limit)?));
        }

        let fields = selection(definition, &self.properties)?;
        Ok(get_document(&self.collection, &args, &fields, &["id"]))
    }
}

/// What a similarity search is anchored on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NearTarget {
    /// Free-text concepts, vectorized by the service.
    Concepts(Vec<String>),
    /// A precomputed reference vector.
    Vector(Vec<f32>),
}

/// Nearest-neighbour search, optionally combined with a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityQuery {
    pub collection: String,
    pub target: NearTarget,
    /// Results farther than this are excluded by the service.
    pub max_distance: Option<f32>,
    pub limit: Option<usize>,
    pub filter: Option<FilterExpression>,
    pub properties: Vec<String>,
}

impl SimilarityQuery {
    /// Search by concept strings.
    #[must_use]
    pub fn concepts<I, S>(collection: impl Into<String>, concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            collection,
            NearTarget::Concepts(concepts.into_iter().map(Into::into).collect()),
        )
    }

    /// Search by a reference vector.
    #[must_use]
    pub fn vector(collection: impl Into<String>, vector: Vec<f32>) -> Self {
        Self::new(collection, NearTarget::Vector(vector))
    }

    fn new(collection: impl Into<String>, target: NearTarget) -> Self {
        Self {
            collection: collection.into(),
            target,
            max_distance: None,
            limit: None,
            filter: None,
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn max_distance(mut self, distance: f32) -> Self {
        self.max_distance = Some(distance);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: FilterExpression) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn select<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Validate against `definition` and build the query document.
    ///
    /// # Errors
    /// Returns an error for an unknown collection name, an empty concept
    /// list or vector, a negative or non-finite distance, a zero limit, or
    /// an invalid filter.
    pub fn prepare(&self, definition: &CollectionDefinition) -> Result<String> {
        check_collection(&self.collection, definition)?;

        let distance = match self.max_distance {
            Some(d) if !d.is_finite() || d < 0.0 => {
                return Err(Error::InvalidQuery(format!(
                    "max distance must be a non-negative number, got {}",
                    d
                )))
            }
            Some(d) => format!(", distance: {}", float_literal(d)),
            None => String::new(),
        };

        let near = match &self.target {
            NearTarget::Concepts(concepts) => {
                if concepts.is_empty() || concepts.iter().all(|c| c.trim().is_empty()) {
                    return Err(Error::InvalidQuery("no concepts given".to_string()));
                }
                let list: Vec<String> = concepts.iter().map(|c| string_literal(c)).collect();
                format!("nearText: {{concepts: [{}]{}}}", list.join(", "), distance)
            }
            NearTarget::Vector(vector) => {
                if vector.is_empty() {
                    return Err(Error::InvalidQuery("reference vector is empty".to_string()));
                }
                if vector.iter().any(|x| !x.is_finite()) {
                    return Err(Error::InvalidQuery(
                        "reference vector has non-finite components".to_string(),
                    ));
                }
                let list: Vec<String> = vector
                    .iter()
                    .map(|x| float_literal(*x))
                    .collect();
                format!("nearVector: {{vector: [{}]{}}}", list.join(", "), distance)
            }
        };

        let mut args = Vec::new();
        if let Some(filter) = &self.filter {
            args.push(format!("where: {}", filter.resolve(definition)?.to_graphql()));
        }
        args.push(near);
        if let Some(limit) = self.limit {
            args.push(format!("limit: {}", check_limit(limit)?));
        }

        let fields = selection(definition, &self.properties)?;
        Ok(get_document(
            &self.collection,
            &args,
            &fields,
            &["id", "distance"],
        ))
    }
}

impl fmt::Display for NearTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concepts(concepts) => write!(f, "concepts {:?}", concepts),
            Self::Vector(vector) => write!(f, "vector of {} dimensions", vector.len()),
        }
    }
}

/// Build the `Aggregate` document that counts a collection's records.
///
/// # Errors
/// Returns an error when `collection` is not a valid collection name.
pub fn count_document(collection: &str) -> Result<String> {
    validate_collection_name(collection)?;
    Ok(format!(
        "{{ Aggregate {{ {} {{ meta {{ count }} }} }} }}",
        collection
    ))
}

// ---------------------------------------------------------------------------
// Result decoding
// ---------------------------------------------------------------------------

/// Read the count out of an `Aggregate` result.
///
/// # Errors
/// Returns [`Error::InvalidData`] when the result tree has no count.
pub fn decode_count(data: &Value, collection: &str) -> Result<u64> {
    data.get("Aggregate")
        .and_then(|a| a.get(collection))
        .and_then(|groups| groups.get(0))
        .and_then(|group| group.pointer("/meta/count"))
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            Error::InvalidData(format!("aggregate result has no count for {}", collection))
        })
}

/// Read the records out of a `Get` result.
///
/// # Errors
/// Returns [`Error::InvalidData`] when the tree is malformed.
pub fn decode_records(data: &Value, definition: &CollectionDefinition) -> Result<Vec<Record>> {
    get_objects(data, &definition.name)?
        .iter()
        .map(|object| decode_object(object, definition))
        .collect()
}

/// Read records and distances out of a similarity `Get` result.
///
/// # Errors
/// Returns [`Error::InvalidData`] when the tree is malformed or an item has
/// no distance.
#[allow(clippy::cast_possible_truncation)]
pub fn decode_scored_records(
    data: &Value,
    definition: &CollectionDefinition,
) -> Result<Vec<ScoredRecord>> {
    get_objects(data, &definition.name)?
        .iter()
        .map(|object| {
            let distance = object
                .pointer("/_additional/distance")
                .and_then(Value::as_f64)
                .ok_or_else(|| Error::InvalidData("result item has no distance".to_string()))?;
            Ok(ScoredRecord {
                record: decode_object(object, definition)?,
                distance: distance as f32,
            })
        })
        .collect()
}

fn get_objects<'a>(data: &'a Value, collection: &str) -> Result<&'a [Value]> {
    match data.get("Get").and_then(|g| g.get(collection)) {
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(Value::Null) => Ok(&[]),
        _ => Err(Error::InvalidData(format!(
            "query result has no Get.{} list",
            collection
        ))),
    }
}

fn decode_object(object: &Value, definition: &CollectionDefinition) -> Result<Record> {
    let map = object
        .as_object()
        .ok_or_else(|| Error::InvalidData("result item is not an object".to_string()))?;

    let id = object
        .pointer("/_additional/id")
        .and_then(Value::as_str)
        .map(|s| {
            s.parse::<RecordId>()
                .map_err(|e| Error::InvalidData(format!("invalid record id {}: {}", s, e)))
        })
        .transpose()?;

    let vector = object
        .pointer("/_additional/vector")
        .filter(|v| !v.is_null())
        .map(decode_vector)
        .transpose()?;

    Ok(Record {
        id,
        collection: definition.name.clone(),
        properties: decode_properties(definition, map)?,
        vector,
    })
}

// ---------------------------------------------------------------------------
// Document assembly
// ---------------------------------------------------------------------------

fn check_collection(collection: &str, definition: &CollectionDefinition) -> Result<()> {
    validate_collection_name(collection)?;
    if collection != definition.name {
        return Err(Error::InvalidQuery(format!(
            "query targets {} but was prepared against {}",
            collection, definition.name
        )));
    }
    Ok(())
}

fn check_limit(limit: usize) -> Result<usize> {
    if limit == 0 {
        return Err(Error::InvalidQuery("limit must be at least 1".to_string()));
    }
    Ok(limit)
}

fn selection(definition: &CollectionDefinition, requested: &[String]) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(definition
            .properties
            .iter()
            .filter(|p| !matches!(p.data_type, DataType::Other(_)))
            .map(|p| p.name.clone())
            .collect());
    }

    requested
        .iter()
        .map(|name| {
            let property = definition.require_property(name)?;
            if let DataType::Other(kind) = &property.data_type {
                return Err(Error::InvalidQuery(format!(
                    "property {} has unsupported type {}",
                    name, kind
                )));
            }
            Ok(property.name.clone())
        })
        .collect()
}

fn get_document(collection: &str, args: &[String], fields: &[String], additional: &[&str]) -> String {
    let args = if args.is_empty() {
        String::new()
    } else {
        format!("({})", args.join(", "))
    };
    let mut selection = fields.join(" ");
    if !selection.is_empty() {
        selection.push(' ');
    }
    format!(
        "{{ Get {{ {}{} {{ {}_additional {{ {} }} }} }} }}",
        collection,
        args,
        selection,
        additional.join(" ")
    )
}
