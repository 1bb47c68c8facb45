use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::collection::DataType;

/// A typed property value on a record or inside a filter condition.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Int(i64),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
}

impl PropertyValue {
    /// Short name of the value's kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Int(_) => "int",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::Date(_) => "date",
        }
    }

    /// The data type this value carries without coercion.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Text(_) => DataType::Text,
            Self::Int(_) => DataType::Int,
            Self::Number(_) => DataType::Number,
            Self::Boolean(_) => DataType::Boolean,
            Self::Date(_) => DataType::Date,
        }
    }

    /// Convert the value into the declared type of `property`.
    ///
    /// Integers widen to numbers and RFC 3339 text parses into dates; every
    /// other pairing must match exactly.
    ///
    /// # Errors
    /// Returns [`Error::TypeMismatch`] when no coercion applies.
    #[allow(clippy::cast_precision_loss)]
    pub fn coerce_to(self, property: &str, declared: &DataType) -> Result<Self> {
        let mismatch = |found: &'static str| Error::TypeMismatch {
            property: property.to_string(),
            expected: declared.to_string(),
            found,
        };

        match (self, declared) {
            (v @ Self::Text(_), DataType::Text)
            | (v @ Self::Int(_), DataType::Int)
            | (v @ Self::Number(_), DataType::Number)
            | (v @ Self::Boolean(_), DataType::Boolean)
            | (v @ Self::Date(_), DataType::Date) => Ok(v),
            (Self::Int(i), DataType::Number) => Ok(Self::Number(i as f64)),
            (Self::Text(s), DataType::Date) => parse_date(&s).ok_or(mismatch("text")),
            (other, _) => Err(mismatch(other.kind())),
        }
    }

    /// Decode a JSON value returned by the service according to the declared
    /// property type.
    ///
    /// Returns `Ok(None)` for JSON `null` and for types the client does not
    /// model (cross references and arrays).
    ///
    /// # Errors
    /// Returns [`Error::InvalidData`] when the JSON shape does not fit the
    /// declared type.
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    pub fn from_json(property: &str, value: &Value, declared: &DataType) -> Result<Option<Self>> {
        if value.is_null() {
            return Ok(None);
        }

        let decoded = match declared {
            DataType::Text => value.as_str().map(|s| Self::Text(s.to_string())),
            DataType::Int => value.as_i64().map(Self::Int).or_else(|| {
                value
                    .as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| Self::Int(f as i64))
            }),
            DataType::Number => value.as_f64().map(Self::Number),
            DataType::Boolean => value.as_bool().map(Self::Boolean),
            DataType::Date => value.as_str().and_then(parse_date),
            DataType::Other(_) => return Ok(None),
        };

        decoded.map(Some).ok_or_else(|| {
            Error::InvalidData(format!(
                "property {} declared as {} but service returned {}",
                property, declared, value
            ))
        })
    }

    /// Encode the value for a request body.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Int(i) => Value::from(*i),
            Self::Number(n) => Value::from(*n),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Date(d) => Value::String(format_date(d)),
        }
    }
}

/// Parse an RFC 3339 timestamp into UTC.
pub(crate) fn parse_date(s: &str) -> Option<PropertyValue> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| PropertyValue::Date(d.with_timezone(&Utc)))
}

/// Format a date the way the service expects it.
pub(crate) fn format_date(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Number(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Date(d) => write!(f, "{}", format_date(d)),
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Boolean(bool),
            Int(i64),
            Number(f64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Boolean(b) => Self::Boolean(b),
            Raw::Int(i) => Self::Int(i),
            Raw::Number(n) => Self::Number(n),
            Raw::Text(s) => Self::Text(s),
        })
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}
