//! Filter expressions.
//!
//! A [`FilterExpression`] is a tree of typed [`Condition`]s combined with
//! AND, OR and NOT. Before it is sent, a filter is resolved against the
//! collection definition: every path must name a declared property, every
//! value is coerced to the declared type, and every operator must make sense
//! for that type. Only a resolved filter is rendered into a query document.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::collection::{CollectionDefinition, DataType};
use crate::model::value::{format_date, PropertyValue};

/// Comparison operator of a filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    /// Pattern match; `*` matches any run of characters, `?` a single one.
    Like,
}

impl Operator {
    /// The operator name in the query language.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "Equal",
            Self::NotEqual => "NotEqual",
            Self::GreaterThan => "GreaterThan",
            Self::GreaterThanEqual => "GreaterThanEqual",
            Self::LessThan => "LessThan",
            Self::LessThanEqual => "LessThanEqual",
            Self::Like => "Like",
        }
    }

    fn supports(self, data_type: &DataType) -> bool {
        match self {
            Self::Equal | Self::NotEqual => !matches!(data_type, DataType::Other(_)),
            Self::GreaterThan | Self::GreaterThanEqual | Self::LessThan | Self::LessThanEqual => {
                matches!(data_type, DataType::Int | DataType::Number | DataType::Date)
            }
            Self::Like => *data_type == DataType::Text,
        }
    }
}

/// A single comparison of a property against a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub path: String,
    pub operator: Operator,
    pub value: PropertyValue,
}

/// A boolean combination of conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpression {
    Condition(Condition),
    And(Vec<FilterExpression>),
    Or(Vec<FilterExpression>),
    Not(Box<FilterExpression>),
}

impl FilterExpression {
    pub fn condition(
        path: impl Into<String>,
        operator: Operator,
        value: impl Into<PropertyValue>,
    ) -> Self {
        Self::Condition(Condition {
            path: path.into(),
            operator,
            value: value.into(),
        })
    }

    pub fn equal(path: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::condition(path, Operator::Equal, value)
    }

    pub fn not_equal(path: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::condition(path, Operator::NotEqual, value)
    }

    pub fn greater_than(path: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::condition(path, Operator::GreaterThan, value)
    }

    pub fn greater_than_equal(path: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::condition(path, Operator::GreaterThanEqual, value)
    }

    pub fn less_than(path: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::condition(path, Operator::LessThan, value)
    }

    pub fn less_than_equal(path: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::condition(path, Operator::LessThanEqual, value)
    }

    pub fn like(path: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::condition(path, Operator::Like, PropertyValue::Text(pattern.into()))
    }

    pub fn and(operands: impl IntoIterator<Item = FilterExpression>) -> Self {
        Self::And(operands.into_iter().collect())
    }

    pub fn or(operands: impl IntoIterator<Item = FilterExpression>) -> Self {
        Self::Or(operands.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: FilterExpression) -> Self {
        Self::Not(Box::new(operand))
    }

    /// Validate the filter against a collection and coerce every value to
    /// its property's declared type.
    ///
    /// # Errors
    /// Returns [`Error::UnknownProperty`] for undeclared paths,
    /// [`Error::TypeMismatch`] for values of the wrong type, and
    /// [`Error::InvalidFilter`] for unsupported operators, non-finite numbers
    /// or empty AND/OR groups.
    pub fn resolve(&self, definition: &CollectionDefinition) -> Result<Self> {
        match self {
            Self::Condition(condition) => {
                let declared = &definition.require_property(&condition.path)?.data_type;
                if !condition.operator.supports(declared) {
                    return Err(Error::InvalidFilter(format!(
                        "operator {} cannot be applied to {} property {}",
                        condition.operator.as_str(),
                        declared,
                        condition.path
                    )));
                }
                let value = condition.value.clone().coerce_to(&condition.path, declared)?;
                if let PropertyValue::Number(n) = value {
                    if !n.is_finite() {
                        return Err(Error::InvalidFilter(format!(
                            "non-finite number in condition on {}",
                            condition.path
                        )));
                    }
                }
                Ok(Self::Condition(Condition {
                    path: condition.path.clone(),
                    operator: condition.operator,
                    value,
                }))
            }
            Self::And(operands) => Ok(Self::And(resolve_group("And", operands, definition)?)),
            Self::Or(operands) => Ok(Self::Or(resolve_group("Or", operands, definition)?)),
            Self::Not(operand) => Ok(Self::Not(Box::new(operand.resolve(definition)?))),
        }
    }

    /// Render the `where` argument of a query document.
    ///
    /// Call this on a filter returned by [`resolve`](Self::resolve); paths
    /// are emitted as given.
    pub fn to_graphql(&self) -> String {
        match self {
            Self::Condition(condition) => {
                let (key, literal) = value_literal(&condition.value);
                format!(
                    "{{path: [{}], operator: {}, {}: {}}}",
                    string_literal(&condition.path),
                    condition.operator.as_str(),
                    key,
                    literal
                )
            }
            Self::And(operands) => group_graphql("And", operands),
            Self::Or(operands) => group_graphql("Or", operands),
            Self::Not(operand) => format!("{{operator: Not, operands: [{}]}}", operand.to_graphql()),
        }
    }
}

fn resolve_group(
    name: &str,
    operands: &[FilterExpression],
    definition: &CollectionDefinition,
) -> Result<Vec<FilterExpression>> {
    if operands.is_empty() {
        return Err(Error::InvalidFilter(format!("{} group has no operands", name)));
    }
    operands.iter().map(|op| op.resolve(definition)).collect()
}

fn group_graphql(operator: &str, operands: &[FilterExpression]) -> String {
    let rendered: Vec<String> = operands.iter().map(FilterExpression::to_graphql).collect();
    format!(
        "{{operator: {}, operands: [{}]}}",
        operator,
        rendered.join(", ")
    )
}

/// Quote a string as a query-language literal.
///
/// JSON string escaping is a valid subset of the query language's string
/// syntax, so quotes, backslashes and control characters cannot break out.
pub(crate) fn string_literal(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

fn value_literal(value: &PropertyValue) -> (&'static str, String) {
    match value {
        PropertyValue::Text(s) => ("valueText", string_literal(s)),
        PropertyValue::Int(i) => ("valueInt", i.to_string()),
        PropertyValue::Number(n) => ("valueNumber", number_literal(*n)),
        PropertyValue::Boolean(b) => ("valueBoolean", b.to_string()),
        PropertyValue::Date(d) => ("valueDate", string_literal(&format_date(d))),
    }
}

fn number_literal(n: f64) -> String {
    serde_json::to_string(&n).unwrap_or_else(|_| "0".to_string())
}

/// Render an `f32` with its shortest round-tripping representation.
pub(crate) fn float_literal(x: f32) -> String {
    serde_json::to_string(&x).unwrap_or_else(|_| "0".to_string())
}
