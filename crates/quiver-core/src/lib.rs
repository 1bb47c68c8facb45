//! Core data model for quiver.
//!
//! This crate defines collection and property definitions, typed record
//! values, filter expressions, and the builder that turns typed queries into
//! documents for the service's query endpoint. Nothing here touches the
//! network.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod filter;
pub mod model;
pub mod naming;
pub mod query;

pub use error::{Error, Result};
pub use filter::{Condition, FilterExpression, Operator};
pub use model::{
    CollectionDefinition, DataType, Properties, PropertyDefinition, PropertyValue, Record,
    RecordId, ScoredRecord, VectorizerConfig,
};
pub use query::{FilteredQuery, NearTarget, SimilarityQuery, SortOrder, SortSpec};
