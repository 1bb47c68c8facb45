pub mod collection;
pub mod ids;
pub mod record;
pub mod value;

pub use collection::{CollectionDefinition, DataType, PropertyDefinition, VectorizerConfig};
pub use ids::RecordId;
pub use record::{Properties, Record, ScoredRecord};
pub use value::PropertyValue;
