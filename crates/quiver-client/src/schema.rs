//! Collection lifecycle: create, list, inspect and delete.

use std::sync::Arc;

use quiver_core::naming::validate_collection_name;
use quiver_core::CollectionDefinition;
use serde_json::Value;

use crate::error::{service_message, ClientError, ClientResult};
use crate::transport::{Reply, Transport};

const SCHEMA_PATH: &str = "v1/schema";

/// Manages collection definitions on the service.
#[derive(Debug, Clone)]
pub struct SchemaManager {
    transport: Arc<dyn Transport>,
}

impl SchemaManager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Create a collection.
    ///
    /// # Errors
    /// - [`ClientError::Validation`] for invalid names, locally or from the
    ///   service
    /// - [`ClientError::DuplicateCollection`] if the name is taken
    pub async fn create_collection(&self, definition: &CollectionDefinition) -> ClientResult<()> {
        definition.validate().map_err(ClientError::validation)?;

        let reply = self.transport.post(SCHEMA_PATH, definition.to_wire()).await?;
        match reply {
            Reply::Success(_) => {
                log::info!(
                    "Created collection {} with {} properties",
                    definition.name,
                    definition.properties.len()
                );
                Ok(())
            }
            Reply::HttpError { status, body } => {
                let message = service_message(&body);
                if status == 409 || (status == 422 && is_duplicate_message(&message)) {
                    Err(ClientError::DuplicateCollection {
                        name: definition.name.clone(),
                        message,
                    })
                } else if status == 422 {
                    Err(ClientError::Validation { message })
                } else {
                    Err(ClientError::http("create collection", status, &body))
                }
            }
        }
    }

    /// List every collection known to the service.
    pub async fn list_collections(&self) -> ClientResult<Vec<CollectionDefinition>> {
        let body = match self.transport.get(SCHEMA_PATH, &[]).await? {
            Reply::Success(body) => body,
            Reply::HttpError { status, body } => {
                return Err(ClientError::http("list collections", status, &body));
            }
        };

        let classes = match body.get("classes") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(classes)) => classes.clone(),
            Some(other) => {
                return Err(ClientError::parse(
                    "list collections",
                    format!("classes is not an array: {other}"),
                ));
            }
        };

        classes
            .into_iter()
            .map(|class| {
                CollectionDefinition::from_wire(class)
                    .map_err(|e| ClientError::parse("list collections", e))
            })
            .collect()
    }

    /// Fetch one collection definition.
    ///
    /// # Errors
    /// Returns [`ClientError::NotFound`] if the collection does not exist.
    pub async fn get_collection(&self, name: &str) -> ClientResult<CollectionDefinition> {
        validate_collection_name(name).map_err(ClientError::validation)?;

        let reply = self
            .transport
            .get(&format!("{SCHEMA_PATH}/{name}"), &[])
            .await?;
        match reply {
            Reply::Success(Value::Null) | Reply::HttpError { status: 404, .. } => {
                Err(not_found(name))
            }
            Reply::Success(body) => CollectionDefinition::from_wire(body)
                .map_err(|e| ClientError::parse("get collection", e)),
            Reply::HttpError { status, body } => {
                Err(ClientError::http("get collection", status, &body))
            }
        }
    }

    /// Whether a collection with this name exists.
    pub async fn collection_exists(&self, name: &str) -> ClientResult<bool> {
        match self.get_collection(name).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete a collection and all of its records.
    ///
    /// The service acknowledges deletes of unknown names, so existence is
    /// checked first.
    ///
    /// # Errors
    /// Returns [`ClientError::NotFound`] if the collection does not exist.
    pub async fn delete_collection(&self, name: &str) -> ClientResult<()> {
        self.get_collection(name).await?;

        match self
            .transport
            .delete(&format!("{SCHEMA_PATH}/{name}"))
            .await?
        {
            Reply::Success(_) => {
                log::info!("Deleted collection {name}");
                Ok(())
            }
            Reply::HttpError { status: 404, .. } => Err(not_found(name)),
            Reply::HttpError { status, body } => {
                Err(ClientError::http("delete collection", status, &body))
            }
        }
    }

    /// Delete a collection if present. Returns whether anything was deleted.
    pub async fn delete_collection_if_exists(&self, name: &str) -> ClientResult<bool> {
        match self.delete_collection(name).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => {
                log::debug!("Collection {name} does not exist; nothing to delete");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

fn is_duplicate_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains("already exists")
}

fn not_found(name: &str) -> ClientError {
    ClientError::NotFound {
        entity: "collection",
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_duplicate_message() {
        assert!(is_duplicate_message("class name \"Movie\" already exists"));
        assert!(is_duplicate_message("Class Already Exists"));
        assert!(!is_duplicate_message("invalid dataType"));
    }
}
