use std::path::Path;

use anyhow::{bail, Context, Result};
use quiver_client::{Client, Config};
use quiver_core::CollectionDefinition;
use serde_json::Value;

/// List collections with their properties.
pub async fn list(client: &Client) -> Result<()> {
    let collections = client
        .schema()
        .list_collections()
        .await
        .context("Failed to list collections")?;

    if collections.is_empty() {
        println!("No collections.");
        return Ok(());
    }

    for collection in &collections {
        let vectorizer = collection
            .vectorizer
            .as_ref()
            .map_or_else(|| "none".to_string(), |v| format!("{} ({})", v.module, v.model));
        println!("{}  [vectorizer: {}]", collection.name, vectorizer);
        if let Some(description) = &collection.description {
            println!("  {description}");
        }
        for property in &collection.properties {
            let marker = if property.vectorize { "*" } else { " " };
            println!("  {marker} {}: {}", property.name, property.data_type);
        }
    }
    println!("\n{} collection(s); * marks vectorized properties", collections.len());

    Ok(())
}

/// Create a collection from a class JSON file.
pub async fn create(client: &Client, config: &Config, file: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let definition = parse_definition(&contents, config)
        .with_context(|| format!("Invalid collection definition in {}", file.display()))?;

    client
        .schema()
        .create_collection(&definition)
        .await
        .with_context(|| format!("Failed to create collection {}", definition.name))?;

    println!(
        "✓ Created collection {} ({} properties)",
        definition.name,
        definition.properties.len()
    );
    Ok(())
}

/// Decode a class JSON document, filling in the configured vectorizer when
/// the document does not name one.
fn parse_definition(contents: &str, config: &Config) -> Result<CollectionDefinition> {
    let wire: Value = serde_json::from_str(contents)?;
    if !wire.is_object() {
        bail!("expected a JSON object");
    }
    let names_vectorizer = wire.get("vectorizer").is_some();

    let mut definition = CollectionDefinition::from_wire(wire)?;
    if !names_vectorizer {
        let vectorizer = config.vectorizer_config()?;
        for property in &mut definition.properties {
            property.vectorize = property.data_type == quiver_core::DataType::Text;
        }
        definition.vectorizer = Some(vectorizer);
    }
    Ok(definition)
}

/// Delete a collection.
pub async fn delete(client: &Client, name: &str, missing_ok: bool) -> Result<()> {
    let schema = client.schema();
    if missing_ok {
        let deleted = schema
            .delete_collection_if_exists(name)
            .await
            .with_context(|| format!("Failed to delete collection {name}"))?;
        if deleted {
            println!("✓ Deleted collection {name}");
        } else {
            println!("Collection {name} does not exist; nothing to delete");
        }
    } else {
        schema
            .delete_collection(name)
            .await
            .with_context(|| format!("Failed to delete collection {name}"))?;
        println!("✓ Deleted collection {name}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_core::DataType;

    #[test]
    fn test_parse_definition_uses_configured_vectorizer() {
        let contents = r#"{
            "class": "Movie",
            "properties": [
                {"name": "title", "dataType": ["text"]},
                {"name": "year", "dataType": ["int"]}
            ]
        }"#;
        let definition = parse_definition(contents, &Config::default()).unwrap();

        let vectorizer = definition.vectorizer.unwrap();
        assert_eq!(vectorizer.module, "text2vec-ollama");
        assert_eq!(vectorizer.model, "bge-m3");
        assert!(definition.properties[0].vectorize);
        assert!(!definition.properties[1].vectorize);
        assert_eq!(definition.properties[1].data_type, DataType::Int);
    }

    #[test]
    fn test_parse_definition_keeps_explicit_none() {
        let contents = r#"{"class": "Note", "vectorizer": "none", "properties": []}"#;
        let definition = parse_definition(contents, &Config::default()).unwrap();
        assert!(definition.vectorizer.is_none());
    }

    #[test]
    fn test_parse_definition_rejects_non_object() {
        assert!(parse_definition("[1, 2]", &Config::default()).is_err());
    }
}
