use std::path::Path;

use anyhow::{Context, Result};
use quiver_client::{BatchOutcome, Client};
use quiver_core::Properties;

use super::format_record;

/// Print the number of records in a collection.
pub async fn count(client: &Client, collection: &str) -> Result<()> {
    let count = client
        .objects()
        .count_records(collection)
        .await
        .with_context(|| format!("Failed to count records in {collection}"))?;
    println!("{count}");
    Ok(())
}

/// Print up to `limit` records.
pub async fn list(client: &Client, collection: &str, limit: usize, vector: bool) -> Result<()> {
    let records = client
        .objects()
        .list_records(collection, limit, vector)
        .await
        .with_context(|| format!("Failed to list records in {collection}"))?;

    for record in &records {
        println!("{}", format_record(record));
    }
    println!("\n{} record(s)", records.len());
    Ok(())
}

/// Import a JSON array of property objects as one batch.
pub async fn import(client: &Client, collection: &str, file: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let records = parse_records(&contents)
        .with_context(|| format!("Invalid records file {}", file.display()))?;

    let report = client
        .objects()
        .create_records_batch(collection, records)
        .await
        .with_context(|| format!("Failed to import into {collection}"))?;

    for (index, outcome) in report.outcomes().iter().enumerate() {
        match outcome {
            BatchOutcome::Created(id) => println!("  ✓ [{index}] {id}"),
            BatchOutcome::Failed(reason) => println!("  ✗ [{index}] {reason}"),
        }
    }
    println!(
        "\nImported {} of {} record(s) into {}",
        report.created_count(),
        report.len(),
        collection
    );

    report.into_result()?;
    Ok(())
}

fn parse_records(contents: &str) -> Result<Vec<Properties>> {
    Ok(serde_json::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_core::PropertyValue;

    #[test]
    fn test_parse_records() {
        let records = parse_records(
            r#"[
                {"title": "Inception", "year": 2010, "rating": 8.8},
                {"title": "Parasite", "year": 2019, "rating": 8.5}
            ]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["year"], PropertyValue::Int(2010));
        assert_eq!(records[1]["rating"], PropertyValue::Number(8.5));
    }

    #[test]
    fn test_parse_records_requires_array() {
        assert!(parse_records(r#"{"title": "X"}"#).is_err());
    }
}
