pub mod config;
pub mod meta;
pub mod objects;
pub mod query;
pub mod schema;

use quiver_core::{Record, ScoredRecord};

/// Render a record as `id  name=value ...` on one line.
pub fn format_record(record: &Record) -> String {
    let id = record
        .id
        .map_or_else(|| "<no id>".to_string(), |id| id.to_string());
    let properties: Vec<String> = record
        .properties
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    let line = format!("{id}  {}", properties.join("  "));
    match &record.vector {
        Some(vector) => format!("{line}  vector[{}]", vector.len()),
        None => line,
    }
}

pub fn format_scored(scored: &ScoredRecord) -> String {
    format!("{:.4}  {}", scored.distance, format_record(&scored.record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_record() {
        let mut record = Record::new("Movie").with("title", "Inception").with("year", 2010);
        record.id = Some("00000000-0000-4000-8000-000000000001".parse().unwrap());
        assert_eq!(
            format_record(&record),
            "00000000-0000-4000-8000-000000000001  title=Inception  year=2010"
        );

        record.vector = Some(vec![0.1, 0.2]);
        assert!(format_record(&record).ends_with("vector[2]"));
    }

    #[test]
    fn test_format_scored() {
        let scored = ScoredRecord {
            record: Record::new("Movie").with("title", "X"),
            distance: 0.25,
        };
        assert_eq!(format_scored(&scored), "0.2500  <no id>  title=X");
    }
}
