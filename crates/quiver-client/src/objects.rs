//! Record creation, counting and listing.

use std::sync::Arc;

use quiver_core::model::record::{
    conform_properties, decode_properties, decode_vector, properties_to_json,
};
use quiver_core::query::{count_document, decode_count};
use quiver_core::{CollectionDefinition, Properties, Record, RecordId};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{service_message, ClientError, ClientResult};
use crate::schema::SchemaManager;
use crate::transport::{GraphQlError, QueryReply, Reply, Transport};

const OBJECTS_PATH: &str = "v1/objects";
const BATCH_PATH: &str = "v1/batch/objects";

/// Result of one item of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    Created(RecordId),
    Failed(String),
}

impl BatchOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub fn id(&self) -> Option<RecordId> {
        match self {
            Self::Created(id) => Some(*id),
            Self::Failed(_) => None,
        }
    }
}

/// Per-item results of a batch, one outcome per input in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn outcomes(&self) -> &[BatchOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn created_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_created()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.len() - self.created_count()
    }

    /// Ids of the created records, in input order.
    pub fn created_ids(&self) -> Vec<RecordId> {
        self.outcomes.iter().filter_map(BatchOutcome::id).collect()
    }

    /// All ids if every item was created.
    ///
    /// # Errors
    /// Returns [`ClientError::PartialBatchFailure`] carrying every outcome
    /// when any item failed.
    pub fn into_result(self) -> ClientResult<Vec<RecordId>> {
        let failed = self.failed_count();
        if failed == 0 {
            return Ok(self.created_ids());
        }
        Err(ClientError::PartialBatchFailure {
            total: self.len(),
            failed,
            outcomes: self.outcomes,
        })
    }
}

/// Creates and reads records.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    transport: Arc<dyn Transport>,
    schema: SchemaManager,
}

impl ObjectStore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            schema: SchemaManager::new(Arc::clone(&transport)),
            transport,
        }
    }

    /// Create one record and return the id the service assigned.
    ///
    /// Properties are checked against the collection definition before
    /// anything is sent.
    ///
    /// # Errors
    /// - [`ClientError::NotFound`] if the collection does not exist
    /// - [`ClientError::Validation`] for undeclared properties, type
    ///   mismatches or a service-side rejection
    pub async fn create_record(
        &self,
        collection: &str,
        properties: Properties,
    ) -> ClientResult<RecordId> {
        let definition = self.schema.get_collection(collection).await?;
        let properties =
            conform_properties(&definition, properties).map_err(ClientError::validation)?;

        let body = json!({
            "class": definition.name,
            "properties": properties_to_json(&properties),
        });

        match self.transport.post(OBJECTS_PATH, body).await? {
            Reply::Success(body) => {
                let id = parse_id(&body).ok_or_else(|| {
                    ClientError::parse("create record", format!("no id in response: {body}"))
                })?;
                log::debug!("Created {collection} record {id}");
                Ok(id)
            }
            Reply::HttpError { status: 422, body } => Err(ClientError::Validation {
                message: service_message(&body),
            }),
            Reply::HttpError { status, body } => {
                Err(ClientError::http("create record", status, &body))
            }
        }
    }

    /// Create many records in one request.
    ///
    /// Items that fail local validation are reported as failed and never
    /// sent; the rest are submitted together. An empty input sends nothing.
    ///
    /// # Errors
    /// Only whole-operation failures are errors: a missing collection or a
    /// transport failure. Per-item failures are in the returned report.
    pub async fn create_records_batch(
        &self,
        collection: &str,
        records: Vec<Properties>,
    ) -> ClientResult<BatchReport> {
        if records.is_empty() {
            return Ok(BatchReport::default());
        }

        let definition = self.schema.get_collection(collection).await?;

        let mut outcomes: Vec<Option<BatchOutcome>> = Vec::with_capacity(records.len());
        let mut sent_indices = Vec::new();
        let mut objects = Vec::new();
        for (index, properties) in records.into_iter().enumerate() {
            match conform_properties(&definition, properties) {
                Ok(properties) => {
                    outcomes.push(None);
                    sent_indices.push(index);
                    objects.push(json!({
                        "class": definition.name,
                        "properties": properties_to_json(&properties),
                    }));
                }
                Err(e) => {
                    log::warn!("Skipping {collection} batch item {index}: {e}");
                    outcomes.push(Some(BatchOutcome::Failed(e.to_string())));
                }
            }
        }

        if !objects.is_empty() {
            let sent = objects.len();
            let results = match self
                .transport
                .post(BATCH_PATH, json!({ "objects": objects }))
                .await?
            {
                Reply::Success(body) => decode_batch_results(&body, sent),
                Reply::HttpError { status, body } => {
                    let reason = format!("HTTP {status}: {}", service_message(&body));
                    vec![BatchOutcome::Failed(reason); sent]
                }
            };
            for (index, outcome) in sent_indices.into_iter().zip(results) {
                outcomes[index] = Some(outcome);
            }
        }

        let report = BatchReport {
            outcomes: outcomes
                .into_iter()
                .map(|o| o.unwrap_or_else(|| BatchOutcome::Failed(MISSING_RESULT.to_string())))
                .collect(),
        };
        log::info!(
            "Batch into {collection}: {} created, {} failed",
            report.created_count(),
            report.failed_count()
        );
        Ok(report)
    }

    /// Count the records of a collection with an aggregate query.
    ///
    /// # Errors
    /// Returns [`ClientError::NotFound`] if the collection does not exist.
    pub async fn count_records(&self, collection: &str) -> ClientResult<u64> {
        let document = count_document(collection).map_err(ClientError::validation)?;

        match self.transport.query(&document).await? {
            QueryReply::Data(data) => {
                decode_count(&data, collection).map_err(|e| ClientError::parse("count records", e))
            }
            QueryReply::Errors(errors) => {
                if !self.schema.collection_exists(collection).await? {
                    return Err(ClientError::NotFound {
                        entity: "collection",
                        name: collection.to_string(),
                    });
                }
                Err(ClientError::query(join_errors(&errors)))
            }
            QueryReply::HttpError { status, body } => {
                Err(ClientError::query_http("count records", status, &body))
            }
        }
    }

    /// List up to `limit` records, optionally with their vectors.
    ///
    /// # Errors
    /// Returns [`ClientError::NotFound`] if the collection does not exist.
    pub async fn list_records(
        &self,
        collection: &str,
        limit: usize,
        include_vector: bool,
    ) -> ClientResult<Vec<Record>> {
        let definition = self.schema.get_collection(collection).await?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut params = vec![
            ("class", definition.name.clone()),
            ("limit", limit.to_string()),
        ];
        if include_vector {
            params.push(("include", "vector".to_string()));
        }

        let body = match self.transport.get(OBJECTS_PATH, &params).await? {
            Reply::Success(body) => body,
            Reply::HttpError { status, body } => {
                return Err(ClientError::http("list records", status, &body));
            }
        };

        let objects = match body.get("objects") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(objects)) => objects,
            Some(other) => {
                return Err(ClientError::parse(
                    "list records",
                    format!("objects is not an array: {other}"),
                ));
            }
        };

        objects
            .iter()
            .map(|object| decode_listed_object(object, &definition, include_vector))
            .collect()
    }
}

const MISSING_RESULT: &str = "no result returned by service";

fn parse_id(body: &Value) -> Option<RecordId> {
    body.get("id")?.as_str()?.parse().ok()
}

pub(crate) fn join_errors(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Map a batch response onto the `sent` submitted items, in order.
fn decode_batch_results(body: &Value, sent: usize) -> Vec<BatchOutcome> {
    let items = body.as_array().map(Vec::as_slice).unwrap_or_default();
    (0..sent)
        .map(|i| match items.get(i) {
            Some(item) => decode_batch_item(item),
            None => BatchOutcome::Failed(MISSING_RESULT.to_string()),
        })
        .collect()
}

fn decode_batch_item(item: &Value) -> BatchOutcome {
    let messages: Vec<&str> = item
        .pointer("/result/errors/error")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if !messages.is_empty() {
        return BatchOutcome::Failed(messages.join("; "));
    }
    match parse_id(item) {
        Some(id) => BatchOutcome::Created(id),
        None => BatchOutcome::Failed("service returned no id".to_string()),
    }
}

fn decode_listed_object(
    object: &Value,
    definition: &CollectionDefinition,
    include_vector: bool,
) -> ClientResult<Record> {
    let parse = |e: quiver_core::Error| ClientError::parse("list records", e);

    let properties = match object.get("properties") {
        Some(Value::Object(map)) => decode_properties(definition, map).map_err(parse)?,
        _ => Properties::new(),
    };
    let vector = if include_vector {
        object
            .get("vector")
            .filter(|v| !v.is_null())
            .map(decode_vector)
            .transpose()
            .map_err(parse)?
    } else {
        None
    };

    Ok(Record {
        id: parse_id(object),
        collection: definition.name.clone(),
        properties,
        vector,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID_A: &str = "36ddd591-2dee-4e7e-a3cc-eb86d30a4303";
    const ID_B: &str = "8d0a3c2e-6d0c-4cf0-9a5b-5b6e0f7f6c11";

    #[test]
    fn test_decode_batch_results_in_order() {
        let body = json!([
            {"id": ID_A, "result": {}},
            {"id": ID_B, "result": {"errors": {"error": [{"message": "invalid text property"}]}}}
        ]);
        let outcomes = decode_batch_results(&body, 3);
        assert_eq!(outcomes[0], BatchOutcome::Created(ID_A.parse().unwrap()));
        assert_eq!(
            outcomes[1],
            BatchOutcome::Failed("invalid text property".to_string())
        );
        assert_eq!(outcomes[2], BatchOutcome::Failed(MISSING_RESULT.to_string()));
    }

    #[test]
    fn test_report_into_result() {
        let id: RecordId = ID_A.parse().unwrap();
        let ok = BatchReport {
            outcomes: vec![BatchOutcome::Created(id)],
        };
        assert_eq!(ok.into_result().unwrap(), vec![id]);

        let mixed = BatchReport {
            outcomes: vec![
                BatchOutcome::Created(id),
                BatchOutcome::Failed("bad".to_string()),
            ],
        };
        assert_eq!(mixed.created_count(), 1);
        assert_eq!(mixed.failed_count(), 1);
        match mixed.into_result() {
            Err(ClientError::PartialBatchFailure {
                total,
                failed,
                outcomes,
            }) => {
                assert_eq!((total, failed), (2, 1));
                assert_eq!(outcomes.len(), 2);
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_report() {
        let report = BatchReport::default();
        assert!(report.is_empty());
        assert!(report.into_result().unwrap().is_empty());
    }
}
