//! Filtered retrieval and similarity search.

use std::sync::Arc;

use quiver_core::query::{decode_records, decode_scored_records};
use quiver_core::{CollectionDefinition, FilteredQuery, Record, ScoredRecord, SimilarityQuery};
use serde_json::Value;

use crate::error::{ClientError, ClientResult};
use crate::objects::join_errors;
use crate::schema::SchemaManager;
use crate::transport::{QueryReply, Transport};

/// Runs typed queries against the service's query endpoint.
///
/// Every query is checked against the collection definition before it is
/// sent. Results come back in service order.
#[derive(Debug, Clone)]
pub struct QueryClient {
    transport: Arc<dyn Transport>,
    schema: SchemaManager,
}

impl QueryClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            schema: SchemaManager::new(Arc::clone(&transport)),
            transport,
        }
    }

    /// Retrieve records matching an optional filter, sorted and limited.
    ///
    /// # Errors
    /// - [`ClientError::NotFound`] if the collection does not exist
    /// - [`ClientError::Query`] for unknown properties, type mismatches or
    ///   service-reported query errors
    pub async fn get(&self, query: &FilteredQuery) -> ClientResult<Vec<Record>> {
        let definition = self.schema.get_collection(&query.collection).await?;
        let document = query.prepare(&definition).map_err(ClientError::query)?;

        let data = self.run(&document, "get").await?;
        let records = decode_records(&data, &definition)
            .map_err(|e| ClientError::parse("get", e))?;
        log::debug!("Get on {} returned {} records", definition.name, records.len());
        Ok(records)
    }

    /// Find the records nearest to a set of concepts or a vector.
    ///
    /// Items the service reports beyond the requested maximum distance are
    /// dropped with a warning; the remaining order is the service's.
    ///
    /// # Errors
    /// Same as [`QueryClient::get`].
    pub async fn similar(&self, query: &SimilarityQuery) -> ClientResult<Vec<ScoredRecord>> {
        let definition = self.schema.get_collection(&query.collection).await?;
        let document = query.prepare(&definition).map_err(ClientError::query)?;

        let data = self.run(&document, "similar").await?;
        let scored = decode_scored_records(&data, &definition)
            .map_err(|e| ClientError::parse("similar", e))?;
        let scored = within_threshold(scored, query.max_distance, &definition);
        log::debug!(
            "Similarity search on {} for {} returned {} records",
            definition.name,
            query.target,
            scored.len()
        );
        Ok(scored)
    }

    async fn run(&self, document: &str, operation: &'static str) -> ClientResult<Value> {
        log::debug!("Query document: {document}");
        match self.transport.query(document).await? {
            QueryReply::Data(data) => Ok(data),
            QueryReply::Errors(errors) => Err(ClientError::query(join_errors(&errors))),
            QueryReply::HttpError { status, body } => {
                Err(ClientError::query_http(operation, status, &body))
            }
        }
    }
}

fn within_threshold(
    scored: Vec<ScoredRecord>,
    max_distance: Option<f32>,
    definition: &CollectionDefinition,
) -> Vec<ScoredRecord> {
    let Some(max) = max_distance else {
        return scored;
    };
    scored
        .into_iter()
        .filter(|item| {
            let keep = item.distance <= max;
            if !keep {
                log::warn!(
                    "Dropping {} result at distance {} beyond threshold {}",
                    definition.name,
                    item.distance,
                    max
                );
            }
            keep
        })
        .collect()
}
