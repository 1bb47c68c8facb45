use anyhow::{Context, Result};
use quiver_client::Client;
use quiver_core::{FilterExpression, FilteredQuery, SimilarityQuery, SortSpec};

use super::{format_record, format_scored};

/// Arguments of `quiver query`.
#[derive(Debug)]
pub struct GetArgs {
    pub collection: String,
    pub filter: Option<String>,
    pub sort: Vec<SortSpec>,
    pub limit: Option<usize>,
    pub select: Vec<String>,
}

/// Arguments of `quiver search`.
#[derive(Debug)]
pub struct SearchArgs {
    pub collection: String,
    pub concepts: Vec<String>,
    pub vector: Option<String>,
    pub max_distance: Option<f32>,
    pub limit: Option<usize>,
    pub filter: Option<String>,
}

pub async fn run_get(client: &Client, args: GetArgs) -> Result<()> {
    let query = build_get(args)?;
    let records = client
        .query()
        .get(&query)
        .await
        .with_context(|| format!("Query on {} failed", query.collection))?;

    for record in &records {
        println!("{}", format_record(record));
    }
    println!("\n{} record(s)", records.len());
    Ok(())
}

pub async fn run_search(client: &Client, args: SearchArgs) -> Result<()> {
    let query = build_search(args)?;
    let results = client
        .query()
        .similar(&query)
        .await
        .with_context(|| format!("Similarity search on {} failed", query.collection))?;

    for scored in &results {
        println!("{}", format_scored(scored));
    }
    println!("\n{} result(s)", results.len());
    Ok(())
}

fn build_get(args: GetArgs) -> Result<FilteredQuery> {
    let mut query = FilteredQuery::new(args.collection).select(args.select);
    query.sort = args.sort;
    if let Some(filter) = args.filter.as_deref() {
        query = query.filter(parse_filter(filter)?);
    }
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }
    Ok(query)
}

fn build_search(args: SearchArgs) -> Result<SimilarityQuery> {
    let mut query = match args.vector.as_deref() {
        Some(vector) => {
            let vector: Vec<f32> =
                serde_json::from_str(vector).context("--vector must be a JSON array of numbers")?;
            SimilarityQuery::vector(args.collection, vector)
        }
        None => SimilarityQuery::concepts(args.collection, args.concepts),
    };
    if let Some(distance) = args.max_distance {
        query = query.max_distance(distance);
    }
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }
    if let Some(filter) = args.filter.as_deref() {
        query = query.filter(parse_filter(filter)?);
    }
    Ok(query)
}

fn parse_filter(json: &str) -> Result<FilterExpression> {
    serde_json::from_str(json).context("--filter must be a JSON filter expression")
}
