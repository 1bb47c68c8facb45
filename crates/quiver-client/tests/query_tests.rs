//! Query client behavior against a scripted transport.

mod common;

use common::{client, movie, ScriptedTransport, ID_1, ID_2, ID_3};
use quiver_client::ClientError;
use quiver_core::{FilterExpression, FilteredQuery, PropertyValue, SimilarityQuery, SortOrder};
use serde_json::{json, Value};

#[tokio::test]
async fn test_filtered_get_sorted_and_limited() {
    let transport = ScriptedTransport::new();
    transport.collection(&movie()).ok(json!({
        "data": {"Get": {"Movie": [
            {"title": "Inception", "rating": 8.8, "_additional": {"id": ID_1}},
            {"title": "Interstellar", "rating": 8.6, "_additional": {"id": ID_2}}
        ]}}
    }));

    let query = FilteredQuery::new("Movie")
        .filter(FilterExpression::equal("genre", "Sci-Fi"))
        .sort_by("rating", SortOrder::Desc)
        .limit(2)
        .select(["title", "rating"]);
    let records = client(&transport).query().get(&query).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].get("title"),
        Some(&PropertyValue::Text("Inception".to_string()))
    );
    assert_eq!(records[1].id, Some(ID_2.parse().unwrap()));

    let document = transport.document(1);
    assert!(document.contains(
        r#"where: {path: ["genre"], operator: Equal, valueText: "Sci-Fi"}"#
    ));
    assert!(document.contains(r#"sort: [{path: ["rating"], order: desc}]"#));
    assert!(document.contains("limit: 2"));
    assert!(document.contains("title rating _additional { id }"));
}

#[tokio::test]
async fn test_compound_filter_rendering() {
    let transport = ScriptedTransport::new();
    transport
        .collection(&movie())
        .ok(json!({"data": {"Get": {"Movie": []}}}));

    let filter = FilterExpression::and([
        FilterExpression::greater_than("year", 2009),
        FilterExpression::greater_than_equal("rating", 8.7),
    ]);
    let records = client(&transport)
        .query()
        .get(&FilteredQuery::new("Movie").filter(filter))
        .await
        .unwrap();

    assert!(records.is_empty());
    let document = transport.document(1);
    assert!(document.contains("operator: And"));
    assert!(document.contains(r#"{path: ["year"], operator: GreaterThan, valueInt: 2009}"#));
    assert!(document.contains("operator: GreaterThanEqual, valueNumber: 8.7"));
}

#[tokio::test]
async fn test_unknown_property_filter_is_query_error_before_sending() {
    let transport = ScriptedTransport::new();
    transport.collection(&movie());

    let query = FilteredQuery::new("Movie").filter(FilterExpression::equal("budget", 100));
    let err = client(&transport).query().get(&query).await.unwrap_err();

    match err {
        ClientError::Query { message } => assert!(message.contains("budget")),
        other => panic!("expected query error, got {other:?}"),
    }
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_type_mismatch_filter_is_query_error() {
    let transport = ScriptedTransport::new();
    transport.collection(&movie());

    let query = FilteredQuery::new("Movie").filter(FilterExpression::equal("year", "recent"));
    let err = client(&transport).query().get(&query).await.unwrap_err();

    assert!(matches!(err, ClientError::Query { .. }));
}

#[tokio::test]
async fn test_unknown_sort_path_is_query_error() {
    let transport = ScriptedTransport::new();
    transport.collection(&movie());

    let query = FilteredQuery::new("Movie").sort_by("budget", SortOrder::Asc);
    let err = client(&transport).query().get(&query).await.unwrap_err();

    assert!(matches!(err, ClientError::Query { .. }));
}

#[tokio::test]
async fn test_service_errors_become_query_error() {
    let transport = ScriptedTransport::new();
    transport.collection(&movie()).ok(json!({
        "data": {"Get": {"Movie": null}},
        "errors": [{"message": "explorer: list class: search: object search at index movie: no vectorizer", "path": ["Get", "Movie"]}]
    }));

    let err = client(&transport)
        .query()
        .similar(&SimilarityQuery::concepts("Movie", ["space"]))
        .await
        .unwrap_err();

    match err {
        ClientError::Query { message } => {
            assert!(message.contains("no vectorizer"));
            assert!(message.contains("Get.Movie"));
        }
        other => panic!("expected query error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_document_becomes_query_error() {
    let transport = ScriptedTransport::new();
    transport.collection(&movie()).status(
        422,
        json!({"error": [{"message": "Syntax Error GraphQL request (1:9) Unexpected Name"}]}),
    );

    let err = client(&transport)
        .query()
        .get(&FilteredQuery::new("Movie"))
        .await
        .unwrap_err();

    match err {
        ClientError::Query { message } => assert!(message.starts_with("Syntax Error")),
        other => panic!("expected query error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_query_endpoint_outage_stays_transient() {
    let transport = ScriptedTransport::new();
    transport.collection(&movie()).status(503, json!("unavailable"));

    let err = client(&transport)
        .query()
        .similar(&SimilarityQuery::concepts("Movie", ["space"]))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Http { status: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_errors_without_messages_are_not_empty_results() {
    let transport = ScriptedTransport::new();
    transport.collection(&movie()).ok(json!({
        "data": {"Get": {"Movie": null}},
        "errors": [{"extensions": {"code": "INTERNAL"}}]
    }));

    let err = client(&transport)
        .query()
        .get(&FilteredQuery::new("Movie"))
        .await
        .unwrap_err();

    match err {
        ClientError::Query { message } => assert!(message.contains("INTERNAL")),
        other => panic!("expected query error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_query_against_missing_collection() {
    let transport = ScriptedTransport::new();
    transport.status(404, Value::Null);

    let err = client(&transport)
        .query()
        .get(&FilteredQuery::new("Movie"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_similarity_search_keeps_service_order() {
    let transport = ScriptedTransport::new();
    transport.collection(&movie()).ok(json!({
        "data": {"Get": {"Movie": [
            {"title": "Interstellar", "_additional": {"id": ID_1, "distance": 0.21}},
            {"title": "Inception", "_additional": {"id": ID_2, "distance": 0.34}},
            {"title": "The Matrix", "_additional": {"id": ID_3, "distance": 0.5}}
        ]}}
    }));

    let query = SimilarityQuery::concepts("Movie", ["space exploration"])
        .max_distance(0.8)
        .limit(3);
    let results = client(&transport).query().similar(&query).await.unwrap();

    let distances: Vec<f32> = results.iter().map(|r| r.distance).collect();
    assert_eq!(distances, vec![0.21, 0.34, 0.5]);
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(
        results[0].record.get("title"),
        Some(&PropertyValue::Text("Interstellar".to_string()))
    );

    let document = transport.document(1);
    assert!(document.contains(r#"nearText: {concepts: ["space exploration"], distance: 0.8}"#));
    assert!(document.contains("limit: 3"));
    assert!(document.contains("_additional { id distance }"));
}

#[tokio::test]
async fn test_similarity_drops_items_beyond_threshold() {
    let transport = ScriptedTransport::new();
    transport.collection(&movie()).ok(json!({
        "data": {"Get": {"Movie": [
            {"title": "Close", "_additional": {"id": ID_1, "distance": 0.3}},
            {"title": "Far", "_additional": {"id": ID_2, "distance": 0.95}}
        ]}}
    }));

    let results = client(&transport)
        .query()
        .similar(&SimilarityQuery::concepts("Movie", ["dreams"]).max_distance(0.8))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].record.id, Some(ID_1.parse().unwrap()));
}

#[tokio::test]
async fn test_hybrid_search_with_vector_and_filter() {
    let transport = ScriptedTransport::new();
    transport
        .collection(&movie())
        .ok(json!({"data": {"Get": {"Movie": []}}}));

    let query = SimilarityQuery::vector("Movie", vec![0.5, -0.25])
        .filter(FilterExpression::greater_than("year", 2000))
        .limit(5);
    let results = client(&transport).query().similar(&query).await.unwrap();

    assert!(results.is_empty());
    let document = transport.document(1);
    assert!(document.contains("nearVector: {vector: [0.5, -0.25]}"));
    assert!(document.contains("valueInt: 2000"));
}

#[tokio::test]
async fn test_empty_concepts_rejected_locally() {
    let transport = ScriptedTransport::new();
    transport.collection(&movie());

    let query = SimilarityQuery::concepts("Movie", Vec::<String>::new());
    let err = client(&transport).query().similar(&query).await.unwrap_err();

    assert!(matches!(err, ClientError::Query { .. }));
    assert_eq!(transport.request_count(), 1);
}
