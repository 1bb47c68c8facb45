//! Tests against a running service with a vectorizer module enabled.
//!
//! Run with:
//!
//! ```text
//! QUIVER_SERVICE_URL=http://localhost:8080 cargo test -p quiver-client -- --ignored
//! ```
//!
//! The vectorizer settings come from the usual `QUIVER_*` variables.

use quiver_client::{Client, Config};
use quiver_core::{
    CollectionDefinition, DataType, FilterExpression, FilteredQuery, Properties,
    PropertyDefinition, PropertyValue, Record, SimilarityQuery, SortOrder,
};

fn live_client() -> (Client, Config) {
    let config = Config::load().unwrap();
    (Client::new(&config).unwrap(), config)
}

fn movie_collection(name: &str, config: &Config) -> CollectionDefinition {
    CollectionDefinition::new(name)
        .with_description("A collection of movies")
        .with_vectorizer(config.vectorizer_config().unwrap())
        .with_property(PropertyDefinition::new("title", DataType::Text))
        .with_property(PropertyDefinition::new("description", DataType::Text))
        .with_property(PropertyDefinition::new("year", DataType::Int))
        .with_property(PropertyDefinition::new("rating", DataType::Number))
        .with_property(PropertyDefinition::new("genre", DataType::Text))
}

fn movies() -> Vec<Properties> {
    [
        ("The Shawshank Redemption", "Two imprisoned men bond over years, finding redemption through acts of common decency.", 1994, 9.3, "Drama"),
        ("The Matrix", "A hacker learns the true nature of his reality and his role in the war against its controllers.", 1999, 8.7, "Sci-Fi"),
        ("Inception", "A thief who steals corporate secrets through dream-sharing technology is given the inverse task.", 2010, 8.8, "Sci-Fi"),
        ("Interstellar", "A team of explorers travel through a wormhole in space to ensure humanity's survival.", 2014, 8.6, "Sci-Fi"),
        ("Parasite", "Greed and class discrimination threaten a newly formed symbiotic relationship between two families.", 2019, 8.5, "Thriller"),
    ]
    .into_iter()
    .map(|(title, description, year, rating, genre)| {
        Record::new("Movie")
            .with("title", title)
            .with("description", description)
            .with("year", year)
            .with("rating", rating)
            .with("genre", genre)
            .properties
    })
    .collect()
}

#[tokio::test]
#[ignore = "requires a running service (QUIVER_SERVICE_URL)"]
async fn test_movie_scenario() {
    let (client, config) = live_client();
    let name = "QuiverLiveMovie";
    let definition = movie_collection(name, &config);

    client.schema().delete_collection_if_exists(name).await.unwrap();
    client.schema().create_collection(&definition).await.unwrap();

    let report = client
        .objects()
        .create_records_batch(name, movies())
        .await
        .unwrap();
    assert_eq!(report.len(), 5);
    assert_eq!(report.created_count(), 5);
    assert_eq!(client.objects().count_records(name).await.unwrap(), 5);

    let sci_fi = client
        .query()
        .get(
            &FilteredQuery::new(name)
                .filter(FilterExpression::equal("genre", "Sci-Fi"))
                .sort_by("rating", SortOrder::Desc),
        )
        .await
        .unwrap();
    let titles: Vec<_> = sci_fi
        .iter()
        .filter_map(|r| r.get("title"))
        .cloned()
        .collect();
    assert_eq!(
        titles,
        vec![
            PropertyValue::from("Inception"),
            PropertyValue::from("The Matrix"),
            PropertyValue::from("Interstellar"),
        ]
    );

    let similar = client
        .query()
        .similar(
            &SimilarityQuery::concepts(name, ["space exploration"])
                .max_distance(0.8)
                .limit(3),
        )
        .await
        .unwrap();
    assert!(similar.len() <= 3);
    assert!(similar.iter().all(|s| s.distance <= 0.8));
    assert!(similar.windows(2).all(|w| w[0].distance <= w[1].distance));

    client.schema().delete_collection(name).await.unwrap();
    assert!(!client.schema().collection_exists(name).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a running service (QUIVER_SERVICE_URL)"]
async fn test_schema_round_trip() {
    let (client, config) = live_client();
    let name = "QuiverLiveRoundTrip";
    let definition = movie_collection(name, &config);

    client.schema().delete_collection_if_exists(name).await.unwrap();
    client.schema().create_collection(&definition).await.unwrap();

    let listed = client.schema().list_collections().await.unwrap();
    let found = listed.iter().find(|c| c.name == name).unwrap();
    let declared: Vec<_> = found
        .properties
        .iter()
        .map(|p| (p.name.clone(), p.data_type.clone()))
        .collect();
    let expected: Vec<_> = definition
        .properties
        .iter()
        .map(|p| (p.name.clone(), p.data_type.clone()))
        .collect();
    assert_eq!(declared, expected);

    let duplicate = client.schema().create_collection(&definition).await;
    assert!(matches!(
        duplicate,
        Err(quiver_client::ClientError::DuplicateCollection { .. })
    ));

    client.schema().delete_collection(name).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running service (QUIVER_SERVICE_URL)"]
async fn test_recreated_collection_starts_empty() {
    let (client, config) = live_client();
    let name = "QuiverLiveRecreate";
    let definition = movie_collection(name, &config);

    client.schema().delete_collection_if_exists(name).await.unwrap();
    client.schema().create_collection(&definition).await.unwrap();
    client
        .objects()
        .create_records_batch(name, movies())
        .await
        .unwrap()
        .into_result()
        .unwrap();

    client.schema().delete_collection(name).await.unwrap();
    client.schema().create_collection(&definition).await.unwrap();

    assert_eq!(client.objects().count_records(name).await.unwrap(), 0);
    assert!(client
        .objects()
        .list_records(name, 10, false)
        .await
        .unwrap()
        .is_empty());

    client.schema().delete_collection(name).await.unwrap();
}
