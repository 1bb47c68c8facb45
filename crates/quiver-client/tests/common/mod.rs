//! Shared fixtures for the client integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quiver_client::{Client, Reply, Request, Transport, TransportError};
use quiver_core::{CollectionDefinition, DataType, PropertyDefinition, VectorizerConfig};
use serde_json::Value;

/// A transport that answers from a queue and records every request.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<Reply, TransportError>>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, reply: Result<Reply, TransportError>) -> &Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn ok(&self, body: Value) -> &Self {
        self.push(Ok(Reply::Success(body)))
    }

    pub fn status(&self, status: u16, body: Value) -> &Self {
        self.push(Ok(Reply::HttpError { status, body }))
    }

    pub fn fail(&self, error: TransportError) -> &Self {
        self.push(Err(error))
    }

    /// Queue the schema lookup every record and query operation starts with.
    pub fn collection(&self, definition: &CollectionDefinition) -> &Self {
        self.ok(definition.to_wire())
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request(&self, index: usize) -> Request {
        self.requests()[index].clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The query document of the request at `index`.
    pub fn document(&self, index: usize) -> String {
        let request = self.request(index);
        assert_eq!(request.path, "v1/graphql");
        request
            .body
            .as_ref()
            .and_then(|b| b.get("query"))
            .and_then(Value::as_str)
            .unwrap()
            .to_string()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> Result<Reply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted reply for {} {}", request.method, request.path))
    }
}

pub fn client(transport: &Arc<ScriptedTransport>) -> Client {
    Client::with_transport(Arc::clone(transport) as Arc<dyn Transport>)
}

pub fn movie() -> CollectionDefinition {
    CollectionDefinition::new("Movie")
        .with_description("A collection of movies")
        .with_vectorizer(VectorizerConfig::new(
            "text2vec-ollama",
            "bge-m3",
            "http://host.docker.internal:11434",
        ))
        .with_property(PropertyDefinition::new("title", DataType::Text))
        .with_property(PropertyDefinition::new("description", DataType::Text))
        .with_property(PropertyDefinition::new("year", DataType::Int))
        .with_property(PropertyDefinition::new("rating", DataType::Number))
        .with_property(PropertyDefinition::new("genre", DataType::Text))
}

pub fn unreachable() -> TransportError {
    TransportError::Connect {
        url: "http://localhost:8080/".to_string(),
        message: "connection refused".to_string(),
    }
}

pub const ID_1: &str = "00000000-0000-4000-8000-000000000001";
pub const ID_2: &str = "00000000-0000-4000-8000-000000000002";
pub const ID_3: &str = "00000000-0000-4000-8000-000000000003";
