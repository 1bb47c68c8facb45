//! Request/response plumbing between the managers and the service.
//!
//! Non-2xx statuses are ordinary values ([`Reply::HttpError`]); only failures
//! to complete an exchange are [`TransportError`]s. Nothing here retries.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::ConnectionParams;

const USER_AGENT: &str = concat!("quiver/", env!("CARGO_PKG_VERSION"));
const GRAPHQL_PATH: &str = "v1/graphql";

/// Failures to complete an exchange with the service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    /// The connect or read timeout elapsed.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The exchange failed after the connection was made.
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Setup(String),
}

impl TransportError {
    fn from_reqwest(url: &Url, error: &reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            Self::Timeout { url }
        } else if error.is_connect() {
            Self::Connect {
                url,
                message: error.to_string(),
            }
        } else {
            Self::Request {
                url,
                message: error.to_string(),
            }
        }
    }
}

/// HTTP method of a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        })
    }
}

/// A request relative to the service base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    /// Path relative to the base URL, e.g. `v1/schema/Movie`.
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            params: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            params: Vec::new(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            params: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }
}

/// Outcome of a completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A 2xx status. An empty body is `Value::Null`; a body that is not JSON
    /// is kept as `Value::String`.
    Success(Value),
    /// Any other status, with the body decoded the same way.
    HttpError { status: u16, body: Value },
}

/// One entry of a query response's `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub path: Vec<Value>,
}

impl GraphQlError {
    /// Decode one `errors` entry, keeping its raw JSON as the message when it
    /// has no usable `message`.
    fn from_entry(entry: Value) -> Self {
        serde_json::from_value(entry.clone()).unwrap_or_else(|_| Self {
            message: entry.to_string(),
            path: Vec::new(),
        })
    }
}

impl fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            let path: Vec<String> = self
                .path
                .iter()
                .map(|p| match p {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            write!(f, "{} (at {})", self.message, path.join("."))
        }
    }
}

/// Outcome of a query-language request.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryReply {
    /// The `data` member of a response without errors.
    Data(Value),
    /// The service reported query errors.
    Errors(Vec<GraphQlError>),
    /// The query endpoint answered with a non-2xx status.
    HttpError { status: u16, body: Value },
}

impl QueryReply {
    fn from_reply(reply: Reply) -> Self {
        match reply {
            Reply::HttpError { status, body } => Self::HttpError { status, body },
            Reply::Success(mut body) => {
                let errors = match body.get_mut("errors").map(Value::take) {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(entries)) => {
                        entries.into_iter().map(GraphQlError::from_entry).collect()
                    }
                    Some(other) => vec![GraphQlError::from_entry(other)],
                };
                if errors.is_empty() {
                    Self::Data(body.get_mut("data").map(Value::take).unwrap_or(Value::Null))
                } else {
                    Self::Errors(errors)
                }
            }
        }
    }
}

/// A channel to the service.
///
/// Implementations apply their own timeouts and never retry.
#[async_trait]
pub trait Transport: fmt::Debug + Send + Sync {
    /// Perform one exchange.
    async fn send(&self, request: Request) -> Result<Reply, TransportError>;

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Reply, TransportError> {
        let mut request = Request::get(path);
        for (key, value) in params {
            request = request.with_param(*key, value);
        }
        self.send(request).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Reply, TransportError> {
        self.send(Request::post(path, body)).await
    }

    async fn delete(&self, path: &str) -> Result<Reply, TransportError> {
        self.send(Request::delete(path)).await
    }

    /// Post a query-language document to the query endpoint.
    async fn query(&self, document: &str) -> Result<QueryReply, TransportError> {
        let reply = self
            .send(Request::post(GRAPHQL_PATH, json!({ "query": document })))
            .await?;
        Ok(QueryReply::from_reply(reply))
    }
}

/// [`Transport`] over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport for the given connection settings.
    ///
    /// # Errors
    /// Returns [`TransportError::Setup`] if the HTTP client cannot be created.
    pub fn new(params: &ConnectionParams) -> Result<Self, TransportError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(params.connect_timeout)
            .timeout(params.read_timeout)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        let mut base_url = params.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::Request {
                url: format!("{}{}", self.base_url, path),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Reply, TransportError> {
        let url = self.url_for(&request.path)?;
        log::debug!("{} {}", request.method, url);

        let mut builder = match request.method {
            Method::Get => self.http.get(url.clone()),
            Method::Post => self.http.post(url.clone()),
            Method::Delete => self.http.delete(url.clone()),
        };
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&url, &e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(&url, &e))?;

        log::debug!("{} {} -> {}", request.method, url, status.as_u16());

        let body = decode_body(&text);
        if status.is_success() {
            Ok(Reply::Success(body))
        } else {
            Ok(Reply::HttpError {
                status: status.as_u16(),
                body,
            })
        }
    }
}

fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
