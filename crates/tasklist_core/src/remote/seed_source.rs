//! HTTP seed source for the one-time import.
//!
//! # Responsibility
//! - Perform a single GET of the seed endpoint.
//! - Decode `{ "todos": [ { "id", "todo", "completed", "userId" } ] }` into
//!   seed tasks.
//!
//! # Invariants
//! - Any status other than 200 is an error.
//! - `userId` is ignored.

use crate::model::task::SeedTask;
use log::{error, info};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Default seed endpoint.
pub const DEFAULT_SEED_URL: &str = "https://dummyjson.com/todos";

/// Failure of one seed fetch.
#[derive(Debug)]
pub enum FetchError {
    /// Configured endpoint is not a valid absolute URL.
    InvalidEndpoint(String),
    /// Connection, TLS or body read failure.
    TransportFailure(reqwest::Error),
    /// Server answered with a status other than 200.
    UnexpectedStatus(u16),
    /// Body is not the expected JSON shape.
    MalformedPayload(serde_json::Error),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEndpoint(endpoint) => write!(f, "invalid seed endpoint `{endpoint}`"),
            Self::TransportFailure(err) => write!(f, "seed request failed: {err}"),
            Self::UnexpectedStatus(status) => write!(f, "unexpected seed response status {status}"),
            Self::MalformedPayload(err) => write!(f, "malformed seed payload: {err}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TransportFailure(err) => Some(err),
            Self::MalformedPayload(err) => Some(err),
            Self::InvalidEndpoint(_) | Self::UnexpectedStatus(_) => None,
        }
    }
}

/// Source of the seed list. Blocking; callers run it off the foreground.
pub trait SeedSource: Send + Sync {
    fn fetch_seed_tasks(&self) -> Result<Vec<SeedTask>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct TodosPayload {
    todos: Vec<RemoteTodo>,
}

#[derive(Debug, Deserialize)]
struct RemoteTodo {
    id: i64,
    todo: String,
    completed: bool,
}

/// Decodes a seed response body.
pub fn parse_seed_payload(body: &[u8]) -> Result<Vec<SeedTask>, FetchError> {
    let payload: TodosPayload =
        serde_json::from_slice(body).map_err(FetchError::MalformedPayload)?;
    Ok(payload
        .todos
        .into_iter()
        .map(|todo| SeedTask {
            remote_id: todo.id,
            title: todo.todo,
            completed: todo.completed,
        })
        .collect())
}

/// Seed source backed by a blocking HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpSeedSource {
    endpoint: String,
}

impl HttpSeedSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SeedSource for HttpSeedSource {
    fn fetch_seed_tasks(&self) -> Result<Vec<SeedTask>, FetchError> {
        let started_at = Instant::now();
        let result = fetch(&self.endpoint);
        match &result {
            Ok(items) => info!(
                "event=seed_fetch module=remote status=ok count={} duration_ms={}",
                items.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=seed_fetch module=remote status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

fn fetch(endpoint: &str) -> Result<Vec<SeedTask>, FetchError> {
    let url = Url::parse(endpoint).map_err(|_| FetchError::InvalidEndpoint(endpoint.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::InvalidEndpoint(endpoint.to_string()));
    }

    let client = Client::builder()
        .build()
        .map_err(FetchError::TransportFailure)?;
    let response = client
        .get(url)
        .send()
        .map_err(FetchError::TransportFailure)?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::UnexpectedStatus(status.as_u16()));
    }

    let body = response.bytes().map_err(FetchError::TransportFailure)?;
    parse_seed_payload(&body)
}

#[cfg(test)]
mod tests {
    use super::{parse_seed_payload, FetchError, HttpSeedSource, SeedSource};

    #[test]
    fn parses_todos_and_ignores_user_id() {
        let body = br#"{
            "todos": [
                { "id": 1, "todo": "Do something nice", "completed": false, "userId": 26 },
                { "id": 2, "todo": "Memorize a poem", "completed": true, "userId": 13 }
            ],
            "total": 2, "skip": 0, "limit": 30
        }"#;

        let items = parse_seed_payload(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].remote_id, 1);
        assert_eq!(items[0].title, "Do something nice");
        assert!(!items[0].completed);
        assert!(items[1].completed);
    }

    #[test]
    fn missing_todos_key_is_malformed() {
        let err = parse_seed_payload(br#"{ "items": [] }"#).unwrap_err();
        assert!(matches!(err, FetchError::MalformedPayload(_)));
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        let body = br#"{ "todos": [ { "id": "one", "todo": "x", "completed": false } ] }"#;
        assert!(matches!(
            parse_seed_payload(body),
            Err(FetchError::MalformedPayload(_))
        ));
    }

    #[test]
    fn invalid_endpoint_fails_before_any_request() {
        let source = HttpSeedSource::new("not a url");
        assert!(matches!(
            source.fetch_seed_tasks(),
            Err(FetchError::InvalidEndpoint(_))
        ));

        let source = HttpSeedSource::new("ftp://example.com/todos");
        assert!(matches!(
            source.fetch_seed_tasks(),
            Err(FetchError::InvalidEndpoint(_))
        ));
    }
}
