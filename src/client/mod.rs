//! Invocation capability: thin REST and GraphQL clients with body-inclusive timing

pub mod graphql;
pub mod rest;

pub use graphql::GraphQlClient;
pub use rest::RestClient;

use crate::{
    error::{AppError, Result},
    types::{ApiType, QueryType},
};
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Items requested per page by every list-shaped operation
pub const PAGE_SIZE: u32 = 10;

/// Outcome of one successful invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Parsed response body
    pub payload: serde_json::Value,
    /// Wall time from dispatch to last body byte, summed windows for multi-request operations
    pub elapsed: Duration,
    /// Raw body length, summed for multi-request operations
    pub byte_size: usize,
}

/// Parameters of one treatment invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// User login or search query string
    pub key: String,
    /// Requested page for pagination treatments
    pub page: Option<u32>,
}

impl Subject {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), page: None }
    }

    pub fn with_page(key: impl Into<String>, page: u32) -> Self {
        Self { key: key.into(), page: Some(page) }
    }
}

/// One API paradigm as seen by the scheduler
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Paradigm implemented by this client
    fn api_type(&self) -> ApiType;

    /// Single-entity lookup
    async fn get_simple(&self, login: &str) -> Result<Invocation>;

    /// Entity plus its first page of repositories
    async fn get_with_relations(&self, login: &str) -> Result<Invocation>;

    /// Filtered repository search
    async fn search_filtered(&self, query: &str) -> Result<Invocation>;

    /// Paginated repository listing
    async fn get_paginated(&self, login: &str, page: u32) -> Result<Invocation>;

    /// Release held resources; called once by `ClientSession`
    fn shutdown(&self) {}
}

/// Dispatch one treatment invocation to the matching client operation
pub async fn invoke(client: &dyn ApiClient, query_type: QueryType, subject: &Subject) -> Result<Invocation> {
    match query_type {
        QueryType::Simple => client.get_simple(&subject.key).await,
        QueryType::Relationship => client.get_with_relations(&subject.key).await,
        QueryType::Filter => client.search_filtered(&subject.key).await,
        QueryType::Pagination => client.get_paginated(&subject.key, subject.page.unwrap_or(1)).await,
    }
}

/// Raw response of one timed round trip
#[derive(Debug)]
pub(crate) struct TimedBody {
    /// Body bytes as received, before any parsing
    pub bytes: Vec<u8>,
    pub elapsed: Duration,
}

/// Send a request and read the full body. The clock starts right before
/// dispatch and stops once the last body byte arrived, before parsing.
pub(crate) async fn timed_send(request: reqwest::RequestBuilder) -> Result<TimedBody> {
    let start = Instant::now();
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(transport_error)?;
    let elapsed = start.elapsed();

    if !status.is_success() {
        let snippet: String = String::from_utf8_lossy(&body).chars().take(200).collect();
        return Err(AppError::transport(format!("HTTP {}: {}", status, snippet.trim())));
    }

    Ok(TimedBody { bytes: body.to_vec(), elapsed })
}

/// Parse a received body as JSON
pub(crate) fn parse_body(body: &[u8]) -> Result<serde_json::Value> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::protocol(format!("Response body is not valid JSON: {}", e)))
}

fn transport_error(error: reqwest::Error) -> AppError {
    if error.is_timeout() {
        AppError::transport(format!("Request timed out: {}", error))
    } else if error.is_connect() {
        AppError::transport(format!("Connection failed: {}", error))
    } else {
        AppError::transport(error.to_string())
    }
}

/// Build the long-lived HTTP client of one paradigm
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(crate::defaults::USER_AGENT)
        .build()
        .map_err(|e| AppError::config(format!("Failed to create HTTP client: {}", e)))
}

/// Scoped owner of one paradigm client, released exactly once
pub struct ClientSession {
    client: Option<Box<dyn ApiClient>>,
    api_type: ApiType,
}

impl ClientSession {
    pub fn new(client: Box<dyn ApiClient>) -> Self {
        let api_type = client.api_type();
        Self { client: Some(client), api_type }
    }

    pub fn api_type(&self) -> ApiType {
        self.api_type
    }

    /// Borrow the client; fails once the session has been closed
    pub fn client(&self) -> Result<&dyn ApiClient> {
        self.client
            .as_deref()
            .ok_or_else(|| AppError::internal(format!("{} session already closed", self.api_type)))
    }

    pub fn is_open(&self) -> bool {
        self.client.is_some()
    }

    /// Release the client. Returns false when it was already released.
    pub fn close(&mut self) -> bool {
        match self.client.take() {
            Some(client) => {
                client.shutdown();
                true
            }
            None => false,
        }
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("api_type", &self.api_type)
            .field("open", &self.is_open())
            .finish()
    }
}
