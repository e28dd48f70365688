//! HTTP client abstraction for tile downloads
//!
//! The fetcher only needs a status code and a body, so the trait exposes
//! exactly that and keeps transport failures separate from HTTP statuses.
//! Tests swap in an in-process implementation.

use std::fmt;
use std::time::Duration;

use crate::errors::NetworkError;

/// Default User-Agent string for tile requests.
/// Some tile servers reject requests without a browser-like User-Agent.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// A request that never produced a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Timeout(String),
    Connection(String),
    Body(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Timeout(msg) => write!(f, "timed out: {}", msg),
            TransportError::Connection(msg) => write!(f, "connection failed: {}", msg),
            TransportError::Body(msg) => write!(f, "failed to read body: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// Blocking GET, shared across fetch workers
pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// Real HTTP client implementation using reqwest
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with a per-request timeout and User-Agent
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, NetworkError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| NetworkError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(e.to_string())
            } else {
                TransportError::Connection(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse { status, body: body.to_vec() })
    }
}
