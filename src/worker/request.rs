//! Request and interception types for the fetch path

use crate::fetch::FetchResponse;

/// An application request the worker may intercept.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method. Only `GET` requests are ever intercepted.
    pub method: String,
    /// Absolute request URL.
    pub url: String,
}

impl Request {
    /// Builds a `GET` request for the given URL.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
        }
    }
}

/// Where an intercepted response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Served from the content bucket without touching the network.
    Cache,
    /// Fetched from the network (and possibly stored for next time).
    Network,
}

impl ResponseSource {
    /// Stable lowercase name, used in result records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Network => "network",
        }
    }
}

/// The outcome of an intercepted request.
#[derive(Debug, Clone)]
pub struct Intercepted {
    /// The normalized site-relative resource key.
    pub key: String,
    /// Whether the body came from cache or network.
    pub source: ResponseSource,
    /// The response handed to the caller.
    pub response: FetchResponse,
}
