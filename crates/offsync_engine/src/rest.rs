//! REST remote store.
//!
//! Maps each mutation onto one HTTP request in the row-level REST style:
//! `POST /{table}` with the row, `PATCH /{table}?{column}=eq.{value}` with
//! the patch, `DELETE /{table}?{column}=eq.{value}`.
//!
//! The actual HTTP client is abstracted via [`HttpClient`] so any HTTP
//! library (reqwest, hyper, ...) or an in-process loopback can carry it.

use crate::remote::RemoteStore;
use offsync_protocol::{Mutation, RemoteError, RowFilter};
use parking_lot::RwLock;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use std::fmt;
use std::future::Future;

/// Characters left unescaped in path segments and query values.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// HTTP method of a [`RestRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Create a row.
    Post,
    /// Patch matching rows.
    Patch,
    /// Delete matching rows.
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        })
    }
}

/// One outbound HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL including query.
    pub url: String,
    /// JSON body, if any.
    pub body: Option<String>,
}

/// An HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl RestResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// `Err` means the request never produced a response (DNS, refused
/// connection, timeout).
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response.
    fn send(
        &self,
        request: RestRequest,
    ) -> impl Future<Output = Result<RestResponse, String>> + Send;
}

/// A [`RemoteStore`] speaking row-level REST.
pub struct RestRemote<C: HttpClient> {
    /// Base URL of the REST endpoint (e.g. "https://db.example.com/rest/v1").
    base_url: String,
    /// HTTP client implementation.
    client: C,
    /// Last error message.
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> RestRemote<C> {
    /// Creates a REST remote. A trailing `/` on `base_url` is ignored.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client,
            last_error: RwLock::new(None),
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn set_error(&self, err: &str) {
        *self.last_error.write() = Some(err.to_string());
    }

    fn clear_error(&self) {
        *self.last_error.write() = None;
    }

    /// Builds the request that applies `mutation` to `table`.
    pub fn build_request(&self, table: &str, mutation: &Mutation) -> RestRequest {
        let path = format!(
            "{}/{}",
            self.base_url,
            utf8_percent_encode(table, UNRESERVED)
        );

        match mutation {
            Mutation::Insert { data } => RestRequest {
                method: Method::Post,
                url: path,
                body: Some(Value::Object(data.clone()).to_string()),
            },
            Mutation::Update { data, filter } => RestRequest {
                method: Method::Patch,
                url: format!("{path}?{}", filter_query(filter)),
                body: Some(Value::Object(data.clone()).to_string()),
            },
            Mutation::Delete { filter } => RestRequest {
                method: Method::Delete,
                url: format!("{path}?{}", filter_query(filter)),
                body: None,
            },
        }
    }
}

fn filter_query(filter: &RowFilter) -> String {
    let value = match &filter.value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!(
        "{}=eq.{}",
        utf8_percent_encode(&filter.column, UNRESERVED),
        utf8_percent_encode(&value, UNRESERVED)
    )
}

impl<C: HttpClient> RemoteStore for RestRemote<C> {
    async fn apply(&self, table: &str, mutation: &Mutation) -> Result<(), RemoteError> {
        let request = self.build_request(table, mutation);
        tracing::trace!(method = %request.method, url = %request.url, "sending change");

        let response = self.client.send(request).await.map_err(|e| {
            self.set_error(&e);
            RemoteError::network(e)
        })?;

        if response.is_success() {
            self.clear_error();
            return Ok(());
        }

        let message = if response.body.trim().is_empty() {
            format!("HTTP {}", response.status)
        } else {
            response.body
        };
        self.set_error(&message);
        Err(RemoteError::with_kind(
            message,
            format!("http_{}", response.status),
        ))
    }
}
