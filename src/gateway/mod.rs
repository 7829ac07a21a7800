//! Remote document store gateway
//!
//! This module defines the [`RemoteGateway`] trait: a stateless transport
//! that performs one parameterized HTTP verb against a keyed JSON document
//! store and returns the decoded JSON payload. Concrete implementations live
//! in submodules:
//!
//! - [`http::HttpGateway`] -- `reqwest`-backed implementation.
//! - `fake::FakeGateway` -- scripted in-process fake used in tests
//!   (cfg(test) only).
//!
//! # Wire layout
//!
//! ```text
//! GET    <collection>.json[?orderBy="ownerId"&equalTo="<uid>"][&auth=<token>]
//! POST   <collection>.json?auth=<token>         -> { "name": <generatedKey> }
//! PUT    <collection>/<id>.json?auth=<token>
//! DELETE <collection>/<id>.json?auth=<token>
//! ```
//!
//! Record ids must be valid store keys (see [`check_key`]); the HTTP
//! implementation percent-encodes every path segment it sends.
//!
//! Images do not live in the document store. [`ImageStore`] uploads them to
//! a separate endpoint that answers with the public URL.

use crate::error::{Result, StaybookError};

pub mod http;

#[cfg(test)]
pub mod fake;

/// HTTP verb of a gateway request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(verb)
    }
}

/// A single request against the document store.
///
/// `path` is relative to the store root (`offered-places.json`,
/// `my-bookings/-Nx1.json`). Query parameters keep their insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl GatewayRequest {
    fn new(method: Method, path: impl Into<String>, body: Option<serde_json::Value>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path, None)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::Post, path, Some(body))
    }

    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::Put, path, Some(body))
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path, None)
    }

    /// Appends a query parameter.
    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// First value of the named query parameter, if any.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Path of a whole collection (`offered-places.json`).
pub fn collection_path(collection: &str) -> String {
    format!("{}.json", collection)
}

/// Longest key the store accepts, in bytes.
pub const MAX_KEY_LEN: usize = 768;

/// Rejects ids the store cannot hold as a key.
///
/// Keys are non-empty, at most [`MAX_KEY_LEN`] bytes and free of
/// `. $ # [ ] /` and ASCII control characters.
///
/// # Errors
///
/// Returns [`StaybookError::InvalidInput`] naming the offending id.
pub fn check_key(id: &str) -> Result<()> {
    let forbidden = |c: char| matches!(c, '.' | '$' | '#' | '[' | ']' | '/') || c.is_ascii_control();
    if id.is_empty() || id.len() > MAX_KEY_LEN || id.contains(forbidden) {
        return Err(StaybookError::InvalidInput(format!("'{}' is not a valid record id", id)).into());
    }
    Ok(())
}

/// Path of a single record (`offered-places/<id>.json`).
///
/// # Errors
///
/// Fails like [`check_key`] when `id` is not a valid key.
pub fn record_path(collection: &str, id: &str) -> Result<String> {
    check_key(id)?;
    Ok(format!("{}/{}.json", collection, id))
}

/// Stateless transport to the remote document store.
///
/// Implementations return the response body decoded as JSON; an empty body
/// decodes to `null`. Non-success statuses surface as
/// [`crate::error::StaybookError::Transport`].
#[async_trait::async_trait]
pub trait RemoteGateway: Send + Sync + std::fmt::Debug {
    /// Performs `request` and returns the decoded payload.
    async fn execute(&self, request: GatewayRequest) -> Result<serde_json::Value>;
}

/// Image bytes to upload, sent as the `image` form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Where the image endpoint stored an upload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub image_url: String,
    pub image_path: String,
}

/// Upload endpoint for place images.
///
/// The token travels as a bearer `Authorization` header rather than as a
/// query parameter.
#[async_trait::async_trait]
pub trait ImageStore: Send + Sync + std::fmt::Debug {
    async fn store(&self, image: ImageUpload, token: &str) -> Result<StoredImage>;
}
