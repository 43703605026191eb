// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Connection Port
//!
//! Transport-agnostic request/response pair and the trait every connector
//! to an ADT server implements. Paths are relative to the server root
//! (e.g. `/sap/bc/adt/activation`).
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Defines the connector contract used by editors and activation

use async_trait::async_trait;
use reqwest::Method;
use thiserror::Error;

/// HTTP request as issued by the services of this crate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Case-insensitive header lookup
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// HTTP response returned by a connector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub text: String,
}

impl Response {
    pub fn new(status_code: u16, text: impl Into<String>) -> Self {
        Self {
            status_code,
            headers: Vec::new(),
            text: text.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("{method} {url} failed with status {status}: {body}")]
    Http {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("Could not obtain CSRF token: {0}")]
    Csrf(String),
}

/// Connector to an ADT server.
///
/// Requests are awaited one after another by the services; implementations
/// only need interior mutability for session state such as tokens.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Name of the user the connection is authenticated as
    fn user(&self) -> &str;

    async fn execute(&self, request: Request) -> Result<Response, ConnectionError>;
}
