// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Recording connection shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use sapcli_core::domain::connection::{Connection, ConnectionError, Request, Response};

/// Replays queued responses (an empty `200` once the queue is drained) and
/// records every executed request.
pub struct MockConnection {
    user: String,
    responses: Mutex<VecDeque<Response>>,
    requests: Mutex<Vec<Request>>,
}

impl MockConnection {
    pub fn new(responses: Vec<Response>) -> Self {
        Self {
            user: "ANZEIGER".to_string(),
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    pub fn request(&self, index: usize) -> Request {
        self.requests.lock()[index].clone()
    }

    /// (method, path) of every request
    pub fn methods(&self) -> Vec<(String, String)> {
        self.requests
            .lock()
            .iter()
            .map(|r| (r.method.to_string(), r.path.clone()))
            .collect()
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn user(&self) -> &str {
        &self.user
    }

    async fn execute(&self, request: Request) -> Result<Response, ConnectionError> {
        self.requests.lock().push(request.clone());

        let response = self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Response::new(200, ""));

        if response.status_code >= 400 {
            return Err(ConnectionError::Http {
                method: request.method.to_string(),
                url: request.path,
                status: response.status_code,
                body: response.text,
            });
        }

        Ok(response)
    }
}

/// Header names of a request, sorted
pub fn header_names(request: &Request) -> Vec<String> {
    let mut names: Vec<_> = request.headers.iter().map(|(n, _)| n.clone()).collect();
    names.sort();
    names
}

/// Parameter names of a request, sorted
pub fn param_names(request: &Request) -> Vec<String> {
    let mut names: Vec<_> = request.params.iter().map(|(n, _)| n.clone()).collect();
    names.sort();
    names
}

pub const LOCK_RESPONSE_OK: &str = r#"<?xml version="1.0" encoding="utf-8"?><asx:abap xmlns:asx="http://www.sap.com/abapxml" version="1.0"><asx:values><DATA><LOCK_HANDLE>win</LOCK_HANDLE></DATA></asx:values></asx:abap>"#;

pub fn lock_response() -> Response {
    Response::new(200, LOCK_RESPONSE_OK)
        .with_header("Content-Type", "application/vnd.sap.as+xml; charset=utf-8")
}
