// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Recording connection for command tests

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use sapcli_core::{Connection, ConnectionError, Request, Response};

const LOCK_RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?><asx:abap xmlns:asx="http://www.sap.com/abapxml" version="1.0"><asx:values><DATA><LOCK_HANDLE>win</LOCK_HANDLE></DATA></asx:values></asx:abap>"#;

/// Answers lock requests with a lock handle and everything else with an
/// empty `200`, unless a response was queued.
pub struct RecordingConnection {
    queued: Mutex<VecDeque<Response>>,
    requests: Mutex<Vec<Request>>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_responses(responses: Vec<Response>) -> Self {
        Self {
            queued: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    /// "METHOD path" of every request
    pub fn calls(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    fn user(&self) -> &str {
        "developer"
    }

    async fn execute(&self, request: Request) -> Result<Response, ConnectionError> {
        self.requests.lock().push(request.clone());

        if let Some(response) = self.queued.lock().pop_front() {
            return Ok(response);
        }

        if request.param_value("_action") == Some("LOCK") {
            return Ok(Response::new(200, LOCK_RESPONSE));
        }

        Ok(Response::new(200, ""))
    }
}
