// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! ADT HTTP Connection
//!
//! reqwest-backed implementation of the [`Connection`] port talking to the
//! ICF service of an ABAP system.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements the connector with session cookies, basic
//!   authentication and CSRF protection
//!
//! # Session handling
//!
//! - Every request carries `sap-client` and basic authentication.
//! - The cookie store keeps the ICF session alive between requests.
//! - Before the first modifying request a CSRF token is fetched from
//!   `GET /sap/bc/adt/discovery` with `x-csrf-token: Fetch`. When the server
//!   rejects a cached token (`403` with `x-csrf-token: Required`) the token is
//!   fetched again and the request repeated once.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, Method, StatusCode};
use tracing::debug;

use crate::domain::config::ConnectionConfig;
use crate::domain::connection::{Connection, ConnectionError, Request, Response};

pub const DISCOVERY_PATH: &str = "/sap/bc/adt/discovery";

const CSRF_HEADER: &str = "x-csrf-token";

/// HTTP connector to an ADT server
pub struct HttpConnection {
    client: Client,

    /// Server base URL (e.g. "https://vhcalnplci:44300")
    base_url: String,

    sap_client: String,
    user: String,
    password: String,

    csrf_token: Mutex<Option<String>>,
}

impl HttpConnection {
    pub fn new(
        config: &ConnectionConfig,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConnectionError> {
        let scheme = if config.ssl { "https" } else { "http" };
        let base_url = format!("{}://{}:{}", scheme, config.ashost, config.port);

        let client = Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(!config.verify)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;

        Ok(Self::with_client(client, base_url, config.client.clone(), user, password))
    }

    /// Connector against an explicit base URL
    pub fn with_base_url(
        base_url: impl Into<String>,
        sap_client: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConnectionError> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;

        Ok(Self::with_client(client, base_url.into(), sap_client.into(), user, password))
    }

    fn with_client(
        client: Client,
        base_url: String,
        sap_client: String,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            sap_client,
            user: user.into(),
            password: password.into(),
            csrf_token: Mutex::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build full URL for a server path
    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request_builder(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.build_url(path))
            .query(&[("sap-client", self.sap_client.as_str())])
            .basic_auth(&self.user, Some(&self.password))
    }

    async fn csrf_token(&self) -> Result<String, ConnectionError> {
        let cached = self.csrf_token.lock().clone();
        if let Some(token) = cached {
            return Ok(token);
        }

        let token = self.fetch_csrf_token().await?;
        *self.csrf_token.lock() = Some(token.clone());
        Ok(token)
    }

    async fn fetch_csrf_token(&self) -> Result<String, ConnectionError> {
        debug!("Fetching CSRF token");

        let response = self
            .request_builder(Method::GET, DISCOVERY_PATH)
            .header(CSRF_HEADER, "Fetch")
            .send()
            .await
            .map_err(|e| ConnectionError::Csrf(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectionError::Csrf(format!(
                "{} {} returned {}",
                Method::GET,
                DISCOVERY_PATH,
                status
            )));
        }

        response
            .headers()
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ConnectionError::Csrf("the server did not return a token".to_string()))
    }

    async fn send(
        &self,
        request: &Request,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ConnectionError> {
        let mut builder = self.request_builder(request.method.clone(), &request.path);

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(token) = token {
            builder = builder.header(CSRF_HEADER, token);
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        builder
            .send()
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))
    }
}

fn is_modifying(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}

fn token_rejected(response: &reqwest::Response) -> bool {
    response.status() == StatusCode::FORBIDDEN
        && response
            .headers()
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.eq_ignore_ascii_case("required"))
}

#[async_trait]
impl Connection for HttpConnection {
    fn user(&self) -> &str {
        &self.user
    }

    async fn execute(&self, request: Request) -> Result<Response, ConnectionError> {
        debug!("{} {}", request.method, request.path);

        let response = if is_modifying(&request.method) {
            let token = self.csrf_token().await?;
            let response = self.send(&request, Some(&token)).await?;

            if token_rejected(&response) {
                debug!("CSRF token rejected, fetching a new one");
                *self.csrf_token.lock() = None;
                let token = self.csrf_token().await?;
                self.send(&request, Some(&token)).await?
            } else {
                response
            }
        } else {
            self.send(&request, None).await?
        };

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        let text = response
            .text()
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;

        if status.as_u16() >= 400 {
            return Err(ConnectionError::Http {
                method: request.method.to_string(),
                url: self.build_url(&request.path),
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(Response {
            status_code: status.as_u16(),
            headers,
            text,
        })
    }
}
