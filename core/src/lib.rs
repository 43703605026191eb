// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # sapcli core
//!
//! Library behind the `sapcli` command line client for the ABAP Development
//! Tools (ADT) REST API.
//!
//! - [`domain`]: ordered member declarations, element tree, repository
//!   object catalog, activation documents, configuration and the
//!   [`Connection`](domain::connection::Connection) port.
//! - [`application`]: the marshalling engine, the two-pass activation
//!   protocol, the ABAP Unit runner and the object editing services.
//! - [`infrastructure`]: the reqwest HTTP connector.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::activation::{activate, activate_all, ActivationError, ActivationOptions, ActivationOutcome};
pub use application::aunit::{AUnitError, TestRun};
pub use application::editor::{Editor, EditorError};
pub use application::marshal::{deserialize, serialize, MarshalError};
pub use domain::connection::{Connection, ConnectionError, Request, Response};
pub use infrastructure::HttpConnection;
