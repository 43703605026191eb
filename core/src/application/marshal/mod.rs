// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Marshalling Engine
//!
//! Converts objects described by a [`Members`](crate::domain::member::Members)
//! declaration to markup text and populates existing objects from markup.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Implements the serializer, renderer and path-indexed deserializer
//!
//! The rendered layout is a compatibility contract: one XML declaration line,
//! one element per line, no indentation, childless elements self-closed and
//! namespace declarations only on the root element.

mod deserializer;
mod serializer;

pub use deserializer::deserialize;
pub use serializer::{object_to_tree, render, serialize, tree_to_xml, XML_DECLARATION};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("Malformed markup at position {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("{0} has no entity descriptor and cannot be a document root")]
    MissingEntity(String),

    #[error("Invalid markup encoding: {0}")]
    Encoding(String),
}
