// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: the marshallable data model and the collaborator contracts.

pub mod activation;
pub mod aunit;
pub mod config;
pub mod connection;
pub mod element;
pub mod member;
pub mod metadata;
pub mod objects;
