// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application layer: marshalling engine and the services built on it.

pub mod activation;
pub mod aunit;
pub mod editor;
pub mod marshal;
