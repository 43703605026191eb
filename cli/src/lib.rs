// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! sapcli library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Implements argument parsing adapters on top of `sapcli_core`

pub mod commands;
pub mod connection;
pub mod logging;
