// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod http_connection;

pub use http_connection::HttpConnection;
