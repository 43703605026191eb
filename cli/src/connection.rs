// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Connection options
//!
//! Merges the configuration file, `SAP_*` environment variables and command
//! line flags (in that order of increasing precedence) and opens the HTTP
//! connection. Missing credentials are asked for on the terminal.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dialoguer::{Input, Password};

use sapcli_core::domain::config::{ConnectionConfig, SapConfig};
use sapcli_core::HttpConnection;

#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Application server host name
    #[arg(long, global = true)]
    pub ashost: Option<String>,

    /// SAP client (three digits)
    #[arg(long, global = true)]
    pub client: Option<String>,

    /// HTTP(S) port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Use plain HTTP
    #[arg(long, global = true)]
    pub no_ssl: bool,

    /// Do not verify the server certificate
    #[arg(long, global = true)]
    pub skip_ssl_validation: bool,

    #[arg(long, global = true)]
    pub user: Option<String>,

    #[arg(long, global = true)]
    pub password: Option<String>,
}

impl ConnectionArgs {
    /// Overrides configuration values with the flags given on the command line
    pub fn apply(&self, config: &mut ConnectionConfig) {
        if let Some(ashost) = &self.ashost {
            config.ashost = ashost.clone();
        }

        if let Some(client) = &self.client {
            config.client = client.clone();
        }

        if let Some(port) = self.port {
            config.port = port;
        }

        if self.no_ssl {
            config.ssl = false;
        }

        if self.skip_ssl_validation {
            config.verify = false;
        }

        if let Some(user) = &self.user {
            config.user = Some(user.clone());
        }

        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
    }
}

/// Loads, overrides and validates the configuration
pub fn load_config(args: &ConnectionArgs) -> Result<SapConfig> {
    let mut config =
        SapConfig::load_or_default(args.config.clone()).context("Failed to load configuration")?;

    args.apply(&mut config.connection);

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

/// Source of credentials missing from the configuration
pub trait Prompter {
    fn user(&self) -> Result<String>;
    fn password(&self) -> Result<String>;
}

/// Asks on the terminal, the password without echo
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn user(&self) -> Result<String> {
        Input::<String>::new()
            .with_prompt("Login")
            .interact_text()
            .context("Failed to read the user name")
    }

    fn password(&self) -> Result<String> {
        Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read the password")
    }
}

/// User and password from the configuration, prompting for the missing ones
pub fn credentials(config: &ConnectionConfig, prompter: &dyn Prompter) -> Result<(String, String)> {
    let user = match &config.user {
        Some(user) => user.clone(),
        None => prompter.user()?,
    };

    let password = match &config.password {
        Some(password) => password.clone(),
        None => prompter.password()?,
    };

    Ok((user, password))
}

pub fn connect(config: &ConnectionConfig, prompter: &dyn Prompter) -> Result<HttpConnection> {
    let (user, password) = credentials(config, prompter)?;

    HttpConnection::new(config, user, password).context("Failed to create the HTTP client")
}
