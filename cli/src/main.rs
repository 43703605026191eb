// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # sapcli
//!
//! Command line client for the ABAP Development Tools (ADT) REST interface.
//!
//! ## Commands
//!
//! - `sapcli class create|read|write|activate|attributes`
//! - `sapcli program create|read|write|activate`
//! - `sapcli interface create|read|write|activate`
//! - `sapcli package create`
//! - `sapcli aunit run`
//!
//! Connection options are global and may appear after any subcommand.

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

use sapcli::commands::{self, AUnitCommand, ClassCommand, InterfaceCommand, PackageCommand, ProgramCommand};
use sapcli::connection::{self, ConnectionArgs, TerminalPrompter};
use sapcli::logging::init_logging;
use sapcli_core::ActivationOptions;

/// Work with ABAP repository objects over ADT
#[derive(Parser)]
#[command(name = "sapcli")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// More output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Log level (trace, debug, info, warn, error); overrides -v
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// ABAP classes
    #[command(name = "class")]
    Class {
        #[command(subcommand)]
        command: ClassCommand,
    },

    /// ABAP programs
    #[command(name = "program")]
    Program {
        #[command(subcommand)]
        command: ProgramCommand,
    },

    /// ABAP interfaces
    #[command(name = "interface")]
    Interface {
        #[command(subcommand)]
        command: InterfaceCommand,
    },

    /// ABAP development packages
    #[command(name = "package")]
    Package {
        #[command(subcommand)]
        command: PackageCommand,
    },

    /// ABAP Unit test runs
    #[command(name = "aunit")]
    Aunit {
        #[command(subcommand)]
        command: AUnitCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_level.as_deref())?;

    let Some(command) = cli.command else {
        eprintln!("{}", "No command specified. Use --help for usage.".yellow());
        std::process::exit(1);
    };

    let config = connection::load_config(&cli.connection)?;
    debug!(
        "Connecting to {}:{} client {}",
        config.connection.ashost, config.connection.port, config.connection.client
    );

    let conn = connection::connect(&config.connection, &TerminalPrompter)?;
    let options = ActivationOptions {
        deleted_objects: config.activation.deleted_objects,
    };

    match command {
        Commands::Class { command } => commands::class::handle_command(command, &conn, &options).await,
        Commands::Program { command } => {
            commands::program::handle_command(command, &conn, &options).await
        }
        Commands::Interface { command } => {
            commands::interface::handle_command(command, &conn, &options).await
        }
        Commands::Package { command } => commands::package::handle_command(command, &conn).await,
        Commands::Aunit { command } => {
            let critical = commands::aunit::handle_command(command, &conn).await?;
            if critical > 0 {
                eprintln!("{}", format!("✗ {} test methods failed", critical).red());
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
