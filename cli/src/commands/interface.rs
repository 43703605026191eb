// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! ABAP interface commands
//!
//! Commands: create, read, write, activate

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use sapcli_core::domain::metadata::AdtCoreData;
use sapcli_core::domain::objects::Interface;
use sapcli_core::{ActivationOptions, Connection};

use super::object::{self, CreateArgs, ObjectGroup, WriteArgs};

#[derive(Subcommand, Debug)]
pub enum InterfaceCommand {
    /// Create an interface
    Create(CreateArgs),

    /// Print the source code of an interface
    Read { name: String },

    /// Change the source code of an interface
    Write(WriteArgs),

    /// Activate interfaces
    Activate {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
}

pub struct InterfaceGroup;

impl ObjectGroup for InterfaceGroup {
    type Object = Interface;

    fn new_object(name: &str, metadata: AdtCoreData) -> Interface {
        Interface::with_metadata(name, metadata)
    }
}

pub async fn handle_command(
    command: InterfaceCommand,
    connection: &dyn Connection,
    options: &ActivationOptions,
) -> Result<()> {
    match command {
        InterfaceCommand::Create(args) => object::create_object::<InterfaceGroup>(connection, &args).await,
        InterfaceCommand::Read { name } => {
            let text = object::read_object_text(&InterfaceGroup, connection, &name).await?;
            println!("{}", text);
            Ok(())
        }
        InterfaceCommand::Write(args) => {
            object::write_object_text(&InterfaceGroup, connection, &args, options).await?;
            Ok(())
        }
        InterfaceCommand::Activate { name } => {
            object::activate_objects(&InterfaceGroup, connection, &name, options).await?;
            println!("{}", "✓ Activation finished".green());
            Ok(())
        }
    }
}
