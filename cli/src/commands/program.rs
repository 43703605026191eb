// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! ABAP program commands
//!
//! Commands: create, read, write, activate

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use sapcli_core::domain::metadata::AdtCoreData;
use sapcli_core::domain::objects::Program;
use sapcli_core::{ActivationOptions, Connection};

use super::object::{self, CreateArgs, ObjectGroup, WriteArgs};

#[derive(Subcommand, Debug)]
pub enum ProgramCommand {
    /// Create a program
    Create(CreateArgs),

    /// Print the source code of a program
    Read { name: String },

    /// Change the source code of a program
    Write(WriteArgs),

    /// Activate programs
    Activate {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
}

pub struct ProgramGroup;

impl ObjectGroup for ProgramGroup {
    type Object = Program;

    fn new_object(name: &str, metadata: AdtCoreData) -> Program {
        Program::with_metadata(name, metadata)
    }
}

pub async fn handle_command(
    command: ProgramCommand,
    connection: &dyn Connection,
    options: &ActivationOptions,
) -> Result<()> {
    match command {
        ProgramCommand::Create(args) => object::create_object::<ProgramGroup>(connection, &args).await,
        ProgramCommand::Read { name } => {
            let text = object::read_object_text(&ProgramGroup, connection, &name).await?;
            println!("{}", text);
            Ok(())
        }
        ProgramCommand::Write(args) => {
            object::write_object_text(&ProgramGroup, connection, &args, options).await?;
            Ok(())
        }
        ProgramCommand::Activate { name } => {
            object::activate_objects(&ProgramGroup, connection, &name, options).await?;
            println!("{}", "✓ Activation finished".green());
            Ok(())
        }
    }
}
