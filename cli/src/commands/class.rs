// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! ABAP class commands
//!
//! Commands: create, read, write, activate, attributes

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use colored::Colorize;

use sapcli_core::application::editor;
use sapcli_core::domain::metadata::AdtCoreData;
use sapcli_core::domain::objects::{Class, IncludeKind, RepositoryObject, SourceObject};
use sapcli_core::{ActivationOptions, Connection};

use super::object::{self, CommandLineError, CreateArgs, ObjectGroup, WriteArgs};

/// Source part of a class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SourceType {
    #[default]
    Main,
    Definitions,
    Implementations,
    Testclasses,
}

impl SourceType {
    fn include(self) -> Option<IncludeKind> {
        match self {
            SourceType::Main => None,
            SourceType::Definitions => Some(IncludeKind::Definitions),
            SourceType::Implementations => Some(IncludeKind::Implementations),
            SourceType::Testclasses => Some(IncludeKind::TestClasses),
        }
    }

    /// Source part stored in a file with the given suffix
    pub fn from_suffix(suffix: &str) -> Result<Self, CommandLineError> {
        match suffix {
            "clas.abap" => Ok(SourceType::Main),
            "clas.locals_def.abap" => Ok(SourceType::Definitions),
            "clas.locals_imp.abap" => Ok(SourceType::Implementations),
            "clas.testclasses.abap" => Ok(SourceType::Testclasses),
            other => Err(CommandLineError::UnknownSuffix(other.to_string())),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ClassCommand {
    /// Create a class
    Create(CreateArgs),

    /// Print the source code of a class
    Read {
        name: String,

        #[arg(long = "type", value_enum, default_value_t = SourceType::Main)]
        source_type: SourceType,
    },

    /// Change the source code of a class
    Write {
        #[arg(long = "type", value_enum, default_value_t = SourceType::Main)]
        source_type: SourceType,

        #[command(flatten)]
        args: WriteArgs,
    },

    /// Activate classes
    Activate {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Print basic attributes of a class
    Attributes { name: String },
}

/// Classes addressed by name, the main source or one of the includes
pub struct ClassGroup {
    source_type: SourceType,
}

impl ClassGroup {
    pub fn new(source_type: SourceType) -> Self {
        Self { source_type }
    }

    fn part(class: Class, source_type: SourceType) -> Box<dyn SourceObject> {
        match source_type.include() {
            Some(kind) => Box::new(class.include(kind)),
            None => Box::new(class),
        }
    }
}

impl ObjectGroup for ClassGroup {
    type Object = Class;

    fn new_object(name: &str, metadata: AdtCoreData) -> Class {
        Class::with_metadata(name, metadata)
    }

    fn instance(&self, name: &str) -> Box<dyn SourceObject> {
        Self::part(Class::new(name), self.source_type)
    }

    fn instance_from_file(&self, name: &str, suffix: &str) -> Result<Box<dyn SourceObject>, CommandLineError> {
        Ok(Self::part(Class::new(name), SourceType::from_suffix(suffix)?))
    }
}

pub async fn handle_command(
    command: ClassCommand,
    connection: &dyn Connection,
    options: &ActivationOptions,
) -> Result<()> {
    match command {
        ClassCommand::Create(args) => object::create_object::<ClassGroup>(connection, &args).await,
        ClassCommand::Read { name, source_type } => {
            let text = object::read_object_text(&ClassGroup::new(source_type), connection, &name).await?;
            println!("{}", text);
            Ok(())
        }
        ClassCommand::Write { source_type, args } => {
            object::write_object_text(&ClassGroup::new(source_type), connection, &args, options).await?;
            Ok(())
        }
        ClassCommand::Activate { name } => {
            object::activate_objects(&ClassGroup::new(SourceType::Main), connection, &name, options)
                .await?;
            println!("{}", "✓ Activation finished".green());
            Ok(())
        }
        ClassCommand::Attributes { name } => {
            let class = fetch_class(connection, &name).await?;
            print!("{}", format_attributes(&class));
            Ok(())
        }
    }
}

async fn fetch_class(connection: &dyn Connection, name: &str) -> Result<Class> {
    let mut class = Class::new(name);

    editor::fetch(connection, &mut class)
        .await
        .with_context(|| format!("Failed to fetch class {}", name))?;

    Ok(class)
}

pub fn format_attributes(class: &Class) -> String {
    let metadata = class.metadata();

    format!(
        "Name       : {}\nDescription: {}\nResponsible: {}\nPackage    : {}\n",
        class.object_core().name,
        class.description().unwrap_or_default(),
        metadata.responsible.as_deref().unwrap_or_default(),
        metadata.package().unwrap_or_default(),
    )
}
