// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared object commands
//!
//! Create, read, write and activate work the same way for every source
//! based object type. A command group only says how objects are built from
//! names and source file names.
//!
//! # Write semantics
//!
//! - `write NAME FILE` writes one object from a file, `write NAME -` reads
//!   the source from stdin.
//! - `write - FILE...` takes each object name from its file name
//!   (`NAME.SUFFIX`); stdin is not allowed then.
//! - `--activate` activates every written object once, in the order the
//!   objects were first written.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use thiserror::Error;
use tracing::info;

use sapcli_core::application::editor::{self, Editor};
use sapcli_core::domain::metadata::AdtCoreData;
use sapcli_core::domain::objects::{RepositoryObject, SourceObject};
use sapcli_core::{activate_all, ActivationOptions, Connection};

/// Object name or source path meaning "derive from file" or "stdin"
pub const DASH: &str = "-";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandLineError {
    #[error("{0} does not match the pattern NAME.SUFFIX")]
    MissingSuffix(String),

    #[error("{0} does not contain NAME from the pattern NAME.SUFFIX")]
    MissingName(String),

    #[error("Source file cannot be - when Object name is - too")]
    StdinWithDerivedName,

    #[error("Source file can be a list only when Object name is -")]
    MultipleSources,

    #[error("Unsupported source file suffix: {0}")]
    UnknownSuffix(String),
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    pub name: String,
    pub description: String,
    pub package: String,

    /// Transport request recording the change
    #[arg(long)]
    pub corrnr: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct WriteArgs {
    /// An object name or - for getting it from the source file name
    pub name: String,

    /// A path or - for stdin; multiple allowed only when name = -
    #[arg(required = true, num_args = 1..)]
    pub source: Vec<String>,

    /// Activate after write
    #[arg(short, long)]
    pub activate: bool,

    /// Transport request recording the change
    #[arg(long)]
    pub corrnr: Option<String>,
}

/// Splits the file name of `path` into the object name and the suffix.
///
/// The object name is the file name up to the first dot, e.g.
/// `./src/zreport.prog.abap` gives `zreport` and `prog.abap`.
pub fn object_name_from_source_file(path: &str) -> Result<(String, String), CommandLineError> {
    let basename = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());

    let Some((name, suffix)) = basename.split_once('.') else {
        return Err(CommandLineError::MissingSuffix(basename));
    };

    if name.is_empty() {
        return Err(CommandLineError::MissingName(basename));
    }

    Ok((name.to_string(), suffix.to_string()))
}

/// Where the source of one written object comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    pub name: String,

    /// `None` reads stdin
    pub path: Option<String>,

    /// Suffix of the source file when the name was derived from it
    pub suffix: Option<String>,
}

impl SourceInput {
    pub fn read(&self) -> Result<String> {
        match &self.path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read source file {}", path)),
            None => std::io::read_to_string(std::io::stdin()).context("Failed to read stdin"),
        }
    }
}

/// Resolves the write arguments into the list of objects to write
pub fn write_inputs(name: &str, sources: &[String]) -> Result<Vec<SourceInput>, CommandLineError> {
    if name == DASH {
        return sources
            .iter()
            .map(|source| {
                if source == DASH {
                    return Err(CommandLineError::StdinWithDerivedName);
                }

                let (name, suffix) = object_name_from_source_file(source)?;
                Ok(SourceInput {
                    name,
                    path: Some(source.clone()),
                    suffix: Some(suffix),
                })
            })
            .collect();
    }

    match sources {
        [source] => Ok(vec![SourceInput {
            name: name.to_string(),
            path: (source != DASH).then(|| source.clone()),
            suffix: None,
        }]),
        _ => Err(CommandLineError::MultipleSources),
    }
}

/// Builds the objects a command group works with
pub trait ObjectGroup {
    type Object: RepositoryObject + SourceObject;

    /// Object to be created with the given metadata
    fn new_object(name: &str, metadata: AdtCoreData) -> Self::Object;

    /// Object addressed by name on the command line
    fn instance(&self, name: &str) -> Box<dyn SourceObject> {
        Box::new(Self::new_object(name, AdtCoreData::default()))
    }

    /// Object whose name was taken from a source file `NAME.SUFFIX`
    fn instance_from_file(&self, name: &str, _suffix: &str) -> Result<Box<dyn SourceObject>, CommandLineError> {
        Ok(self.instance(name))
    }
}

pub async fn create_object<G: ObjectGroup>(connection: &dyn Connection, args: &CreateArgs) -> Result<()> {
    let metadata = AdtCoreData::new_object(&args.package, connection.user());
    let mut object = G::new_object(&args.name, metadata);
    object.set_description(args.description.clone());

    editor::create(connection, &object, args.corrnr.as_deref())
        .await
        .with_context(|| format!("Failed to create {}", args.name))
}

pub async fn read_object_text<G: ObjectGroup>(
    group: &G,
    connection: &dyn Connection,
    name: &str,
) -> Result<String> {
    let object = group.instance(name);

    editor::read_source(connection, object.as_ref())
        .await
        .with_context(|| format!("Failed to read {}", name))
}

/// Writes the sources and returns the names of the activated objects
pub async fn write_object_text<G: ObjectGroup>(
    group: &G,
    connection: &dyn Connection,
    args: &WriteArgs,
    options: &ActivationOptions,
) -> Result<Vec<String>> {
    let inputs = write_inputs(&args.name, &args.source)?;
    let editor = Editor::new(connection).with_corrnr(args.corrnr.clone());

    let mut to_activate: Vec<(String, Box<dyn SourceObject>)> = Vec::new();

    for input in inputs {
        let object = match &input.suffix {
            Some(suffix) => group.instance_from_file(&input.name, suffix)?,
            None => group.instance(&input.name),
        };

        let text = input.read()?;
        editor
            .write(object.as_ref(), &text)
            .await
            .with_context(|| format!("Failed to write {}", input.name))?;

        let name = object.name().to_string();
        match to_activate.iter_mut().find(|(written, _)| *written == name) {
            Some(entry) => entry.1 = object,
            None => to_activate.push((name, object)),
        }
    }

    if !args.activate {
        return Ok(Vec::new());
    }

    let mut activated = Vec::new();
    for (name, object) in to_activate {
        info!("Activating {}", name);
        activate_all(connection, &[object.as_ref()], options)
            .await
            .with_context(|| format!("Failed to activate {}", name))?;
        activated.push(name);
    }

    Ok(activated)
}

pub async fn activate_objects<G: ObjectGroup>(
    group: &G,
    connection: &dyn Connection,
    names: &[String],
    options: &ActivationOptions,
) -> Result<()> {
    for name in names {
        let object = group.instance(name);

        activate_all(connection, &[object.as_ref()], options)
            .await
            .with_context(|| format!("Failed to activate {}", name))?;
    }

    Ok(())
}
