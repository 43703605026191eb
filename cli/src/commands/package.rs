// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! ABAP package commands
//!
//! Commands: create

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use sapcli_core::application::editor;
use sapcli_core::domain::metadata::AdtCoreData;
use sapcli_core::domain::objects::{Package, RepositoryObject};
use sapcli_core::Connection;

#[derive(Args, Debug, Clone)]
pub struct PackageCreateArgs {
    pub name: String,
    pub description: String,

    /// Parent package name
    #[arg(long)]
    pub super_package: Option<String>,

    /// Application component
    #[arg(long)]
    pub app_component: Option<String>,

    /// Software component
    #[arg(long, default_value = "LOCAL")]
    pub software_component: String,

    /// Transport layer
    #[arg(long)]
    pub transport_layer: Option<String>,

    /// Transport request recording the change
    #[arg(long)]
    pub corrnr: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum PackageCommand {
    /// Create a development package
    Create(PackageCreateArgs),
}

pub async fn handle_command(command: PackageCommand, connection: &dyn Connection) -> Result<()> {
    match command {
        PackageCommand::Create(args) => create(connection, &args).await,
    }
}

/// Development package described by the create arguments
pub fn build_package(args: &PackageCreateArgs, responsible: &str) -> Package {
    let name = args.name.to_uppercase();

    let mut metadata = AdtCoreData::new_object(&name, responsible);
    metadata.responsible = Some(responsible.to_string());

    let mut package = Package::with_metadata(&name, metadata);
    package.set_description(args.description.clone());
    package.set_package_type("development");
    package.set_software_component(args.software_component.clone());

    if let Some(super_package) = &args.super_package {
        package.set_super_package(super_package.to_uppercase());
    }

    if let Some(app_component) = &args.app_component {
        package.set_app_component(app_component.to_uppercase());
    }

    if let Some(transport_layer) = &args.transport_layer {
        package.set_transport_layer(transport_layer.to_uppercase());
    }

    package
}

async fn create(connection: &dyn Connection, args: &PackageCreateArgs) -> Result<()> {
    let package = build_package(args, connection.user());

    editor::create(connection, &package, args.corrnr.as_deref())
        .await
        .with_context(|| format!("Failed to create package {}", args.name))?;

    println!("{}", format!("✓ Package {} created", args.name.to_uppercase()).green());
    Ok(())
}
