// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for sapcli

pub mod aunit;
pub mod class;
pub mod interface;
pub mod object;
pub mod package;
pub mod program;

#[cfg(test)]
pub(crate) mod testing;

pub use self::aunit::AUnitCommand;
pub use self::class::ClassCommand;
pub use self::interface::InterfaceCommand;
pub use self::package::PackageCommand;
pub use self::program::ProgramCommand;
