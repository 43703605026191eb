// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! ABAP Unit Results
//!
//! Outcome of an ABAP Unit test run: run-level alerts plus the tested
//! programs, their test classes and test methods.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements the test run result model and method verdicts

use std::fmt;

const CRITICAL: &str = "critical";
const TOLERABLE: &str = "tolerable";

/// Message the test framework attached to a run or a test method
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alert {
    pub kind: String,
    pub severity: String,
    pub title: String,

    /// Detail lines, nested details flattened in document order
    pub details: Vec<String>,

    /// Stack frame descriptions, innermost first
    pub stack: Vec<String>,
}

impl Alert {
    pub fn is_critical(&self) -> bool {
        self.severity == CRITICAL
    }

    pub fn is_tolerable(&self) -> bool {
        self.severity == TOLERABLE
    }
}

/// Verdict of one test method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Ok,
    Skip,
    Err,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TestStatus::Ok => "OK",
            TestStatus::Skip => "SKIP",
            TestStatus::Err => "ERR",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestMethod {
    pub name: String,
    pub alerts: Vec<Alert>,
}

impl TestMethod {
    /// A critical alert fails the method, a tolerable one skips it
    pub fn status(&self) -> TestStatus {
        if self.alerts.iter().any(Alert::is_critical) {
            TestStatus::Err
        } else if self.alerts.iter().any(Alert::is_tolerable) {
            TestStatus::Skip
        } else {
            TestStatus::Ok
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestClass {
    pub name: String,
    pub test_methods: Vec<TestMethod>,
}

/// Tested program (class pool, report, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestProgram {
    pub name: String,
    pub test_classes: Vec<TestClass>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResults {
    pub alerts: Vec<Alert>,
    pub programs: Vec<TestProgram>,
}

impl RunResults {
    /// Every test method with its program and class
    pub fn test_methods(&self) -> impl Iterator<Item = (&TestProgram, &TestClass, &TestMethod)> {
        self.programs.iter().flat_map(|program| {
            program.test_classes.iter().flat_map(move |class| {
                class
                    .test_methods
                    .iter()
                    .map(move |method| (program, class, method))
            })
        })
    }

    /// Number of failed test methods
    pub fn critical_count(&self) -> usize {
        self.test_methods()
            .filter(|(_, _, method)| method.status() == TestStatus::Err)
            .count()
    }
}
