// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! ABAP Unit Service
//!
//! Runs the unit tests of a repository object and reads back the run
//! results.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Implements the test run request and the results reader
//!
//! # Protocol
//!
//! One `POST /sap/bc/adt/abapunit/testruns` carrying a run configuration
//! that selects the object by URI and enables every risk level and
//! duration. The answer is a run result document:
//!
//! ```text
//! runResult
//!   alerts/alert                                  run-level alerts
//!   program/testClasses/testClass/testMethods/testMethod
//!     alerts/alert(kind, severity)
//!       title
//!       details/detail(text)                      may nest
//!       stack/stackEntry(description)
//! ```
//!
//! Only local names are matched, so the document's prefixes do not matter.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::{debug, info};

use crate::application::marshal::{render, MarshalError};
use crate::domain::activation::WorkbenchObject;
use crate::domain::aunit::{Alert, RunResults, TestClass, TestMethod, TestProgram};
use crate::domain::connection::{Connection, ConnectionError, Request};
use crate::domain::element::Element;
use crate::domain::metadata::{NamespaceSet, XmlNamespace, ADTCORE_NAMESPACE};

pub const TESTRUNS_PATH: &str = "/sap/bc/adt/abapunit/testruns";

pub const AUNIT_NAMESPACE: XmlNamespace = XmlNamespace::new("aunit", "http://www.sap.com/adt/aunit");

#[derive(Debug, Error)]
pub enum AUnitError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("Could not read the test run results: {0}")]
    Marshal(#[from] MarshalError),
}

/// Raw answer of the server together with its parsed form
#[derive(Debug, Clone)]
pub struct TestRun {
    pub xml: String,
    pub results: RunResults,
}

/// Builds the run configuration selecting the object behind `object_uri`
pub fn run_configuration(object_uri: &str) -> String {
    let mut root = Element::new("aunit:runConfiguration");

    let external = root.add_child("external");
    external.add_child("coverage").add_attribute("active", "false");

    let options = root.add_child("options");
    options.add_child("uriType").add_attribute("value", "semantic");

    let strategy = options.add_child("testDeterminationStrategy");
    strategy.add_attribute("sameProgram", "true");
    strategy.add_attribute("assignedTests", "false");
    strategy.add_attribute("appendAssignedTestsPreview", "true");

    let risk_levels = options.add_child("testRiskLevels");
    for level in ["harmless", "dangerous", "critical"] {
        risk_levels.add_attribute(level, "true");
    }

    let durations = options.add_child("testDurations");
    for duration in ["short", "medium", "long"] {
        durations.add_attribute(duration, "true");
    }

    let object_set = root.add_child("adtcore:objectSets").add_child("objectSet");
    object_set.add_attribute("kind", "inclusive");
    object_set
        .add_child("adtcore:objectReferences")
        .add_child("adtcore:objectReference")
        .add_attribute("adtcore:uri", object_uri);

    let mut namespaces = NamespaceSet::new();
    namespaces.register(AUNIT_NAMESPACE);
    namespaces.register(ADTCORE_NAMESPACE);

    render(&root, &namespaces)
}

/// Executes the unit tests of the object
pub async fn run(connection: &dyn Connection, object: &dyn WorkbenchObject) -> Result<TestRun, AUnitError> {
    let uri = object.full_adt_uri();
    debug!("Running ABAP Unit tests of {}", uri);

    let request = Request::post(TESTRUNS_PATH)
        .header("Accept", "application/xml")
        .header("Content-Type", "application/xml")
        .body(run_configuration(&uri));

    let response = connection.execute(request).await?;
    let results = parse_run_results(&response.text)?;

    info!(
        "ABAP Unit run of {} finished with {} critical test methods",
        object.name(),
        results.critical_count()
    );

    Ok(TestRun {
        xml: response.text,
        results,
    })
}

/// Reads a run result document
pub fn parse_run_results(xml: &str) -> Result<RunResults, MarshalError> {
    let mut reader = Reader::from_str(xml);
    let mut builder = ResultsBuilder::default();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| syntax_error(&reader, e))?;

        match event {
            Event::Start(start) => builder.open(&reader, &start)?,
            Event::Empty(start) => {
                builder.open(&reader, &start)?;
                builder.close(start.local_name().as_ref());
            }
            Event::End(end) => builder.close(end.local_name().as_ref()),
            Event::Text(text) if builder.in_title => {
                let text = text.unescape().map_err(|e| syntax_error(&reader, e))?;
                builder.title_text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(builder.results)
}

#[derive(Default)]
struct ResultsBuilder {
    results: RunResults,
    in_method: bool,
    in_title: bool,
    alert: Option<Alert>,
}

impl ResultsBuilder {
    fn open(&mut self, reader: &Reader<&[u8]>, start: &BytesStart) -> Result<(), MarshalError> {
        match start.local_name().as_ref() {
            b"program" => self.results.programs.push(TestProgram {
                name: attribute(reader, start, b"name")?.unwrap_or_default(),
                test_classes: Vec::new(),
            }),
            b"testClass" => {
                let name = attribute(reader, start, b"name")?.unwrap_or_default();
                if let Some(program) = self.results.programs.last_mut() {
                    program.test_classes.push(TestClass {
                        name,
                        test_methods: Vec::new(),
                    });
                }
            }
            b"testMethod" => {
                let name = attribute(reader, start, b"name")?.unwrap_or_default();
                let class = self
                    .results
                    .programs
                    .last_mut()
                    .and_then(|program| program.test_classes.last_mut());
                if let Some(class) = class {
                    class.test_methods.push(TestMethod {
                        name,
                        alerts: Vec::new(),
                    });
                    self.in_method = true;
                }
            }
            b"alert" => {
                self.alert = Some(Alert {
                    kind: attribute(reader, start, b"kind")?.unwrap_or_default(),
                    severity: attribute(reader, start, b"severity")?.unwrap_or_default(),
                    ..Default::default()
                });
            }
            b"title" => self.in_title = self.alert.is_some(),
            b"detail" => {
                if let Some(text) = attribute(reader, start, b"text")? {
                    if let Some(alert) = self.alert.as_mut() {
                        alert.details.push(text);
                    }
                }
            }
            b"stackEntry" => {
                if let Some(description) = attribute(reader, start, b"description")? {
                    if let Some(alert) = self.alert.as_mut() {
                        alert.stack.push(description);
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn close(&mut self, local_name: &[u8]) {
        match local_name {
            b"testMethod" => self.in_method = false,
            b"title" => {
                self.in_title = false;
                if let Some(alert) = self.alert.as_mut() {
                    alert.title = alert.title.trim().to_string();
                }
            }
            b"alert" => {
                let Some(alert) = self.alert.take() else {
                    return;
                };

                match self.current_method() {
                    Some(method) => method.alerts.push(alert),
                    None => self.results.alerts.push(alert),
                }
            }
            _ => {}
        }
    }

    fn title_text(&mut self, text: &str) {
        if let Some(alert) = self.alert.as_mut() {
            alert.title.push_str(text);
        }
    }

    fn current_method(&mut self) -> Option<&mut TestMethod> {
        if !self.in_method {
            return None;
        }

        self.results
            .programs
            .last_mut()
            .and_then(|program| program.test_classes.last_mut())
            .and_then(|class| class.test_methods.last_mut())
    }
}

fn attribute(
    reader: &Reader<&[u8]>,
    start: &BytesStart,
    local_name: &[u8],
) -> Result<Option<String>, MarshalError> {
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| syntax_error(reader, e))?;
        if attribute.key.local_name().as_ref() == local_name {
            let value = attribute
                .unescape_value()
                .map_err(|e| syntax_error(reader, e))?;
            return Ok(Some(value.into_owned()));
        }
    }

    Ok(None)
}

fn syntax_error(reader: &Reader<&[u8]>, error: impl std::fmt::Display) -> MarshalError {
    MarshalError::Syntax {
        position: reader.buffer_position() as u64,
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_outside_methods_is_run_level() {
        let results = parse_run_results(
            r#"<runResult><alerts><alert kind="noTestClasses" severity="tolerable"><title>
  No tests
</title></alert></alerts></runResult>"#,
        )
        .unwrap();

        assert_eq!(results.alerts.len(), 1);
        assert_eq!(results.alerts[0].title, "No tests");
        assert!(results.programs.is_empty());
    }

    #[test]
    fn test_alert_after_method_closed_is_run_level() {
        let results = parse_run_results(
            r#"<runResult><program name="ZP"><testClasses><testClass name="LTCL"><testMethods>
<testMethod name="M"/>
</testMethods></testClass></testClasses></program>
<alerts><alert kind="warning" severity="tolerable"><title>late</title></alert></alerts>
</runResult>"#,
        )
        .unwrap();

        assert_eq!(results.alerts.len(), 1);
        assert!(results.programs[0].test_classes[0].test_methods[0].alerts.is_empty());
    }

    #[test]
    fn test_unclosed_document_is_syntax_error() {
        let error = parse_run_results("<runResult><program name=\"ZP\"></runResult>").unwrap_err();
        assert!(matches!(error, MarshalError::Syntax { .. }));
    }
}
