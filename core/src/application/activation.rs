// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Activation Service
//!
//! Two-pass activation of repository objects. The pre-audit pass submits the
//! targets; when the server answers with an inactive-objects report, the
//! still inactive dependents are submitted in one final pass.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Implements the activation protocol state machine
//!
//! # Protocol
//!
//! ```text
//! Init -> PreAudit -> (dependents?) Final -> Done
//! ```
//!
//! Each pass is one `POST /sap/bc/adt/activation` with the parameters
//! `method=activate` and `preauditRequested=true|false`. A response is
//! interpreted as follows:
//!
//! - inactive-objects report content type: parse the report
//! - empty body: the pass succeeded
//! - anything else: the server reported a failure
//!
//! At most two requests are sent per call and nothing is retried.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::marshal::{deserialize, serialize, MarshalError};
use crate::domain::activation::{
    DeletedObjectPolicy, InactiveObjects, ObjectReference, ObjectReferences, WorkbenchObject,
    INACTIVE_OBJECTS_MEDIA_TYPE,
};
use crate::domain::connection::{Connection, ConnectionError, Request, Response};

pub const ACTIVATION_PATH: &str = "/sap/bc/adt/activation";

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("Could not activate the object {name}: {response}")]
    Failed { name: String, response: String },

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("Could not process the activation documents: {0}")]
    Marshal(#[from] MarshalError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationPass {
    PreAudit,
    Final,
}

#[derive(Debug, Clone, Default)]
pub struct ActivationOptions {
    pub deleted_objects: DeletedObjectPolicy,
}

/// What an activation call did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationOutcome {
    pub passes: Vec<ActivationPass>,

    /// References submitted in the final pass
    pub dependents: Vec<ObjectReference>,
}

enum ActivationState {
    Init,
    PreAudit(ObjectReferences),
    Final(ObjectReferences),
    Done,
}

/// Activates one object with the default options
pub async fn activate(
    connection: &dyn Connection,
    object: &dyn WorkbenchObject,
) -> Result<ActivationOutcome, ActivationError> {
    activate_all(connection, &[object], &ActivationOptions::default()).await
}

/// Activates several objects in one protocol run
pub async fn activate_all(
    connection: &dyn Connection,
    objects: &[&dyn WorkbenchObject],
    options: &ActivationOptions,
) -> Result<ActivationOutcome, ActivationError> {
    let mut outcome = ActivationOutcome::default();

    if objects.is_empty() {
        warn!("Nothing to activate");
        return Ok(outcome);
    }

    let name = objects
        .iter()
        .map(|object| object.name())
        .collect::<Vec<_>>()
        .join(", ");

    let mut state = ActivationState::Init;

    loop {
        state = match state {
            ActivationState::Init => ActivationState::PreAudit(ObjectReferences::new(
                objects
                    .iter()
                    .map(|object| ObjectReference::for_object(*object))
                    .collect(),
            )),
            ActivationState::PreAudit(references) => {
                info!("Activating {} (pre-audit)", name);
                outcome.passes.push(ActivationPass::PreAudit);

                match submit(connection, &references, true, &name).await? {
                    Some(report) => {
                        let dependents = inactive_dependents(&report, options.deleted_objects);
                        if dependents.is_empty() {
                            ActivationState::Done
                        } else {
                            ActivationState::Final(dependents)
                        }
                    }
                    None => ActivationState::Done,
                }
            }
            ActivationState::Final(references) => {
                info!("Activating {} inactive objects of {}", references.len(), name);
                outcome.passes.push(ActivationPass::Final);

                if let Some(report) = submit(connection, &references, false, &name).await? {
                    warn!(
                        "{} objects are still inactive after activating {}",
                        report.entries.len(),
                        name
                    );
                }

                outcome.dependents = references.references;
                ActivationState::Done
            }
            ActivationState::Done => return Ok(outcome),
        };
    }
}

async fn submit(
    connection: &dyn Connection,
    references: &ObjectReferences,
    preaudit: bool,
    name: &str,
) -> Result<Option<InactiveObjects>, ActivationError> {
    let body = serialize(references)?;

    let request = Request::post(ACTIVATION_PATH)
        .param("method", "activate")
        .param("preauditRequested", if preaudit { "true" } else { "false" })
        .header("Accept", "application/xml")
        .header("Content-Type", "application/xml")
        .body(body);

    let response = connection.execute(request).await?;
    interpret_response(&response, name)
}

fn is_inactive_objects_report(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(INACTIVE_OBJECTS_MEDIA_TYPE))
}

fn interpret_response(
    response: &Response,
    name: &str,
) -> Result<Option<InactiveObjects>, ActivationError> {
    if is_inactive_objects_report(response.content_type()) {
        let mut report = InactiveObjects::default();
        deserialize(&response.text, &mut report)?;
        return Ok(Some(report));
    }

    if response.text.trim().is_empty() {
        return Ok(None);
    }

    Err(ActivationError::Failed {
        name: name.to_string(),
        response: response.text.clone(),
    })
}

/// Objects of the report that need the final pass, first seen wins
fn inactive_dependents(report: &InactiveObjects, policy: DeletedObjectPolicy) -> ObjectReferences {
    let mut seen = HashSet::new();
    let mut references = Vec::new();

    for entry in &report.entries {
        let Some(reference) = entry.object_reference() else {
            debug!("Skipping inactive entry without an object");
            continue;
        };

        let Some(uri) = reference.uri.as_deref() else {
            debug!("Skipping inactive object without URI");
            continue;
        };

        if !policy.admits(entry) {
            warn!("Skipping deleted inactive object {}", uri);
            continue;
        }

        if seen.insert(uri.to_string()) {
            references.push(reference.to_request());
        }
    }

    ObjectReferences::new(references)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::activation::{InactiveEntry, InactiveMarker};

    fn entry(uri: &str, deleted: bool) -> InactiveEntry {
        InactiveEntry {
            object: Some(InactiveMarker {
                deleted: Some(deleted),
                reference: Some(ObjectReference {
                    uri: Some(uri.to_string()),
                    name: Some("OBJ".to_string()),
                    description: Some("text".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            transport: None,
        }
    }

    #[test]
    fn test_report_content_type_recognition() {
        assert!(is_inactive_objects_report(Some(INACTIVE_OBJECTS_MEDIA_TYPE)));
        assert!(is_inactive_objects_report(Some(
            "application/vnd.sap.adt.inactivectsobjects.v1+xml; charset=utf-8"
        )));
        assert!(!is_inactive_objects_report(Some("application/xml")));
        assert!(!is_inactive_objects_report(None));
    }

    #[test]
    fn test_dependents_deduplicated_and_filtered() {
        let report = InactiveObjects {
            entries: vec![
                InactiveEntry::default(),
                entry("/a", false),
                entry("/b", true),
                entry("/a", false),
                entry("/c", false),
            ],
        };

        let uris: Vec<_> = inactive_dependents(&report, DeletedObjectPolicy::Skip)
            .references
            .into_iter()
            .map(|r| r.uri.unwrap())
            .collect();
        assert_eq!(uris, vec!["/a", "/c"]);

        let all = inactive_dependents(&report, DeletedObjectPolicy::Activate);
        assert_eq!(all.len(), 3);
        assert!(all.references.iter().all(|r| r.description.is_none()));
    }

    #[test]
    fn test_whitespace_body_is_success() {
        let response = Response::new(200, " \n");
        assert!(interpret_response(&response, "X").unwrap().is_none());
    }

    #[test]
    fn test_unrecognised_body_is_failure() {
        let response = Response::new(200, "<error/>").with_header("Content-Type", "application/xml");
        let err = interpret_response(&response, "ZPROG").unwrap_err();

        assert_eq!(err.to_string(), "Could not activate the object ZPROG: <error/>");
    }

    struct Unreachable;

    #[async_trait::async_trait]
    impl Connection for Unreachable {
        fn user(&self) -> &str {
            "nobody"
        }

        async fn execute(&self, request: Request) -> Result<Response, ConnectionError> {
            panic!("unexpected request to {}", request.path);
        }
    }

    #[test]
    fn test_nothing_to_activate_sends_nothing() {
        let outcome = tokio_test::block_on(activate_all(
            &Unreachable,
            &[],
            &ActivationOptions::default(),
        ))
        .unwrap();

        assert_eq!(outcome, ActivationOutcome::default());
    }
}
