// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Activation Documents
//!
//! Object reference lists submitted for activation and the inactive-objects
//! report the server answers with when further objects need activating.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements activation references, inactive entries and the deleted-object policy

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::domain::member::{Describe, Members};
use crate::domain::metadata::{EntityDescriptor, XmlNamespace, ADTCORE_NAMESPACE};
use crate::domain::objects::RepositoryObject;

/// Media type of the inactive-objects report
pub const INACTIVE_OBJECTS_MEDIA_TYPE: &str = "application/vnd.sap.adt.inactivectsobjects.v1+xml";

pub const IOC_NAMESPACE: XmlNamespace =
    XmlNamespace::new("ioc", "http://www.sap.com/abapxml/inactiveCtsObjects");

pub static OBJECT_REFERENCES: EntityDescriptor = EntityDescriptor {
    category: "",
    base_path: "",
    namespace: ADTCORE_NAMESPACE,
    media_type: "application/xml",
    content_slots: &[],
    root_name: "objectReferences",
};

pub static INACTIVE_OBJECTS: EntityDescriptor = EntityDescriptor {
    category: "",
    base_path: "",
    namespace: IOC_NAMESPACE,
    media_type: INACTIVE_OBJECTS_MEDIA_TYPE,
    content_slots: &[],
    root_name: "inactiveObjects",
};

/// Anything the server can activate
pub trait WorkbenchObject: Send + Sync {
    fn name(&self) -> &str;

    fn full_adt_uri(&self) -> String;

    fn parent_uri(&self) -> Option<String> {
        None
    }

    fn object_type(&self) -> Option<String> {
        None
    }
}

impl<T: RepositoryObject> WorkbenchObject for T {
    fn name(&self) -> &str {
        &self.object_core().name
    }

    fn full_adt_uri(&self) -> String {
        self.uri()
    }

    fn object_type(&self) -> Option<String> {
        self.kind().category().map(str::to_string)
    }
}

/// Reference to one object in an activation request or report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectReference {
    pub uri: Option<String>,
    pub typ: Option<String>,
    pub name: Option<String>,
    pub parent_uri: Option<String>,
    pub description: Option<String>,
}

impl ObjectReference {
    /// Root-level reference to an activation target, made of its own URI
    /// and upper-cased name only
    pub fn for_object(object: &dyn WorkbenchObject) -> Self {
        Self {
            uri: Some(object.full_adt_uri()),
            name: Some(object.name().to_uppercase()),
            ..Default::default()
        }
    }

    /// Copy suitable for an activation request
    pub fn to_request(&self) -> Self {
        Self {
            description: None,
            ..self.clone()
        }
    }
}

impl Describe for ObjectReference {
    fn describe() -> &'static Members<Self> {
        static MEMBERS: LazyLock<Members<ObjectReference>> = LazyLock::new(|| {
            Members::new()
                .attribute(
                    "adtcore:uri",
                    |r: &ObjectReference| r.uri.clone(),
                    |r, v| r.uri = Some(v),
                )
                .attribute(
                    "adtcore:type",
                    |r: &ObjectReference| r.typ.clone(),
                    |r, v| r.typ = Some(v),
                )
                .attribute(
                    "adtcore:name",
                    |r: &ObjectReference| r.name.clone(),
                    |r, v| r.name = Some(v),
                )
                .attribute(
                    "adtcore:parentUri",
                    |r: &ObjectReference| r.parent_uri.clone(),
                    |r, v| r.parent_uri = Some(v),
                )
                .attribute(
                    "adtcore:description",
                    |r: &ObjectReference| r.description.clone(),
                    |r, v| r.description = Some(v),
                )
        });
        &MEMBERS
    }
}

/// Body of an activation request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectReferences {
    pub references: Vec<ObjectReference>,
}

impl ObjectReferences {
    pub fn new(references: Vec<ObjectReference>) -> Self {
        Self { references }
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }
}

impl Describe for ObjectReferences {
    fn describe() -> &'static Members<Self> {
        static MEMBERS: LazyLock<Members<ObjectReferences>> = LazyLock::new(|| {
            Members::new().list(
                "adtcore:objectReference",
                |r: &ObjectReferences| &r.references,
                |r| &mut r.references,
            )
        });
        &MEMBERS
    }

    fn descriptor() -> Option<&'static EntityDescriptor> {
        Some(&OBJECT_REFERENCES)
    }
}

/// Object or transport marker of an inactive entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InactiveMarker {
    pub user: Option<String>,
    pub linked: Option<bool>,
    pub deleted: Option<bool>,
    pub reference: Option<ObjectReference>,
}

impl InactiveMarker {
    pub fn is_deleted(&self) -> bool {
        self.deleted.unwrap_or(false)
    }

    pub fn is_linked(&self) -> bool {
        self.linked.unwrap_or(false)
    }
}

impl Describe for InactiveMarker {
    fn describe() -> &'static Members<Self> {
        static MEMBERS: LazyLock<Members<InactiveMarker>> = LazyLock::new(|| {
            Members::new()
                .attribute(
                    "ioc:user",
                    |m: &InactiveMarker| m.user.clone(),
                    |m, v| m.user = Some(v),
                )
                .attribute("ioc:linked", |m: &InactiveMarker| m.linked, |m, v| m.linked = Some(v))
                .attribute("ioc:deleted", |m: &InactiveMarker| m.deleted, |m, v| m.deleted = Some(v))
                .optional_element(
                    "ioc:ref",
                    |m: &InactiveMarker| m.reference.as_ref(),
                    |m| &mut m.reference,
                )
        });
        &MEMBERS
    }
}

/// One row of the inactive-objects report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InactiveEntry {
    pub object: Option<InactiveMarker>,
    pub transport: Option<InactiveMarker>,
}

impl InactiveEntry {
    /// Reference of the pending object, if the entry carries one
    pub fn object_reference(&self) -> Option<&ObjectReference> {
        self.object.as_ref().and_then(|object| object.reference.as_ref())
    }

    pub fn is_deleted(&self) -> bool {
        self.object.as_ref().is_some_and(InactiveMarker::is_deleted)
    }
}

impl Describe for InactiveEntry {
    fn describe() -> &'static Members<Self> {
        static MEMBERS: LazyLock<Members<InactiveEntry>> = LazyLock::new(|| {
            Members::new()
                .optional_element(
                    "ioc:object",
                    |e: &InactiveEntry| e.object.as_ref(),
                    |e| &mut e.object,
                )
                .optional_element(
                    "ioc:transport",
                    |e: &InactiveEntry| e.transport.as_ref(),
                    |e| &mut e.transport,
                )
        });
        &MEMBERS
    }
}

/// Inactive-objects report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InactiveObjects {
    pub entries: Vec<InactiveEntry>,
}

impl Describe for InactiveObjects {
    fn describe() -> &'static Members<Self> {
        static MEMBERS: LazyLock<Members<InactiveObjects>> = LazyLock::new(|| {
            Members::new().list(
                "ioc:entry",
                |r: &InactiveObjects| &r.entries,
                |r| &mut r.entries,
            )
        });
        &MEMBERS
    }

    fn descriptor() -> Option<&'static EntityDescriptor> {
        Some(&INACTIVE_OBJECTS)
    }
}

/// What to do with inactive entries the server marks as deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletedObjectPolicy {
    #[default]
    Skip,
    Activate,
}

impl DeletedObjectPolicy {
    pub fn admits(&self, entry: &InactiveEntry) -> bool {
        match self {
            DeletedObjectPolicy::Skip => !entry.is_deleted(),
            DeletedObjectPolicy::Activate => true,
        }
    }
}
