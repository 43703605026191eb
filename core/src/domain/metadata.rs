// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Entity Metadata
//!
//! Static per-type metadata used by the root of a marshalling call and the
//! core attributes shared by every repository object.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements entity descriptors, XML namespaces and core object data

use std::collections::BTreeMap;

/// Prefix/URI pair of an XML namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlNamespace {
    pub prefix: &'static str,
    pub uri: &'static str,
}

impl XmlNamespace {
    pub const fn new(prefix: &'static str, uri: &'static str) -> Self {
        Self { prefix, uri }
    }

    /// Qualifies a local name with this namespace's prefix
    pub fn qualify(&self, name: &str) -> String {
        format!("{}:{}", self.prefix, name)
    }
}

/// The namespace of the core attributes shared by all repository objects
pub const ADTCORE_NAMESPACE: XmlNamespace =
    XmlNamespace::new("adtcore", "http://www.sap.com/adt/core");

/// Static description of a marshallable root type.
///
/// Never mutated after definition; domain types keep it in a `static`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Free-form type tag (e.g. `CLAS/OC`), may be empty
    pub category: &'static str,

    /// Path below `/sap/bc/adt/` where objects of this type live, may be empty
    pub base_path: &'static str,

    pub namespace: XmlNamespace,

    /// Media type of the serialized document, may be empty
    pub media_type: &'static str,

    /// Content type to logical slot name (e.g. `text/plain` -> `source/main`)
    pub content_slots: &'static [(&'static str, &'static str)],

    /// Local name of the root element
    pub root_name: &'static str,
}

impl EntityDescriptor {
    /// Qualified name of the root element (`prefix:root`)
    pub fn element_name(&self) -> String {
        self.namespace.qualify(self.root_name)
    }

    /// Logical slot registered for the given content type
    pub fn content_slot(&self, content_type: &str) -> Option<&'static str> {
        self.content_slots
            .iter()
            .find(|(typ, _)| *typ == content_type)
            .map(|(_, slot)| *slot)
    }

    pub fn category(&self) -> Option<&'static str> {
        if self.category.is_empty() {
            None
        } else {
            Some(self.category)
        }
    }
}

/// Reference to the package an object belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageReference {
    pub name: Option<String>,
}

/// Core data every repository object carries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdtCoreData {
    pub package_reference: PackageReference,
    pub description: Option<String>,
    pub language: Option<String>,
    pub master_language: Option<String>,
    pub master_system: Option<String>,
    pub responsible: Option<String>,
}

impl AdtCoreData {
    /// Core data of a brand new object owned by `responsible` in `package`
    pub fn new_object(package: &str, responsible: &str) -> Self {
        Self {
            package_reference: PackageReference {
                name: Some(package.to_uppercase()),
            },
            language: Some("EN".to_string()),
            master_language: Some("EN".to_string()),
            responsible: Some(responsible.to_uppercase()),
            ..Default::default()
        }
    }

    pub fn package(&self) -> Option<&str> {
        self.package_reference.name.as_deref()
    }
}

/// Collects the namespaces a rendered document needs to declare, in
/// registration order.
#[derive(Debug, Default)]
pub struct NamespaceSet {
    known: BTreeMap<&'static str, XmlNamespace>,
    order: Vec<&'static str>,
}

impl NamespaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, namespace: XmlNamespace) {
        if self.known.insert(namespace.prefix, namespace).is_none() {
            self.order.push(namespace.prefix);
        }
    }

    pub fn get(&self, prefix: &str) -> Option<&XmlNamespace> {
        self.known.get(prefix)
    }

    /// Registered namespaces in the order they were registered
    pub fn iter(&self) -> impl Iterator<Item = &XmlNamespace> {
        self.order.iter().filter_map(|prefix| self.known.get(prefix))
    }
}
