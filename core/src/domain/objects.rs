// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Objects
//!
//! Catalog of the ABAP repository object types the client works with. Each
//! type embeds [`AdtObjectCore`] for the attributes every object shares and
//! declares its own members on top of it.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements classes, interfaces, programs, packages and class includes
//!
//! # URIs
//!
//! An object lives at `/sap/bc/adt/{base_path}/{name}` where the name is
//! lower-cased and percent-encoded. Source code lives in the `text/plain`
//! content slot below that URI (`source/main`). Class includes are addressed
//! as `{class uri}/includes/{kind}` and are edited under the lock of their
//! class.

use std::fmt;
use std::sync::LazyLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::domain::activation::WorkbenchObject;
use crate::domain::member::{Describe, Members, XmlObject};
use crate::domain::metadata::{AdtCoreData, EntityDescriptor, PackageReference, XmlNamespace};

const ADT_ROOT: &str = "/sap/bc/adt";

const NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'-')
    .remove(b'.')
    .remove(b'~');

pub static CLASS: EntityDescriptor = EntityDescriptor {
    category: "CLAS/OC",
    base_path: "oo/classes",
    namespace: XmlNamespace::new("class", "http://www.sap.com/adt/oo/classes"),
    media_type: "application/vnd.sap.adt.oo.classes.v2+xml",
    content_slots: &[("text/plain", "source/main")],
    root_name: "abapClass",
};

pub static INTERFACE: EntityDescriptor = EntityDescriptor {
    category: "INTF/OI",
    base_path: "oo/interfaces",
    namespace: XmlNamespace::new("intf", "http://www.sap.com/adt/oo/interfaces"),
    media_type: "application/vnd.sap.adt.oo.interfaces.v2+xml",
    content_slots: &[("text/plain", "source/main")],
    root_name: "abapInterface",
};

pub static PROGRAM: EntityDescriptor = EntityDescriptor {
    category: "PROG/P",
    base_path: "programs/programs",
    namespace: XmlNamespace::new("program", "http://www.sap.com/adt/programs/programs"),
    media_type: "application/vnd.sap.adt.programs.programs.v2+xml",
    content_slots: &[("text/plain", "source/main")],
    root_name: "abapProgram",
};

pub static PACKAGE: EntityDescriptor = EntityDescriptor {
    category: "DEVC/K",
    base_path: "packages",
    namespace: XmlNamespace::new("pak", "http://www.sap.com/adt/packages"),
    media_type: "application/vnd.sap.adt.packages.v1+xml",
    content_slots: &[],
    root_name: "package",
};

/// URI of the object `name` of the given type
pub fn object_uri(descriptor: &EntityDescriptor, name: &str) -> String {
    let name = name.to_lowercase();
    format!(
        "{}/{}/{}",
        ADT_ROOT,
        descriptor.base_path,
        utf8_percent_encode(&name, NAME_ENCODE_SET)
    )
}

/// Collection URI where new objects of the given type are created
pub fn collection_uri(descriptor: &EntityDescriptor) -> String {
    format!("{}/{}", ADT_ROOT, descriptor.base_path)
}

impl Describe for PackageReference {
    fn describe() -> &'static Members<Self> {
        static MEMBERS: LazyLock<Members<PackageReference>> = LazyLock::new(|| {
            Members::new().attribute(
                "adtcore:name",
                |r: &PackageReference| r.name.clone(),
                |r, v| r.name = Some(v),
            )
        });
        &MEMBERS
    }
}

/// Name, type and core metadata shared by every repository object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdtObjectCore {
    pub kind: &'static EntityDescriptor,
    pub name: String,
    pub metadata: AdtCoreData,
}

impl AdtObjectCore {
    pub fn new(kind: &'static EntityDescriptor, name: impl Into<String>, metadata: AdtCoreData) -> Self {
        Self {
            kind,
            name: name.into(),
            metadata,
        }
    }
}

impl Describe for AdtObjectCore {
    fn describe() -> &'static Members<Self> {
        static MEMBERS: LazyLock<Members<AdtObjectCore>> = LazyLock::new(|| {
            Members::new()
                .attribute_readonly("adtcore:type", |c: &AdtObjectCore| {
                    c.kind.category().map(str::to_string)
                })
                .attribute(
                    "adtcore:description",
                    |c: &AdtObjectCore| c.metadata.description.clone(),
                    |c, v| c.metadata.description = Some(v),
                )
                .attribute(
                    "adtcore:language",
                    |c: &AdtObjectCore| c.metadata.language.clone(),
                    |c, v| c.metadata.language = Some(v),
                )
                .attribute(
                    "adtcore:name",
                    |c: &AdtObjectCore| (!c.name.is_empty()).then(|| c.name.clone()),
                    |c, v| c.name = v,
                )
                .attribute(
                    "adtcore:masterLanguage",
                    |c: &AdtObjectCore| c.metadata.master_language.clone(),
                    |c, v| c.metadata.master_language = Some(v),
                )
                .attribute(
                    "adtcore:masterSystem",
                    |c: &AdtObjectCore| c.metadata.master_system.clone(),
                    |c, v| c.metadata.master_system = Some(v),
                )
                .attribute(
                    "adtcore:responsible",
                    |c: &AdtObjectCore| c.metadata.responsible.clone(),
                    |c, v| c.metadata.responsible = Some(v),
                )
                .element_writeonly("adtcore:packageRef", |c: &mut AdtObjectCore| {
                    &mut c.metadata.package_reference
                })
        });
        &MEMBERS
    }

    fn core(&self) -> Option<&AdtCoreData> {
        Some(&self.metadata)
    }
}

/// A marshallable object stored in the ABAP repository
pub trait RepositoryObject: XmlObject {
    fn object_core(&self) -> &AdtObjectCore;
    fn object_core_mut(&mut self) -> &mut AdtObjectCore;

    fn kind(&self) -> &'static EntityDescriptor {
        self.object_core().kind
    }

    fn metadata(&self) -> &AdtCoreData {
        &self.object_core().metadata
    }

    fn metadata_mut(&mut self) -> &mut AdtCoreData {
        &mut self.object_core_mut().metadata
    }

    fn description(&self) -> Option<&str> {
        self.metadata().description.as_deref()
    }

    fn set_description(&mut self, description: impl Into<String>)
    where
        Self: Sized,
    {
        self.metadata_mut().description = Some(description.into());
    }

    fn uri(&self) -> String {
        object_uri(self.kind(), &self.object_core().name)
    }

    /// URI of the plain text source, when the type has one
    fn text_uri(&self) -> Option<String> {
        self.kind()
            .content_slot("text/plain")
            .map(|slot| format!("{}/{}", self.uri(), slot))
    }
}

/// Object with an editable source text
pub trait SourceObject: WorkbenchObject {
    fn source_uri(&self) -> String;

    /// URI of the object whose lock guards the source
    fn lock_uri(&self) -> String {
        self.full_adt_uri()
    }
}

/// ABAP class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    core: AdtObjectCore,
    pub is_final: Option<bool>,
    pub visibility: Option<String>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_metadata(name, AdtCoreData::default())
    }

    pub fn with_metadata(name: impl Into<String>, metadata: AdtCoreData) -> Self {
        Self {
            core: AdtObjectCore::new(&CLASS, name, metadata),
            is_final: None,
            visibility: None,
        }
    }

    pub fn include(&self, kind: IncludeKind) -> ClassInclude {
        ClassInclude {
            class_name: self.core.name.clone(),
            class_uri: self.uri(),
            kind,
        }
    }

    pub fn definitions(&self) -> ClassInclude {
        self.include(IncludeKind::Definitions)
    }

    pub fn implementations(&self) -> ClassInclude {
        self.include(IncludeKind::Implementations)
    }

    pub fn test_classes(&self) -> ClassInclude {
        self.include(IncludeKind::TestClasses)
    }
}

impl Describe for Class {
    fn describe() -> &'static Members<Self> {
        static MEMBERS: LazyLock<Members<Class>> = LazyLock::new(|| {
            Members::new()
                .inherit(|c: &Class| &c.core, |c| &mut c.core)
                .attribute("class:final", |c: &Class| c.is_final, |c, v| c.is_final = Some(v))
                .attribute(
                    "class:visibility",
                    |c: &Class| c.visibility.clone(),
                    |c, v| c.visibility = Some(v),
                )
        });
        &MEMBERS
    }

    fn descriptor() -> Option<&'static EntityDescriptor> {
        Some(&CLASS)
    }

    fn core(&self) -> Option<&AdtCoreData> {
        Some(&self.core.metadata)
    }
}

impl RepositoryObject for Class {
    fn object_core(&self) -> &AdtObjectCore {
        &self.core
    }

    fn object_core_mut(&mut self) -> &mut AdtObjectCore {
        &mut self.core
    }
}

/// Local include of a class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    Definitions,
    Implementations,
    TestClasses,
}

impl IncludeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncludeKind::Definitions => "definitions",
            IncludeKind::Implementations => "implementations",
            IncludeKind::TestClasses => "testclasses",
        }
    }
}

impl fmt::Display for IncludeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInclude {
    class_name: String,
    class_uri: String,
    kind: IncludeKind,
}

impl ClassInclude {
    pub fn kind(&self) -> IncludeKind {
        self.kind
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}

impl WorkbenchObject for ClassInclude {
    fn name(&self) -> &str {
        &self.class_name
    }

    fn full_adt_uri(&self) -> String {
        format!("{}/includes/{}", self.class_uri, self.kind)
    }

    fn parent_uri(&self) -> Option<String> {
        Some(self.class_uri.clone())
    }

    fn object_type(&self) -> Option<String> {
        Some(format!("{}N/{}", CLASS.category, self.kind))
    }
}

impl SourceObject for ClassInclude {
    fn source_uri(&self) -> String {
        self.full_adt_uri()
    }

    fn lock_uri(&self) -> String {
        self.class_uri.clone()
    }
}

/// ABAP interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    core: AdtObjectCore,
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_metadata(name, AdtCoreData::default())
    }

    pub fn with_metadata(name: impl Into<String>, metadata: AdtCoreData) -> Self {
        Self {
            core: AdtObjectCore::new(&INTERFACE, name, metadata),
        }
    }
}

/// ABAP program (report)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    core: AdtObjectCore,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_metadata(name, AdtCoreData::default())
    }

    pub fn with_metadata(name: impl Into<String>, metadata: AdtCoreData) -> Self {
        Self {
            core: AdtObjectCore::new(&PROGRAM, name, metadata),
        }
    }
}

// Types made of nothing but the shared core
macro_rules! core_only_object {
    ($ty:ty, $descriptor:expr) => {
        impl Describe for $ty {
            fn describe() -> &'static Members<Self> {
                static MEMBERS: LazyLock<Members<$ty>> = LazyLock::new(|| {
                    Members::new().inherit(|o: &$ty| &o.core, |o| &mut o.core)
                });
                &MEMBERS
            }

            fn descriptor() -> Option<&'static EntityDescriptor> {
                Some(&$descriptor)
            }

            fn core(&self) -> Option<&AdtCoreData> {
                Some(&self.core.metadata)
            }
        }

        impl RepositoryObject for $ty {
            fn object_core(&self) -> &AdtObjectCore {
                &self.core
            }

            fn object_core_mut(&mut self) -> &mut AdtObjectCore {
                &mut self.core
            }
        }

        impl SourceObject for $ty {
            fn source_uri(&self) -> String {
                self.text_uri()
                    .unwrap_or_else(|| format!("{}/source/main", self.uri()))
            }
        }
    };
}

core_only_object!(Interface, INTERFACE);
core_only_object!(Program, PROGRAM);

impl SourceObject for Class {
    fn source_uri(&self) -> String {
        self.text_uri()
            .unwrap_or_else(|| format!("{}/source/main", self.uri()))
    }
}

/// `pak:attributes` of a package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageAttributes {
    pub package_type: Option<String>,
}

impl Describe for PackageAttributes {
    fn describe() -> &'static Members<Self> {
        static MEMBERS: LazyLock<Members<PackageAttributes>> = LazyLock::new(|| {
            Members::new().attribute(
                "pak:packageType",
                |a: &PackageAttributes| a.package_type.clone(),
                |a, v| a.package_type = Some(v),
            )
        });
        &MEMBERS
    }
}

/// Named component a package refers to (`pak:name`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageComponent {
    pub name: Option<String>,
}

impl PackageComponent {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

impl Describe for PackageComponent {
    fn describe() -> &'static Members<Self> {
        static MEMBERS: LazyLock<Members<PackageComponent>> = LazyLock::new(|| {
            Members::new().attribute(
                "pak:name",
                |c: &PackageComponent| c.name.clone(),
                |c, v| c.name = Some(v),
            )
        });
        &MEMBERS
    }
}

/// Transport settings of a package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageTransport {
    pub software_component: Option<PackageComponent>,
    pub transport_layer: Option<PackageComponent>,
}

impl Describe for PackageTransport {
    fn describe() -> &'static Members<Self> {
        static MEMBERS: LazyLock<Members<PackageTransport>> = LazyLock::new(|| {
            Members::new()
                .optional_element(
                    "pak:softwareComponent",
                    |t: &PackageTransport| t.software_component.as_ref(),
                    |t| &mut t.software_component,
                )
                .optional_element(
                    "pak:transportLayer",
                    |t: &PackageTransport| t.transport_layer.as_ref(),
                    |t| &mut t.transport_layer,
                )
        });
        &MEMBERS
    }
}

/// ABAP package (development class)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    core: AdtObjectCore,
    pub attributes: PackageAttributes,
    pub super_package: Option<PackageReference>,
    pub application_component: Option<PackageComponent>,
    pub transport: Option<PackageTransport>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_metadata(name, AdtCoreData::default())
    }

    pub fn with_metadata(name: impl Into<String>, metadata: AdtCoreData) -> Self {
        Self {
            core: AdtObjectCore::new(&PACKAGE, name, metadata),
            attributes: PackageAttributes::default(),
            super_package: None,
            application_component: None,
            transport: None,
        }
    }

    pub fn set_package_type(&mut self, package_type: impl Into<String>) {
        self.attributes.package_type = Some(package_type.into());
    }

    pub fn set_super_package(&mut self, name: impl Into<String>) {
        self.super_package = Some(PackageReference {
            name: Some(name.into()),
        });
    }

    pub fn set_app_component(&mut self, name: impl Into<String>) {
        self.application_component = Some(PackageComponent::named(name));
    }

    pub fn set_software_component(&mut self, name: impl Into<String>) {
        self.transport.get_or_insert_with(Default::default).software_component =
            Some(PackageComponent::named(name));
    }

    pub fn set_transport_layer(&mut self, name: impl Into<String>) {
        self.transport.get_or_insert_with(Default::default).transport_layer =
            Some(PackageComponent::named(name));
    }
}

impl Describe for Package {
    fn describe() -> &'static Members<Self> {
        static MEMBERS: LazyLock<Members<Package>> = LazyLock::new(|| {
            Members::new()
                .inherit(|p: &Package| &p.core, |p| &mut p.core)
                .element("pak:attributes", |p: &Package| &p.attributes, |p| &mut p.attributes)
                .optional_element(
                    "pak:superPackage",
                    |p: &Package| p.super_package.as_ref(),
                    |p| &mut p.super_package,
                )
                .optional_element(
                    "pak:applicationComponent",
                    |p: &Package| p.application_component.as_ref(),
                    |p| &mut p.application_component,
                )
                .optional_element(
                    "pak:transport",
                    |p: &Package| p.transport.as_ref(),
                    |p| &mut p.transport,
                )
        });
        &MEMBERS
    }

    fn descriptor() -> Option<&'static EntityDescriptor> {
        Some(&PACKAGE)
    }

    fn core(&self) -> Option<&AdtCoreData> {
        Some(&self.core.metadata)
    }
}

impl RepositoryObject for Package {
    fn object_core(&self) -> &AdtObjectCore {
        &self.core
    }

    fn object_core_mut(&mut self) -> &mut AdtObjectCore {
        &mut self.core
    }
}
