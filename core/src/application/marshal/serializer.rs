// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Object to element tree, element tree to text.

use std::collections::HashSet;

use quick_xml::escape::escape;

use super::MarshalError;
use crate::domain::element::Element;
use crate::domain::member::{MemberKind, Nested, XmlObject};
use crate::domain::metadata::{NamespaceSet, ADTCORE_NAMESPACE};

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

const PACKAGE_REF: &str = "adtcore:packageRef";

/// Serializes a root object to markup text
pub fn serialize(obj: &dyn XmlObject) -> Result<String, MarshalError> {
    let tree = object_to_tree(obj)?;

    let mut namespaces = NamespaceSet::new();
    if let Some(entity) = obj.entity() {
        namespaces.register(entity.namespace);
    }
    namespaces.register(ADTCORE_NAMESPACE);

    Ok(render(&tree, &namespaces))
}

/// Builds the element tree of a root object
pub fn object_to_tree(obj: &dyn XmlObject) -> Result<Element, MarshalError> {
    let entity = obj
        .entity()
        .ok_or_else(|| MarshalError::MissingEntity(obj.type_name().to_string()))?;

    let mut root = Element::new(entity.element_name());

    if let Some(core) = obj.core_data() {
        root.push_child(build_element(&core.package_reference, PACKAGE_REF));
    }

    fill_element(obj, &mut root);

    Ok(root)
}

fn build_element(obj: &dyn XmlObject, name: &str) -> Element {
    let mut element = Element::new(name);
    fill_element(obj, &mut element);
    element
}

fn fill_element(obj: &dyn XmlObject, element: &mut Element) {
    for (index, member) in obj.members().iter().enumerate() {
        if !member.serialize {
            continue;
        }

        match member.kind {
            MemberKind::Attribute => {
                if let Some(value) = obj.attribute(index) {
                    element.add_attribute(member.name, value);
                }
            }
            MemberKind::Element => match obj.element(index) {
                Nested::Absent => {}
                Nested::One(child) => element.push_child(build_element(&*child, member.name)),
                Nested::Many(items) => {
                    for item in items {
                        element.push_child(build_element(&*item, member.name));
                    }
                }
            },
        }
    }
}

/// Renders a tree without namespace declarations
pub fn tree_to_xml(root: &Element) -> String {
    render(root, &NamespaceSet::new())
}

/// Renders a tree, declaring on the root every known namespace the tree
/// references
pub fn render(root: &Element, namespaces: &NamespaceSet) -> String {
    let mut referenced = HashSet::new();
    collect_prefixes(root, &mut referenced);

    let declarations: Vec<(String, String)> = namespaces
        .iter()
        .filter(|ns| referenced.contains(ns.prefix))
        .map(|ns| (format!("xmlns:{}", ns.prefix), ns.uri.to_string()))
        .collect();

    let mut lines = vec![XML_DECLARATION.to_string()];
    render_element(root, &declarations, &mut lines);
    lines.join("\n")
}

fn collect_prefixes<'a>(element: &'a Element, prefixes: &mut HashSet<&'a str>) {
    if let Some(prefix) = Element::prefix_of(&element.name) {
        prefixes.insert(prefix);
    }

    for (name, _) in &element.attributes {
        if let Some(prefix) = Element::prefix_of(name) {
            prefixes.insert(prefix);
        }
    }

    for child in &element.children {
        collect_prefixes(child, prefixes);
    }
}

fn render_element(element: &Element, declarations: &[(String, String)], lines: &mut Vec<String>) {
    let mut open = format!("<{}", element.name);

    for (name, value) in declarations.iter().chain(element.attributes.iter()) {
        open.push_str(&format!(" {}=\"{}\"", name, escape(value.as_str())));
    }

    if element.children.is_empty() {
        open.push_str("/>");
        lines.push(open);
        return;
    }

    open.push('>');
    lines.push(open);

    for child in &element.children {
        render_element(child, &[], lines);
    }

    lines.push(format!("</{}>", element.name));
}
