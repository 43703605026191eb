// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Element Tree
//!
//! Intermediate tree produced from an object before it is rendered as text.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements the ordered element tree used by the serializer

/// A markup element with ordered attributes and ordered children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Sets an attribute; an existing attribute of the same name keeps its
    /// position and gets the new value.
    pub fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Appends a new child and returns it for population
    pub fn add_child(&mut self, name: impl Into<String>) -> &mut Element {
        self.children.push(Element::new(name));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Namespace prefix of a qualified name
    pub fn prefix_of(name: &str) -> Option<&str> {
        name.split_once(':').map(|(prefix, _)| prefix)
    }
}
