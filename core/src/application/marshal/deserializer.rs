// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Path-indexed deserializer.
//!
//! Handlers are keyed by the slash-joined element path and registered when
//! the owning element starts, using the member table of the concrete object
//! constructed for it. Handlers left below that path by an earlier
//! occurrence are dropped first, so a factory returning another type never
//! inherits the previous type's schema. The handler table lives for one call
//! only.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use super::MarshalError;
use crate::domain::member::{Entered, MemberKind, XmlObject};

/// Populates `root` from markup text.
///
/// Unknown elements (with their subtrees) and unknown or read-only
/// attributes are ignored. On error the object keeps whatever was set before
/// the failing position.
pub fn deserialize(xml: &str, root: &mut dyn XmlObject) -> Result<(), MarshalError> {
    let entity = root
        .entity()
        .ok_or_else(|| MarshalError::MissingEntity(root.type_name().to_string()))?;

    let root_path = format!("/{}", entity.element_name());
    let mut state = Deserializer::new(root, root_path);

    let mut reader = Reader::from_str(xml);

    loop {
        let event = reader
            .read_event()
            .map_err(|e| syntax_error(&reader, e))?;

        match event {
            Event::Start(start) => state.start(&reader, &start)?,
            Event::Empty(start) => {
                state.start(&reader, &start)?;
                state.end();
            }
            Event::End(_) => state.end(),
            Event::Eof => break,
            _ => {}
        }
    }

    if !state.frames.is_empty() {
        return Err(MarshalError::Syntax {
            position: reader.buffer_position() as u64,
            message: format!("unexpected end of document inside {}", state.current_path()),
        });
    }

    if !state.seen_root {
        return Err(MarshalError::Syntax {
            position: reader.buffer_position() as u64,
            message: "document has no root element".to_string(),
        });
    }

    Ok(())
}

fn syntax_error(reader: &Reader<&[u8]>, error: impl std::fmt::Display) -> MarshalError {
    MarshalError::Syntax {
        position: reader.buffer_position() as u64,
        message: error.to_string(),
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, MarshalError> {
    std::str::from_utf8(bytes).map_err(|e| MarshalError::Encoding(e.to_string()))
}

#[derive(Debug, Clone, Copy)]
enum Origin {
    Root,
    Detached(usize),
}

#[derive(Debug, Clone, Copy)]
struct Step {
    member: usize,
    item: Option<usize>,
}

/// Address of a live object, resolved from its origin on every use
#[derive(Debug, Clone)]
struct Route {
    origin: Origin,
    steps: Vec<Step>,
}

impl Route {
    fn root() -> Self {
        Self {
            origin: Origin::Root,
            steps: Vec::new(),
        }
    }

    fn detached(index: usize) -> Self {
        Self {
            origin: Origin::Detached(index),
            steps: Vec::new(),
        }
    }

    fn child(&self, member: usize, item: Option<usize>) -> Self {
        let mut route = self.clone();
        route.steps.push(Step { member, item });
        route
    }
}

enum Handler {
    Root,
    Member { owner: Route, member: usize },
}

struct Frame {
    path: String,

    /// None for ignored subtrees
    route: Option<Route>,
}

struct Deserializer<'r> {
    root: &'r mut dyn XmlObject,
    detached: Vec<Box<dyn XmlObject>>,
    handlers: HashMap<String, Handler>,
    frames: Vec<Frame>,
    seen_root: bool,
}

impl<'r> Deserializer<'r> {
    fn new(root: &'r mut dyn XmlObject, root_path: String) -> Self {
        let mut handlers = HashMap::new();
        handlers.insert(root_path, Handler::Root);

        Self {
            root,
            detached: Vec::new(),
            handlers,
            frames: Vec::new(),
            seen_root: false,
        }
    }

    fn current_path(&self) -> &str {
        self.frames.last().map(|frame| frame.path.as_str()).unwrap_or("")
    }

    fn resolve(&mut self, route: &Route) -> Option<&mut dyn XmlObject> {
        let mut current: &mut dyn XmlObject = match route.origin {
            Origin::Root => &mut *self.root,
            Origin::Detached(index) => self.detached.get_mut(index)?.as_mut(),
        };

        for step in &route.steps {
            current = current.child_mut(step.member, step.item)?;
        }

        Some(current)
    }

    fn start(&mut self, reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<(), MarshalError> {
        let name = utf8(start.name().as_ref())?.to_string();
        let path = format!("{}/{}", self.current_path(), name);

        if self.frames.is_empty() {
            self.seen_root = true;
        }

        let parent_ignored = self.frames.last().is_some_and(|frame| frame.route.is_none());
        let route = if parent_ignored {
            None
        } else {
            self.enter(&path)
        };

        if let Some(route) = route.as_ref() {
            self.register_children(&path, route);
            self.apply_attributes(reader, start, route)?;
        }

        self.frames.push(Frame { path, route });
        Ok(())
    }

    fn end(&mut self) {
        self.frames.pop();
    }

    /// Runs the handler registered for `path`, returning the route of the
    /// object that became current
    fn enter(&mut self, path: &str) -> Option<Route> {
        let (owner, member) = match self.handlers.get(path) {
            None => {
                debug!("Skipping unknown element {}", path);
                return None;
            }
            Some(Handler::Root) => return Some(Route::root()),
            Some(Handler::Member { owner, member }) => (owner.clone(), *member),
        };

        let entered = self.resolve(&owner)?.enter_element(member);

        match entered {
            Entered::InPlace => Some(owner.child(member, None)),
            Entered::Appended(item) => Some(owner.child(member, Some(item))),
            Entered::Detached(obj) => {
                debug!("Constructed detached {} for {}", obj.type_name(), path);
                self.detached.push(obj);
                Some(Route::detached(self.detached.len() - 1))
            }
            Entered::Unavailable => {
                debug!("Element {} cannot be populated", path);
                None
            }
        }
    }

    /// Replaces every handler below `path` with the element members of the
    /// object now current at `route`
    fn register_children(&mut self, path: &str, route: &Route) {
        let prefix = format!("{}/", path);
        self.handlers.retain(|key, _| !key.starts_with(&prefix));

        let Some(obj) = self.resolve(route) else {
            return;
        };

        let children: Vec<(usize, &'static str)> = obj
            .members()
            .iter()
            .enumerate()
            .filter(|(_, member)| member.is_element() && member.deserialize)
            .map(|(index, member)| (index, member.name))
            .collect();

        for (member, name) in children {
            let child_path = format!("{}/{}", path, name);
            debug!("Registering handler {}", child_path);
            self.handlers.insert(
                child_path,
                Handler::Member {
                    owner: route.clone(),
                    member,
                },
            );
        }
    }

    fn apply_attributes(
        &mut self,
        reader: &Reader<&[u8]>,
        start: &BytesStart<'_>,
        route: &Route,
    ) -> Result<(), MarshalError> {
        let mut attributes: Vec<(String, String)> = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| syntax_error(reader, e))?;
            let key = utf8(attribute.key.as_ref())?.to_string();
            let value = attribute
                .unescape_value()
                .map_err(|e| syntax_error(reader, e))?
                .into_owned();
            attributes.push((key, value));
        }

        let Some(obj) = self.resolve(route) else {
            return Ok(());
        };

        for (key, value) in attributes {
            match obj.find_member(&key, MemberKind::Attribute) {
                Some((index, member)) if member.deserialize => {
                    if !obj.set_attribute(index, &value) {
                        debug!("Attribute {}=\"{}\" rejected by {}", key, value, obj.type_name());
                    }
                }
                Some(_) => debug!("Ignoring read-only attribute {}", key),
                None => debug!("Ignoring unknown attribute {}", key),
            }
        }

        Ok(())
    }
}
