// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Member Registry
//!
//! Ordered declaration of the accessors a type exposes as markup attributes
//! or nested elements. The declaration is built once per type, cached in a
//! `static`, and is the single source of truth for both serialization order
//! and the deserialization schema.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements member descriptors and the type-erased object view
//!
//! # Declaring a type
//!
//! ```ignore
//! impl Describe for Item {
//!     fn describe() -> &'static Members<Self> {
//!         static MEMBERS: LazyLock<Members<Item>> = LazyLock::new(|| {
//!             Members::new()
//!                 .attribute("number", |i: &Item| i.number.clone(), |i, v| i.number = Some(v))
//!                 .list("child", |i: &Item| &i.children, |i| &mut i.children)
//!         });
//!         &MEMBERS
//!     }
//! }
//! ```

use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::domain::metadata::{AdtCoreData, EntityDescriptor};

/// Zero-argument constructor producing the value a member holds
pub type Factory = Arc<dyn Fn() -> Box<dyn XmlObject> + Send + Sync>;

/// Markup representation of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Attribute,
    Element,
}

/// Type-independent description of one declared member
#[derive(Clone)]
pub struct MemberDescriptor {
    pub name: &'static str,
    pub kind: MemberKind,

    /// Element member holding an ordered sequence
    pub repeated: bool,

    pub serialize: bool,
    pub deserialize: bool,

    pub factory: Option<Factory>,
}

impl MemberDescriptor {
    pub fn is_attribute(&self) -> bool {
        self.kind == MemberKind::Attribute
    }

    pub fn is_element(&self) -> bool {
        self.kind == MemberKind::Element
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("repeated", &self.repeated)
            .field("serialize", &self.serialize)
            .field("deserialize", &self.deserialize)
            .field("factory", &self.factory.is_some())
            .finish()
    }
}

/// A nested object yielded by an element getter, either borrowed from the
/// owner or computed on the fly.
pub enum ObjRef<'a> {
    Borrowed(&'a dyn XmlObject),
    Owned(Box<dyn XmlObject>),
}

impl<'a> Deref for ObjRef<'a> {
    type Target = dyn XmlObject;

    fn deref(&self) -> &Self::Target {
        match self {
            ObjRef::Borrowed(obj) => *obj,
            ObjRef::Owned(obj) => obj.as_ref(),
        }
    }
}

/// Value of an element member
pub enum Nested<'a> {
    /// Nothing to emit, the child is omitted entirely
    Absent,
    One(ObjRef<'a>),
    Many(Vec<ObjRef<'a>>),
}

impl<'a> Nested<'a> {
    pub fn borrowed(obj: &'a dyn XmlObject) -> Self {
        Nested::One(ObjRef::Borrowed(obj))
    }

    pub fn owned(obj: impl XmlObject) -> Self {
        Nested::One(ObjRef::Owned(Box::new(obj)))
    }

    pub fn optional<C: XmlObject>(obj: Option<&'a C>) -> Self {
        match obj {
            Some(obj) => Nested::One(ObjRef::Borrowed(obj)),
            None => Nested::Absent,
        }
    }

    pub fn items<C: XmlObject>(items: &'a [C]) -> Self {
        Nested::Many(
            items
                .iter()
                .map(|item| ObjRef::Borrowed(item as &dyn XmlObject))
                .collect(),
        )
    }
}

/// Result of entering an element member during deserialization
pub enum Entered {
    /// The member value now exists in the owner and is populated in place
    InPlace,

    /// A new item was appended to the member sequence at the given position
    Appended(usize),

    /// A new instance was constructed but the owner has no way to keep it
    Detached(Box<dyn XmlObject>),

    /// The member cannot be populated
    Unavailable,
}

/// Conversion between attribute values and their canonical markup text
pub trait XmlValue: Sized {
    fn to_xml(&self) -> String;
    fn from_xml(text: &str) -> Option<Self>;
}

impl XmlValue for String {
    fn to_xml(&self) -> String {
        self.clone()
    }

    fn from_xml(text: &str) -> Option<Self> {
        Some(text.to_string())
    }
}

impl XmlValue for bool {
    fn to_xml(&self) -> String {
        if *self { "true" } else { "false" }.to_string()
    }

    fn from_xml(text: &str) -> Option<Self> {
        match text {
            "true" | "X" => Some(true),
            "false" | "" => Some(false),
            _ => None,
        }
    }
}

macro_rules! xml_value_number {
    ($($ty:ty),*) => {
        $(
            impl XmlValue for $ty {
                fn to_xml(&self) -> String {
                    self.to_string()
                }

                fn from_xml(text: &str) -> Option<Self> {
                    text.trim().parse().ok()
                }
            }
        )*
    };
}

xml_value_number!(u8, u16, u32, u64, usize, i32, i64);

type AttributeGetter<T> = Box<dyn Fn(&T) -> Option<String> + Send + Sync>;
type AttributeSetter<T> = Box<dyn Fn(&mut T, &str) -> bool + Send + Sync>;
type ElementGetter<T> = Box<dyn for<'a> Fn(&'a T) -> Nested<'a> + Send + Sync>;
type ElementEnter<T> = Box<dyn Fn(&mut T) -> Entered + Send + Sync>;
type ChildMut<T> =
    Box<dyn for<'a> Fn(&'a mut T, Option<usize>) -> Option<&'a mut dyn XmlObject> + Send + Sync>;

// Helpers forcing the higher-ranked signatures onto closures
fn element_getter<T, F>(f: F) -> ElementGetter<T>
where
    F: for<'a> Fn(&'a T) -> Nested<'a> + Send + Sync + 'static,
{
    Box::new(f)
}

fn child_mut<T, F>(f: F) -> ChildMut<T>
where
    F: for<'a> Fn(&'a mut T, Option<usize>) -> Option<&'a mut dyn XmlObject>
        + Send
        + Sync
        + 'static,
{
    Box::new(f)
}

struct Accessor<T> {
    get_attribute: Option<AttributeGetter<T>>,
    set_attribute: Option<AttributeSetter<T>>,
    get_element: Option<ElementGetter<T>>,
    enter: Option<ElementEnter<T>>,
    child_mut: Option<ChildMut<T>>,
}

impl<T> Accessor<T> {
    fn empty() -> Self {
        Self {
            get_attribute: None,
            set_attribute: None,
            get_element: None,
            enter: None,
            child_mut: None,
        }
    }
}

/// Ordered member declaration of the type `T`.
///
/// Members are appended in declaration order and never reordered.
pub struct Members<T> {
    descriptors: Vec<MemberDescriptor>,
    accessors: Vec<Accessor<T>>,
}

impl<T: Describe> Default for Members<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Describe> Members<T> {
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            accessors: Vec::new(),
        }
    }

    pub fn descriptors(&self) -> &[MemberDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    fn push(mut self, descriptor: MemberDescriptor, accessor: Accessor<T>) -> Self {
        self.descriptors.push(descriptor);
        self.accessors.push(accessor);
        self
    }

    fn attribute_descriptor(name: &'static str, serialize: bool, deserialize: bool) -> MemberDescriptor {
        MemberDescriptor {
            name,
            kind: MemberKind::Attribute,
            repeated: false,
            serialize,
            deserialize,
            factory: None,
        }
    }

    fn element_descriptor(
        name: &'static str,
        repeated: bool,
        serialize: bool,
        deserialize: bool,
        factory: Option<Factory>,
    ) -> MemberDescriptor {
        MemberDescriptor {
            name,
            kind: MemberKind::Element,
            repeated,
            serialize,
            deserialize,
            factory,
        }
    }

    /// Concatenates the members of an embedded ancestor part ahead of the
    /// members declared afterwards.
    pub fn inherit<P: Describe>(
        mut self,
        project: fn(&T) -> &P,
        project_mut: fn(&mut T) -> &mut P,
    ) -> Self {
        let parent: &'static Members<P> = P::describe();

        for (index, descriptor) in parent.descriptors.iter().enumerate() {
            let source = &parent.accessors[index];
            let mut accessor = Accessor::empty();

            if let Some(get) = source.get_attribute.as_ref() {
                accessor.get_attribute = Some(Box::new(move |obj: &T| get(project(obj))));
            }
            if let Some(set) = source.set_attribute.as_ref() {
                accessor.set_attribute =
                    Some(Box::new(move |obj: &mut T, value: &str| set(project_mut(obj), value)));
            }
            if let Some(get) = source.get_element.as_ref() {
                accessor.get_element = Some(element_getter(move |obj: &T| get(project(obj))));
            }
            if let Some(enter) = source.enter.as_ref() {
                accessor.enter = Some(Box::new(move |obj: &mut T| enter(project_mut(obj))));
            }
            if let Some(child) = source.child_mut.as_ref() {
                accessor.child_mut = Some(child_mut(move |obj: &mut T, item: Option<usize>| {
                    child(project_mut(obj), item)
                }));
            }

            self = self.push(descriptor.clone(), accessor);
        }

        self
    }

    /// Attribute readable and writable through markup
    pub fn attribute<V, G, S>(self, name: &'static str, get: G, set: S) -> Self
    where
        V: XmlValue + 'static,
        G: Fn(&T) -> Option<V> + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let mut accessor = Accessor::empty();
        accessor.get_attribute = Some(Box::new(move |obj: &T| get(obj).map(|v| v.to_xml())));
        accessor.set_attribute = Some(Box::new(move |obj: &mut T, text: &str| {
            match V::from_xml(text) {
                Some(value) => {
                    set(obj, value);
                    true
                }
                None => false,
            }
        }));

        self.push(Self::attribute_descriptor(name, true, true), accessor)
    }

    /// Attribute emitted on serialization and never written by markup
    pub fn attribute_readonly<V, G>(self, name: &'static str, get: G) -> Self
    where
        V: XmlValue + 'static,
        G: Fn(&T) -> Option<V> + Send + Sync + 'static,
    {
        let mut accessor = Accessor::empty();
        accessor.get_attribute = Some(Box::new(move |obj: &T| get(obj).map(|v| v.to_xml())));

        self.push(Self::attribute_descriptor(name, true, false), accessor)
    }

    /// Attribute accepted from markup and never emitted
    pub fn attribute_writeonly<V, S>(self, name: &'static str, set: S) -> Self
    where
        V: XmlValue + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let mut accessor = Accessor::empty();
        accessor.set_attribute = Some(Box::new(move |obj: &mut T, text: &str| {
            match V::from_xml(text) {
                Some(value) => {
                    set(obj, value);
                    true
                }
                None => false,
            }
        }));

        self.push(Self::attribute_descriptor(name, false, true), accessor)
    }

    /// Nested object always present in the owner, populated in place
    pub fn element<C, G, M>(self, name: &'static str, get: G, get_mut: M) -> Self
    where
        C: Describe,
        G: Fn(&T) -> &C + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut C + Send + Sync + 'static,
    {
        let mut accessor = Accessor::empty();
        accessor.get_element = Some(element_getter(move |obj: &T| {
            Nested::borrowed(get(obj) as &dyn XmlObject)
        }));
        accessor.enter = Some(Box::new(|_: &mut T| Entered::InPlace));
        accessor.child_mut = Some(child_mut(move |obj: &mut T, _| {
            Some(get_mut(obj) as &mut dyn XmlObject)
        }));

        self.push(Self::element_descriptor(name, false, true, true, None), accessor)
    }

    /// Optional nested object, reused when present and default-constructed
    /// otherwise
    pub fn optional_element<C, G, S>(self, name: &'static str, get: G, slot: S) -> Self
    where
        C: Describe + Default,
        G: Fn(&T) -> Option<&C> + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut Option<C> + Send + Sync + 'static,
    {
        let slot = Arc::new(slot);
        let enter_slot = Arc::clone(&slot);

        let mut accessor = Accessor::empty();
        accessor.get_element = Some(element_getter(move |obj: &T| Nested::optional(get(obj))));
        accessor.enter = Some(Box::new(move |obj: &mut T| {
            enter_slot(obj).get_or_insert_with(C::default);
            Entered::InPlace
        }));
        accessor.child_mut = Some(child_mut(move |obj: &mut T, _| {
            slot(obj).as_mut().map(|child| child as &mut dyn XmlObject)
        }));

        self.push(Self::element_descriptor(name, false, true, true, None), accessor)
    }

    /// Nested object built by `factory` every time the element starts and
    /// stored into the owner's slot
    pub fn element_factory<C, G, S>(self, name: &'static str, factory: fn() -> C, get: G, slot: S) -> Self
    where
        C: Describe,
        G: Fn(&T) -> Option<&C> + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut Option<C> + Send + Sync + 'static,
    {
        let slot = Arc::new(slot);
        let enter_slot = Arc::clone(&slot);

        let mut accessor = Accessor::empty();
        accessor.get_element = Some(element_getter(move |obj: &T| Nested::optional(get(obj))));
        accessor.enter = Some(Box::new(move |obj: &mut T| {
            *enter_slot(obj) = Some(factory());
            Entered::InPlace
        }));
        accessor.child_mut = Some(child_mut(move |obj: &mut T, _| {
            slot(obj).as_mut().map(|child| child as &mut dyn XmlObject)
        }));

        let factory: Factory = Arc::new(move || Box::new(factory()) as Box<dyn XmlObject>);
        self.push(
            Self::element_descriptor(name, false, true, true, Some(factory)),
            accessor,
        )
    }

    /// Polymorphic nested object: the factory decides the concrete type and
    /// thereby the schema of the element's subtree
    pub fn element_dyn<F, G, S>(self, name: &'static str, factory: F, get: G, slot: S) -> Self
    where
        F: Fn() -> Box<dyn XmlObject> + Send + Sync + 'static,
        G: Fn(&T) -> Option<&dyn XmlObject> + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut Option<Box<dyn XmlObject>> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(factory);
        let enter_factory = Arc::clone(&factory);
        let slot = Arc::new(slot);
        let enter_slot = Arc::clone(&slot);

        let mut accessor = Accessor::empty();
        accessor.get_element = Some(element_getter(move |obj: &T| match get(obj) {
            Some(child) => Nested::borrowed(child),
            None => Nested::Absent,
        }));
        accessor.enter = Some(Box::new(move |obj: &mut T| {
            *enter_slot(obj) = Some(enter_factory());
            Entered::InPlace
        }));
        accessor.child_mut = Some(child_mut(move |obj: &mut T, _| match slot(obj) {
            Some(child) => Some(child.as_mut() as &mut dyn XmlObject),
            None => None,
        }));

        self.push(
            Self::element_descriptor(name, false, true, true, Some(factory)),
            accessor,
        )
    }

    /// Element whose instances are built by `factory` but not kept by the
    /// owner. Markup still populates the fresh instance.
    pub fn element_detached<C>(self, name: &'static str, factory: fn() -> C) -> Self
    where
        C: Describe,
    {
        let mut accessor = Accessor::empty();
        accessor.enter = Some(Box::new(move |_: &mut T| Entered::Detached(Box::new(factory()))));

        let factory: Factory = Arc::new(move || Box::new(factory()) as Box<dyn XmlObject>);
        self.push(
            Self::element_descriptor(name, false, false, true, Some(factory)),
            accessor,
        )
    }

    /// Element emitted on serialization only
    pub fn element_readonly<G>(self, name: &'static str, get: G) -> Self
    where
        G: for<'a> Fn(&'a T) -> Nested<'a> + Send + Sync + 'static,
    {
        let mut accessor = Accessor::empty();
        accessor.get_element = Some(Box::new(get));

        self.push(Self::element_descriptor(name, false, true, false, None), accessor)
    }

    /// Element populated in place from markup and never emitted
    pub fn element_writeonly<C, M>(self, name: &'static str, get_mut: M) -> Self
    where
        C: Describe,
        M: Fn(&mut T) -> &mut C + Send + Sync + 'static,
    {
        let mut accessor = Accessor::empty();
        accessor.enter = Some(Box::new(|_: &mut T| Entered::InPlace));
        accessor.child_mut = Some(child_mut(move |obj: &mut T, _| {
            Some(get_mut(obj) as &mut dyn XmlObject)
        }));

        self.push(Self::element_descriptor(name, false, false, true, None), accessor)
    }

    /// Ordered sequence of nested objects, one element per item; markup
    /// appends default-constructed items
    pub fn list<C, G, M>(self, name: &'static str, get: G, get_mut: M) -> Self
    where
        C: Describe + Default,
        G: Fn(&T) -> &Vec<C> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Vec<C> + Send + Sync + 'static,
    {
        self.list_with(name, C::default, None, get, get_mut)
    }

    /// Ordered sequence whose items are constructed by `factory`
    pub fn list_factory<C, G, M>(self, name: &'static str, factory: fn() -> C, get: G, get_mut: M) -> Self
    where
        C: Describe,
        G: Fn(&T) -> &Vec<C> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Vec<C> + Send + Sync + 'static,
    {
        let declared: Factory = Arc::new(move || Box::new(factory()) as Box<dyn XmlObject>);
        self.list_with(name, factory, Some(declared), get, get_mut)
    }

    fn list_with<C, G, M>(
        self,
        name: &'static str,
        construct: fn() -> C,
        factory: Option<Factory>,
        get: G,
        get_mut: M,
    ) -> Self
    where
        C: Describe,
        G: Fn(&T) -> &Vec<C> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Vec<C> + Send + Sync + 'static,
    {
        let get_mut = Arc::new(get_mut);
        let enter_mut = Arc::clone(&get_mut);

        let mut accessor = Accessor::empty();
        accessor.get_element = Some(element_getter(move |obj: &T| Nested::items(get(obj).as_slice())));
        accessor.enter = Some(Box::new(move |obj: &mut T| {
            let items = enter_mut(obj);
            items.push(construct());
            Entered::Appended(items.len() - 1)
        }));
        accessor.child_mut = Some(child_mut(move |obj: &mut T, item: Option<usize>| {
            let index = item?;
            get_mut(obj)
                .get_mut(index)
                .map(|child| child as &mut dyn XmlObject)
        }));

        self.push(
            Self::element_descriptor(name, true, true, true, factory),
            accessor,
        )
    }

    fn attribute_of(&self, obj: &T, index: usize) -> Option<String> {
        self.accessors
            .get(index)
            .and_then(|accessor| accessor.get_attribute.as_ref())
            .and_then(|get| get(obj))
    }

    fn set_attribute_of(&self, obj: &mut T, index: usize, value: &str) -> bool {
        match self
            .accessors
            .get(index)
            .and_then(|accessor| accessor.set_attribute.as_ref())
        {
            Some(set) => set(obj, value),
            None => false,
        }
    }

    fn element_of<'a>(&self, obj: &'a T, index: usize) -> Nested<'a> {
        match self
            .accessors
            .get(index)
            .and_then(|accessor| accessor.get_element.as_ref())
        {
            Some(get) => get(obj),
            None => Nested::Absent,
        }
    }

    fn enter_of(&self, obj: &mut T, index: usize) -> Entered {
        match self.accessors.get(index).and_then(|accessor| accessor.enter.as_ref()) {
            Some(enter) => enter(obj),
            None => Entered::Unavailable,
        }
    }

    fn child_of<'a>(&self, obj: &'a mut T, index: usize, item: Option<usize>) -> Option<&'a mut dyn XmlObject> {
        let child = self
            .accessors
            .get(index)
            .and_then(|accessor| accessor.child_mut.as_ref())?;
        child(obj, item)
    }
}

/// Static registration step of a marshallable type
pub trait Describe: Any + Send + Sync + Sized {
    /// Ordered member declaration, built once and cached
    fn describe() -> &'static Members<Self>;

    /// Entity descriptor when the type can be the root of a document
    fn descriptor() -> Option<&'static EntityDescriptor> {
        None
    }

    /// Core repository metadata; its presence makes the serializer emit the
    /// package reference child on the root element
    fn core(&self) -> Option<&AdtCoreData> {
        None
    }
}

/// Type-erased view of a marshallable object.
///
/// Members are addressed by their position in [`XmlObject::members`].
pub trait XmlObject: Any + Send + Sync {
    /// Rust type name, for diagnostics
    fn type_name(&self) -> &'static str;

    fn members(&self) -> &'static [MemberDescriptor];
    fn entity(&self) -> Option<&'static EntityDescriptor>;
    fn core_data(&self) -> Option<&AdtCoreData>;

    fn attribute(&self, index: usize) -> Option<String>;

    /// Returns false when the member has no setter or rejects the value
    fn set_attribute(&mut self, index: usize, value: &str) -> bool;

    fn element(&self, index: usize) -> Nested<'_>;
    fn enter_element(&mut self, index: usize) -> Entered;
    fn child_mut(&mut self, index: usize, item: Option<usize>) -> Option<&mut dyn XmlObject>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Describe> XmlObject for T {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn members(&self) -> &'static [MemberDescriptor] {
        T::describe().descriptors()
    }

    fn entity(&self) -> Option<&'static EntityDescriptor> {
        T::descriptor()
    }

    fn core_data(&self) -> Option<&AdtCoreData> {
        self.core()
    }

    fn attribute(&self, index: usize) -> Option<String> {
        T::describe().attribute_of(self, index)
    }

    fn set_attribute(&mut self, index: usize, value: &str) -> bool {
        T::describe().set_attribute_of(self, index, value)
    }

    fn element(&self, index: usize) -> Nested<'_> {
        T::describe().element_of(self, index)
    }

    fn enter_element(&mut self, index: usize) -> Entered {
        T::describe().enter_of(self, index)
    }

    fn child_mut(&mut self, index: usize, item: Option<usize>) -> Option<&mut dyn XmlObject> {
        T::describe().child_of(self, index, item)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<'o> dyn XmlObject + 'o {
    pub fn downcast_ref<T: XmlObject>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: XmlObject>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Position of the member with the given markup name and kind
    pub fn find_member(&self, name: &str, kind: MemberKind) -> Option<(usize, &'static MemberDescriptor)> {
        self.members()
            .iter()
            .enumerate()
            .find(|(_, member)| member.kind == kind && member.name == name)
    }
}
