//! Lazy elements: virtual nodes that stand in for a real node until one is needed.
//!
//! Property traffic resolves in a fixed order:
//!
//! 1. reserved slots ([`Slot::NODE`](crate::Slot::NODE), [`Slot::PROPS`](crate::Slot::PROPS), [`Slot::METHODS`](crate::Slot::METHODS));
//! 2. before materialization, the property store, then the method table, then
//!    materialize-on-demand and read from the new real node;
//! 3. after materialization, the method table (its methods delegate to the real
//!    node), then the real node itself.
//!
//! Writes go to the real node once one exists and to the property store before.

use std::fmt;
use std::rc::Rc;

use crate::error::DomError;
use crate::interceptor;
use crate::native::RealNode;
use crate::slots::{ElementSlots, Key, MethodTable, PropertyStore, PropertyStoreRef};
use crate::value::{Child, Value};

pub(crate) type MethodFn = fn(&LazyElement, Child) -> Result<Child, DomError>;

/// Methods served from the method table before and after materialization.
pub static ELEMENT_METHODS: MethodTable = MethodTable::new(&[
    ("appendChild", append_child_method as MethodFn),
    ("removeChild", remove_child_method as MethodFn),
]);

/// Result of a property read.
#[derive(Clone, Debug)]
pub enum Property {
    /// Contents of [`Slot::NODE`](crate::Slot::NODE).
    Node(Option<RealNode>),
    /// Contents of [`Slot::PROPS`](crate::Slot::PROPS).
    Props(PropertyStoreRef),
    /// Contents of [`Slot::METHODS`](crate::Slot::METHODS).
    Methods(&'static MethodTable),
    Value(Value),
    Method(BoundMethod),
}

impl Property {
    /// Collapses the read into a plain value. Slots and methods become `undefined`.
    pub fn into_value(self) -> Value {
        match self {
            Property::Value(value) => value,
            Property::Node(Some(node)) => Value::Node(node),
            _ => Value::Undefined,
        }
    }

    pub fn into_method(self) -> Option<BoundMethod> {
        match self {
            Property::Method(method) => Some(method),
            _ => None,
        }
    }
}

/// Capability-forwarding property interface shared by lazy elements and real nodes.
pub trait PropertyAccess {
    fn get(&self, key: Key<'_>) -> Result<Property, DomError>;

    fn set(&self, key: Key<'_>, value: Value) -> Result<(), DomError>;
}

/// A method-table entry bound to its element.
#[derive(Clone)]
pub struct BoundMethod {
    element: LazyElement,
    name: &'static str,
    method: MethodFn,
}

impl BoundMethod {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn call(&self, child: impl Into<Child>) -> Result<Child, DomError> {
        (self.method)(&self.element, child.into())
    }
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundMethod({} on {})", self.name, self.element.tag_name())
    }
}

/// A virtual element with reference identity.
#[derive(Clone)]
pub struct LazyElement {
    slots: Rc<ElementSlots>,
}

impl LazyElement {
    pub(crate) fn from_store(store: PropertyStore) -> Self {
        Self {
            slots: Rc::new(ElementSlots::new(store, &ELEMENT_METHODS)),
        }
    }

    pub(crate) fn slots(&self) -> &ElementSlots {
        &self.slots
    }

    pub fn ptr_eq(&self, other: &LazyElement) -> bool {
        Rc::ptr_eq(&self.slots, &other.slots)
    }

    /// The uppercased tag name this element was created with.
    pub fn tag_name(&self) -> Rc<str> {
        self.slots.props.borrow().tag_name.clone()
    }

    pub fn is_materialized(&self) -> bool {
        self.slots.node().is_some()
    }

    pub fn materialized_node(&self) -> Option<RealNode> {
        self.slots.node().cloned()
    }

    pub fn store(&self) -> PropertyStoreRef {
        PropertyStoreRef::new(self.clone())
    }

    /// Returns the backing real node, materializing through the installed tree if needed.
    pub fn materialize(&self) -> Result<RealNode, DomError> {
        match self.slots.node() {
            Some(node) => Ok(node.clone()),
            None => interceptor::current()?.materialize(self),
        }
    }

    /// Reads a named property as a plain value.
    pub fn get_value(&self, name: &str) -> Result<Value, DomError> {
        self.get(Key::Name(name)).map(Property::into_value)
    }

    pub fn set_value(&self, name: &str, value: impl Into<Value>) -> Result<(), DomError> {
        self.set(Key::Name(name), value.into())
    }

    pub fn append_child(&self, child: impl Into<Child>) -> Result<Child, DomError> {
        append_child_method(self, child.into())
    }

    pub fn remove_child(&self, child: impl Into<Child>) -> Result<Child, DomError> {
        remove_child_method(self, child.into())
    }

    fn bind(&self, name: &str) -> Option<BoundMethod> {
        self.slots
            .methods
            .lookup(name)
            .map(|(name, method)| BoundMethod {
                element: self.clone(),
                name,
                method,
            })
    }
}

impl PropertyAccess for LazyElement {
    fn get(&self, key: Key<'_>) -> Result<Property, DomError> {
        let name = match key {
            Key::Slot(slot) if slot.is_node() => {
                return Ok(Property::Node(self.materialized_node()));
            }
            Key::Slot(slot) if slot.is_props() => return Ok(Property::Props(self.store())),
            Key::Slot(_) => return Ok(Property::Methods(self.slots.methods)),
            Key::Name(name) => name,
        };

        if let Some(node) = self.slots.node() {
            if let Some(method) = self.bind(name) {
                return Ok(Property::Method(method));
            }
            return Ok(Property::Value(node.get(name)));
        }

        if let Some(value) = self.slots.props.borrow().get(name) {
            return Ok(Property::Value(value));
        }
        if let Some(method) = self.bind(name) {
            return Ok(Property::Method(method));
        }

        let node = self.materialize()?;
        Ok(Property::Value(node.get(name)))
    }

    fn set(&self, key: Key<'_>, value: Value) -> Result<(), DomError> {
        match key {
            Key::Slot(slot) if slot.is_node() => match value {
                Value::Node(node) => self.slots.attach(node),
                other => Err(DomError::invalid_value("[[node]]", "node", &other)),
            },
            Key::Slot(slot) if slot.is_props() => Err(DomError::read_only("[[props]]")),
            Key::Slot(_) => Err(DomError::read_only("[[methods]]")),
            Key::Name(name) => match self.slots.node() {
                Some(node) => node.set(name, value),
                None => self.slots.props.borrow_mut().set(name, value),
            },
        }
    }
}

impl fmt::Debug for LazyElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyElement")
            .field("tag_name", &self.tag_name())
            .field("node", &self.slots.node())
            .finish()
    }
}

fn append_child_method(element: &LazyElement, child: Child) -> Result<Child, DomError> {
    if let Some(node) = element.slots.node() {
        return node.append_child(child);
    }
    if matches!(&child, Child::Element(inner) if inner.ptr_eq(element)) {
        return Err(DomError::Hierarchy {
            method: "appendChild",
        });
    }
    element.slots.props.borrow_mut().children.push(child.clone());
    Ok(child)
}

fn remove_child_method(element: &LazyElement, child: Child) -> Result<Child, DomError> {
    if let Some(node) = element.slots.node() {
        return node.remove_child(child);
    }

    let mut store = element.slots.props.borrow_mut();
    let index = store
        .children
        .iter()
        .position(|candidate| candidate.is_same(&child))
        .ok_or_else(|| DomError::not_a_child("removeChild"))?;
    store.children.remove(index);
    Ok(child)
}
