//! Private per-element state and the keys that address it.
//!
//! A [`Slot`] can only be obtained through its constants, never from a string,
//! so no user property name can collide with an element's internal state.

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::collections::OrderedMap;
use crate::element::{LazyElement, MethodFn};
use crate::error::DomError;
use crate::native::RealNode;
use crate::value::{Child, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum SlotKind {
    Node,
    Props,
    Methods,
}

/// Reserved key addressing one piece of an element's internal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot(SlotKind);

impl Slot {
    /// The materialized real node.
    pub const NODE: Slot = Slot(SlotKind::Node);
    /// The property store.
    pub const PROPS: Slot = Slot(SlotKind::Props);
    /// The method table.
    pub const METHODS: Slot = Slot(SlotKind::Methods);

    pub fn is_node(self) -> bool {
        self.0 == SlotKind::Node
    }

    pub fn is_props(self) -> bool {
        self.0 == SlotKind::Props
    }

    pub fn is_methods(self) -> bool {
        self.0 == SlotKind::Methods
    }
}

/// Property key: a reserved slot or an ordinary property name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key<'a> {
    Slot(Slot),
    Name(&'a str),
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(name: &'a str) -> Self {
        Key::Name(name)
    }
}

impl From<Slot> for Key<'static> {
    fn from(slot: Slot) -> Self {
        Key::Slot(slot)
    }
}

/// Fixed set of methods usable on an element before it is materialized.
pub struct MethodTable {
    entries: &'static [(&'static str, MethodFn)],
}

impl MethodTable {
    pub(crate) const fn new(entries: &'static [(&'static str, MethodFn)]) -> Self {
        Self { entries }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<(&'static str, MethodFn)> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(entry, method)| (*entry, *method))
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Pre-materialization holding area for an element's properties and children.
#[derive(Clone, Debug)]
pub(crate) struct PropertyStore {
    pub(crate) tag_name: Rc<str>,
    pub(crate) attributes: OrderedMap<Rc<str>, Value>,
    pub(crate) children: Vec<Child>,
}

impl PropertyStore {
    pub(crate) fn get(&self, key: &str) -> Option<Value> {
        match key {
            "tagName" => Some(Value::String(self.tag_name.clone())),
            "children" => Some(Value::Children(self.children.clone())),
            _ => self.attributes.get(key).cloned(),
        }
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        matches!(key, "tagName" | "children") || self.attributes.contains_key(key)
    }

    pub(crate) fn set(&mut self, key: &str, value: Value) -> Result<(), DomError> {
        match key {
            "tagName" => Err(DomError::read_only(key)),
            "children" => match value {
                Value::Children(children) => {
                    self.children = children;
                    Ok(())
                }
                other => Err(DomError::invalid_value(key, "children", &other)),
            },
            _ => {
                self.attributes.insert(Rc::from(key), value);
                Ok(())
            }
        }
    }
}

/// Sealed internal state of a lazy element.
pub(crate) struct ElementSlots {
    node: OnceCell<RealNode>,
    pub(crate) props: RefCell<PropertyStore>,
    pub(crate) methods: &'static MethodTable,
    pub(crate) materializing: Cell<bool>,
}

impl ElementSlots {
    pub(crate) fn new(store: PropertyStore, methods: &'static MethodTable) -> Self {
        Self {
            node: OnceCell::new(),
            props: RefCell::new(store),
            methods,
            materializing: Cell::new(false),
        }
    }

    pub(crate) fn node(&self) -> Option<&RealNode> {
        self.node.get()
    }

    /// Sets the node slot. The slot transitions unset to set once; attaching
    /// the same node again is a no-op, a different node is rejected.
    pub(crate) fn attach(&self, node: RealNode) -> Result<(), DomError> {
        match self.node.get() {
            Some(existing) if existing.is_same(&node) => Ok(()),
            Some(_) => Err(DomError::AlreadyMaterialized),
            None => self
                .node
                .set(node)
                .map_err(|_| DomError::AlreadyMaterialized),
        }
    }
}

/// Read handle to an element's property store.
///
/// Stays readable after materialization; it then reflects what the element
/// was built with rather than the real node.
#[derive(Clone)]
pub struct PropertyStoreRef {
    element: LazyElement,
}

impl PropertyStoreRef {
    pub(crate) fn new(element: LazyElement) -> Self {
        Self { element }
    }

    pub fn tag_name(&self) -> Rc<str> {
        self.element.slots().props.borrow().tag_name.clone()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.element.slots().props.borrow().get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.element.slots().props.borrow().contains(key)
    }

    /// Snapshot of the child sequence.
    pub fn children(&self) -> Vec<Child> {
        self.element.slots().props.borrow().children.clone()
    }

    /// Snapshot of every stored property except `tagName` and `children`.
    pub fn attributes(&self) -> Vec<(Rc<str>, Value)> {
        self.element
            .slots()
            .props
            .borrow()
            .attributes
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn element(&self) -> &LazyElement {
        &self.element
    }
}

impl fmt::Debug for PropertyStoreRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.element.slots().props.borrow();
        f.debug_struct("PropertyStore")
            .field("tagName", &store.tag_name)
            .field("attributes", &store.attributes)
            .field("children", &store.children.len())
            .finish()
    }
}
