//! Boundary to the real tree.
//!
//! A backend (the in-memory tree, the browser DOM) implements [`NativeDocument`]
//! and [`NativeNode`]. Everything above this module only talks to real nodes
//! through [`RealNode`], whose mutation methods accept lazy elements and route
//! them through the installed [`RealTree`](crate::RealTree).

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::element::{Property, PropertyAccess};
use crate::error::DomError;
use crate::interceptor;
use crate::slots::Key;
use crate::value::{Child, Value};

/// Native operations of one real node.
///
/// `append_child`, `insert_before` and `remove_child` only ever receive real
/// nodes; the interception layer resolves lazy elements before calling them.
pub trait NativeNode: fmt::Debug {
    /// Uppercased tag name for elements, `#text` for text nodes.
    fn node_name(&self) -> Rc<str>;

    /// Character data for text nodes, `None` for elements.
    fn text(&self) -> Option<Rc<str>>;

    fn get_property(&self, key: &str) -> Value;

    fn set_property(&self, key: &str, value: Value) -> Result<(), DomError>;

    fn remove_property(&self, key: &str) -> Result<(), DomError>;

    fn append_child(&self, child: &RealNode) -> Result<(), DomError>;

    /// Inserts `child` before `reference`, or appends when `reference` is `None`.
    fn insert_before(&self, child: &RealNode, reference: Option<&RealNode>) -> Result<(), DomError>;

    fn remove_child(&self, child: &RealNode) -> Result<(), DomError>;

    fn child_nodes(&self) -> Vec<RealNode>;

    fn parent_node(&self) -> Option<RealNode>;

    fn as_any(&self) -> &dyn Any;

    /// Node identity. Backends whose handles are not unique per node override this.
    fn is_same_node(&self, other: &dyn NativeNode) -> bool {
        std::ptr::eq(
            self.as_any() as *const dyn Any as *const (),
            other.as_any() as *const dyn Any as *const (),
        )
    }
}

/// Real-node constructor.
pub trait NativeDocument: fmt::Debug {
    fn create_element(&self, tag_name: &str) -> Result<RealNode, DomError>;

    fn create_text_node(&self, data: &str) -> Result<RealNode, DomError>;

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a real node.
#[derive(Clone)]
pub struct RealNode(Rc<dyn NativeNode>);

impl RealNode {
    pub fn new<N: NativeNode + 'static>(node: Rc<N>) -> Self {
        Self(node)
    }

    pub fn native(&self) -> &dyn NativeNode {
        &*self.0
    }

    /// Downcasts to the backend node type.
    pub fn downcast_ref<N: NativeNode + 'static>(&self) -> Option<&N> {
        self.0.as_any().downcast_ref::<N>()
    }

    pub fn is_same(&self, other: &RealNode) -> bool {
        self.0.is_same_node(&*other.0)
    }

    pub fn node_name(&self) -> Rc<str> {
        self.0.node_name()
    }

    pub fn is_element(&self) -> bool {
        self.0.text().is_none()
    }

    pub fn text(&self) -> Option<Rc<str>> {
        self.0.text()
    }

    pub fn get(&self, key: &str) -> Value {
        self.0.get_property(key)
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), DomError> {
        self.0.set_property(key, value.into())
    }

    pub fn remove_property(&self, key: &str) -> Result<(), DomError> {
        self.0.remove_property(key)
    }

    pub fn child_nodes(&self) -> Vec<RealNode> {
        self.0.child_nodes()
    }

    pub fn child_at(&self, index: usize) -> Option<RealNode> {
        self.0.child_nodes().into_iter().nth(index)
    }

    pub fn parent_node(&self) -> Option<RealNode> {
        self.0.parent_node()
    }

    /// Appends `child`, materializing it first when it is not a real node.
    ///
    /// Real nodes go straight to the native method; anything else needs an
    /// installed [`RealTree`](crate::RealTree).
    pub fn append_child(&self, child: impl Into<Child>) -> Result<Child, DomError> {
        match child.into() {
            Child::Node(node) => {
                self.0.append_child(&node)?;
                Ok(Child::Node(node))
            }
            child => interceptor::current()?.insert_child(self, child),
        }
    }

    pub fn insert_before(
        &self,
        child: impl Into<Child>,
        reference: Option<&RealNode>,
    ) -> Result<Child, DomError> {
        match child.into() {
            Child::Node(node) => {
                self.0.insert_before(&node, reference)?;
                Ok(Child::Node(node))
            }
            child => interceptor::current()?.insert_before(self, child, reference),
        }
    }

    pub fn remove_child(&self, child: impl Into<Child>) -> Result<Child, DomError> {
        match child.into() {
            Child::Node(node) => {
                self.0.remove_child(&node)?;
                Ok(Child::Node(node))
            }
            child => interceptor::current()?.remove_child(self, child),
        }
    }
}

impl fmt::Debug for RealNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.text() {
            Some(text) => write!(f, "RealNode(#text {text:?})"),
            None => write!(f, "RealNode({})", self.0.node_name()),
        }
    }
}

/// Real nodes have no reserved slots; named keys go straight to the native node.
impl PropertyAccess for RealNode {
    fn get(&self, key: Key<'_>) -> Result<Property, DomError> {
        Ok(match key {
            Key::Slot(_) => Property::Value(Value::Undefined),
            Key::Name(name) => Property::Value(self.0.get_property(name)),
        })
    }

    fn set(&self, key: Key<'_>, value: Value) -> Result<(), DomError> {
        match key {
            Key::Slot(_) => Err(DomError::read_only("[[slot]]")),
            Key::Name(name) => self.0.set_property(name, value),
        }
    }
}
