//! Interception of real-tree mutations.
//!
//! [`RealTree`] is the adapter that resolves lazy elements into real nodes before
//! delegating to the native insertion and removal methods. [`install`] registers
//! one for the UI thread so that plain [`RealNode`] mutation calls route lazy
//! arguments through it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::element::LazyElement;
use crate::error::DomError;
use crate::materialize;
use crate::native::{NativeDocument, RealNode};
use crate::value::Child;

thread_local! {
    static INSTALLED: RefCell<Option<RealTree>> = const { RefCell::new(None) };
}

/// Registers `document` as this thread's real tree.
///
/// Only the first call installs anything. Later calls return the tree that is
/// already in place and drop the document they were given.
pub fn install<D: NativeDocument + 'static>(document: D) -> RealTree {
    install_shared(Rc::new(document))
}

pub fn install_shared(document: Rc<dyn NativeDocument>) -> RealTree {
    INSTALLED.with(|installed| {
        let mut installed = installed.borrow_mut();
        if let Some(tree) = installed.as_ref() {
            log::debug!("real tree already installed, keeping {:?}", tree.document());
            return tree.clone();
        }
        let tree = RealTree::new(document);
        log::debug!("installed real tree over {:?}", tree.document());
        *installed = Some(tree.clone());
        tree
    })
}

/// The installed tree, if any.
pub fn installed() -> Option<RealTree> {
    INSTALLED.with(|installed| installed.borrow().clone())
}

pub fn is_installed() -> bool {
    INSTALLED.with(|installed| installed.borrow().is_some())
}

/// The installed tree, or [`DomError::NotInstalled`].
pub fn current() -> Result<RealTree, DomError> {
    installed().ok_or(DomError::NotInstalled)
}

#[derive(Debug, Default)]
struct InterceptStats {
    intercepted: Cell<usize>,
    materialized: Cell<usize>,
}

struct TreeInner {
    document: Rc<dyn NativeDocument>,
    stats: InterceptStats,
}

/// Adapter over the native tree that accepts lazy elements wherever a real node is expected.
#[derive(Clone)]
pub struct RealTree {
    inner: Rc<TreeInner>,
}

impl RealTree {
    /// Builds an adapter without installing it.
    pub fn new(document: Rc<dyn NativeDocument>) -> Self {
        Self {
            inner: Rc::new(TreeInner {
                document,
                stats: InterceptStats::default(),
            }),
        }
    }

    pub fn document(&self) -> &dyn NativeDocument {
        &*self.inner.document
    }

    pub fn ptr_eq(&self, other: &RealTree) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn create_element(&self, tag_name: &str) -> Result<RealNode, DomError> {
        self.inner.document.create_element(&tag_name.to_uppercase())
    }

    pub fn create_text_node(&self, data: &str) -> Result<RealNode, DomError> {
        self.inner.document.create_text_node(data)
    }

    /// Materializes `element` against this tree's document.
    pub fn materialize(&self, element: &LazyElement) -> Result<RealNode, DomError> {
        if let Some(node) = element.materialized_node() {
            return Ok(node);
        }
        let node = materialize::materialize(element, self.document())?;
        let stats = &self.inner.stats;
        stats.materialized.set(stats.materialized.get() + 1);
        Ok(node)
    }

    /// Resolves a child into a real node. Real nodes pass through unchanged.
    pub fn resolve(&self, child: &Child) -> Result<RealNode, DomError> {
        match child {
            Child::Node(node) => Ok(node.clone()),
            Child::Element(element) => {
                let stats = &self.inner.stats;
                stats.intercepted.set(stats.intercepted.get() + 1);
                log::trace!("intercepted <{}>", element.tag_name());
                self.materialize(element)
            }
            Child::Text(text) => self.create_text_node(text),
        }
    }

    pub fn insert_child(&self, parent: &RealNode, child: Child) -> Result<Child, DomError> {
        let node = self.resolve(&child)?;
        parent.native().append_child(&node)?;
        Ok(child)
    }

    pub fn insert_before(
        &self,
        parent: &RealNode,
        child: Child,
        reference: Option<&RealNode>,
    ) -> Result<Child, DomError> {
        let node = self.resolve(&child)?;
        parent.native().insert_before(&node, reference)?;
        Ok(child)
    }

    /// Removes `child` from `parent`.
    ///
    /// A lazy element without a node cannot be a child of a real node, so it is
    /// rejected without being materialized.
    pub fn remove_child(&self, parent: &RealNode, child: Child) -> Result<Child, DomError> {
        let node = match &child {
            Child::Node(node) => node.clone(),
            Child::Element(element) => element
                .materialized_node()
                .ok_or_else(|| DomError::not_a_child("removeChild"))?,
            Child::Text(text) => parent
                .child_nodes()
                .into_iter()
                .find(|candidate| candidate.text().as_deref() == Some(&**text))
                .ok_or_else(|| DomError::not_a_child("removeChild"))?,
        };
        parent.native().remove_child(&node)?;
        Ok(child)
    }

    /// Number of lazy elements passed through the interception layer.
    pub fn intercepted(&self) -> usize {
        self.inner.stats.intercepted.get()
    }

    /// Number of subtrees this tree materialized.
    pub fn materialized(&self) -> usize {
        self.inner.stats.materialized.get()
    }
}

impl fmt::Debug for RealTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealTree")
            .field("document", &self.inner.document)
            .field("intercepted", &self.intercepted())
            .field("materialized", &self.materialized())
            .finish()
    }
}
