//! In-process real tree.
//!
//! Behaves like a document tree for everything this crate relies on: ordered
//! children, parent links, move-on-append, cycle rejection and the
//! `removeChild` contract. Used by tests, demos and server-side rendering.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt::{self, Write as _};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::collections::map::HashMap;
use crate::error::DomError;
use crate::native::{NativeDocument, NativeNode, RealNode};
use crate::value::{Child, Value};

/// Counters for native calls made against a [`MemoryDocument`].
#[derive(Debug, Default)]
pub struct NativeStats {
    elements_created: Cell<usize>,
    text_nodes_created: Cell<usize>,
    append_calls: Cell<usize>,
    insert_calls: Cell<usize>,
    remove_calls: Cell<usize>,
}

impl NativeStats {
    pub fn elements_created(&self) -> usize {
        self.elements_created.get()
    }

    pub fn text_nodes_created(&self) -> usize {
        self.text_nodes_created.get()
    }

    pub fn append_calls(&self) -> usize {
        self.append_calls.get()
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.get()
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls.get()
    }

    fn bump(counter: &Cell<usize>) {
        counter.set(counter.get() + 1);
    }
}

/// Document backed by [`MemoryNode`]s. Clones share statistics.
#[derive(Clone, Debug, Default)]
pub struct MemoryDocument {
    stats: Rc<NativeStats>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &NativeStats {
        &self.stats
    }

    /// Convenience constructor that never fails.
    pub fn element(&self, tag_name: &str) -> RealNode {
        NativeStats::bump(&self.stats.elements_created);
        MemoryNode::create(
            NodeKind::Element(Rc::from(tag_name.to_uppercase())),
            self.stats.clone(),
        )
    }

    pub fn text(&self, data: &str) -> RealNode {
        NativeStats::bump(&self.stats.text_nodes_created);
        MemoryNode::create(
            NodeKind::Text(RefCell::new(Rc::from(data))),
            self.stats.clone(),
        )
    }
}

impl NativeDocument for MemoryDocument {
    fn create_element(&self, tag_name: &str) -> Result<RealNode, DomError> {
        if tag_name.is_empty() || tag_name.contains(|c: char| c.is_whitespace() || c == '<') {
            return Err(DomError::Native(format!(
                "Failed to execute 'createElement' on 'Document': The tag name provided ('{tag_name}') is not a valid name."
            )));
        }
        Ok(self.element(tag_name))
    }

    fn create_text_node(&self, data: &str) -> Result<RealNode, DomError> {
        Ok(self.text(data))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
enum NodeKind {
    Element(Rc<str>),
    Text(RefCell<Rc<str>>),
}

/// A node of the in-memory tree.
pub struct MemoryNode {
    kind: NodeKind,
    properties: RefCell<HashMap<Rc<str>, Value>>,
    children: RefCell<SmallVec<[RealNode; 4]>>,
    parent: RefCell<Weak<MemoryNode>>,
    this: Weak<MemoryNode>,
    stats: Rc<NativeStats>,
}

impl MemoryNode {
    fn create(kind: NodeKind, stats: Rc<NativeStats>) -> RealNode {
        RealNode::new(Rc::new_cyclic(|this| MemoryNode {
            kind,
            properties: RefCell::new(HashMap::default()),
            children: RefCell::new(SmallVec::new()),
            parent: RefCell::new(Weak::new()),
            this: this.clone(),
            stats,
        }))
    }

    fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    fn text_content(&self) -> String {
        match &self.kind {
            NodeKind::Text(data) => data.borrow().to_string(),
            NodeKind::Element(_) => self
                .children
                .borrow()
                .iter()
                .filter_map(|child| child.downcast_ref::<MemoryNode>().map(MemoryNode::text_content))
                .collect(),
        }
    }

    fn position_of(&self, child: &RealNode) -> Option<usize> {
        self.children
            .borrow()
            .iter()
            .position(|candidate| candidate.is_same(child))
    }

    /// True when `self` is `node` or lies beneath it.
    fn is_inclusive_descendant_of(&self, node: &MemoryNode) -> bool {
        if std::ptr::eq(self, node) {
            return true;
        }
        let mut current = self.parent.borrow().upgrade();
        while let Some(ancestor) = current {
            if std::ptr::eq(&*ancestor, node) {
                return true;
            }
            current = ancestor.parent.borrow().upgrade();
        }
        false
    }

    fn adopt<'a>(&self, child: &'a RealNode, method: &'static str) -> Result<&'a MemoryNode, DomError> {
        let memory = child
            .downcast_ref::<MemoryNode>()
            .ok_or_else(|| DomError::Native(format!("{method}: node belongs to another tree")))?;
        if self.is_text() || self.is_inclusive_descendant_of(memory) {
            return Err(DomError::Hierarchy { method });
        }
        memory.detach();
        Ok(memory)
    }

    fn detach(&self) {
        let parent = self.parent.replace(Weak::new()).upgrade();
        if let Some(parent) = parent {
            parent
                .children
                .borrow_mut()
                .retain(|candidate| !is_memory_node(candidate, self));
        }
    }

    fn set_text_children(&self, data: &str) {
        for child in self.children.borrow_mut().drain(..) {
            if let Some(memory) = child.downcast_ref::<MemoryNode>() {
                *memory.parent.borrow_mut() = Weak::new();
            }
        }
        if data.is_empty() {
            return;
        }
        let text = MemoryNode::create(
            NodeKind::Text(RefCell::new(Rc::from(data))),
            self.stats.clone(),
        );
        if let Some(memory) = text.downcast_ref::<MemoryNode>() {
            *memory.parent.borrow_mut() = self.this.clone();
        }
        self.children.borrow_mut().push(text);
    }

    fn write_html(&self, out: &mut String) {
        match &self.kind {
            NodeKind::Text(data) => escape_into(out, &data.borrow(), false),
            NodeKind::Element(tag) => {
                let tag = tag.to_lowercase();
                let _ = write!(out, "<{tag}");
                let properties = self.properties.borrow();
                let mut keys: Vec<&Rc<str>> = properties.keys().collect();
                keys.sort();
                for key in keys {
                    match &properties[key] {
                        Value::Bool(true) => {
                            let _ = write!(out, " {key}");
                        }
                        value @ (Value::String(_) | Value::Number(_)) => {
                            let _ = write!(out, " {key}=\"");
                            escape_into(out, &value.to_string(), true);
                            out.push('"');
                        }
                        _ => {}
                    }
                }
                out.push('>');
                for child in self.children.borrow().iter() {
                    if let Some(memory) = child.downcast_ref::<MemoryNode>() {
                        memory.write_html(out);
                    }
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

fn is_memory_node(node: &RealNode, memory: &MemoryNode) -> bool {
    node.downcast_ref::<MemoryNode>()
        .is_some_and(|candidate| std::ptr::eq(candidate, memory))
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

impl NativeNode for MemoryNode {
    fn node_name(&self) -> Rc<str> {
        match &self.kind {
            NodeKind::Element(tag) => tag.clone(),
            NodeKind::Text(_) => Rc::from("#text"),
        }
    }

    fn text(&self) -> Option<Rc<str>> {
        match &self.kind {
            NodeKind::Text(data) => Some(data.borrow().clone()),
            NodeKind::Element(_) => None,
        }
    }

    fn get_property(&self, key: &str) -> Value {
        match (key, &self.kind) {
            ("tagName", NodeKind::Element(tag)) => Value::String(tag.clone()),
            ("nodeName", _) => Value::String(self.node_name()),
            ("nodeValue" | "data", NodeKind::Text(data)) => Value::String(data.borrow().clone()),
            ("nodeValue", NodeKind::Element(_)) => Value::Null,
            ("textContent", _) => Value::from(self.text_content()),
            ("children", NodeKind::Element(_)) => Value::Children(
                self.children
                    .borrow()
                    .iter()
                    .filter(|child| child.is_element())
                    .cloned()
                    .map(Child::Node)
                    .collect(),
            ),
            ("childNodes", _) => Value::Children(
                self.children.borrow().iter().cloned().map(Child::Node).collect(),
            ),
            ("parentNode", _) => self
                .parent
                .borrow()
                .upgrade()
                .map(RealNode::new)
                .map(Value::Node)
                .unwrap_or(Value::Null),
            _ => self
                .properties
                .borrow()
                .get(key)
                .cloned()
                .unwrap_or_default(),
        }
    }

    fn set_property(&self, key: &str, value: Value) -> Result<(), DomError> {
        match (key, &self.kind) {
            ("tagName" | "nodeName" | "children" | "childNodes" | "parentNode", _) => {
                Err(DomError::read_only(key))
            }
            ("nodeValue" | "data" | "textContent", NodeKind::Text(data)) => {
                *data.borrow_mut() = Rc::from(value.to_string());
                Ok(())
            }
            ("textContent", NodeKind::Element(_)) => {
                self.set_text_children(&value.to_string());
                Ok(())
            }
            _ => {
                self.properties.borrow_mut().insert(Rc::from(key), value);
                Ok(())
            }
        }
    }

    fn remove_property(&self, key: &str) -> Result<(), DomError> {
        self.properties.borrow_mut().remove(key);
        Ok(())
    }

    fn append_child(&self, child: &RealNode) -> Result<(), DomError> {
        NativeStats::bump(&self.stats.append_calls);
        let memory = self.adopt(child, "appendChild")?;
        *memory.parent.borrow_mut() = self.this.clone();
        self.children.borrow_mut().push(child.clone());
        Ok(())
    }

    fn insert_before(&self, child: &RealNode, reference: Option<&RealNode>) -> Result<(), DomError> {
        let Some(reference) = reference else {
            return self.append_child(child);
        };
        NativeStats::bump(&self.stats.insert_calls);
        if self.position_of(reference).is_none() {
            return Err(DomError::not_a_child("insertBefore"));
        }
        if reference.is_same(child) {
            return Ok(());
        }
        let memory = self.adopt(child, "insertBefore")?;
        // adopting may have shifted the reference when the child was an earlier sibling
        let index = self
            .position_of(reference)
            .ok_or_else(|| DomError::not_a_child("insertBefore"))?;
        *memory.parent.borrow_mut() = self.this.clone();
        self.children.borrow_mut().insert(index, child.clone());
        Ok(())
    }

    fn remove_child(&self, child: &RealNode) -> Result<(), DomError> {
        NativeStats::bump(&self.stats.remove_calls);
        let index = self
            .position_of(child)
            .ok_or_else(|| DomError::not_a_child("removeChild"))?;
        let removed = self.children.borrow_mut().remove(index);
        if let Some(memory) = removed.downcast_ref::<MemoryNode>() {
            *memory.parent.borrow_mut() = Weak::new();
        }
        Ok(())
    }

    fn child_nodes(&self) -> Vec<RealNode> {
        self.children.borrow().to_vec()
    }

    fn parent_node(&self) -> Option<RealNode> {
        self.parent.borrow().upgrade().map(RealNode::new)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Element(tag) => f
                .debug_struct("MemoryNode")
                .field("tag", tag)
                .field("children", &self.children.borrow().len())
                .finish(),
            NodeKind::Text(data) => write!(f, "MemoryNode(#text {:?})", data.borrow()),
        }
    }
}

/// Serializes a memory subtree. `None` for nodes from another backend.
pub fn outer_html(node: &RealNode) -> Option<String> {
    let memory = node.downcast_ref::<MemoryNode>()?;
    let mut out = String::new();
    memory.write_html(&mut out);
    Some(out)
}

/// Serializes the children of a memory node.
pub fn inner_html(node: &RealNode) -> Option<String> {
    let memory = node.downcast_ref::<MemoryNode>()?;
    let mut out = String::new();
    for child in memory.child_nodes() {
        if let Some(child) = child.downcast_ref::<MemoryNode>() {
            child.write_html(&mut out);
        }
    }
    Some(out)
}

/// Invokes the handler stored under `on{event}`. Returns false when there is none.
pub fn dispatch_event(node: &RealNode, event: &str) -> bool {
    let handler = match node.get(&format!("on{event}")) {
        Value::Handler(handler) => handler,
        _ => return false,
    };
    handler.call();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Handler;

    #[test]
    fn append_moves_node_between_parents() {
        let document = MemoryDocument::new();
        let first = document.element("div");
        let second = document.element("div");
        let child = document.element("span");

        first.native().append_child(&child).unwrap();
        second.native().append_child(&child).unwrap();

        assert!(first.child_nodes().is_empty());
        assert_eq!(second.child_nodes().len(), 1);
        assert!(child.parent_node().unwrap().is_same(&second));
    }

    #[test]
    fn remove_child_rejects_strangers() {
        let document = MemoryDocument::new();
        let parent = document.element("ul");
        let stranger = document.element("li");

        let err = parent.native().remove_child(&stranger).unwrap_err();
        assert!(err.is_not_a_child());
        assert_eq!(
            err.to_string(),
            "Failed to execute 'removeChild' on 'Node': The node to be removed is not a child of this node."
        );
    }

    #[test]
    fn appending_an_ancestor_is_a_hierarchy_error() {
        let document = MemoryDocument::new();
        let outer = document.element("div");
        let inner = document.element("div");
        outer.native().append_child(&inner).unwrap();

        let err = inner.native().append_child(&outer).unwrap_err();
        assert_eq!(err, DomError::Hierarchy { method: "appendChild" });
        let err = outer.native().append_child(&outer).unwrap_err();
        assert_eq!(err, DomError::Hierarchy { method: "appendChild" });
    }

    #[test]
    fn insert_before_places_child_ahead_of_reference() {
        let document = MemoryDocument::new();
        let list = document.element("ol");
        let a = document.text("a");
        let b = document.text("b");
        let c = document.text("c");
        list.native().append_child(&a).unwrap();
        list.native().append_child(&c).unwrap();

        list.native().insert_before(&b, Some(&c)).unwrap();
        assert_eq!(outer_html(&list).unwrap(), "<ol>abc</ol>");

        list.native().insert_before(&c, Some(&a)).unwrap();
        assert_eq!(outer_html(&list).unwrap(), "<ol>cab</ol>");
    }

    #[test]
    fn insert_before_requires_the_reference_to_be_a_child() {
        let document = MemoryDocument::new();
        let parent = document.element("ul");
        let stranger = document.element("li");

        let err = parent
            .native()
            .insert_before(&stranger, Some(&stranger))
            .unwrap_err();
        assert!(err.is_not_a_child());
        assert!(stranger.parent_node().is_none());

        let item = document.element("li");
        parent.native().append_child(&item).unwrap();
        parent.native().insert_before(&item, Some(&item)).unwrap();
        assert_eq!(parent.child_nodes().len(), 1);
    }

    #[test]
    fn insert_without_reference_counts_as_an_append() {
        let document = MemoryDocument::new();
        let parent = document.element("div");
        parent.native().insert_before(&document.element("p"), None).unwrap();

        let stats = document.stats();
        assert_eq!(stats.append_calls(), 1);
        assert_eq!(stats.insert_calls(), 0);
        assert_eq!(parent.child_nodes().len(), 1);
    }

    #[test]
    fn serializes_properties_sorted_and_escaped() {
        let document = MemoryDocument::new();
        let node = document.element("a");
        node.set("title", "x \"quoted\"").unwrap();
        node.set("href", "/?a=1&b=2").unwrap();
        node.set("hidden", true).unwrap();
        node.set("onclick", Handler::new(|| {})).unwrap();
        node.native().append_child(&document.text("1 < 2")).unwrap();

        assert_eq!(
            outer_html(&node).unwrap(),
            "<a hidden href=\"/?a=1&amp;b=2\" title=\"x &quot;quoted&quot;\">1 &lt; 2</a>"
        );
    }

    #[test]
    fn text_content_replaces_children() {
        let document = MemoryDocument::new();
        let node = document.element("p");
        node.native().append_child(&document.element("b")).unwrap();
        node.set("textContent", "plain").unwrap();

        assert_eq!(outer_html(&node).unwrap(), "<p>plain</p>");
        assert_eq!(node.get("textContent"), Value::from("plain"));
    }

    #[test]
    fn reserved_properties_are_read_only() {
        let document = MemoryDocument::new();
        let node = document.element("div");
        assert_eq!(node.get("tagName"), Value::from("DIV"));
        assert!(node.set("tagName", "SPAN").is_err());
        assert!(node.set("children", Value::Children(Vec::new())).is_err());
    }

    #[test]
    fn dispatch_calls_the_handler_property() {
        let document = MemoryDocument::new();
        let node = document.element("button");
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        node.set("onclick", Handler::new(move || counter.set(counter.get() + 1)))
            .unwrap();

        assert!(dispatch_event(&node, "click"));
        assert!(!dispatch_event(&node, "input"));
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn statistics_count_native_calls() {
        let document = MemoryDocument::new();
        let parent = document.element("div");
        let child = document.element("span");
        parent.native().append_child(&child).unwrap();
        parent.native().remove_child(&child).unwrap();

        let stats = document.stats();
        assert_eq!(stats.elements_created(), 2);
        assert_eq!(stats.append_calls(), 1);
        assert_eq!(stats.remove_calls(), 1);
    }
}
