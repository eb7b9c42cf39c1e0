//! Positional reconciliation of a lazy tree against an existing real subtree.
//!
//! The previous real node is reused when the new tree describes the same kind
//! of node: properties are synced, children are matched by index, and the new
//! lazy element is attached to the reused node through its node slot. Anything
//! else is replaced in place.

use std::cell::RefCell;
use std::fmt::Write as _;

use lazydom_core::{
    current, Child, DomError, Key, LazyElement, PropertyAccess, RealNode, RealTree, Slot, Value,
};

thread_local! {
    // last tree patched onto each root node
    static LAST_TREES: RefCell<Vec<(RealNode, Child)>> = const { RefCell::new(Vec::new()) };
}

/// Mounts or updates `next` inside `container`.
///
/// Without a previous node the tree is materialized and appended. With one, the
/// previous subtree is patched in place where possible. Returns the root real
/// node, which may differ from `previous` when the root had to be replaced.
pub fn patch(
    previous: Option<&RealNode>,
    next: &Child,
    container: &RealNode,
) -> Result<RealNode, DomError> {
    let tree = current()?;
    let root = match previous {
        None => {
            let node = tree.resolve(next)?;
            container.append_child(node.clone())?;
            node
        }
        Some(previous) => {
            let old = take_last_tree(previous);
            patch_node(&tree, container, previous, old.as_ref(), next)?
        }
    };
    remember_tree(&root, next.clone());

    if std::env::var_os("LAZYDOM_DEBUG_PATCH").is_some() {
        log::debug!("patched tree:\n{}", describe(&root));
    }
    Ok(root)
}

/// Drops the remembered tree for `root`. Returns whether one was recorded.
pub fn forget(root: &RealNode) -> bool {
    take_last_tree(root).is_some()
}

fn take_last_tree(root: &RealNode) -> Option<Child> {
    LAST_TREES.with(|trees| {
        let mut trees = trees.borrow_mut();
        let index = trees.iter().position(|(node, _)| node.is_same(root))?;
        Some(trees.swap_remove(index).1)
    })
}

fn remember_tree(root: &RealNode, tree: Child) {
    LAST_TREES.with(|trees| {
        let mut trees = trees.borrow_mut();
        trees.retain(|(node, _)| !node.is_same(root));
        trees.push((root.clone(), tree));
    });
}

fn patch_node(
    tree: &RealTree,
    parent: &RealNode,
    current: &RealNode,
    old: Option<&Child>,
    next: &Child,
) -> Result<RealNode, DomError> {
    match next {
        Child::Text(text) => match current.text() {
            Some(data) => {
                if data != *text {
                    current.set("nodeValue", Value::String(text.clone()))?;
                }
                Ok(current.clone())
            }
            None => replace(tree, parent, current, next),
        },
        Child::Node(node) => {
            if node.is_same(current) {
                Ok(current.clone())
            } else {
                replace(tree, parent, current, next)
            }
        }
        Child::Element(element) => {
            if let Some(node) = element.materialized_node() {
                return if node.is_same(current) {
                    Ok(node)
                } else {
                    replace(tree, parent, current, next)
                };
            }
            if !current.is_element() || !current.node_name().eq_ignore_ascii_case(&element.tag_name())
            {
                return replace(tree, parent, current, next);
            }
            let old = old.and_then(Child::as_element);
            reuse_element(tree, current, old, element)?;
            Ok(current.clone())
        }
    }
}

fn reuse_element(
    tree: &RealTree,
    node: &RealNode,
    old: Option<&LazyElement>,
    next: &LazyElement,
) -> Result<(), DomError> {
    let store = next.store();

    for (key, value) in store.attributes() {
        if node.get(&key) != value {
            node.set(&key, value)?;
        }
    }
    let old_children = match old {
        Some(old) => {
            let old_store = old.store();
            for (key, _) in old_store.attributes() {
                if !store.contains(&key) {
                    node.remove_property(&key)?;
                }
            }
            old_store.children()
        }
        None => Vec::new(),
    };

    patch_children(tree, node, &old_children, &store.children())?;
    next.set(Key::Slot(Slot::NODE), Value::Node(node.clone()))
}

fn patch_children(
    tree: &RealTree,
    parent: &RealNode,
    old: &[Child],
    next: &[Child],
) -> Result<(), DomError> {
    let existing = parent.child_nodes();
    for (index, child) in next.iter().enumerate() {
        match existing.get(index) {
            Some(current) => {
                let previous = old.get(index).filter(|previous| {
                    previous
                        .backing_node()
                        .is_some_and(|backing| backing.is_same(current))
                });
                patch_node(tree, parent, current, previous, child)?;
            }
            None => {
                let node = tree.resolve(child)?;
                parent.append_child(node)?;
            }
        }
    }
    for extra in existing.iter().skip(next.len()) {
        // a reused real child may already have been moved elsewhere
        if extra.parent_node().is_some_and(|owner| owner.is_same(parent)) {
            parent.remove_child(extra.clone())?;
        }
    }
    Ok(())
}

fn replace(
    tree: &RealTree,
    parent: &RealNode,
    current: &RealNode,
    next: &Child,
) -> Result<RealNode, DomError> {
    let node = tree.resolve(next)?;
    log::trace!("replacing {current:?} with {node:?}");
    parent.insert_before(node.clone(), Some(current))?;
    parent.remove_child(current.clone())?;
    Ok(node)
}

fn describe(root: &RealNode) -> String {
    fn walk(node: &RealNode, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        match node.text() {
            Some(text) => {
                let _ = writeln!(out, "{indent}{text:?}");
            }
            None => {
                let _ = writeln!(out, "{indent}<{}>", node.node_name().to_lowercase());
                for child in node.child_nodes() {
                    walk(&child, depth + 1, out);
                }
            }
        }
    }
    let mut out = String::new();
    walk(root, 0, &mut out);
    out
}
