use crate::element::LazyElement;
use crate::error::DomError;
use crate::native::{NativeDocument, RealNode};
use crate::value::Child;

/// Creates the real node for `element` and transfers its store onto it.
///
/// Properties are copied in insertion order, then children are resolved and
/// appended in declared order. The node slot is only set once the subtree is
/// complete; an element reached again while it is being built is a cycle.
pub(crate) fn materialize(
    element: &LazyElement,
    document: &dyn NativeDocument,
) -> Result<RealNode, DomError> {
    if let Some(node) = element.materialized_node() {
        return Ok(node);
    }

    let slots = element.slots();
    if slots.materializing.replace(true) {
        return Err(DomError::Hierarchy {
            method: "appendChild",
        });
    }
    let built = build(element, document);
    slots.materializing.set(false);

    let node = built?;
    slots.attach(node.clone())?;
    log::trace!("materialized <{}>", node.node_name());
    Ok(node)
}

fn build(element: &LazyElement, document: &dyn NativeDocument) -> Result<RealNode, DomError> {
    let store = element.slots().props.borrow().clone();

    let node = document.create_element(&store.tag_name)?;
    for (key, value) in store.attributes {
        node.native().set_property(&key, value)?;
    }
    for child in &store.children {
        let child = resolve(child, document)?;
        node.native().append_child(&child)?;
    }
    Ok(node)
}

/// Turns any child reference into a real node.
pub(crate) fn resolve(child: &Child, document: &dyn NativeDocument) -> Result<RealNode, DomError> {
    match child {
        Child::Element(element) => materialize(element, document),
        Child::Node(node) => Ok(node.clone()),
        Child::Text(text) => document.create_text_node(text),
    }
}
