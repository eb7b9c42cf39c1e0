//! Element factory: the construction entry point called by tree-building code.

use std::rc::Rc;

use crate::element::LazyElement;
use crate::error::DomError;
use crate::slots::PropertyStore;
use crate::value::{Child, Component, Props, Value};

/// Type descriptor passed to [`create`].
#[derive(Clone, Debug)]
pub enum ElementType {
    Tag(Rc<str>),
    Component(Component),
    /// Any other descriptor. [`create`] rejects it.
    Other(Value),
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        ElementType::Tag(Rc::from(tag))
    }
}

impl From<String> for ElementType {
    fn from(tag: String) -> Self {
        ElementType::Tag(Rc::from(tag))
    }
}

impl From<Rc<str>> for ElementType {
    fn from(tag: Rc<str>) -> Self {
        ElementType::Tag(tag)
    }
}

impl From<Component> for ElementType {
    fn from(component: Component) -> Self {
        ElementType::Component(component)
    }
}

impl From<&Component> for ElementType {
    fn from(component: &Component) -> Self {
        ElementType::Component(component.clone())
    }
}

impl From<Value> for ElementType {
    fn from(value: Value) -> Self {
        match value {
            Value::String(tag) => ElementType::Tag(tag),
            Value::Component(component) => ElementType::Component(component),
            other => ElementType::Other(other),
        }
    }
}

/// Builds a node.
///
/// A tag name yields a fresh [`LazyElement`] whose store is `props` merged with
/// `tagName` (uppercased) and `children`. A component is called with `props`
/// plus `children`, and its result is returned as is. Nothing touches the real tree.
pub fn create<T, I>(ty: T, props: Option<Props>, children: I) -> Result<Child, DomError>
where
    T: Into<ElementType>,
    I: IntoIterator,
    I::Item: Into<Child>,
{
    let props = props.unwrap_or_default();
    let children: Vec<Child> = children.into_iter().map(Into::into).collect();

    match ty.into() {
        ElementType::Tag(tag) => Ok(Child::Element(element(&tag, props, children))),
        ElementType::Component(component) => {
            let mut props = props;
            props.insert("children", Value::Children(children));
            component.call(props)
        }
        ElementType::Other(value) => Err(DomError::UnsupportedType {
            descriptor: value.to_string(),
        }),
    }
}

/// String-type branch of [`create`], typed to return the element directly.
pub fn element(tag: &str, props: Props, children: Vec<Child>) -> LazyElement {
    let mut attributes = props.into_entries();
    attributes.shift_remove("tagName");
    attributes.shift_remove("children");
    LazyElement::from_store(PropertyStore {
        tag_name: Rc::from(tag.to_uppercase()),
        attributes,
        children,
    })
}
