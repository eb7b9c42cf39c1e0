//! Values that flow through property reads and writes.
//!
//! Lazy elements and real nodes share one value model so a caller can move a
//! value between the property store and a materialized node without caring
//! which side currently serves the element.

use std::fmt;
use std::rc::Rc;

use crate::collections::OrderedMap;
use crate::element::LazyElement;
use crate::error::DomError;
use crate::native::RealNode;

/// A property value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Node(RealNode),
    Children(Vec<Child>),
    Handler(Handler),
    Component(Component),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&RealNode> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_children(&self) -> Option<&[Child]> {
        match self {
            Value::Children(children) => Some(children),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Node(_) => "node",
            Value::Children(_) => "children",
            Value::Handler(_) => "handler",
            Value::Component(_) => "component",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a.is_same(b),
            (Value::Children(a), Value::Children(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.is_same(b))
            }
            (Value::Handler(a), Value::Handler(b)) => a == b,
            (Value::Component(a), Value::Component(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(flag) => write!(f, "Bool({flag})"),
            Value::Number(number) => write!(f, "Number({number})"),
            Value::String(text) => write!(f, "String({text:?})"),
            Value::Node(node) => write!(f, "Node({node:?})"),
            Value::Children(children) => f.debug_tuple("Children").field(children).finish(),
            Value::Handler(handler) => handler.fmt(f),
            Value::Component(component) => component.fmt(f),
        }
    }
}

/// Renders the value the way a script would stringify it.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(flag) => write!(f, "{flag}"),
            Value::Number(number) => write_number(f, *number),
            Value::String(text) => f.write_str(text),
            Value::Node(node) => write!(f, "[object {}]", node.node_name()),
            Value::Children(children) => {
                for (index, child) in children.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
            Value::Handler(_) => f.write_str("function handler() { [native code] }"),
            Value::Component(component) => write!(f, "function {}() {{ [component] }}", component.name()),
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, number: f64) -> fmt::Result {
    if number.is_nan() {
        return f.write_str("NaN");
    }
    if number.is_infinite() {
        return f.write_str(if number > 0.0 { "Infinity" } else { "-Infinity" });
    }
    if number == 0.0 {
        return f.write_str("0");
    }
    let magnitude = number.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return write!(f, "{number}");
    }
    // exponent form keeps an explicit sign on the exponent
    let scientific = format!("{number:e}");
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            write!(f, "{mantissa}e+{exponent}")
        }
        _ => f.write_str(&scientific),
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Rc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Rc::from(value))
    }
}

impl From<Rc<str>> for Value {
    fn from(value: Rc<str>) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Number(value as f64)
    }
}

impl From<RealNode> for Value {
    fn from(value: RealNode) -> Self {
        Value::Node(value)
    }
}

impl From<Vec<Child>> for Value {
    fn from(value: Vec<Child>) -> Self {
        Value::Children(value)
    }
}

impl From<Handler> for Value {
    fn from(value: Handler) -> Self {
        Value::Handler(value)
    }
}

impl From<Component> for Value {
    fn from(value: Component) -> Self {
        Value::Component(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A child reference held in a `children` sequence.
#[derive(Clone, Debug)]
pub enum Child {
    Element(LazyElement),
    Node(RealNode),
    Text(Rc<str>),
}

impl Child {
    /// Identity comparison: reference identity for elements and nodes,
    /// string equality for text.
    pub fn is_same(&self, other: &Child) -> bool {
        match (self, other) {
            (Child::Element(a), Child::Element(b)) => a.ptr_eq(b),
            (Child::Node(a), Child::Node(b)) => a.is_same(b),
            (Child::Text(a), Child::Text(b)) => a == b,
            _ => false,
        }
    }

    pub fn as_element(&self) -> Option<&LazyElement> {
        match self {
            Child::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&RealNode> {
        match self {
            Child::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The real node currently backing this child, if any.
    pub fn backing_node(&self) -> Option<RealNode> {
        match self {
            Child::Element(element) => element.materialized_node(),
            Child::Node(node) => Some(node.clone()),
            Child::Text(_) => None,
        }
    }
}

impl fmt::Display for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Element(element) => write!(f, "[object {}]", element.tag_name()),
            Child::Node(node) => write!(f, "[object {}]", node.node_name()),
            Child::Text(text) => f.write_str(text),
        }
    }
}

impl From<LazyElement> for Child {
    fn from(value: LazyElement) -> Self {
        Child::Element(value)
    }
}

impl From<&LazyElement> for Child {
    fn from(value: &LazyElement) -> Self {
        Child::Element(value.clone())
    }
}

impl From<RealNode> for Child {
    fn from(value: RealNode) -> Self {
        Child::Node(value)
    }
}

impl From<&RealNode> for Child {
    fn from(value: &RealNode) -> Self {
        Child::Node(value.clone())
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::Text(Rc::from(value))
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child::Text(Rc::from(value))
    }
}

impl From<Rc<str>> for Child {
    fn from(value: Rc<str>) -> Self {
        Child::Text(value)
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Child::Text(Rc::from(value.to_string()))
    }
}

impl From<usize> for Child {
    fn from(value: usize) -> Self {
        Child::Text(Rc::from(value.to_string()))
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Child::Text(Rc::from(Value::Number(value).to_string()))
    }
}

/// Shared zero-argument callback stored in handler properties such as `onclick`.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn()>);

impl Handler {
    pub fn new(handler: impl Fn() + 'static) -> Self {
        Self(Rc::new(handler))
    }

    pub fn call(&self) {
        (self.0)()
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

type RenderFn = dyn Fn(Props) -> Result<Child, DomError>;

/// A function-type element descriptor.
///
/// Components are plain function composition: the factory hands them their
/// props (with `children` filled in) and returns whatever they produce.
#[derive(Clone)]
pub struct Component {
    name: Rc<str>,
    render: Rc<RenderFn>,
}

impl Component {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(Props) -> Result<Child, DomError> + 'static,
    {
        Self::named("anonymous", render)
    }

    pub fn named<F>(name: impl Into<Rc<str>>, render: F) -> Self
    where
        F: Fn(Props) -> Result<Child, DomError> + 'static,
    {
        Self {
            name: name.into(),
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, props: Props) -> Result<Child, DomError> {
        (self.render)(props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

/// Caller-supplied properties for [`create`](crate::create).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    entries: OrderedMap<Rc<str>, Value>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<Rc<str>>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a property, returning the previous value for `key`.
    pub fn insert(&mut self, key: impl Into<Rc<str>>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// The `children` entry, or an empty slice when absent.
    pub fn children(&self) -> &[Child] {
        self.get("children")
            .and_then(Value::as_children)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Rc<str>, &Value)> {
        self.entries.iter()
    }

    pub(crate) fn into_entries(self) -> OrderedMap<Rc<str>, Value> {
        self.entries
    }
}

impl<K: Into<Rc<str>>, V: Into<Value>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Props::new();
        for (key, value) in iter {
            props.insert(key, value);
        }
        props
    }
}

/// Builds [`Props`] from `key => value` pairs.
///
/// ```rust,ignore
/// let props = props! { "id" => "main", "hidden" => false };
/// ```
#[macro_export]
macro_rules! props {
    () => { $crate::Props::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut props = $crate::Props::new();
        $( props.insert($key, $value); )+
        props
    }};
}

/// Builds a `Vec<Child>` from anything convertible into [`Child`].
#[macro_export]
macro_rules! children {
    () => { ::std::vec::Vec::<$crate::Child>::new() };
    ($($child:expr),+ $(,)?) => {
        ::std::vec![$( $crate::Child::from($child) ),+]
    };
}
