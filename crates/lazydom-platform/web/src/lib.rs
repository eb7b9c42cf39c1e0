//! Browser DOM backend.
//!
//! [`WebDocument`] implements the real-tree boundary over `web_sys`, so lazy
//! trees can be materialized and patched straight into a page.

use std::any::Any;
use std::rc::Rc;

use js_sys::{Function, Reflect};
use lazydom_core::{install, DomError, Handler, NativeDocument, NativeNode, RealNode, RealTree, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Installs panic reporting and a console logger for the page.
pub fn init_logging(level: log::Level) {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(level));
}

/// Installs the page's document as this thread's real tree.
pub fn install_web() -> Result<RealTree, DomError> {
    let document = WebDocument::from_window()?;
    log::debug!("installing the browser document");
    Ok(install(document))
}

#[derive(Clone, Debug)]
pub struct WebDocument {
    document: web_sys::Document,
}

impl WebDocument {
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    pub fn from_window() -> Result<Self, DomError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| DomError::Native("no document in this context".into()))?;
        Ok(Self::new(document))
    }

    pub fn body(&self) -> Option<RealNode> {
        self.document
            .body()
            .map(|body| WebNode::wrap(body.into()))
    }

    pub fn element_by_id(&self, id: &str) -> Option<RealNode> {
        self.document
            .get_element_by_id(id)
            .map(|element| WebNode::wrap(element.into()))
    }
}

impl NativeDocument for WebDocument {
    fn create_element(&self, tag_name: &str) -> Result<RealNode, DomError> {
        let element = self
            .document
            .create_element(tag_name)
            .map_err(|err| dom_error(err, "createElement"))?;
        Ok(WebNode::wrap(element.into()))
    }

    fn create_text_node(&self, data: &str) -> Result<RealNode, DomError> {
        Ok(WebNode::wrap(self.document.create_text_node(data).into()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Handle to one DOM node. Several handles may point at the same node.
#[derive(Clone, Debug)]
pub struct WebNode {
    node: web_sys::Node,
}

impl WebNode {
    pub fn wrap(node: web_sys::Node) -> RealNode {
        RealNode::new(Rc::new(Self { node }))
    }

    pub fn node(&self) -> &web_sys::Node {
        &self.node
    }
}

fn js_node(node: &RealNode) -> Result<&web_sys::Node, DomError> {
    node.downcast_ref::<WebNode>()
        .map(WebNode::node)
        .ok_or_else(|| DomError::Native(format!("{node:?} does not belong to the browser document")))
}

fn dom_error(err: JsValue, method: &'static str) -> DomError {
    match err.dyn_ref::<web_sys::DomException>().map(|err| err.name()) {
        Some(name) if name == "NotFoundError" => DomError::not_a_child(method),
        Some(name) if name == "HierarchyRequestError" => DomError::Hierarchy { method },
        _ => DomError::Native(format!("{method}: {err:?}")),
    }
}

fn to_js(key: &str, value: Value) -> Result<JsValue, DomError> {
    Ok(match value {
        Value::Undefined => JsValue::UNDEFINED,
        Value::Null => JsValue::NULL,
        Value::Bool(value) => JsValue::from_bool(value),
        Value::Number(value) => JsValue::from_f64(value),
        Value::String(value) => JsValue::from_str(&value),
        Value::Node(node) => js_node(&node)?.clone().into(),
        Value::Handler(handler) => Closure::<dyn Fn()>::new(move || handler.call()).into_js_value(),
        other @ (Value::Children(_) | Value::Component(_)) => {
            return Err(DomError::invalid_value(key, "a primitive, node or handler", &other))
        }
    })
}

fn from_js(value: JsValue) -> Value {
    if let Some(text) = value.as_string() {
        return Value::from(text);
    }
    if let Some(number) = value.as_f64() {
        return Value::Number(number);
    }
    if let Some(flag) = value.as_bool() {
        return Value::Bool(flag);
    }
    if value.is_null() {
        return Value::Null;
    }
    if value.is_instance_of::<web_sys::Node>() {
        return Value::Node(WebNode::wrap(value.unchecked_into()));
    }
    if let Some(function) = value.dyn_ref::<Function>() {
        let function = function.clone();
        return Value::Handler(Handler::new(move || {
            if let Err(err) = function.call0(&JsValue::NULL) {
                log::error!("handler threw {err:?}");
            }
        }));
    }
    Value::Undefined
}

impl NativeNode for WebNode {
    fn node_name(&self) -> Rc<str> {
        Rc::from(self.node.node_name())
    }

    fn text(&self) -> Option<Rc<str>> {
        if self.node.node_type() == web_sys::Node::TEXT_NODE {
            Some(Rc::from(self.node.node_value().unwrap_or_default()))
        } else {
            None
        }
    }

    fn get_property(&self, key: &str) -> Value {
        Reflect::get(&self.node, &JsValue::from_str(key))
            .map(from_js)
            .unwrap_or_default()
    }

    fn set_property(&self, key: &str, value: Value) -> Result<(), DomError> {
        let value = to_js(key, value)?;
        let written = Reflect::set(&self.node, &JsValue::from_str(key), &value)
            .map_err(|err| DomError::Native(format!("setting {key}: {err:?}")))?;
        if written {
            Ok(())
        } else {
            Err(DomError::read_only(key))
        }
    }

    fn remove_property(&self, key: &str) -> Result<(), DomError> {
        let js_key = JsValue::from_str(key);
        if key.starts_with("on") {
            Reflect::set(&self.node, &js_key, &JsValue::NULL)
                .map_err(|err| DomError::Native(format!("clearing {key}: {err:?}")))?;
            return Ok(());
        }
        Reflect::delete_property::<JsValue>(self.node.unchecked_ref(), &js_key)
            .map_err(|err| DomError::Native(format!("deleting {key}: {err:?}")))?;
        if let Some(element) = self.node.dyn_ref::<web_sys::Element>() {
            element
                .remove_attribute(key)
                .map_err(|err| dom_error(err, "removeAttribute"))?;
        }
        Ok(())
    }

    fn append_child(&self, child: &RealNode) -> Result<(), DomError> {
        self.node
            .append_child(js_node(child)?)
            .map(drop)
            .map_err(|err| dom_error(err, "appendChild"))
    }

    fn insert_before(&self, child: &RealNode, reference: Option<&RealNode>) -> Result<(), DomError> {
        let reference = reference.map(js_node).transpose()?;
        self.node
            .insert_before(js_node(child)?, reference)
            .map(drop)
            .map_err(|err| dom_error(err, "insertBefore"))
    }

    fn remove_child(&self, child: &RealNode) -> Result<(), DomError> {
        self.node
            .remove_child(js_node(child)?)
            .map(drop)
            .map_err(|err| dom_error(err, "removeChild"))
    }

    fn child_nodes(&self) -> Vec<RealNode> {
        let list = self.node.child_nodes();
        (0..list.length())
            .filter_map(|index| list.item(index))
            .map(WebNode::wrap)
            .collect()
    }

    fn parent_node(&self) -> Option<RealNode> {
        self.node.parent_node().map(WebNode::wrap)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_same_node(&self, other: &dyn NativeNode) -> bool {
        other
            .as_any()
            .downcast_ref::<WebNode>()
            .is_some_and(|other| self.node.is_same_node(Some(&other.node)))
    }
}
