use crate::memory::outer_html;
use crate::*;
use crate::{children, props};

fn setup() -> (MemoryDocument, RealTree) {
    let document = MemoryDocument::new();
    let tree = install(document.clone());
    (document, tree)
}

fn div(props: Props, children: Vec<Child>) -> LazyElement {
    element("div", props, children)
}

#[test]
fn reads_are_served_from_the_store_before_materialization() {
    let (document, _tree) = setup();
    let element = div(props! { "id" => "x" }, children!["hi"]);

    assert_eq!(element.get_value("id").unwrap(), Value::from("x"));
    assert_eq!(element.get_value("tagName").unwrap(), Value::from("DIV"));
    assert!(!element.is_materialized());
    assert_eq!(document.stats().elements_created(), 0);
}

#[test]
fn method_table_is_consulted_after_the_store() {
    let (_document, _tree) = setup();
    let element = div(Props::new(), Vec::new());

    let method = element
        .get(Key::from("appendChild"))
        .unwrap()
        .into_method()
        .expect("bound method");
    assert_eq!(method.name(), "appendChild");
    method.call("text").unwrap();

    assert_eq!(element.store().children().len(), 1);
    assert!(!element.is_materialized());
}

#[test]
fn unknown_read_materializes_on_demand() {
    let (document, tree) = setup();
    let element = div(props! { "title" => "t" }, children!["a", "b"]);

    let content = element.get_value("textContent").unwrap();

    assert_eq!(content, Value::from("ab"));
    assert!(element.is_materialized());
    assert_eq!(document.stats().elements_created(), 1);
    assert_eq!(tree.materialized(), 1);
    let node = element.materialized_node().unwrap();
    assert_eq!(outer_html(&node).unwrap(), "<div title=\"t\">ab</div>");
}

#[test]
fn reads_after_materialization_come_from_the_real_node() {
    let (_document, _tree) = setup();
    let element = div(props! { "id" => "stale" }, Vec::new());
    let node = element.materialize().unwrap();

    node.set("id", "fresh").unwrap();

    assert_eq!(element.get_value("id").unwrap(), Value::from("fresh"));
    assert_eq!(element.store().get("id"), Some(Value::from("stale")));
    let again = element.materialize().unwrap();
    assert!(again.is_same(&node));
}

#[test]
fn writes_pass_through_once_materialized() {
    let (_document, _tree) = setup();
    let element = div(Props::new(), Vec::new());
    element.set_value("className", "before").unwrap();
    let node = element.materialize().unwrap();

    element.set_value("className", "after").unwrap();

    assert_eq!(node.get("className"), Value::from("after"));
    assert_eq!(element.store().get("className"), Some(Value::from("before")));
}

#[test]
fn tag_name_cannot_be_rewritten() {
    let (_document, _tree) = setup();
    let element = div(Props::new(), Vec::new());
    assert_eq!(
        element.set_value("tagName", "SPAN").unwrap_err(),
        DomError::read_only("tagName")
    );
}

#[test]
fn slots_expose_internal_state() {
    let (document, _tree) = setup();
    let element = div(props! { "id" => "x" }, Vec::new());

    assert!(matches!(element.get(Slot::NODE.into()).unwrap(), Property::Node(None)));
    match element.get(Slot::PROPS.into()).unwrap() {
        Property::Props(store) => assert_eq!(store.get("id"), Some(Value::from("x"))),
        other => panic!("expected the property store, got {other:?}"),
    }
    match element.get(Slot::METHODS.into()).unwrap() {
        Property::Methods(table) => assert!(table.contains("removeChild")),
        other => panic!("expected the method table, got {other:?}"),
    }

    let node = document.element("div");
    element.set(Slot::NODE.into(), Value::Node(node.clone())).unwrap();
    assert!(element.materialized_node().unwrap().is_same(&node));
    assert!(element.set(Slot::PROPS.into(), Value::Null).is_err());
}

#[test]
fn node_slot_is_set_at_most_once() {
    let (document, _tree) = setup();
    let element = div(Props::new(), Vec::new());
    let first = document.element("div");
    let second = document.element("div");

    element.set(Slot::NODE.into(), Value::Node(first.clone())).unwrap();
    element.set(Slot::NODE.into(), Value::Node(first.clone())).unwrap();
    let err = element
        .set(Slot::NODE.into(), Value::Node(second))
        .unwrap_err();

    assert_eq!(err, DomError::AlreadyMaterialized);
    assert!(element.materialized_node().unwrap().is_same(&first));
}

#[test]
fn appends_keep_order_across_the_materialization_boundary() {
    let (_document, _tree) = setup();
    let element = div(Props::new(), Vec::new());
    element.append_child("a").unwrap();
    element.append_child(div(props! { "id" => "b" }, Vec::new())).unwrap();
    let node = element.materialize().unwrap();
    element.append_child("c").unwrap();

    assert_eq!(
        outer_html(&node).unwrap(),
        "<div>a<div id=\"b\"></div>c</div>"
    );
}

#[test]
fn removal_restores_previous_children_on_both_paths() {
    let (_document, _tree) = setup();
    let element = div(Props::new(), children!["a"]);
    let extra = div(Props::new(), Vec::new());

    element.append_child(&extra).unwrap();
    element.remove_child(&extra).unwrap();
    assert_eq!(element.store().children().len(), 1);

    let node = element.materialize().unwrap();
    element.append_child(&extra).unwrap();
    element.remove_child(&extra).unwrap();
    element.append_child("t").unwrap();
    element.remove_child("t").unwrap();
    assert_eq!(outer_html(&node).unwrap(), "<div>a</div>");
}

#[test]
fn removing_a_stranger_fails_on_both_paths() {
    let (_document, _tree) = setup();
    let element = div(Props::new(), Vec::new());
    let stranger = div(Props::new(), Vec::new());

    assert!(element.remove_child(&stranger).unwrap_err().is_not_a_child());
    element.materialize().unwrap();
    assert!(element.remove_child(&stranger).unwrap_err().is_not_a_child());
    assert!(!stranger.is_materialized());
}

#[test]
fn cycles_are_rejected() {
    let (_document, _tree) = setup();
    let outer = div(Props::new(), Vec::new());
    assert_eq!(
        outer.append_child(&outer).unwrap_err(),
        DomError::Hierarchy { method: "appendChild" }
    );

    let inner = div(Props::new(), Vec::new());
    outer.append_child(&inner).unwrap();
    inner.append_child(&outer).unwrap();
    assert!(matches!(outer.materialize(), Err(DomError::Hierarchy { .. })));
    assert!(!outer.is_materialized());
    // break the reference cycle so the test does not leak
    inner.remove_child(&outer).unwrap();
}

#[test]
fn native_append_materializes_lazy_arguments() {
    let (document, tree) = setup();
    let container = document.element("main");
    let element = div(props! { "id" => "x" }, children!["text"]);

    container.append_child(&element).unwrap();

    assert!(element.is_materialized());
    assert_eq!(tree.intercepted(), 1);
    assert_eq!(
        outer_html(&container).unwrap(),
        "<main><div id=\"x\">text</div></main>"
    );
}

#[test]
fn interception_matches_manual_materialization() {
    let (document, _tree) = setup();
    let build = || div(props! { "id" => "x" }, children![element("b", Props::new(), children!["1"])]);

    let intercepted = document.element("section");
    intercepted.append_child(build()).unwrap();

    let manual = document.element("section");
    let node = build().materialize().unwrap();
    manual.append_child(node).unwrap();

    assert_eq!(outer_html(&intercepted), outer_html(&manual));
}

#[test]
fn real_nodes_pass_through_without_interception() {
    let (document, tree) = setup();
    let container = document.element("div");
    let child = document.element("span");

    container.append_child(&child).unwrap();
    container.remove_child(&child).unwrap();

    assert_eq!(tree.intercepted(), 0);
    assert!(container.child_nodes().is_empty());
}

#[test]
fn reinstalling_keeps_a_single_interception_layer() {
    let document = MemoryDocument::new();
    let first = install(document.clone());
    let second = install(MemoryDocument::new());
    assert!(first.ptr_eq(&second));

    let container = document.element("div");
    let appends_before = document.stats().append_calls();
    container.append_child(div(Props::new(), Vec::new())).unwrap();

    assert_eq!(document.stats().append_calls() - appends_before, 1);
    assert_eq!(first.intercepted(), 1);
}

#[test]
fn lazy_arguments_need_an_installed_tree() {
    let document = MemoryDocument::new();
    let container = document.element("div");
    assert!(!is_installed());

    let err = container
        .append_child(div(Props::new(), Vec::new()))
        .unwrap_err();

    assert_eq!(err, DomError::NotInstalled);
    container.append_child(document.element("p")).unwrap();
}

#[test]
fn components_compose_with_elements() {
    let (_document, _tree) = setup();
    let greeting = Component::named("Greeting", |props: Props| {
        let name = props.get("name").cloned().unwrap_or_default();
        let mut children = vec![Child::from(format!("Hello, {name}"))];
        children.extend(props.children().iter().cloned());
        create("p", None, children)
    });

    let tree = create(&greeting, Some(props! { "name" => "Ada" }), children!["!"]).unwrap();
    let node = tree.as_element().unwrap().materialize().unwrap();

    assert_eq!(outer_html(&node).unwrap(), "<p>Hello, Ada!</p>");
}

#[test]
fn property_access_on_real_nodes_ignores_slots() {
    let (document, _tree) = setup();
    let node = document.element("div");
    let value = PropertyAccess::get(&node, Slot::PROPS.into()).unwrap().into_value();
    assert!(value.is_undefined());
    PropertyAccess::set(&node, Key::from("id"), Value::from("n")).unwrap();
    assert_eq!(node.get("id"), Value::from("n"));
}
