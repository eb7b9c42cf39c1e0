use lazydom_core::memory::{dispatch_event, inner_html};
use lazydom_core::{
    install, Child, DomError, MemoryDocument, NativeStats, RealNode, RealTree, Value,
};
use lazydom_patch::{Renderer, Rerender, Root};

pub struct ElementMatcher {
    description: String,
    matcher: Box<dyn Fn(&RealNode) -> bool>,
}

impl ElementMatcher {
    pub fn new(
        description: impl Into<String>,
        matcher: impl Fn(&RealNode) -> bool + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            matcher: Box::new(matcher),
        }
    }

    pub fn matches(&self, node: &RealNode) -> bool {
        (self.matcher)(node)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn and(self, other: ElementMatcher) -> ElementMatcher {
        let description = format!("{} && {}", self.description, other.description);
        ElementMatcher::new(description, move |node| {
            self.matches(node) && other.matches(node)
        })
    }
}

pub fn has_id(id: impl Into<String>) -> ElementMatcher {
    let id = id.into();
    ElementMatcher::new(format!("has_id({:?})", id), move |node| {
        node.get("id").as_str() == Some(id.as_str())
    })
}

pub fn has_tag(tag: impl Into<String>) -> ElementMatcher {
    let tag = tag.into();
    ElementMatcher::new(format!("has_tag({:?})", tag), move |node| {
        node.is_element() && node.node_name().eq_ignore_ascii_case(&tag)
    })
}

/// Elements whose text content equals `text`.
pub fn has_text(text: impl Into<String>) -> ElementMatcher {
    let text = text.into();
    ElementMatcher::new(format!("has_text({:?})", text), move |node| {
        node.is_element() && node.get("textContent").as_str() == Some(text.as_str())
    })
}

pub struct TestNode<'a> {
    rule: &'a LazyDomTestRule,
    node: RealNode,
}

impl<'a> TestNode<'a> {
    pub fn node(&self) -> &RealNode {
        &self.node
    }

    pub fn get(&self, key: &str) -> Value {
        self.node.get(key)
    }

    /// Fires the node's `onclick` handler, then fails the test if the render it
    /// triggered returned an error.
    pub fn perform_click(&mut self) {
        self.perform_event("click");
    }

    pub fn perform_event(&mut self, event: &str) {
        assert!(
            dispatch_event(&self.node, event),
            "{:?} has no on{} handler",
            self.node,
            event
        );
        if let Some(err) = self.rule.take_error() {
            panic!("render after {event} failed: {err}");
        }
    }

    pub fn assert_exists(&self) {
        assert!(
            self.rule.contains(&self.node),
            "{:?} is no longer attached to the test root",
            self.node
        );
    }

    pub fn assert_text_equals(&self, expected: &str) {
        let actual = self.node.get("textContent");
        assert_eq!(actual.as_str(), Some(expected), "text of {:?}", self.node);
    }
}

fn find_node(root: &RealNode, matcher: &ElementMatcher, found: &mut Vec<RealNode>) {
    for child in root.child_nodes() {
        if matcher.matches(&child) {
            found.push(child.clone());
        }
        find_node(&child, matcher, found);
    }
}

trait MountedView {
    fn take_error(&self) -> Option<DomError>;

    fn unmount(&self) -> Result<bool, DomError>;
}

impl<S: 'static> MountedView for Renderer<S> {
    fn take_error(&self) -> Option<DomError> {
        Renderer::take_error(self)
    }

    fn unmount(&self) -> Result<bool, DomError> {
        Renderer::unmount(self)
    }
}

/// Renders content into an in-memory container and queries the result.
pub struct LazyDomTestRule {
    document: MemoryDocument,
    tree: RealTree,
    root: Root,
    view: Option<Box<dyn MountedView>>,
}

impl LazyDomTestRule {
    pub fn new() -> Self {
        let tree = install(MemoryDocument::new());
        let document = tree
            .document()
            .as_any()
            .downcast_ref::<MemoryDocument>()
            .cloned()
            .unwrap_or_else(|| panic!("a non-memory document is installed: {:?}", tree.document()));
        let container = document.element("body");
        Self {
            document,
            tree,
            root: Root::new(container),
            view: None,
        }
    }

    pub fn set_content(&mut self, content: impl Into<Child>) -> RealNode {
        self.unmount_view();
        self.root
            .render(content)
            .unwrap_or_else(|err| panic!("render failed: {err}"))
    }

    /// Mounts a stateful view. Event handlers created through the [`Rerender`]
    /// handle re-render into the same container.
    pub fn set_view<S, F>(&mut self, state: S, view: F) -> Renderer<S>
    where
        S: 'static,
        F: Fn(&S, &Rerender<S>) -> Result<Child, DomError> + 'static,
    {
        self.unmount_view();
        if let Err(err) = self.root.unmount() {
            panic!("unmount failed: {err}");
        }
        let renderer = Renderer::new(self.container().clone(), state, view);
        if let Err(err) = renderer.render() {
            panic!("render failed: {err}");
        }
        self.view = Some(Box::new(renderer.clone()));
        renderer
    }

    pub fn document(&self) -> &MemoryDocument {
        &self.document
    }

    pub fn tree(&self) -> &RealTree {
        &self.tree
    }

    pub fn container(&self) -> &RealNode {
        self.root.container()
    }

    pub fn stats(&self) -> &NativeStats {
        self.document.stats()
    }

    pub fn html(&self) -> String {
        inner_html(self.container()).unwrap_or_default()
    }

    pub fn assert_html(&self, expected: &str) {
        assert_eq!(self.html(), expected);
    }

    pub fn on_node(&self, matcher: ElementMatcher) -> TestNode<'_> {
        let node = self
            .try_find(&matcher)
            .unwrap_or_else(|| panic!("No node found matching {}", matcher.description));
        TestNode { rule: self, node }
    }

    pub fn on_all_nodes(&self, matcher: ElementMatcher) -> Vec<TestNode<'_>> {
        let mut found = Vec::new();
        find_node(self.container(), &matcher, &mut found);
        found
            .into_iter()
            .map(|node| TestNode { rule: self, node })
            .collect()
    }

    pub fn try_find(&self, matcher: &ElementMatcher) -> Option<RealNode> {
        let mut found = Vec::new();
        find_node(self.container(), matcher, &mut found);
        found.into_iter().next()
    }

    fn contains(&self, node: &RealNode) -> bool {
        let mut current = node.parent_node();
        while let Some(parent) = current {
            if parent.is_same(self.container()) {
                return true;
            }
            current = parent.parent_node();
        }
        false
    }

    fn unmount_view(&mut self) {
        if let Some(view) = self.view.take() {
            if let Err(err) = view.unmount() {
                panic!("unmount failed: {err}");
            }
        }
    }

    fn take_error(&self) -> Option<DomError> {
        self.view.as_ref().and_then(|view| view.take_error())
    }
}

impl Default for LazyDomTestRule {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazydom_core::{children, create, element, props, Props};

    #[test]
    fn matchers_find_nodes_in_document_order() {
        let mut rule = LazyDomTestRule::new();
        rule.set_content(element(
            "ul",
            props! { "id" => "list" },
            children![
                element("li", Props::new(), children!["a"]),
                element("li", Props::new(), children!["b"]),
            ],
        ));

        rule.on_node(has_id("list")).assert_exists();
        let items = rule.on_all_nodes(has_tag("li"));
        assert_eq!(items.len(), 2);
        items[1].assert_text_equals("b");
        assert!(rule.try_find(&has_text("c")).is_none());
        rule.assert_html("<ul id=\"list\"><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn click_runs_the_handler_and_rerenders() {
        let mut rule = LazyDomTestRule::new();
        let renderer = rule.set_view(0_i64, |count, rerender| {
            create(
                "button",
                Some(props! { "onclick" => rerender.handler(|count| *count += 1) }),
                children![format!("{count}")],
            )
        });

        rule.on_node(has_tag("button")).perform_click();

        assert_eq!(renderer.with_state(|count| *count), 1);
        rule.on_node(has_tag("button").and(has_text("1"))).assert_exists();
    }

    #[test]
    #[should_panic(expected = "No node found")]
    fn missing_nodes_fail_the_test() {
        let rule = LazyDomTestRule::new();
        rule.on_node(has_id("nothing"));
    }
}
