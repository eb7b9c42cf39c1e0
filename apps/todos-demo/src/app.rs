//! Todo list view.
//!
//! The whole application is re-rendered on every state change; the patcher
//! keeps the real nodes that did not change.

use lazydom::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub struct Todo {
    pub title: String,
    pub done: bool,
}

#[derive(Debug, Default)]
pub struct TodoState {
    pub todos: Vec<Todo>,
}

impl TodoState {
    pub fn add(&mut self) {
        let title = format!("Todo #{}", self.todos.len() + 1);
        self.todos.push(Todo { title, done: false });
    }

    pub fn toggle(&mut self, index: usize) {
        if let Some(todo) = self.todos.get_mut(index) {
            todo.done = !todo.done;
        }
    }

    pub fn remaining(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.done).count()
    }
}

/// One list row. Expects `title`, `done` and `ontoggle` props.
fn todo_item() -> Component {
    Component::named("TodoItem", |props: Props| {
        let done = props.get("done").and_then(Value::as_bool).unwrap_or(false);
        let title = props.get("title").cloned().unwrap_or_default();
        let mut attributes = props! {
            "className" => if done { "todo done" } else { "todo" },
        };
        if let Some(toggle) = props.get("ontoggle") {
            attributes.insert("onclick", toggle.clone());
        }
        create("li", Some(attributes), children![title.to_string()])
    })
}

fn header(state: &TodoState, rerender: &Rerender<TodoState>) -> Result<Child, DomError> {
    create(
        "header",
        None,
        children![
            create("h1", None, children!["todos"])?,
            create(
                "button",
                Some(props! {
                    "id" => "add",
                    "onclick" => rerender.handler(TodoState::add),
                }),
                children!["Add"],
            )?,
            create(
                "span",
                Some(props! { "id" => "remaining" }),
                children![format!("{} left", state.remaining())],
            )?,
        ],
    )
}

fn todo_list(state: &TodoState, rerender: &Rerender<TodoState>) -> Result<Child, DomError> {
    let item = todo_item();
    let items = state
        .todos
        .iter()
        .enumerate()
        .map(|(index, todo)| {
            create(
                &item,
                Some(props! {
                    "title" => todo.title.as_str(),
                    "done" => todo.done,
                    "ontoggle" => rerender.handler(move |state: &mut TodoState| state.toggle(index)),
                }),
                Vec::<Child>::new(),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    create("ul", Some(props! { "id" => "todos" }), items)
}

/// Root view handed to the [`Renderer`].
pub fn application(state: &TodoState, rerender: &Rerender<TodoState>) -> Result<Child, DomError> {
    create(
        "section",
        Some(props! { "className" => "todoapp" }),
        children![header(state, rerender)?, todo_list(state, rerender)?],
    )
}

/// Depth-first search for the element whose `id` property is `id`.
pub fn find_by_id(root: &RealNode, id: &str) -> Option<RealNode> {
    root.child_nodes().into_iter().find_map(|child| {
        if child.get("id").as_str() == Some(id) {
            Some(child)
        } else {
            find_by_id(&child, id)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazydom_testing::{has_id, has_tag, LazyDomTestRule};

    #[test]
    fn adding_and_toggling_todos() {
        let mut rule = LazyDomTestRule::new();
        let renderer = rule.set_view(TodoState::default(), application);

        rule.on_node(has_id("add")).perform_click();
        rule.on_node(has_id("add")).perform_click();
        let first = rule.on_all_nodes(has_tag("li")).remove(0).node().clone();
        assert!(dispatch_event(&first, "click"));

        assert_eq!(first.get("className"), Value::from("todo done"));
        rule.on_node(has_id("remaining")).assert_text_equals("1 left");
        assert_eq!(renderer.with_state(TodoState::remaining), 1);
    }

    #[test]
    fn find_by_id_searches_the_whole_subtree() {
        let mut rule = LazyDomTestRule::new();
        rule.set_view(TodoState::default(), application);

        let button = find_by_id(rule.container(), "add").unwrap();
        assert_eq!(&*button.node_name(), "BUTTON");
        assert!(find_by_id(rule.container(), "missing").is_none());
    }
}
