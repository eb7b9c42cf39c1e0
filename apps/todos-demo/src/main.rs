mod app;

use std::time::Instant;

use lazydom::prelude::*;

use app::{application, find_by_id, TodoState};

const DEFAULT_ITEMS: usize = 3;

fn main() {
    #[cfg(feature = "logging")]
    let _ = env_logger::try_init();

    if let Err(err) = run() {
        eprintln!("todos-demo: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), DomError> {
    let items = std::env::var("TODOS_DEMO_ITEMS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_ITEMS);

    let document = MemoryDocument::new();
    install(document.clone());
    let container = document.element("div");
    container.set("id", "container")?;

    let renderer = Renderer::new(container.clone(), TodoState::default(), application);
    timed("initial render", || renderer.render())?;

    for _ in 0..items {
        click(&renderer, &container, "add")?;
    }
    if let Some(first) = find_by_id(&container, "todos").and_then(|list| list.child_at(0)) {
        dispatch_event(&first, "click");
        if let Some(err) = renderer.take_error() {
            return Err(err);
        }
    }

    println!("{}", outer_html(&container).unwrap_or_default());
    let stats = document.stats();
    println!(
        "{} todos, {} left; {} elements and {} text nodes created, {} appends, {} inserts, {} removals",
        renderer.with_state(|state| state.todos.len()),
        renderer.with_state(TodoState::remaining),
        stats.elements_created(),
        stats.text_nodes_created(),
        stats.append_calls(),
        stats.insert_calls(),
        stats.remove_calls(),
    );
    Ok(())
}

fn click(renderer: &Renderer<TodoState>, container: &RealNode, id: &str) -> Result<(), DomError> {
    let node = find_by_id(container, id)
        .ok_or_else(|| DomError::Native(format!("no element with id {id:?}")))?;
    let started = Instant::now();
    dispatch_event(&node, "click");
    log::info!("render after click on #{id}: {:?}", started.elapsed());
    match renderer.take_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn timed<T>(label: &str, f: impl FnOnce() -> Result<T, DomError>) -> Result<T, DomError> {
    let started = Instant::now();
    let result = f();
    log::info!("{label}: {:?}", started.elapsed());
    result
}
