//! Render entry points built on [`patch`](crate::patch).

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use lazydom_core::{Child, DomError, Handler, RealNode};

use crate::patch::{forget, patch};

thread_local! {
    static ROOTS: RefCell<Vec<Root>> = const { RefCell::new(Vec::new()) };
}

/// Renders `tree` into `container`, patching whatever the previous call left there.
pub fn render(tree: impl Into<Child>, container: &RealNode) -> Result<RealNode, DomError> {
    let mut root = take_root(container).unwrap_or_else(|| Root::new(container.clone()));
    let rendered = root.render(tree);
    ROOTS.with(|roots| roots.borrow_mut().push(root));
    rendered
}

/// Removes what [`render`] mounted into `container`. Returns false when nothing was mounted.
pub fn unmount(container: &RealNode) -> Result<bool, DomError> {
    match take_root(container) {
        Some(mut root) => root.unmount(),
        None => Ok(false),
    }
}

fn take_root(container: &RealNode) -> Option<Root> {
    ROOTS.with(|roots| {
        let mut roots = roots.borrow_mut();
        let index = roots
            .iter()
            .position(|root| root.container.is_same(container))?;
        Some(roots.swap_remove(index))
    })
}

/// Owned mount point inside one container.
#[derive(Debug)]
pub struct Root {
    container: RealNode,
    node: Option<RealNode>,
}

impl Root {
    pub fn new(container: RealNode) -> Self {
        Self {
            container,
            node: None,
        }
    }

    pub fn container(&self) -> &RealNode {
        &self.container
    }

    /// Current root real node, if mounted.
    pub fn node(&self) -> Option<&RealNode> {
        self.node.as_ref()
    }

    pub fn render(&mut self, tree: impl Into<Child>) -> Result<RealNode, DomError> {
        let tree = tree.into();
        let node = patch(self.node.as_ref(), &tree, &self.container)?;
        log::debug!(
            "rendered {:?} into {:?}",
            node.node_name(),
            self.container.node_name()
        );
        self.node = Some(node.clone());
        Ok(node)
    }

    pub fn unmount(&mut self) -> Result<bool, DomError> {
        let Some(node) = self.node.take() else {
            return Ok(false);
        };
        forget(&node);
        self.container.remove_child(node)?;
        Ok(true)
    }
}

type View<S> = dyn Fn(&S, &Rerender<S>) -> Result<Child, DomError>;

struct RendererInner<S> {
    root: RefCell<Root>,
    state: RefCell<S>,
    view: Box<View<S>>,
    error: RefCell<Option<DomError>>,
}

/// Re-renders a view whenever its state changes.
///
/// The view receives the state and a [`Rerender`] handle it can pass down the
/// tree, so event handlers deep in the tree can update the state and trigger
/// the next render.
pub struct Renderer<S> {
    inner: Rc<RendererInner<S>>,
}

impl<S: 'static> Renderer<S> {
    pub fn new<F>(container: RealNode, state: S, view: F) -> Self
    where
        F: Fn(&S, &Rerender<S>) -> Result<Child, DomError> + 'static,
    {
        Self {
            inner: Rc::new(RendererInner {
                root: RefCell::new(Root::new(container)),
                state: RefCell::new(state),
                view: Box::new(view),
                error: RefCell::new(None),
            }),
        }
    }

    pub fn render(&self) -> Result<RealNode, DomError> {
        render_inner(&self.inner)
    }

    /// Mutates the state and renders again.
    pub fn update(&self, update: impl FnOnce(&mut S)) -> Result<RealNode, DomError> {
        update(&mut self.inner.state.borrow_mut());
        self.render()
    }

    pub fn with_state<R>(&self, read: impl FnOnce(&S) -> R) -> R {
        read(&self.inner.state.borrow())
    }

    pub fn handle(&self) -> Rerender<S> {
        Rerender {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn root_node(&self) -> Option<RealNode> {
        self.inner.root.borrow().node().cloned()
    }

    /// Takes the error raised by the last failed render started from an event handler.
    pub fn take_error(&self) -> Option<DomError> {
        self.inner.error.borrow_mut().take()
    }

    pub fn unmount(&self) -> Result<bool, DomError> {
        self.inner.root.borrow_mut().unmount()
    }
}

impl<S> Clone for Renderer<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> fmt::Debug for Renderer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("root", &self.inner.root.borrow())
            .finish_non_exhaustive()
    }
}

fn render_inner<S>(inner: &Rc<RendererInner<S>>) -> Result<RealNode, DomError> {
    let handle = Rerender {
        inner: Rc::downgrade(inner),
    };
    let tree = {
        let state = inner.state.borrow();
        (inner.view)(&state, &handle)?
    };
    inner.root.borrow_mut().render(tree)
}

/// Weak handle back to a [`Renderer`]. Does nothing once the renderer is dropped.
pub struct Rerender<S> {
    inner: Weak<RendererInner<S>>,
}

impl<S> Clone for Rerender<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: 'static> Rerender<S> {
    /// Mutates the state and renders again. Returns `None` when the renderer is gone.
    pub fn update(&self, update: impl FnOnce(&mut S)) -> Option<Result<RealNode, DomError>> {
        let inner = self.inner.upgrade()?;
        update(&mut inner.state.borrow_mut());
        Some(render_inner(&inner))
    }

    pub fn rerender(&self) -> Option<Result<RealNode, DomError>> {
        let inner = self.inner.upgrade()?;
        Some(render_inner(&inner))
    }

    /// Event handler that applies `update` and re-renders.
    ///
    /// A failed render is stored on the renderer; read it with [`Renderer::take_error`].
    pub fn handler(&self, update: impl Fn(&mut S) + 'static) -> Handler {
        let this = self.clone();
        Handler::new(move || {
            if let Some(Err(err)) = this.update(&update) {
                if let Some(inner) = this.inner.upgrade() {
                    *inner.error.borrow_mut() = Some(err);
                }
            }
        })
    }
}

impl<S> fmt::Debug for Rerender<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rerender")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazydom_core::memory::{dispatch_event, outer_html};
    use lazydom_core::{children, create, element, install, props, MemoryDocument, Props};

    fn setup() -> RealNode {
        let document = MemoryDocument::new();
        install(document.clone());
        document.element("main")
    }

    #[test]
    fn render_patches_the_previous_root() {
        let container = setup();
        let first = render(element("p", Props::new(), children!["1"]), &container).unwrap();
        let second = render(element("p", Props::new(), children!["2"]), &container).unwrap();

        assert!(first.is_same(&second));
        assert_eq!(outer_html(&container).unwrap(), "<main><p>2</p></main>");
    }

    #[test]
    fn unmount_clears_the_container() {
        let container = setup();
        render(element("p", Props::new(), Vec::new()), &container).unwrap();

        assert!(unmount(&container).unwrap());
        assert!(!unmount(&container).unwrap());
        assert!(container.child_nodes().is_empty());
    }

    #[test]
    fn roots_are_independent_per_container() {
        let document = MemoryDocument::new();
        install(document.clone());
        let left = document.element("div");
        let right = document.element("div");
        let mut left_root = Root::new(left.clone());
        let mut right_root = Root::new(right.clone());

        left_root.render("left").unwrap();
        right_root.render("right").unwrap();
        left_root.render("LEFT").unwrap();

        assert_eq!(outer_html(&left).unwrap(), "<div>LEFT</div>");
        assert_eq!(outer_html(&right).unwrap(), "<div>right</div>");
        assert!(right_root.node().is_some());
    }

    #[test]
    fn handlers_update_state_and_rerender() {
        let container = setup();
        let renderer = Renderer::new(container.clone(), 0_i64, |count, rerender| {
            create(
                "button",
                Some(props! { "onclick" => rerender.handler(|count| *count += 1) }),
                children![format!("clicked {count}")],
            )
        });

        let button = renderer.render().unwrap();
        assert!(dispatch_event(&button, "click"));
        assert!(dispatch_event(&button, "click"));

        assert_eq!(renderer.with_state(|count| *count), 2);
        assert!(renderer.root_node().unwrap().is_same(&button));
        assert_eq!(button.text().as_deref(), None);
        assert_eq!(button.get("textContent").to_string(), "clicked 2");
        assert!(renderer.take_error().is_none());
    }

    #[test]
    fn view_errors_surface_through_take_error() {
        let container = setup();
        let renderer = Renderer::new(container, false, |broken, rerender| {
            if *broken {
                return create(lazydom_core::Value::Null, None, Vec::<Child>::new());
            }
            create(
                "button",
                Some(props! { "onclick" => rerender.handler(|broken| *broken = true) }),
                Vec::<Child>::new(),
            )
        });

        let button = renderer.render().unwrap();
        dispatch_event(&button, "click");

        assert!(matches!(
            renderer.take_error(),
            Some(DomError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn handles_outliving_the_renderer_do_nothing() {
        let container = setup();
        let renderer = Renderer::new(container, (), |_, _| {
            create("div", None, Vec::<Child>::new())
        });
        let handle = renderer.handle();
        drop(renderer);

        assert!(handle.rerender().is_none());
    }
}
