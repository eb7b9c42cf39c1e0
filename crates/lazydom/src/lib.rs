//! Lazily materialized element trees.
//!
//! [`create`] builds [`LazyElement`]s that behave like real nodes but only
//! create one when a read cannot be answered from their own store, or when they
//! are attached to a real tree. [`render`] mounts and patches such trees into a
//! real container.
//!
//! ```rust,ignore
//! use lazydom::prelude::*;
//!
//! let document = MemoryDocument::new();
//! install(document.clone());
//! let body = document.element("body");
//! let tree = create("p", Some(props! { "id" => "greeting" }), children!["hello"])?;
//! render(tree, &body)?;
//! ```

pub use lazydom_core::*;
pub use lazydom_patch::{forget, patch, render, unmount, Renderer, Rerender, Root};

#[cfg(feature = "web")]
pub use lazydom_platform_web as web;

pub mod prelude {
    pub use lazydom_core::memory::{dispatch_event, inner_html, outer_html};
    pub use lazydom_core::{
        children, create, element, install, props, Child, Component, DomError, Handler,
        LazyElement, MemoryDocument, PropertyAccess, Props, RealNode, Value,
    };
    pub use lazydom_patch::{render, Renderer, Rerender, Root};
}
