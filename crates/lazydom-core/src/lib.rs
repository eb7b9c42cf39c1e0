//! Core of lazydom: lazy elements that defer creating their real node until it
//! is observed or attached, the element factory, and the interception layer
//! that lets real-tree mutation calls accept lazy elements.

pub mod collections;
mod element;
mod error;
mod factory;
mod interceptor;
mod materialize;
pub mod memory;
mod native;
mod slots;
mod value;

pub use element::{BoundMethod, LazyElement, Property, PropertyAccess, ELEMENT_METHODS};
pub use error::DomError;
pub use factory::{create, element, ElementType};
pub use interceptor::{current, install, install_shared, installed, is_installed, RealTree};
pub use memory::{MemoryDocument, MemoryNode, NativeStats};
pub use native::{NativeDocument, NativeNode, RealNode};
pub use slots::{Key, MethodTable, PropertyStoreRef, Slot};
pub use value::{Child, Component, Handler, Props, Value};

#[cfg(test)]
mod tests;
