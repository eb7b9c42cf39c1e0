//! Mounting and updating lazy trees inside real containers.

mod patch;
mod root;

pub use patch::{forget, patch};
pub use root::{render, unmount, Renderer, Rerender, Root};
