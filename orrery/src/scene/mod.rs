//! Defines the hierarchical scene graph: nodes, groups and scenes.

mod node;
#[allow(clippy::module_inception)]
mod scene;

pub use node::{ImageData, Node, NodeType};
pub use scene::{Backdrop, Scene, SolidBackdrop};
