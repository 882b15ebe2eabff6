//! Defines mocked entities of all kinds (useful for tests mostly).

pub mod renderer;

pub use renderer::{MockRenderer, RenderOp};
