#![doc(html_root_url = "https://docs.rs/orrery/0.1.0")]

//! <h1 align="center">ORRERY - Fixed-timestep 2D animation engine</h1>
//! <div style="text-align:center;font-style:italic;">A clockwork scene & animation sequencing core - written in Rust.</div>
//! <br/>
//!
//! # Documentation
//!
//! This is the API documentation.<br/>
//! To see the code in action, visit the [examples](https://github.com/orrery-engine/orrery/tree/develop/orrery/examples) directory.
//!
//! # Features
//!
//! **Orrery** is a Rust library for driving 2D scene animations at a fixed simulation rate,
//! decoupled from the rendering rate.
//!
//! - A fixed-step [`Clock`](clock::Clock) with catch-up and overrun (scratch) compensation
//! - A hierarchical [scene graph](scene) of drawable nodes, updated once per tick and drawn
//!   once per frame through a host-provided [`Renderer`](render::Renderer)
//! - Five per-tick property [`Animation`](animations::Animation) interpolators (translation,
//!   rotation, zoom, opacity, filter)
//! - A two-level scheduler: [`Sequence`](animations::Sequence)s of animations, managed by a
//!   [`Sequencer`](animations::Sequencer) through stored/waiting/active pools
//! - A [`ResourceLoader`](loader::ResourceLoader) tracking scene assets before unlocking
//!   dependent behavior
//!
//! # Getting Started
//!
//! - Add the following to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! orrery = "0.1.0"
//! ```
//!
//! - Implement the [`Renderer`](render::Renderer) trait for your drawing target, build a
//!   scene and start the engine (the mock renderer shown here ships behind the `mocks`
//!   feature):
//! ```ignore
//! use orrery::animations::{Animation, Sequence};
//! use orrery::engine::Engine;
//! use orrery::mocks::MockRenderer;
//! use orrery::scene::{Node, Scene, SolidBackdrop};
//!
//! #[orrery::runtime]
//! async fn main() {
//!     let scene = Scene::new().set_background(SolidBackdrop::new("black"));
//!     let bubble = Node::image("bubble_0", "bubble.png");
//!     scene.get_root().append_child(bubble.clone());
//!
//!     let engine = Engine::new(MockRenderer::new(), 800.0, 600.0);
//!     engine.load_scene(scene);
//!
//!     let sequence = Sequence::default();
//!     sequence
//!         .add_animation(
//!             Animation::translation(&bubble, 0.0, 4500.0, (400.0, 600.0), (250.0, -800.0))
//!                 .unwrap()
//!                 .set_loop(false),
//!         )
//!         .unwrap();
//!     let sequencer = engine.get_sequencer();
//!     sequencer.add(&sequence);
//!
//!     engine.start();
//!     sequencer.start();
//! }
//! ```
//!
//! # Feature flags
//!
//! - **serde** -- Enables serialize/deserialize capabilities for configuration and value
//!   entities.
//! - **mocks** -- Provides mocked entities (useful for tests mostly).

#[cfg(test)]
extern crate self as orrery;

pub mod animations;
pub mod clock;
pub mod engine;
pub mod errors;
pub mod loader;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod render;
pub mod scene;
pub mod utils;

pub use orrery_macros::runtime;
