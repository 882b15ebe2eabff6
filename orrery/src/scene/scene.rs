use std::fmt::Debug;

use dyn_clone::DynClone;

use crate::render::Renderer;
use crate::scene::Node;

/// Represents a full-viewport decoration drawn before (background) or after (front) the scene
/// graph itself. Decorations are external collaborators: the core only defines when they are
/// drawn.
pub trait Backdrop: Debug + DynClone + Send + Sync {
    /// Draws the decoration over the whole `width` x `height` viewport.
    fn draw(&self, renderer: &mut dyn Renderer, width: f64, height: f64);
}
dyn_clone::clone_trait_object!(Backdrop);

/// Simple solid-color backdrop.
#[derive(Clone, Debug)]
pub struct SolidBackdrop {
    fill_color: String,
    visible: bool,
}

impl SolidBackdrop {
    /// Creates a visible solid backdrop of the given color.
    pub fn new<S: Into<String>>(fill_color: S) -> Self {
        Self {
            fill_color: fill_color.into(),
            visible: true,
        }
    }

    /// Sets the visibility of the backdrop (hidden backdrops draw nothing).
    pub fn set_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

impl Default for SolidBackdrop {
    fn default() -> Self {
        Self::new("black")
    }
}

impl Backdrop for SolidBackdrop {
    fn draw(&self, renderer: &mut dyn Renderer, width: f64, height: f64) {
        if self.visible {
            renderer.fill_rect(Some(&self.fill_color), 0.0, 0.0, width, height);
        }
    }
}

/// Represents a scene: one root group of drawable nodes, plus optional background and front
/// decorations. Exactly one scene is current at a time: [`Engine::load_scene`](crate::engine::Engine::load_scene)
/// replaces it.
///
/// # Example
/// ```
/// use orrery::scene::{Node, Scene, SolidBackdrop};
///
/// let scene = Scene::new().set_background(SolidBackdrop::new("black"));
/// scene.get_root().append_child(Node::rect(800.0, 600.0).with_fill_style("blue"));
/// ```
#[derive(Clone, Debug)]
pub struct Scene {
    background: Option<Box<dyn Backdrop>>,
    front: Option<Box<dyn Backdrop>>,
    root: Node,
}

impl Scene {
    /// Creates a scene with an empty root group and no decorations.
    pub fn new() -> Self {
        Self {
            background: None,
            front: None,
            root: Node::group(),
        }
    }

    /// Sets the background decoration, drawn before the scene graph each frame.
    pub fn set_background<B: Backdrop + 'static>(mut self, background: B) -> Self {
        self.background = Some(Box::new(background));
        self
    }

    /// Returns the background decoration, if any.
    pub fn get_background(&self) -> Option<&dyn Backdrop> {
        self.background.as_deref()
    }

    /// Sets the front decoration, drawn after the scene graph each frame.
    pub fn set_front<B: Backdrop + 'static>(mut self, front: B) -> Self {
        self.front = Some(Box::new(front));
        self
    }

    /// Returns the front decoration, if any.
    pub fn get_front(&self) -> Option<&dyn Backdrop> {
        self.front.as_deref()
    }

    /// Returns a handle to the root group of the scene.
    pub fn get_root(&self) -> Node {
        self.root.clone()
    }

    /// Updates the scene graph for one tick.
    pub fn update(&self) {
        self.root.update();
    }

    /// Draws the scene: background, then the scene graph in pre-order, then the front.
    pub fn draw(&self, renderer: &mut dyn Renderer, width: f64, height: f64, ratio: f64) {
        if let Some(background) = &self.background {
            background.draw(renderer, width, height);
        }

        if !self.root.is_empty() {
            self.root.draw(renderer, ratio);
        }

        if let Some(front) = &self.front {
            front.draw(renderer, width, height);
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
