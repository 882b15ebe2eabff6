//! Defines the resource loading tracker.
//!
//! The engine performs no I/O: decoding image assets is the host's business. The loader only
//! tracks which image nodes of the current scene are waiting for their backing asset, counts
//! completions reported through [`ResourceLoader::resource_loaded`], and exposes the loading
//! progress the host (or the engine user) polls before unlocking dependent behavior, such as
//! starting a sequencer only once a scene is fully loaded.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::scene::{Node, NodeType, Scene};
use crate::utils::events::{EventHandler, EventManager};

/// Lists all events a [`ResourceLoader`] can emit.
pub enum LoaderEvent {
    /// Triggered when all tracked resources are loaded.
    OnComplete,
}

/// Convert events to string to facilitate usage with [`EventManager`].
impl From<LoaderEvent> for String {
    fn from(event: LoaderEvent) -> Self {
        let event = match event {
            LoaderEvent::OnComplete => "complete",
        };
        event.into()
    }
}

/// Tracks the resource loading state of the current scene.
#[derive(Clone, Debug, Default)]
pub struct ResourceLoader {
    inner: Arc<RwLock<LoaderInner>>,
    /// The event manager for the loader.
    events: EventManager,
}

#[derive(Debug, Default)]
struct LoaderInner {
    /// Set when all tracked resources are loaded.
    complete: bool,
    /// Set while the loader is tracking an incomplete scene.
    loading: bool,
    /// The image nodes tracked for the current scene.
    resources: Vec<Node>,
    /// Total number of resources to load.
    total_to_load: usize,
    /// Number of resources loaded so far.
    loaded: usize,
    /// Percentage of loaded resources, recomputed on each update.
    percentage_loaded: f64,
}

impl ResourceLoader {
    /// Starts tracking the resources of a scene: resets the counters and walks the scene
    /// graph collecting every image node.
    pub fn start_loading_scene(&self, scene: &Scene) {
        {
            let inner = &mut *self.inner.write();
            inner.complete = false;
            inner.loading = true;
            inner.resources.clear();
            inner.total_to_load = 0;
            inner.loaded = 0;
            inner.percentage_loaded = 0.0;
        }

        let root = scene.get_root();
        if !root.is_empty() {
            self.load_node(&root);
        }
        log::debug!(
            "Loading scene: {} resource(s) to load",
            self.inner.read().total_to_load
        );
    }

    /// Tracks a single node: only image nodes carry a loadable resource.
    pub fn add(&self, node: &Node) {
        if node.get_type() == NodeType::Image {
            let inner = &mut *self.inner.write();
            inner.total_to_load += 1;
            inner.resources.push(node.clone());
        }
    }

    /// Tracks a node and, recursively, its children.
    pub fn load_node(&self, node: &Node) {
        match node.get_type() {
            NodeType::Group => {
                for child in node.get_children() {
                    self.load_node(&child);
                }
            }
            _ => self.add(node),
        }
    }

    /// Stops tracking all resources.
    pub fn clear(&self) {
        self.inner.write().resources.clear();
    }

    /// Reports a decoded asset: invokes the node `on_load` hook with the natural size of the
    /// asset and counts the completion.
    pub fn resource_loaded(&self, node: &Node, natural_width: f64, natural_height: f64) {
        node.on_load(natural_width, natural_height);
        self.inner.write().loaded += 1;
    }

    /// Recomputes the loading progress: called once per tick by the engine. Completion is
    /// detected here and emitted as a [`LoaderEvent::OnComplete`] event.
    pub fn update(&self) {
        let completed = {
            let inner = &mut *self.inner.write();
            if !inner.loading {
                return;
            }
            inner.percentage_loaded = match inner.total_to_load {
                0 => 100.0,
                total => (inner.loaded as f64 / total as f64) * 100.0,
            };
            if inner.loaded == inner.total_to_load {
                inner.complete = true;
                inner.loading = false;
                true
            } else {
                false
            }
        };

        if completed {
            log::debug!("Scene resources fully loaded");
            self.events.emit(LoaderEvent::OnComplete, self.clone());
        }
    }

    /// Checks if the loading process is complete.
    pub fn is_complete(&self) -> bool {
        self.inner.read().complete
    }

    /// Checks if the loader is tracking an incomplete scene.
    pub fn is_loading(&self) -> bool {
        self.inner.read().loading
    }

    /// Returns the percentage of loaded resources.
    pub fn get_percentage_loaded(&self) -> f64 {
        self.inner.read().percentage_loaded
    }

    /// Returns the tracked image nodes: the host walks this list to decode the assets and
    /// report each completion through [`ResourceLoader::resource_loaded`].
    pub fn get_resources(&self) -> Vec<Node> {
        self.inner.read().resources.clone()
    }

    /// Registers a callback to be executed on a given event.
    ///
    /// Available events for a loader are defined by the enum [`LoaderEvent`]:
    /// - **`OnComplete` | `complete`**: Triggered when all tracked resources are loaded.
    ///   _The callback must receive the following parameter: `|_: ResourceLoader| { ... }`_
    pub fn on<S, F, T, Fut>(&self, event: S, callback: F) -> EventHandler
    where
        S: Into<String>,
        T: 'static + Send + Sync + Clone,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<(), crate::errors::Error>> + Send + 'static,
    {
        self.events.on(event, callback)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    fn scene_with_images(count: usize) -> (Scene, Vec<Node>) {
        let scene = Scene::new();
        let root = scene.get_root();
        let group = Node::group();
        let mut images = vec![];
        for i in 0..count {
            let image = Node::image(format!("img_{}", i), format!("img_{}.png", i));
            group.append_child(image.clone());
            images.push(image);
        }
        root.append_child(group);
        root.append_child(Node::rect(10.0, 10.0));
        (scene, images)
    }

    #[test]
    fn test_collects_image_nodes_recursively() {
        let loader = ResourceLoader::default();
        let (scene, images) = scene_with_images(3);

        loader.start_loading_scene(&scene);
        assert!(loader.is_loading());
        assert!(!loader.is_complete());
        assert_eq!(loader.get_resources().len(), 3);
        assert_eq!(loader.get_resources()[0], images[0]);
    }

    #[test]
    fn test_progress_and_completion() {
        let loader = ResourceLoader::default();
        let (scene, images) = scene_with_images(2);
        loader.start_loading_scene(&scene);

        loader.update();
        assert_eq!(loader.get_percentage_loaded(), 0.0);

        loader.resource_loaded(&images[0], 64.0, 64.0);
        loader.update();
        assert_eq!(loader.get_percentage_loaded(), 50.0);
        assert!(!loader.is_complete());

        loader.resource_loaded(&images[1], 32.0, 16.0);
        loader.update();
        assert_eq!(loader.get_percentage_loaded(), 100.0);
        assert!(loader.is_complete());
        assert!(!loader.is_loading());

        // The on_load hook applied the natural sizes.
        assert_eq!(images[0].get_size(), (64.0, 64.0));
        assert_eq!(images[1].get_size(), (32.0, 16.0));
    }

    #[test]
    fn test_scene_without_resources_completes_immediately() {
        let loader = ResourceLoader::default();
        let (scene, _) = scene_with_images(0);
        loader.start_loading_scene(&scene);

        loader.update();
        assert!(loader.is_complete());
        assert_eq!(loader.get_percentage_loaded(), 100.0);
    }

    #[test]
    fn test_reloading_a_scene_resets_the_tracking() {
        let loader = ResourceLoader::default();
        let (scene, images) = scene_with_images(1);
        loader.start_loading_scene(&scene);
        loader.resource_loaded(&images[0], 8.0, 8.0);
        loader.update();
        assert!(loader.is_complete());

        let (other, _) = scene_with_images(2);
        loader.start_loading_scene(&other);
        assert!(loader.is_loading());
        assert!(!loader.is_complete());
        assert_eq!(loader.get_resources().len(), 2);
        assert_eq!(loader.get_percentage_loaded(), 0.0);
    }

    #[orrery_macros::test]
    #[serial_test::serial]
    async fn test_complete_event_is_emitted() {
        let loader = ResourceLoader::default();
        let (scene, images) = scene_with_images(1);
        loader.start_loading_scene(&scene);

        let flag = Arc::new(AtomicBool::new(false));
        let moved_flag = flag.clone();
        loader.on(LoaderEvent::OnComplete, move |loader: ResourceLoader| {
            let captured_flag = moved_flag.clone();
            async move {
                captured_flag.store(true, Ordering::SeqCst);
                assert!(loader.is_complete());
                Ok(())
            }
        });

        loader.resource_loaded(&images[0], 8.0, 8.0);
        loader.update();

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(
            flag.load(Ordering::SeqCst),
            "the complete event has been emitted"
        );
    }
}
