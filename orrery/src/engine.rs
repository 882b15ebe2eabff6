//! Defines the engine: the composition root wiring the clock, the sequencer, the scene graph
//! and the renderer together.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::animations::Sequencer;
use crate::clock::{Clock, TickRate};
use crate::loader::ResourceLoader;
use crate::render::{Renderer, RenderingMode};
use crate::scene::Scene;
use crate::utils::events::{EventHandler, EventManager};
use crate::utils::task;
use crate::utils::task::TaskHandler;

/// Lists all events an [`Engine`] can emit.
pub enum EngineEvent {
    /// Triggered when the engine starts.
    OnStart,
    /// Triggered when the engine pauses.
    OnPause,
    /// Triggered when the engine resumes.
    OnResume,
}

/// Convert events to string to facilitate usage with [`EventManager`].
impl From<EngineEvent> for String {
    fn from(event: EngineEvent) -> Self {
        let event = match event {
            EngineEvent::OnStart => "start",
            EngineEvent::OnPause => "pause",
            EngineEvent::OnResume => "resume",
        };
        event.into()
    }
}

type LoopCallback = Box<dyn FnMut() + Send>;

/// The animation engine.
///
/// The engine composes a fixed-step [`Clock`], a [`Sequencer`], a current [`Scene`] and a
/// host-provided [`Renderer`]. Each frame ([`Engine::advance`]) runs zero or more fixed
/// simulation ticks — loop callback, then resource loader, then sequencer, then scene graph,
/// strictly in that order — followed by exactly one draw with the leftover fractional-tick
/// ratio.
///
/// [`Engine::start`] spawns a frame task (through the runtime task runner) that drives
/// `advance` from real timestamps; hosts and tests may instead drive `advance` themselves
/// with synthetic timestamps.
///
/// The engine is a cheap-clonable handle: clones share the same underlying engine.
///
/// # Example
/// ```ignore
/// use orrery::engine::Engine;
/// use orrery::mocks::MockRenderer;
/// use orrery::scene::{Node, Scene, SolidBackdrop};
///
/// #[orrery::runtime]
/// async fn main() {
///     let scene = Scene::new().set_background(SolidBackdrop::new("black"));
///     scene.get_root().append_child(Node::rect(800.0, 600.0).with_fill_style("blue"));
///
///     let engine = Engine::new(MockRenderer::new(), 800.0, 600.0);
///     engine.load_scene(scene);
///     engine.start();
/// }
/// ```
#[derive(Clone)]
pub struct Engine {
    /// Viewport width, fixed at construction.
    width: f64,
    /// Viewport height, fixed at construction.
    height: f64,
    /// Whether drawing is clipped to the viewport.
    clipping: bool,
    clock: Arc<RwLock<Clock>>,
    renderer: Arc<RwLock<Box<dyn Renderer>>>,
    scene: Arc<RwLock<Option<Scene>>>,
    sequencer: Sequencer,
    loader: ResourceLoader,
    /// The function called at the beginning of each tick.
    loop_callback: Arc<Mutex<Option<LoopCallback>>>,
    /// Inner handler to the frame task driving the engine.
    interval: Arc<RwLock<Option<TaskHandler>>>,
    /// The event manager for the engine.
    events: EventManager,
}

impl Engine {
    /// Creates an engine drawing through `renderer` on a `width` x `height` viewport, at the
    /// default 60Hz tick rate.
    pub fn new<R: Renderer + 'static>(renderer: R, width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            clipping: true,
            clock: Arc::new(RwLock::new(Clock::new(TickRate::default()))),
            renderer: Arc::new(RwLock::new(Box::new(renderer))),
            scene: Arc::new(RwLock::new(None)),
            sequencer: Sequencer::default(),
            loader: ResourceLoader::default(),
            loop_callback: Arc::new(Mutex::new(None)),
            interval: Arc::new(RwLock::new(None)),
            events: EventManager::default(),
        }
    }

    // ########################################
    // Builders

    /// Sets the tick rate (default: 60 updates per second). Must be done before start.
    pub fn set_tick_rate(self, rate: TickRate) -> Self {
        *self.clock.write() = Clock::new(rate);
        self
    }

    /// Sets the function called at the beginning of each simulation tick.
    pub fn set_loop<F: FnMut() + Send + 'static>(self, callback: F) -> Self {
        *self.loop_callback.lock() = Some(Box::new(callback));
        self
    }

    /// Sets whether drawing is clipped to the viewport (default: true).
    pub fn set_clipping(mut self, clipping: bool) -> Self {
        self.clipping = clipping;
        self
    }

    // ########################################
    // Scene management

    /// Loads a scene: installs it as the current scene and starts tracking its resources.
    pub fn load_scene(&self, scene: Scene) {
        log::debug!("Loading scene");
        self.loader.start_loading_scene(&scene);
        *self.scene.write() = Some(scene);
    }

    /// Prepares the sequencer before start, when it holds any sequence.
    pub fn prepare_to_start(&self) {
        if !self.sequencer.is_empty() {
            self.sequencer.prepare_to_start();
        }
    }

    /// Forwards an image smoothing hint to the renderer.
    pub fn set_rendering_mode(&self, mode: RenderingMode) {
        self.renderer.write().set_rendering_mode(mode);
    }

    // ########################################
    // Lifecycle

    /// Starts the engine: the clock starts from the current timestamp and a frame task is
    /// spawned to drive the frames.
    pub fn start(&self) -> &Self {
        log::debug!("Engine starts");
        self.clock.write().start(Clock::timestamp());
        self.spawn_frame_task();
        self.events.emit(EngineEvent::OnStart, self.clone());
        self
    }

    /// Pauses the engine: stops the frame task without resetting the clock accumulator nor
    /// the diagnostic counters.
    pub fn pause(&self) -> &Self {
        log::debug!("Engine pauses");
        self.clock.write().pause();
        if let Some(handler) = self.interval.write().take() {
            handler.abort();
        }
        self.events.emit(EngineEvent::OnPause, self.clone());
        self
    }

    /// Resumes the engine: the clock re-samples the current timestamp (so the paused
    /// wall-clock time is not counted as lag) and a fresh frame task is spawned.
    pub fn resume(&self) -> &Self {
        log::debug!("Engine resumes");
        self.clock.write().resume(Clock::timestamp());
        self.spawn_frame_task();
        self.events.emit(EngineEvent::OnResume, self.clone());
        self
    }

    /// Indicates whether the engine is currently running.
    pub fn is_running(&self) -> bool {
        self.clock.read().is_running()
    }

    fn spawn_frame_task(&self) {
        let engine = self.clone();
        let pause_ms = self.clock.read().rate().interval();

        let handler = task::run(async move {
            loop {
                if !engine.clock.read().is_running() {
                    break;
                }
                engine.advance(Clock::timestamp());
                crate::pause!(pause_ms);
            }
            Ok(())
        })
        .unwrap();

        // Replace (and cancel) any previous frame task.
        if let Some(previous) = self.interval.write().replace(handler) {
            previous.abort();
        }
    }

    // ########################################
    // Frame execution

    /// Advances the engine to the timestamp `now`: runs the planned fixed ticks, then draws
    /// the current scene exactly once with the leftover fractional-tick ratio.
    pub fn advance(&self, now: f64) {
        let frame = self.clock.write().advance(now);
        for _ in 0..frame.ticks {
            self.update();
        }
        self.draw(frame.interpolation);
    }

    /// Runs one simulation tick: loop callback, resource loader, sequencer, then scene
    /// graph, strictly in that order.
    pub fn update(&self) {
        if let Some(callback) = self.loop_callback.lock().as_mut() {
            callback();
        }
        self.loader.update();
        let interval = self.clock.read().rate().interval();
        self.sequencer.update(interval);
        if let Some(scene) = self.scene.read().as_ref() {
            scene.update();
        }
    }

    /// Draws the current scene. Node attributes are read-only during this phase.
    fn draw(&self, interpolation: f64) {
        let renderer = &mut *self.renderer.write();
        renderer.begin_frame(self.width, self.height, self.clipping);
        if let Some(scene) = self.scene.read().as_ref() {
            scene.draw(&mut **renderer, self.width, self.height, interpolation);
        }
        renderer.end_frame();
    }

    // ########################################
    // Getters

    /// Returns the number of scratches (perceptible frame overruns) since the engine started.
    pub fn get_scratches(&self) -> u64 {
        self.clock.read().scratches()
    }

    /// Returns a handle to the sequencer of the engine.
    pub fn get_sequencer(&self) -> Sequencer {
        self.sequencer.clone()
    }

    /// Returns a handle to the resource loader of the engine.
    pub fn get_loader(&self) -> ResourceLoader {
        self.loader.clone()
    }

    /// Returns the current scene, if any.
    pub fn get_scene(&self) -> Option<Scene> {
        self.scene.read().clone()
    }

    /// Returns the tick rate configuration of the engine.
    pub fn get_tick_rate(&self) -> TickRate {
        *self.clock.read().rate()
    }

    // ########################################
    // Event related functions

    /// Registers a callback to be executed on a given event.
    ///
    /// Available events for an engine are defined by the enum [`EngineEvent`]:
    /// - **`OnStart` | `start`**: Triggered when the engine starts.
    /// - **`OnPause` | `pause`**: Triggered when the engine pauses.
    /// - **`OnResume` | `resume`**: Triggered when the engine resumes.
    ///
    /// _All callbacks receive the following parameter: `|_: Engine| { ... }`_
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

impl Debug for Engine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("clipping", &self.clipping)
            .field("running", &self.is_running())
            .field("scratches", &self.get_scratches())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::animations::{Animation, Sequence};
    use crate::mocks::{MockRenderer, RenderOp};
    use crate::scene::{Node, SolidBackdrop};

    use super::*;

    const T: f64 = 1000.0 / 60.0;

    fn engine_with_scene() -> (Engine, MockRenderer, Node) {
        let renderer = MockRenderer::new();
        let engine = Engine::new(renderer.clone(), 800.0, 600.0);
        let scene = Scene::new().set_background(SolidBackdrop::new("black"));
        let node = Node::rect(10.0, 10.0).with_orientation(1.0, 0.0);
        scene.get_root().append_child(node.clone());
        engine.load_scene(scene);
        (engine, renderer, node)
    }

    #[test]
    fn test_advance_draws_exactly_once_per_frame() {
        let (engine, renderer, _) = engine_with_scene();

        // No tick planned: the frame still draws once.
        engine.advance(T * 0.5);
        assert_eq!(renderer.get_frames(), 1);

        // Several ticks planned: still a single draw.
        engine.advance(T * 4.0);
        assert_eq!(renderer.get_frames(), 2);
    }

    #[test]
    fn test_ticks_update_the_scene_graph() {
        let (engine, _, node) = engine_with_scene();

        engine.advance(T * 3.0);
        let (x, _) = node.get_position();
        assert_eq!(x, 3.0, "one orientation step per planned tick");
    }

    #[test]
    fn test_tick_runs_loop_callback_before_updates() {
        let renderer = MockRenderer::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let moved_ticks = ticks.clone();
        let engine = Engine::new(renderer, 800.0, 600.0).set_loop(move || {
            moved_ticks.fetch_add(1, Ordering::SeqCst);
        });

        engine.advance(T * 2.0);
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_sequencer_is_ticked_before_scene_graph() {
        let (engine, _, _) = engine_with_scene();
        let animated = Node::image("id", "img.png");
        let sequence = Sequence::default();
        sequence
            .add_animation(
                Animation::translation(&animated, 0.0, 1000.0, (0.0, 0.0), (100.0, 0.0))
                    .unwrap()
                    .set_loop(false),
            )
            .unwrap();
        let sequencer = engine.get_sequencer();
        sequencer.add(&sequence);
        sequencer.start();

        engine.advance(T * 2.0);
        let (x, _) = animated.get_position();
        assert!(x > 0.0, "the sequence stepped the animation");
    }

    #[test]
    fn test_draw_bracket_and_clipping() {
        let (engine, renderer, _) = engine_with_scene();
        engine.advance(1.0);

        let ops = renderer.get_ops();
        assert_eq!(
            ops.first(),
            Some(&RenderOp::BeginFrame {
                width: 800.0,
                height: 600.0,
                clip: true,
            })
        );
        assert_eq!(ops.last(), Some(&RenderOp::EndFrame));
    }

    #[test]
    fn test_rendering_mode_is_forwarded() {
        let (engine, renderer, _) = engine_with_scene();
        engine.set_rendering_mode(RenderingMode::Crisp);
        assert_eq!(
            renderer.get_ops(),
            vec![RenderOp::SetRenderingMode(RenderingMode::Crisp)]
        );
    }

    #[test]
    fn test_loader_completion_unlocks_dependent_behavior() {
        let renderer = MockRenderer::new();
        let engine = Engine::new(renderer, 800.0, 600.0);
        let scene = Scene::new();
        let image = Node::image("id", "img.png");
        scene.get_root().append_child(image.clone());
        engine.load_scene(scene);

        let loader = engine.get_loader();
        engine.advance(T);
        assert!(!loader.is_complete());

        loader.resource_loaded(&image, 16.0, 16.0);
        engine.advance(T * 2.5);
        assert!(loader.is_complete());
    }

    #[orrery_macros::test]
    #[serial_test::serial]
    async fn test_engine_runs_and_pauses() {
        let (engine, renderer, node) = engine_with_scene();

        engine.start();
        assert!(engine.is_running());
        crate::pause!(150);
        engine.pause();
        assert!(!engine.is_running());

        let frames = renderer.get_frames();
        assert!(frames > 0, "frames were drawn while running");
        let (x, _) = node.get_position();
        assert!(x > 0.0, "ticks moved the scene while running");

        // Paused: no more frames.
        crate::pause!(100);
        assert_eq!(renderer.get_frames(), frames);

        // Resumed: frames keep coming without counting the paused time as lag.
        engine.resume();
        crate::pause!(100);
        engine.pause();
        assert!(renderer.get_frames() > frames);
    }
}
