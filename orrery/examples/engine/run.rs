//! Runs the engine for one second on a minimal scene: a single white square drifting over a
//! black background, drawn through a console renderer that only counts frames.

use orrery::engine::Engine;
use orrery::pause;
use orrery::render::{Filter, Font, Renderer};
use orrery::scene::{ImageData, Node, Scene, SolidBackdrop};

#[derive(Debug, Default)]
struct ConsoleRenderer {
    frames: u64,
}

impl Renderer for ConsoleRenderer {
    fn begin_frame(&mut self, _width: f64, _height: f64, _clip: bool) {}

    fn end_frame(&mut self) {
        self.frames += 1;
        if self.frames % 30 == 0 {
            println!("{} frames drawn", self.frames);
        }
    }

    fn set_alpha(&mut self, _alpha: f64) {}
    fn set_filters(&mut self, _filters: &[Filter]) {}
    fn fill_rect(&mut self, _style: Option<&str>, _x: f64, _y: f64, _width: f64, _height: f64) {}
    fn fill_text(&mut self, _text: &str, _font: &Font, _style: &str, _x: f64, _y: f64) {}
    fn draw_image(&mut self, _image: &ImageData, _x: f64, _y: f64) {}
    fn draw_image_sized(
        &mut self,
        _image: &ImageData,
        _x: f64,
        _y: f64,
        _width: f64,
        _height: f64,
    ) {
    }
    fn save(&mut self) {}
    fn restore(&mut self) {}
    fn translate(&mut self, _x: f64, _y: f64) {}
    fn rotate(&mut self, _radians: f64) {}
}

#[orrery::runtime]
async fn main() {
    let scene = Scene::new().set_background(SolidBackdrop::new("black"));
    let comet = Node::rect(10.0, 10.0)
        .with_fill_style("white")
        .with_orientation(2.0, 1.0);
    scene.get_root().append_child(comet.clone());

    let engine = Engine::new(ConsoleRenderer::default(), 800.0, 600.0);
    engine.load_scene(scene);
    engine.start();

    pause!(1000);
    engine.pause();

    let (x, y) = comet.get_position();
    println!(
        "Comet drifted to ({:.0}, {:.0}) with {} scratch(es)",
        x,
        y,
        engine.get_scratches()
    );
}
