use std::sync::Arc;

use parking_lot::RwLock;

use crate::render::{Filter, Font, Renderer, RenderingMode};
use crate::scene::ImageData;

/// A primitive call recorded by the [`MockRenderer`].
#[derive(Clone, Debug, PartialEq)]
pub enum RenderOp {
    BeginFrame {
        width: f64,
        height: f64,
        clip: bool,
    },
    EndFrame,
    SetRenderingMode(RenderingMode),
    SetAlpha(f64),
    SetFilters(Vec<Filter>),
    FillRect {
        style: Option<String>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    FillText {
        text: String,
        font: String,
        style: String,
        x: f64,
        y: f64,
    },
    DrawImage {
        id: String,
        x: f64,
        y: f64,
    },
    DrawImageSized {
        id: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Save,
    Restore,
    Translate {
        x: f64,
        y: f64,
    },
    Rotate {
        radians: f64,
    },
}

/// Mock [`Renderer`] for testing purposes: records every primitive call for later inspection.
#[derive(Clone, Debug, Default)]
pub struct MockRenderer {
    ops: Arc<RwLock<Vec<RenderOp>>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all the recorded primitive calls.
    pub fn get_ops(&self) -> Vec<RenderOp> {
        self.ops.read().clone()
    }

    /// Returns the number of frames drawn so far (one per begin/end bracket).
    pub fn get_frames(&self) -> usize {
        self.ops
            .read()
            .iter()
            .filter(|op| matches!(op, RenderOp::EndFrame))
            .count()
    }

    /// Clears the recorded calls.
    pub fn clear(&self) {
        self.ops.write().clear();
    }

    fn push(&self, op: RenderOp) {
        self.ops.write().push(op);
    }
}

impl Renderer for MockRenderer {
    fn begin_frame(&mut self, width: f64, height: f64, clip: bool) {
        self.push(RenderOp::BeginFrame {
            width,
            height,
            clip,
        });
    }

    fn end_frame(&mut self) {
        self.push(RenderOp::EndFrame);
    }

    fn set_rendering_mode(&mut self, mode: RenderingMode) {
        self.push(RenderOp::SetRenderingMode(mode));
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.push(RenderOp::SetAlpha(alpha));
    }

    fn set_filters(&mut self, filters: &[Filter]) {
        self.push(RenderOp::SetFilters(filters.to_vec()));
    }

    fn fill_rect(&mut self, style: Option<&str>, x: f64, y: f64, width: f64, height: f64) {
        self.push(RenderOp::FillRect {
            style: style.map(String::from),
            x,
            y,
            width,
            height,
        });
    }

    fn fill_text(&mut self, text: &str, font: &Font, style: &str, x: f64, y: f64) {
        self.push(RenderOp::FillText {
            text: String::from(text),
            font: font.to_string(),
            style: String::from(style),
            x,
            y,
        });
    }

    fn draw_image(&mut self, image: &ImageData, x: f64, y: f64) {
        self.push(RenderOp::DrawImage {
            id: String::from(image.get_id()),
            x,
            y,
        });
    }

    fn draw_image_sized(&mut self, image: &ImageData, x: f64, y: f64, width: f64, height: f64) {
        self.push(RenderOp::DrawImageSized {
            id: String::from(image.get_id()),
            x,
            y,
            width,
            height,
        });
    }

    fn save(&mut self) {
        self.push(RenderOp::Save);
    }

    fn restore(&mut self) {
        self.push(RenderOp::Restore);
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.push(RenderOp::Translate { x, y });
    }

    fn rotate(&mut self, radians: f64) {
        self.push(RenderOp::Rotate { radians });
    }
}
