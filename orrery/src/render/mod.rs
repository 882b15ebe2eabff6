//! Defines the rendering boundary of the engine.
//!
//! The engine never touches pixels: the scene graph walks itself and emits canvas-like
//! primitive calls on a host-provided [`Renderer`]. Exactly one
//! [`begin_frame`](Renderer::begin_frame)..[`end_frame`](Renderer::end_frame) bracket is
//! issued per rendered frame.

use std::fmt::Debug;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::errors::{Error, Unknown};
use crate::scene::ImageData;

/// Represents a device able to turn scene-graph primitives into pixels.
///
/// The contract mirrors a retained 2D canvas context: per-frame bracketing, stateful alpha and
/// filter settings, fill/text/image primitives, and a save/translate/rotate/restore transform
/// stack used for the rotate-about-center drawing of transformed nodes.
pub trait Renderer: Debug + Send + Sync {
    /// Opens a frame: clears the viewport and, when `clip` is set, constrains all subsequent
    /// drawing to the `width` x `height` rectangle.
    fn begin_frame(&mut self, width: f64, height: f64, clip: bool);
    /// Closes the frame opened by [`Renderer::begin_frame`].
    fn end_frame(&mut self);

    /// Applies an image smoothing hint. Renderers without such a notion may ignore it.
    fn set_rendering_mode(&mut self, _mode: RenderingMode) {}

    /// Sets the global alpha applied to subsequent drawing operations.
    fn set_alpha(&mut self, alpha: f64);
    /// Sets the filter list applied to subsequent drawing operations (empty = none).
    fn set_filters(&mut self, filters: &[Filter]);

    /// Fills a rectangle. A `None` style leaves the renderer current fill style untouched.
    fn fill_rect(&mut self, style: Option<&str>, x: f64, y: f64, width: f64, height: f64);
    /// Fills a line of text at the given baseline position.
    fn fill_text(&mut self, text: &str, font: &Font, style: &str, x: f64, y: f64);
    /// Draws an image at its natural size.
    fn draw_image(&mut self, image: &ImageData, x: f64, y: f64);
    /// Draws an image stretched to the given size.
    fn draw_image_sized(&mut self, image: &ImageData, x: f64, y: f64, width: f64, height: f64);

    /// Pushes the current transform state.
    fn save(&mut self);
    /// Pops the transform state pushed by [`Renderer::save`].
    fn restore(&mut self);
    /// Translates the drawing origin.
    fn translate(&mut self, x: f64, y: f64);
    /// Rotates the drawing plane around the current origin.
    fn rotate(&mut self, radians: f64);
}

/// A structured filter entry attached to an image node. Renderers typically format it as
/// `kind(value unit)`, but the string construction itself is their business, not the core's.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    /// The filter function name (e.g. "blur", "hue-rotate").
    pub kind: String,
    /// The current numeric parameter of the filter.
    pub value: f64,
    /// The unit of the numeric parameter.
    pub unit: FilterUnit,
}

/// The unit attached to a [`Filter`] value.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterUnit {
    /// Unit-less value.
    #[default]
    None,
    /// Pixels.
    Px,
    /// Percents.
    Percent,
    /// Degrees.
    Deg,
}

impl Display for FilterUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let unit = match self {
            FilterUnit::None => "",
            FilterUnit::Px => "px",
            FilterUnit::Percent => "%",
            FilterUnit::Deg => "deg",
        };
        write!(f, "{}", unit)
    }
}

/// The font used by text nodes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    /// Font size, in pixels.
    pub size: f64,
    /// Font family name.
    pub family: String,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            size: 30.0,
            family: String::from("Arial"),
        }
    }
}

impl Display for Font {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}px {}", self.size, self.family)
    }
}

/// Image smoothing hint forwarded to the renderer.
///
/// Each mode answers to several aliases (the names various hosts historically used for the
/// same behavior); parsing compares against every alias explicitly.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderingMode {
    /// Smooth (bicubic/auto) interpolation, favoring quality.
    #[default]
    Smooth,
    /// Crisp (nearest-neighbor/pixelated) interpolation, favoring speed.
    Crisp,
}

impl FromStr for RenderingMode {
    type Err = Error;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "auto" | "bicubic" | "quality" => Ok(RenderingMode::Smooth),
            "crisp" | "pixelated" | "speed" => Ok(RenderingMode::Crisp),
            other => Err(Unknown {
                info: format!("unknown rendering mode '{}'", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_unit_display() {
        assert_eq!(FilterUnit::None.to_string(), "");
        assert_eq!(FilterUnit::Px.to_string(), "px");
        assert_eq!(FilterUnit::Percent.to_string(), "%");
        assert_eq!(FilterUnit::Deg.to_string(), "deg");
    }

    #[test]
    fn test_font_display() {
        assert_eq!(Font::default().to_string(), "30px Arial");
        let font = Font {
            size: 12.0,
            family: String::from("monospace"),
        };
        assert_eq!(font.to_string(), "12px monospace");
    }

    #[test]
    fn test_rendering_mode_aliases() {
        for alias in ["auto", "bicubic", "quality"] {
            assert_eq!(alias.parse::<RenderingMode>().unwrap(), RenderingMode::Smooth);
        }
        for alias in ["crisp", "pixelated", "speed"] {
            assert_eq!(alias.parse::<RenderingMode>().unwrap(), RenderingMode::Crisp);
        }
        assert!("fancy".parse::<RenderingMode>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_filter_serde_roundtrip() {
        let filter = Filter {
            kind: String::from("hue-rotate"),
            value: 180.0,
            unit: FilterUnit::Deg,
        };
        let json = serde_json::to_string(&filter).unwrap();
        let back: Filter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, filter);
    }
}
