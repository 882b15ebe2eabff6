use std::fmt::{Display, Formatter};

use crate::errors::{ConfigurationError, Error};
use crate::render::FilterUnit;
use crate::scene::{Node, NodeType};

/// Discriminates the closed set of animation variants.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationType {
    Translation,
    Rotation,
    Zoom,
    Opacity,
    Filter,
}

/// Represents a per-tick interpolator bound to one node and one property.
///
/// An animation is built for a time window (`start_time` + `duration`) within its owning
/// [`Sequence`](crate::animations::Sequence): once admitted, its [`Animation::step`] runs once
/// per simulation tick and advances the bound property by a constant linear rate
/// (`(end - start) / duration` per millisecond). The node is shared, not owned: it outlives
/// the animation.
///
/// All rate-deriving variants reject a non-positive or non-finite duration at construction:
/// the interpolation rate divides by the duration and a silent non-finite rate would
/// otherwise surface at the first tick.
///
/// # Example
/// ```
/// use orrery::animations::Animation;
/// use orrery::scene::Node;
///
/// let bubble = Node::image("bubble_0", "bubble.png");
/// let rise = Animation::translation(&bubble, 0.0, 5000.0, (400.0, 600.0), (400.0, -800.0))
///     .unwrap()
///     .set_loop(false);
/// assert_eq!(rise.get_end_time(), 5000.0);
/// ```
#[derive(Clone, Debug)]
pub struct Animation {
    /// The scene node affected by this animation.
    node: Node,
    /// The start time (in ms) of the animation within its owning sequence.
    start_time: f64,
    /// The duration (in ms) of the animation.
    duration: f64,
    /// The end time (in ms): always `start_time + duration`.
    end_time: f64,
    /// Whether the animation restarts upon completion instead of being evicted.
    looping: bool,
    /// Whether [`Animation::step`] currently has an effect.
    running: bool,
    /// Per-variant interpolation state.
    kind: AnimationKind,
}

#[derive(Clone, Debug)]
enum AnimationKind {
    Translation {
        start_x: f64,
        start_y: f64,
        current_x: f64,
        current_y: f64,
        movement_x: f64,
        movement_y: f64,
    },
    Rotation {
        use_start_angle: Option<f64>,
        use_end_angle: Option<f64>,
        start_angle: f64,
        end_angle: f64,
        current_angle: f64,
        movement: f64,
    },
    Zoom {
        start_zoom: f64,
        current_zoom: f64,
        movement: f64,
    },
    Opacity {
        start_opacity: f64,
        current_opacity: f64,
        movement: f64,
    },
    Filter {
        filter_kind: String,
        unit: FilterUnit,
        /// Direction of the movement: +1 when ascending, -1 when descending.
        orientation: f64,
        /// Normalized lower bound.
        start_value: f64,
        /// Normalized upper bound.
        end_value: f64,
        current_value: f64,
        movement: f64,
        /// Write limiter: the node filter entry is only rewritten every 30th tick.
        limiter: u32,
    },
}

impl Animation {
    /// Creates a translation animation: linear interpolation of the node position from
    /// `start` towards `end` over `duration` milliseconds. Loops by default.
    pub fn translation(
        node: &Node,
        start_time: f64,
        duration: f64,
        start: (f64, f64),
        end: (f64, f64),
    ) -> Result<Self, Error> {
        ensure_duration(duration)?;
        ensure_finite(start.0, "start_x")?;
        ensure_finite(start.1, "start_y")?;
        ensure_finite(end.0, "end_x")?;
        ensure_finite(end.1, "end_y")?;

        Ok(Self::with_kind(
            node,
            start_time,
            duration,
            true,
            AnimationKind::Translation {
                start_x: start.0,
                start_y: start.1,
                current_x: start.0,
                current_y: start.1,
                movement_x: (end.0 - start.0) / duration,
                movement_y: (end.1 - start.1) / duration,
            },
        ))
    }

    /// Creates a rotation animation: the node angle advances by the caller-supplied constant
    /// `movement` rate (degrees per millisecond). Loops by default, restarting from the base
    /// angle rather than wrapping around.
    ///
    /// The angle bounds default to the node current angle and a full turn above it, resolved
    /// at [`Animation::start`]; explicit bounds can be set with [`Animation::set_angles`].
    /// Rotation derives no rate from its duration, so a zero duration (endless when looping)
    /// is allowed here.
    pub fn rotation(
        node: &Node,
        start_time: f64,
        duration: f64,
        movement: f64,
    ) -> Result<Self, Error> {
        ensure_finite(duration, "duration")?;
        ensure_finite(movement, "movement")?;

        Ok(Self::with_kind(
            node,
            start_time,
            duration,
            true,
            AnimationKind::Rotation {
                use_start_angle: None,
                use_end_angle: None,
                start_angle: 0.0,
                end_angle: 0.0,
                current_angle: 0.0,
                movement,
            },
        ))
    }

    /// Creates a zoom animation: the node size is recomputed each tick as the natural image
    /// size times the current zoom factor, which advances from `start_zoom` to `end_zoom`
    /// over `duration` milliseconds. Loops by default (the caller is responsible for wrap:
    /// no auto-wrap is performed).
    ///
    /// # Errors
    /// Fails unless `node` is an image node: the zoom reads the natural image size.
    pub fn zoom(
        node: &Node,
        start_time: f64,
        duration: f64,
        start_zoom: f64,
        end_zoom: f64,
    ) -> Result<Self, Error> {
        ensure_duration(duration)?;
        ensure_finite(start_zoom, "start_zoom")?;
        ensure_finite(end_zoom, "end_zoom")?;
        ensure_image(node)?;

        Ok(Self::with_kind(
            node,
            start_time,
            duration,
            true,
            AnimationKind::Zoom {
                start_zoom,
                current_zoom: start_zoom,
                movement: (end_zoom - start_zoom) / duration,
            },
        ))
    }

    /// Creates an opacity animation: the node alpha advances linearly from `start_opacity`
    /// towards `end_opacity` and is clamped to [0, 1] every tick. Does not loop by default.
    pub fn opacity(
        node: &Node,
        start_time: f64,
        duration: f64,
        start_opacity: f64,
        end_opacity: f64,
    ) -> Result<Self, Error> {
        ensure_duration(duration)?;
        ensure_finite(start_opacity, "start_opacity")?;
        ensure_finite(end_opacity, "end_opacity")?;

        Ok(Self::with_kind(
            node,
            start_time,
            duration,
            false,
            AnimationKind::Opacity {
                start_opacity,
                current_opacity: start_opacity,
                movement: (end_opacity - start_opacity) / duration,
            },
        ))
    }

    /// Creates a filter animation: a numeric filter parameter advances linearly between the
    /// given bounds and is written into the node filter state — but only every 30th tick, to
    /// amortize the expensive style recomputation the rewrite triggers downstream. The
    /// written value is rounded to an integer. Loops by default.
    ///
    /// # Errors
    /// Fails unless `node` is an image node: filters are an image property.
    pub fn filter<S: Into<String>>(
        node: &Node,
        start_time: f64,
        duration: f64,
        filter_kind: S,
        start_value: f64,
        end_value: f64,
        unit: FilterUnit,
    ) -> Result<Self, Error> {
        ensure_duration(duration)?;
        ensure_finite(start_value, "start_value")?;
        ensure_finite(end_value, "end_value")?;
        ensure_image(node)?;

        let orientation = if end_value > start_value { 1.0 } else { -1.0 };
        let (low, high) = if orientation > 0.0 {
            (start_value, end_value)
        } else {
            (end_value, start_value)
        };

        Ok(Self::with_kind(
            node,
            start_time,
            duration,
            true,
            AnimationKind::Filter {
                filter_kind: filter_kind.into(),
                unit,
                orientation,
                start_value: low,
                end_value: high,
                current_value: low,
                movement: (high - low) / duration,
                limiter: 0,
            },
        ))
    }

    fn with_kind(
        node: &Node,
        start_time: f64,
        duration: f64,
        looping: bool,
        kind: AnimationKind,
    ) -> Self {
        Self {
            node: node.clone(),
            start_time,
            duration,
            end_time: start_time + duration,
            looping,
            running: false,
            kind,
        }
    }

    // ########################################
    // Builders

    /// Sets whether the animation loops upon completion.
    pub fn set_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Sets explicit angle bounds on a rotation animation (ignored on other variants).
    pub fn set_angles(mut self, start_angle: f64, end_angle: f64) -> Self {
        match &mut self.kind {
            AnimationKind::Rotation {
                use_start_angle,
                use_end_angle,
                ..
            } => {
                *use_start_angle = Some(start_angle);
                *use_end_angle = Some(end_angle);
            }
            _ => log::warn!("set_angles called on a non-rotation animation: ignored"),
        }
        self
    }

    // ########################################
    // Tick operations

    /// Starts the animation: initializes the per-tick interpolation state from the configured
    /// bounds. Called by the owning sequence at admission time.
    pub fn start(&mut self) {
        self.running = true;
        match &mut self.kind {
            AnimationKind::Translation {
                start_x,
                start_y,
                current_x,
                current_y,
                ..
            } => {
                *current_x = *start_x;
                *current_y = *start_y;
            }
            AnimationKind::Rotation {
                use_start_angle,
                use_end_angle,
                start_angle,
                end_angle,
                current_angle,
                ..
            } => {
                // Unset bounds resolve against the node at start time.
                *start_angle = use_start_angle.unwrap_or_else(|| self.node.get_rotation());
                *end_angle = use_end_angle.unwrap_or(*start_angle + 360.0);
                *current_angle = *start_angle;
            }
            AnimationKind::Zoom {
                start_zoom,
                current_zoom,
                ..
            } => {
                *current_zoom = *start_zoom;
            }
            AnimationKind::Opacity {
                start_opacity,
                current_opacity,
                ..
            } => {
                *current_opacity = *start_opacity;
            }
            AnimationKind::Filter {
                orientation,
                start_value,
                end_value,
                current_value,
                limiter,
                ..
            } => {
                *current_value = if *orientation > 0.0 {
                    *start_value
                } else {
                    *end_value
                };
                *limiter = 0;
            }
        }
    }

    /// Runs one tick of the animation: applies the configured linear rate times the tick
    /// `interval` (in ms) to the current value and writes it to the bound node. Has no effect
    /// unless running.
    pub fn step(&mut self, interval: f64) {
        if !self.running {
            return;
        }

        match &mut self.kind {
            AnimationKind::Translation {
                current_x,
                current_y,
                movement_x,
                movement_y,
                ..
            } => {
                *current_x += *movement_x * interval;
                *current_y += *movement_y * interval;
                self.node.set_position(*current_x, *current_y);
            }
            AnimationKind::Rotation {
                start_angle,
                end_angle,
                current_angle,
                movement,
                ..
            } => {
                if *current_angle < *end_angle {
                    *current_angle += *movement * interval;
                    self.node.set_rotation(*current_angle);
                } else if self.looping {
                    // Restart from the base angle: a deliberate restart-from-base policy,
                    // not a continuous wraparound.
                    *current_angle = *start_angle + (*movement * interval);
                    self.node.set_rotation(*current_angle);
                } else {
                    // Hold the final angle.
                    self.running = false;
                }
            }
            AnimationKind::Zoom {
                current_zoom,
                movement,
                ..
            } => {
                if let Some((natural_width, natural_height)) = self.node.get_natural_size() {
                    self.node.set_size(
                        natural_width * *current_zoom,
                        natural_height * *current_zoom,
                    );
                }
                *current_zoom += *movement * interval;
            }
            AnimationKind::Opacity {
                current_opacity,
                movement,
                ..
            } => {
                self.node.set_alpha(*current_opacity);
                *current_opacity = (*current_opacity + (*movement * interval)).clamp(0.0, 1.0);
            }
            AnimationKind::Filter {
                filter_kind,
                unit,
                orientation,
                current_value,
                movement,
                limiter,
                ..
            } => {
                if *limiter == 0 {
                    self.node
                        .set_filter(filter_kind.clone(), current_value.round(), *unit);
                }
                if *limiter >= 30 {
                    *limiter = 0;
                } else {
                    *limiter += 1;
                }
                *current_value += *orientation * *movement * interval;
            }
        }
    }

    // ########################################
    // Getters

    /// Returns the variant of this animation.
    pub fn get_type(&self) -> AnimationType {
        match self.kind {
            AnimationKind::Translation { .. } => AnimationType::Translation,
            AnimationKind::Rotation { .. } => AnimationType::Rotation,
            AnimationKind::Zoom { .. } => AnimationType::Zoom,
            AnimationKind::Opacity { .. } => AnimationType::Opacity,
            AnimationKind::Filter { .. } => AnimationType::Filter,
        }
    }

    /// Returns a handle to the node bound to this animation.
    pub fn get_node(&self) -> Node {
        self.node.clone()
    }

    /// Returns the start time (in ms) of the animation within its owning sequence.
    pub fn get_start_time(&self) -> f64 {
        self.start_time
    }

    /// Returns the duration (in ms) of the animation.
    pub fn get_duration(&self) -> f64 {
        self.duration
    }

    /// Returns the end time (in ms): start time plus duration.
    pub fn get_end_time(&self) -> f64 {
        self.end_time
    }

    /// Checks if the animation loops upon completion.
    pub fn is_loop(&self) -> bool {
        self.looping
    }

    /// Checks if the animation is currently running.
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Display for Animation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Animation [type={:?}, start={}ms, duration={}ms, loop={}]",
            self.get_type(),
            self.start_time,
            self.duration,
            self.looping
        )
    }
}

fn ensure_duration(duration: f64) -> Result<(), Error> {
    if !duration.is_finite() {
        return Err(ConfigurationError::NonFiniteBound { bound: "duration" }.into());
    }
    if duration <= 0.0 {
        return Err(ConfigurationError::InstantaneousAnimation { duration }.into());
    }
    Ok(())
}

fn ensure_finite(value: f64, bound: &'static str) -> Result<(), Error> {
    match value.is_finite() {
        true => Ok(()),
        false => Err(ConfigurationError::NonFiniteBound { bound }.into()),
    }
}

fn ensure_image(node: &Node) -> Result<(), Error> {
    match node.get_type() {
        NodeType::Image => Ok(()),
        _ => Err(ConfigurationError::NotAnImageNode.into()),
    }
}
