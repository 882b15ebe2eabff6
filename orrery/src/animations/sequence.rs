use std::fmt::{Display, Formatter};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::animations::{Animation, Timed};
use crate::errors::{Error, InvariantViolation};

/// Determines how a sequence enters the sequencer scheduling pools.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SequenceKind {
    /// Automatically rescheduled into the waiting pool on every sequencer (re)start.
    #[default]
    Auto,
    /// Only enters the active pool through an explicit [`Sequencer::play`](crate::animations::Sequencer::play).
    Free,
}

/// Represents an ordered, time-indexed collection of [`Animation`] with its own clock,
/// active-set management and loop/finish policy.
///
/// A sequence is a cheap-clonable handle over shared state, so the same sequence registered
/// in a [`Sequencer`](crate::animations::Sequencer) pool and held by the caller is one single
/// state machine.
///
/// The lifecycle is *built* → *prepared* → *running* → *finished*:
/// - animations are added in any order while *built*;
/// - [`Sequence::prepare_to_start`] sorts them by start time and seals the list;
/// - once started, each tick admits every animation whose start time has come, steps the
///   active set, evicts completed non-looping animations, and applies the loop/finish policy.
///
/// Without an explicit end time, the sequence finishes by itself once every animation has
/// been admitted and completed.
///
/// # Example
/// ```
/// use orrery::animations::{Animation, Sequence};
/// use orrery::scene::Node;
///
/// let bubble = Node::image("bubble_0", "bubble.png");
/// let sequence = Sequence::default();
/// sequence
///     .add_animation(
///         Animation::translation(&bubble, 0.0, 4500.0, (400.0, 600.0), (250.0, -800.0))
///             .unwrap()
///             .set_loop(false),
///     )
///     .unwrap();
/// sequence.finish_at(10000.0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Sequence {
    inner: Arc<RwLock<SequenceInner>>,
}

#[derive(Debug, Default)]
struct SequenceInner {
    /// Optional label for diagnostics.
    label: Option<String>,
    /// Shared timing attributes (elapsed time, running state, end time, loop flag).
    timed: Timed,
    /// Scheduling behavior of this sequence within a sequencer.
    kind: SequenceKind,
    /// The ordered animation list: sealed once prepared.
    animations: Vec<Animation>,
    /// Indices (into `animations`) of the currently interpolating subset, in admission order.
    active: Vec<usize>,
    /// Index of the next not-yet-admitted animation.
    current_index: usize,
    /// Set when the sequence stopped or finished by itself.
    finished: bool,
    /// Set once `prepare_to_start()` sealed the animation list.
    prepared: bool,
}

impl Sequence {
    // ########################################
    // Builders

    /// Sets a label used for diagnostics.
    pub fn set_label<S: Into<String>>(self, label: S) -> Self {
        self.inner.write().label = Some(label.into());
        self
    }

    /// Sets the scheduling behavior of this sequence (default: [`SequenceKind::Auto`]).
    pub fn set_kind(self, kind: SequenceKind) -> Self {
        self.inner.write().kind = kind;
        self
    }

    /// Adds an animation to this sequence.
    ///
    /// # Errors
    /// Fails with an invariant violation once the sequence has been prepared: the admission
    /// machinery relies on the prepared sort order.
    pub fn add_animation(&self, animation: Animation) -> Result<(), Error> {
        let inner = &mut *self.inner.write();
        if inner.prepared {
            return Err(InvariantViolation::SequenceSealed.into());
        }
        inner.animations.push(animation);
        Ok(())
    }

    // ########################################
    // Timing policy

    /// Delays the activation of this sequence until the sequencer time reaches `start_time`.
    pub fn start_at(&self, start_time: f64) {
        self.inner.write().timed.start_at(start_time);
    }

    /// Makes the sequence restart from zero upon reaching `end_time`.
    pub fn loop_at(&self, end_time: f64) {
        self.inner.write().timed.loop_at(end_time);
    }

    /// Makes the sequence finish upon reaching `end_time`.
    pub fn finish_at(&self, end_time: f64) {
        self.inner.write().timed.finish_at(end_time);
    }

    /// Defines the end of a transient sequence: alias of [`Sequence::finish_at`], in the
    /// vocabulary used for ad-hoc played sequences that pop once done.
    pub fn pop_at(&self, end_time: f64) {
        self.finish_at(end_time);
    }

    // ########################################
    // State machine

    /// Prepares the sequence: stable-sorts the animations by ascending start time and seals
    /// the list. Idempotent; must be called before the first start (the sequencer does it on
    /// registration).
    pub fn prepare_to_start(&self) {
        let inner = &mut *self.inner.write();
        inner
            .animations
            .sort_by(|a, b| a.get_start_time().total_cmp(&b.get_start_time()));
        inner.prepared = true;
    }

    /// Starts (or restarts) the sequence: resets the elapsed time, the admission index and
    /// the active set.
    pub fn start(&self) {
        let inner = &mut *self.inner.write();
        inner.start();
    }

    /// Stops the sequence. This is terminal: restarting requires a fresh [`Sequence::start`].
    pub fn stop(&self) {
        let inner = &mut *self.inner.write();
        inner.stop();
    }

    /// Runs one tick of the sequence: admission, stepping/eviction, then the loop/finish
    /// policy. `interval` is the fixed tick duration in milliseconds.
    pub fn update(&self, interval: f64) {
        let inner = &mut *self.inner.write();

        if !inner.timed.running {
            return;
        }

        if !inner.animations.is_empty() {
            // Admission: every animation whose start time has come becomes active, in the
            // prepared (sorted) order so none is skipped.
            while inner.current_index < inner.animations.len()
                && inner.animations[inner.current_index].get_start_time() <= inner.timed.time
            {
                let index = inner.current_index;
                inner.active.push(index);
                inner.animations[index].start();
                inner.current_index += 1;
            }

            // Stepping: one step per active animation; completed non-looping animations are
            // evicted with a swap-to-end-and-pop. The index only advances when no removal
            // happened, so the element swapped into the vacated slot is re-checked in the
            // same pass.
            let mut i = 0;
            while i < inner.active.len() {
                let index = inner.active[i];
                let animation = &mut inner.animations[index];
                animation.step(interval);

                if !animation.is_loop() && animation.get_end_time() <= inner.timed.time {
                    inner.active.swap_remove(i);
                } else {
                    i += 1;
                }
            }
        }

        // Termination policy.
        match inner.timed.end_time {
            Some(end_time) => {
                if inner.timed.time >= end_time && inner.timed.looping {
                    log::debug!("Sequence{} loops", inner.label_suffix());
                    inner.start();
                } else if inner.timed.time >= end_time {
                    log::debug!("Sequence{} finished at end time", inner.label_suffix());
                    inner.stop();
                } else {
                    inner.timed.time += interval;
                }
            }
            // No explicit end time: the sequence finishes by itself once every animation has
            // been admitted and completed.
            None => {
                if inner.active.is_empty() && inner.current_index == inner.animations.len() {
                    log::debug!("Sequence{} finished by exhaustion", inner.label_suffix());
                    inner.stop();
                } else {
                    inner.timed.time += interval;
                }
            }
        }
    }

    // ########################################
    // Getters

    /// Returns the label of this sequence, if any.
    pub fn get_label(&self) -> Option<String> {
        self.inner.read().label.clone()
    }

    /// Returns the scheduling behavior of this sequence.
    pub fn get_kind(&self) -> SequenceKind {
        self.inner.read().kind
    }

    /// Checks if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().animations.is_empty()
    }

    /// Returns the number of animations in this sequence.
    pub fn size(&self) -> usize {
        self.inner.read().animations.len()
    }

    /// Returns the animations of the sequence.
    pub fn get_all(&self) -> Vec<Animation> {
        self.inner.read().animations.clone()
    }

    /// Returns the animation at a given index.
    pub fn get_at(&self, index: usize) -> Option<Animation> {
        self.inner.read().animations.get(index).cloned()
    }

    /// Returns the currently active animations, in admission order.
    pub fn get_active(&self) -> Vec<Animation> {
        let inner = self.inner.read();
        inner
            .active
            .iter()
            .map(|&index| inner.animations[index].clone())
            .collect()
    }

    /// Returns the index of the next not-yet-admitted animation.
    pub fn get_current_index(&self) -> usize {
        self.inner.read().current_index
    }

    /// Returns the elapsed time (in ms) within this sequence.
    pub fn get_time(&self) -> f64 {
        self.inner.read().timed.time
    }

    /// Returns the activation delay of this sequence, if any.
    pub fn get_start(&self) -> Option<f64> {
        self.inner.read().timed.start_time
    }

    /// Returns the explicit termination time of this sequence, if any.
    pub fn get_end(&self) -> Option<f64> {
        self.inner.read().timed.end_time
    }

    /// Checks if this sequence is going to loop.
    pub fn is_loop(&self) -> bool {
        self.inner.read().timed.looping
    }

    /// Checks if this sequence is running.
    pub fn is_running(&self) -> bool {
        self.inner.read().timed.running
    }

    /// Checks if this sequence stopped or finished by itself.
    pub fn is_finished(&self) -> bool {
        self.inner.read().finished
    }

    /// Checks if this sequence has been prepared (sealed).
    pub fn is_prepared(&self) -> bool {
        self.inner.read().prepared
    }
}

impl SequenceInner {
    fn start(&mut self) {
        self.active.clear();
        self.timed.time = 0.0;
        self.timed.running = true;
        self.current_index = 0;
        self.finished = false;
    }

    fn stop(&mut self) {
        self.timed.running = false;
        self.finished = true;
    }

    fn label_suffix(&self) -> String {
        match &self.label {
            Some(label) => format!(" '{}'", label),
            None => String::new(),
        }
    }
}

/// Two sequence handles are equal when they point to the same underlying state machine.
impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Display for Sequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        write!(
            f,
            "Sequence [kind={:?}, animations={}, end={}]",
            inner.kind,
            inner.animations.len(),
            match inner.timed.end_time {
                Some(end) => format!("{}ms", end),
                None => String::from("auto"),
            }
        )
    }
}
