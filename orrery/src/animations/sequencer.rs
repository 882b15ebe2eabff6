use std::fmt::{Display, Formatter};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::animations::{Sequence, SequenceKind, Timed};
use crate::errors::{Error, InvariantViolation};

/// The scheduling pool a sequence currently occupies within a [`Sequencer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pool {
    /// Registered, never mutated by ticking.
    Stored,
    /// Scheduled, not yet started.
    Waiting,
    /// Currently ticking.
    Active,
}

/// Manages many [`Sequence`] through three pools, promoting and reaping them over time.
///
/// - [`Sequencer::add`] registers a sequence into the stored pool;
/// - [`Sequencer::start`] re-seeds the waiting pool with every stored
///   [`SequenceKind::Auto`] sequence ([`SequenceKind::Free`] sequences never auto-enter);
/// - [`Sequencer::play`] activates and starts an ad-hoc sequence immediately, bypassing the
///   waiting pool (typically for transient spawned effects);
/// - each tick, due waiting sequences are promoted and started, every active sequence is
///   ticked, and finished sequences are reaped.
///
/// The sequencer itself carries the same loop/finish timing policy as its sequences: a
/// looping restart re-seeds the waiting pool exactly as [`Sequencer::start`] does.
///
/// # Example
/// ```
/// use orrery::animations::{Sequence, Sequencer};
///
/// let sequencer = Sequencer::default();
/// let sequence = Sequence::default();
/// sequence.loop_at(20000.0);
/// sequencer.add(&sequence);
/// sequencer.start();
/// ```
#[derive(Clone, Debug, Default)]
pub struct Sequencer {
    inner: Arc<RwLock<SequencerInner>>,
}

#[derive(Debug, Default)]
struct SequencerInner {
    /// Shared timing attributes (elapsed time, running state, end time, loop flag).
    timed: Timed,
    /// Registered sequences: never mutated by ticking.
    stored: Vec<Sequence>,
    /// Scheduled sequences, waiting for their start time.
    waiting: Vec<Sequence>,
    /// Currently ticking sequences.
    active: Vec<Sequence>,
}

impl Sequencer {
    /// Registers a sequence: prepares it and appends it to the stored pool. The sequence does
    /// not start until the sequencer (re)starts and promotes it.
    pub fn add(&self, sequence: &Sequence) {
        sequence.prepare_to_start();
        self.inner.write().stored.push(sequence.clone());
    }

    /// Plays an ad-hoc sequence immediately: prepares it, appends it directly to the active
    /// pool and starts it, bypassing the waiting pool.
    pub fn play(&self, sequence: &Sequence) {
        sequence.prepare_to_start();
        self.inner.write().active.push(sequence.clone());
        sequence.start();
    }

    /// Prepares every registered sequence. Idempotent: registration already prepares each
    /// sequence on [`Sequencer::add`].
    pub fn prepare_to_start(&self) {
        let inner = self.inner.read();
        for sequence in &inner.stored {
            sequence.prepare_to_start();
        }
    }

    /// Starts the sequencer: resets the elapsed time, clears the scheduling pools and
    /// re-seeds the waiting pool with every stored auto sequence.
    pub fn start(&self) {
        log::debug!("Sequencer starts");
        let inner = &mut *self.inner.write();
        inner.timed.running = true;
        inner.timed.time = 0.0;
        inner.waiting.clear();
        inner.active.clear();
        inner.seed_waiting_from_stored();
    }

    /// Stops the sequencer. This is terminal: restarting requires a fresh
    /// [`Sequencer::start`].
    pub fn stop(&self) {
        self.inner.write().timed.running = false;
    }

    // ########################################
    // Timing policy

    /// Makes the sequencer restart from zero upon reaching `end_time`, re-seeding the waiting
    /// pool from the stored auto sequences.
    pub fn loop_at(&self, end_time: f64) {
        self.inner.write().timed.loop_at(end_time);
    }

    /// Makes the sequencer finish upon reaching `end_time`.
    pub fn finish_at(&self, end_time: f64) {
        self.inner.write().timed.finish_at(end_time);
    }

    // ########################################
    // Tick operation

    /// Runs one tick of the sequencer: promotes due waiting sequences, ticks every active
    /// sequence, reaps the finished ones, then applies the sequencer's own loop/finish
    /// policy. `interval` is the fixed tick duration in milliseconds.
    pub fn update(&self, interval: f64) {
        let inner = &mut *self.inner.write();

        if !inner.timed.running {
            return;
        }

        // Promotion: a waiting sequence with no start time is due immediately. The scan
        // re-checks the element shifted into the vacated slot after each removal.
        let mut i = 0;
        while i < inner.waiting.len() {
            let due = match inner.waiting[i].get_start() {
                None => true,
                Some(start_time) => inner.timed.time >= start_time,
            };
            if due {
                let sequence = inner.waiting.remove(i);
                sequence.start();
                inner.active.push(sequence);
            } else {
                i += 1;
            }
        }

        // Tick every active sequence and reap the finished ones.
        let mut i = 0;
        while i < inner.active.len() {
            inner.active[i].update(interval);
            if inner.active[i].is_finished() {
                inner.active.remove(i);
            } else {
                i += 1;
            }
        }

        // The sequencer-level timing policy mirrors the sequence one, with a loop restart
        // re-seeding the waiting pool from the stored auto sequences.
        match inner.timed.end_time {
            Some(end_time) => {
                if inner.timed.time >= end_time && inner.timed.looping {
                    log::debug!("Sequencer loops");
                    inner.timed.time = 0.0;
                    inner.waiting.clear();
                    inner.active.clear();
                    inner.seed_waiting_from_stored();
                } else if inner.timed.time >= end_time {
                    log::debug!("Sequencer finished at end time");
                    inner.timed.running = false;
                } else {
                    inner.timed.time += interval;
                }
            }
            None => {
                inner.timed.time += interval;
            }
        }
    }

    // ########################################
    // Getters

    /// Reports which scheduling pool a sequence currently occupies.
    ///
    /// # Errors
    /// Fails with an invariant violation when the sequence is unknown to this sequencer
    /// (neither registered nor currently scheduled).
    pub fn pool_of(&self, sequence: &Sequence) -> Result<Pool, Error> {
        let inner = self.inner.read();
        if inner.waiting.contains(sequence) {
            Ok(Pool::Waiting)
        } else if inner.active.contains(sequence) {
            Ok(Pool::Active)
        } else if inner.stored.contains(sequence) {
            Ok(Pool::Stored)
        } else {
            Err(InvariantViolation::UnknownSequence.into())
        }
    }

    /// Checks if the sequencer has no registered sequence.
    pub fn is_empty(&self) -> bool {
        self.inner.read().stored.is_empty()
    }

    /// Checks if the sequencer is running.
    pub fn is_playing(&self) -> bool {
        self.inner.read().timed.running
    }

    /// Returns the elapsed time (in ms) within the sequencer.
    pub fn get_time(&self) -> f64 {
        self.inner.read().timed.time
    }

    /// Returns the number of registered sequences.
    pub fn stored_count(&self) -> usize {
        self.inner.read().stored.len()
    }

    /// Returns the number of sequences waiting for their start time.
    pub fn waiting_count(&self) -> usize {
        self.inner.read().waiting.len()
    }

    /// Returns the number of currently ticking sequences.
    pub fn active_count(&self) -> usize {
        self.inner.read().active.len()
    }
}

impl SequencerInner {
    /// Re-seeds the waiting pool with every stored auto sequence.
    fn seed_waiting_from_stored(&mut self) {
        for sequence in &self.stored {
            if sequence.get_kind() == SequenceKind::Auto {
                self.waiting.push(sequence.clone());
            }
        }
    }
}

impl Display for Sequencer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        write!(
            f,
            "Sequencer [stored={}, waiting={}, active={}, running={}]",
            inner.stored.len(),
            inner.waiting.len(),
            inner.active.len(),
            inner.timed.running
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::animations::Animation;
    use crate::scene::Node;

    use super::*;

    const T: f64 = 1000.0 / 60.0;

    fn one_shot_sequence(node: &Node, duration: f64) -> Sequence {
        let sequence = Sequence::default();
        sequence
            .add_animation(
                Animation::translation(node, 0.0, duration, (0.0, 0.0), (100.0, 0.0))
                    .unwrap()
                    .set_loop(false),
            )
            .unwrap();
        sequence
    }

    #[test]
    fn test_add_registers_without_starting() {
        let node = Node::image("id", "img.png");
        let sequencer = Sequencer::default();
        let sequence = one_shot_sequence(&node, 1000.0);

        sequencer.add(&sequence);
        assert!(!sequencer.is_empty());
        assert!(sequence.is_prepared(), "registration prepares the sequence");
        assert!(!sequence.is_running());
        assert_eq!(sequencer.pool_of(&sequence).unwrap(), Pool::Stored);
    }

    #[test]
    fn test_start_seeds_waiting_with_auto_sequences_only() {
        let node = Node::image("id", "img.png");
        let sequencer = Sequencer::default();
        let auto = one_shot_sequence(&node, 1000.0);
        let free = one_shot_sequence(&node, 1000.0).set_kind(SequenceKind::Free);
        sequencer.add(&auto);
        sequencer.add(&free);

        sequencer.start();
        assert!(sequencer.is_playing());
        assert_eq!(sequencer.waiting_count(), 1);
        assert_eq!(sequencer.pool_of(&auto).unwrap(), Pool::Waiting);
        assert_eq!(
            sequencer.pool_of(&free).unwrap(),
            Pool::Stored,
            "free sequences never auto-enter the waiting pool"
        );
    }

    #[test]
    fn test_immediate_promotion_on_first_tick() {
        let node = Node::image("id", "img.png");
        let sequencer = Sequencer::default();
        let sequence = one_shot_sequence(&node, 1000.0);
        sequencer.add(&sequence);

        sequencer.start();
        sequencer.update(T);
        // No start time: due immediately.
        assert_eq!(sequencer.pool_of(&sequence).unwrap(), Pool::Active);
        assert!(sequence.is_running());
    }

    #[test]
    fn test_delayed_promotion_waits_for_start_time() {
        let node = Node::image("id", "img.png");
        let sequencer = Sequencer::default();
        let sequence = one_shot_sequence(&node, 1000.0);
        sequence.start_at(100.0);
        sequencer.add(&sequence);

        sequencer.start();
        for _ in 0..6 {
            sequencer.update(T);
            assert_eq!(sequencer.pool_of(&sequence).unwrap(), Pool::Waiting);
        }
        // Sequencer time reaches 100ms: promoted.
        sequencer.update(T);
        assert_eq!(sequencer.pool_of(&sequence).unwrap(), Pool::Active);
    }

    #[test]
    fn test_play_bypasses_the_waiting_pool() {
        let node = Node::image("id", "img.png");
        let sequencer = Sequencer::default();
        let sequence = one_shot_sequence(&node, 1000.0).set_kind(SequenceKind::Free);

        sequencer.play(&sequence);
        assert_eq!(sequencer.pool_of(&sequence).unwrap(), Pool::Active);
        assert!(sequence.is_running());
        assert!(
            sequencer.is_empty(),
            "played sequences are not registered in the stored pool"
        );
    }

    #[test]
    fn test_restart_reset_does_not_touch_played_free_sequence() {
        let node = Node::image("id", "img.png");
        let sequencer = Sequencer::default();
        let auto = one_shot_sequence(&node, 1000.0);
        let free = one_shot_sequence(&node, 1000.0).set_kind(SequenceKind::Free);
        sequencer.add(&auto);

        sequencer.start();
        sequencer.play(&free);
        assert_eq!(sequencer.pool_of(&free).unwrap(), Pool::Active);

        // A sequencer restart clears the scheduling pools and re-seeds the auto sequences;
        // the played free sequence leaves the pools but its own state is untouched.
        sequencer.start();
        assert_eq!(sequencer.pool_of(&auto).unwrap(), Pool::Waiting);
        assert!(sequencer.pool_of(&free).is_err());
        assert!(free.is_running(), "the free sequence state is not reset");
    }

    #[test]
    fn test_finished_sequences_are_reaped() {
        let node = Node::image("id", "img.png");
        let sequencer = Sequencer::default();
        let sequence = one_shot_sequence(&node, 100.0);
        sequencer.add(&sequence);

        sequencer.start();
        for _ in 0..10 {
            sequencer.update(T);
        }
        assert!(sequence.is_finished());
        assert_eq!(
            sequencer.pool_of(&sequence).unwrap(),
            Pool::Stored,
            "reaped from active, still registered"
        );
        assert_eq!(sequencer.active_count(), 0);
    }

    #[test]
    fn test_sequencer_loop_reseeds_auto_sequences() {
        let node = Node::image("id", "img.png");
        let sequencer = Sequencer::default();
        let sequence = one_shot_sequence(&node, 100.0);
        sequencer.add(&sequence);
        sequencer.loop_at(500.0);

        sequencer.start();
        // First cycle: the sequence is promoted, runs and finishes.
        for _ in 0..10 {
            sequencer.update(T);
        }
        assert!(sequence.is_finished());
        assert_eq!(sequencer.active_count(), 0);

        // Reaching the loop point resets the time and re-seeds the waiting pool.
        let mut time = sequencer.get_time();
        for _ in 0..40 {
            sequencer.update(T);
            if sequencer.get_time() < time {
                break;
            }
            time = sequencer.get_time();
        }
        assert!(sequencer.get_time() < 500.0, "sequencer time was reset");
        assert_eq!(sequencer.pool_of(&sequence).unwrap(), Pool::Waiting);

        // The next tick re-promotes and restarts the sequence.
        sequencer.update(T);
        assert_eq!(sequencer.pool_of(&sequence).unwrap(), Pool::Active);
        assert!(sequence.is_running());
        assert!(sequencer.is_playing());
    }

    #[test]
    fn test_sequencer_finish_at_stops() {
        let sequencer = Sequencer::default();
        sequencer.finish_at(100.0);
        sequencer.start();
        for _ in 0..10 {
            sequencer.update(T);
        }
        assert!(!sequencer.is_playing());
    }

    #[test]
    fn test_pool_of_unknown_sequence_is_an_error() {
        let sequencer = Sequencer::default();
        let sequence = Sequence::default();
        let result = sequencer.pool_of(&sequence);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Invariant violation: Sequence is not registered in this sequencer."
        );
    }

    #[test]
    fn test_translation_scenario_reaches_target_and_evicts() {
        // One translation from (0,0) to (100,0) over 1000ms at 60Hz: after ~60 ticks the node
        // lands within one tick's movement of the target and the animation has been evicted.
        let node = Node::image("id", "img.png");
        let sequencer = Sequencer::default();
        let sequence = one_shot_sequence(&node, 1000.0);
        sequencer.add(&sequence);

        sequencer.start();
        for _ in 0..62 {
            sequencer.update(T);
        }

        let (x, _) = node.get_position();
        let tick_movement = (100.0 / 1000.0) * T + 1e-9;
        assert!(
            (x - 100.0).abs() <= tick_movement,
            "x ~100 within one tick of movement (found {})",
            x
        );
        assert!(sequence.get_active().is_empty(), "animation was evicted");
        assert!(sequence.is_finished());
    }

    #[test]
    fn test_display_implementation() {
        let sequencer = Sequencer::default();
        assert_eq!(
            sequencer.to_string(),
            "Sequencer [stored=0, waiting=0, active=0, running=false]"
        );
    }
}
