//! Defines the fixed-timestep clock driving the engine.

use std::sync::OnceLock;
use std::time::Instant;

/// Immutable tick-rate configuration: built once at engine construction and shared by
/// reference, this fixes the simulation interval and the derived timing thresholds for the
/// whole engine lifetime.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickRate {
    /// Simulation updates per second (default: 60).
    updates_per_second: u32,
}

impl Default for TickRate {
    fn default() -> Self {
        Self::new(60)
    }
}

impl TickRate {
    /// Creates a tick rate of `updates_per_second` simulation steps per second.
    ///
    /// # Panic
    /// Panics if `updates_per_second` is zero.
    pub fn new(updates_per_second: u32) -> Self {
        assert!(
            updates_per_second > 0,
            "Tick rate must be at least one update per second."
        );
        Self { updates_per_second }
    }

    /// The fixed simulation interval `T`, in milliseconds.
    pub fn interval(&self) -> f64 {
        1000.0 / f64::from(self.updates_per_second)
    }

    /// The overrun threshold above which a leftover delta counts as a scratch: 96.5% of `T`.
    pub fn overrun_threshold(&self) -> f64 {
        (self.interval() * 96.5) / 100.0
    }

    /// The catch-up ceiling: accumulating `20*T` of lag stops the catch-up loop.
    pub fn catchup_ceiling(&self) -> f64 {
        self.interval() * 20.0
    }
}

/// The tick plan for one frame, as computed by [`Clock::advance`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    /// Number of simulation ticks the caller must run for this frame.
    pub ticks: u32,
    /// Leftover fractional-tick ratio (`delta / T`) for render interpolation.
    pub interpolation: f64,
}

/// Fixed-step time accumulator.
///
/// The clock samples a monotonic "now", accumulates the elapsed lag `delta` and converts it
/// into whole simulation ticks of length `T`; the remainder is handed to the renderer as an
/// interpolation ratio. Two compensation mechanisms are built in:
///
/// - a catch-up ceiling: after a long stall the clock gives up replaying history and clamps
///   the lag to a single tick;
/// - scratch detection: a leftover delta close to a full tick means a perceptible stutter —
///   counted in a diagnostic counter and smoothed out over the next frame through a carried
///   `delta_transposition` correction.
#[derive(Clone, Debug)]
pub struct Clock {
    rate: TickRate,
    last_frame_time: f64,
    delta: f64,
    delta_transposition: f64,
    scratches: u64,
    running: bool,
}

impl Clock {
    pub fn new(rate: TickRate) -> Self {
        Self {
            rate,
            last_frame_time: 0.0,
            delta: 0.0,
            delta_transposition: 0.0,
            scratches: 0,
            running: false,
        }
    }

    /// Samples the current timestamp (in milliseconds) from a process-wide monotonic epoch.
    pub fn timestamp() -> f64 {
        static EPOCH: OnceLock<Instant> = OnceLock::new();
        let epoch = EPOCH.get_or_init(Instant::now);
        epoch.elapsed().as_secs_f64() * 1000.0
    }

    /// Starts the clock: resets the accumulator and samples `now` as the frame origin.
    pub fn start(&mut self, now: f64) {
        self.running = true;
        self.last_frame_time = now;
        self.delta = 0.0;
        self.delta_transposition = 0.0;
    }

    /// Pauses the clock without resetting the accumulated state nor the counters.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resumes the clock: `now` is re-sampled immediately so the paused wall-clock time is not
    /// counted as lag.
    pub fn resume(&mut self, now: f64) {
        self.running = true;
        self.last_frame_time = now;
    }

    /// Advances the clock to `now` and returns the frame plan: how many fixed ticks the caller
    /// must execute, and the leftover `delta / T` interpolation ratio for the single draw that
    /// follows them.
    pub fn advance(&mut self, now: f64) -> Frame {
        let interval = self.rate.interval();

        // Accumulate the time elapsed since the last frame, in milliseconds.
        self.delta += now - self.last_frame_time;

        let mut ticks = 0u32;
        while self.delta >= interval {
            ticks += 1;
            self.delta -= interval;

            // Too far behind: stop catching up and settle for a single pending tick.
            if self.delta >= self.rate.catchup_ceiling() {
                self.delta = interval;
                break;
            }
        }

        // Apply the correction carried over from the previous frame.
        self.delta -= self.delta_transposition;

        if self.delta >= self.rate.overrun_threshold() {
            let overruns = (self.delta / self.rate.overrun_threshold()).round() as u64;
            self.scratches += overruns;
            self.delta_transposition = (interval + 1.0) - self.delta;
            self.delta = interval;
            log::debug!(
                "Frame overrun: {} scratch(es) detected ({} total)",
                overruns,
                self.scratches
            );
        } else {
            self.delta_transposition = 0.0;
        }

        self.last_frame_time = now;

        Frame {
            ticks,
            interpolation: self.delta / interval,
        }
    }

    /// Returns the tick rate configuration of this clock.
    pub fn rate(&self) -> &TickRate {
        &self.rate
    }

    /// Returns the number of scratches (perceptible stutters) detected since start.
    pub fn scratches(&self) -> u64 {
        self.scratches
    }

    /// Indicates whether the clock is currently running.
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(TickRate::default())
    }
}
