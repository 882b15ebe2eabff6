/// Shared timing attributes for the sequencing state machines ([`Sequence`](crate::animations::Sequence)
/// and [`Sequencer`](crate::animations::Sequencer)).
///
/// `time` is the elapsed duration (in ms) within the entity: monotonic while running, and
/// reset to zero exactly at `start()` and at each loop restart.
#[derive(Clone, Debug, Default)]
pub struct Timed {
    /// Elapsed time (in ms) within this entity.
    pub(crate) time: f64,
    /// Running state.
    pub(crate) running: bool,
    /// Optional delay (in ms) before activation.
    pub(crate) start_time: Option<f64>,
    /// Optional explicit termination time (in ms).
    pub(crate) end_time: Option<f64>,
    /// Whether the entity restarts upon reaching its end time.
    pub(crate) looping: bool,
}

impl Timed {
    /// Makes the entity loop: restart from zero upon reaching `end_time`.
    pub fn loop_at(&mut self, end_time: f64) {
        self.looping = true;
        self.end_time = Some(end_time);
    }

    /// Makes the entity finish upon reaching `end_time`.
    pub fn finish_at(&mut self, end_time: f64) {
        self.end_time = Some(end_time);
    }

    /// Delays the activation of the entity until `start_time`.
    pub fn start_at(&mut self, start_time: f64) {
        self.start_time = Some(start_time);
    }

    /// Returns the explicit termination time, if any.
    pub fn get_end(&self) -> Option<f64> {
        self.end_time
    }

    /// Returns the activation delay, if any.
    pub fn get_start(&self) -> Option<f64> {
        self.start_time
    }

    /// Returns the elapsed time within this entity.
    pub fn get_time(&self) -> f64 {
        self.time
    }

    /// Checks if this entity is going to loop.
    pub fn is_loop(&self) -> bool {
        self.looping
    }

    /// Checks if this entity is running.
    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_defaults() {
        let timed = Timed::default();
        assert_eq!(timed.get_time(), 0.0);
        assert!(!timed.is_running());
        assert!(!timed.is_loop());
        assert_eq!(timed.get_start(), None);
        assert_eq!(timed.get_end(), None);
    }

    #[test]
    fn test_loop_at_sets_loop_and_end() {
        let mut timed = Timed::default();
        timed.loop_at(20000.0);
        assert!(timed.is_loop());
        assert_eq!(timed.get_end(), Some(20000.0));
    }

    #[test]
    fn test_finish_at_sets_end_only() {
        let mut timed = Timed::default();
        timed.finish_at(10000.0);
        assert!(!timed.is_loop());
        assert_eq!(timed.get_end(), Some(10000.0));
    }

    #[test]
    fn test_start_at_sets_delay() {
        let mut timed = Timed::default();
        timed.start_at(500.0);
        assert_eq!(timed.get_start(), Some(500.0));
    }
}
