/// Steps per second of a board driver loop
pub const STEPS_PER_SECOND: usize = 20;

/// Slowest and fastest match speed
pub const MIN_SPEED: u8 = 1;
pub const MAX_SPEED: u8 = 5;

/// Spreads `events` evenly over every window of `steps` calls to `step()`.
///
/// With `FrequencyRegulator::new(3, 4)` four consecutive calls yield three
/// events in total, never more than one apart from the ideal rate.
#[derive(Debug, Clone)]
pub struct FrequencyRegulator {
    events: usize,
    steps: usize,
    current_step: usize,
    events_generated: usize,
}

impl FrequencyRegulator {
    pub fn new(events: usize, steps: usize) -> Self {
        FrequencyRegulator {
            events,
            steps: steps.max(1),
            current_step: 0,
            events_generated: 0,
        }
    }

    /// Gravity for a match speed: `speed` rows per second at
    /// `STEPS_PER_SECOND` steps per second
    pub fn gravity(speed: u8) -> Self {
        let speed = speed.clamp(MIN_SPEED, MAX_SPEED) as usize;
        FrequencyRegulator::new(speed, STEPS_PER_SECOND)
    }

    pub fn events(&self) -> usize {
        self.events
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn set(&mut self, events: usize, steps: usize) {
        *self = FrequencyRegulator::new(events, steps);
    }

    /// Number of events due on this step
    pub fn step(&mut self) -> usize {
        let due = (self.events * (self.current_step + 1)).div_ceil(self.steps)
            - self.events_generated;
        self.events_generated += due;
        self.current_step = (self.current_step + 1) % self.steps;
        if self.current_step == 0 {
            self.events_generated = 0;
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_per_window() {
        let mut regulator = FrequencyRegulator::new(3, 4);
        let window: Vec<usize> = (0..4).map(|_| regulator.step()).collect();
        assert_eq!(window.iter().sum::<usize>(), 3);
        assert!(window.iter().all(|n| *n <= 1));
        // Next window repeats the pattern
        let again: Vec<usize> = (0..4).map(|_| regulator.step()).collect();
        assert_eq!(window, again);
    }

    #[test]
    fn test_more_events_than_steps() {
        let mut regulator = FrequencyRegulator::new(5, 2);
        assert_eq!(regulator.step() + regulator.step(), 5);
    }

    #[test]
    fn test_gravity_clamps_speed() {
        assert_eq!(FrequencyRegulator::gravity(0).events(), 1);
        assert_eq!(FrequencyRegulator::gravity(9).events(), 5);
        let mut gravity = FrequencyRegulator::gravity(2);
        let total: usize = (0..STEPS_PER_SECOND).map(|_| gravity.step()).sum();
        assert_eq!(total, 2);
    }
}
