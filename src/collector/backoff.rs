use std::time::Duration;

/// Delays slept between advance attempts
///
/// Attempt `n` (1-based) waits `steps[n - 1]`; attempts past the end of the
/// schedule reuse the last step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSchedule {
    steps: Vec<Duration>,
}

impl BackoffSchedule {
    pub fn new(steps: Vec<Duration>) -> Self {
        Self { steps }
    }

    /// Builds a schedule from millisecond values
    pub fn from_millis(steps: &[u64]) -> Self {
        Self::new(steps.iter().copied().map(Duration::from_millis).collect())
    }

    /// The delay to sleep after failed attempt `attempt`
    pub fn delay(&self, attempt: u32) -> Duration {
        let index = (attempt.max(1) - 1) as usize;
        self.steps
            .get(index)
            .or_else(|| self.steps.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    pub fn steps(&self) -> &[Duration] {
        &self.steps
    }
}

impl Default for BackoffSchedule {
    /// 2s, 4s, 8s, 12s, 20s, 30s, 45s, 60s
    fn default() -> Self {
        Self::from_millis(&[2_000, 4_000, 8_000, 12_000, 20_000, 30_000, 45_000, 60_000])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_follows_steps_then_saturates() {
        let schedule = BackoffSchedule::from_millis(&[10, 20, 40]);
        assert_eq!(schedule.delay(1), Duration::from_millis(10));
        assert_eq!(schedule.delay(2), Duration::from_millis(20));
        assert_eq!(schedule.delay(3), Duration::from_millis(40));
        assert_eq!(schedule.delay(9), Duration::from_millis(40));
    }

    #[test]
    fn test_delay_of_attempt_zero_is_first_step() {
        let schedule = BackoffSchedule::from_millis(&[10, 20]);
        assert_eq!(schedule.delay(0), Duration::from_millis(10));
    }

    #[test]
    fn test_empty_schedule_never_sleeps() {
        assert_eq!(BackoffSchedule::new(Vec::new()).delay(3), Duration::ZERO);
    }

    #[test]
    fn test_default_schedule_is_increasing() {
        let schedule = BackoffSchedule::default();
        assert_eq!(schedule.steps().len(), 8);
        assert!(schedule.steps().windows(2).all(|w| w[0] < w[1]));
    }
}
