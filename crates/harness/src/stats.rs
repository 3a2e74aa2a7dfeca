use std::time::Duration;

/// Rolling window of recent frame durations.
#[derive(Debug)]
pub struct FrameTimer {
    history: Vec<Duration>,
    capacity: usize,
    index: usize,
    filled: bool,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: vec![Duration::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    fn window(&self) -> &[Duration] {
        &self.history[..self.count()]
    }

    pub fn average(&self) -> Duration {
        let w = self.window();
        if w.is_empty() {
            return Duration::ZERO;
        }
        w.iter().sum::<Duration>() / w.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.window().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    /// Nearest-rank percentile of the window; `fraction` is clamped to `0..=1`.
    pub fn percentile(&self, fraction: f64) -> Duration {
        let mut sorted = self.window().to_vec();
        if sorted.is_empty() {
            return Duration::ZERO;
        }
        sorted.sort_unstable();
        let rank = (fraction.clamp(0.0, 1.0) * sorted.len() as f64).ceil() as usize;
        sorted[rank.clamp(1, sorted.len()) - 1]
    }

    pub fn count(&self) -> usize {
        if self.filled { self.capacity } else { self.index }
    }
}

/// What a finished (cancelled) run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_presented: u64,
    pub final_counter: u32,
    pub average_frame_time: Duration,
    pub max_frame_time: Duration,
    /// 95th-percentile frame time over the timer window.
    pub p95_frame_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_tracks_history() {
        let mut timer = FrameTimer::new(3);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.count(), 3);
        assert_eq!(timer.average(), Duration::from_millis(20));
        assert_eq!(timer.max(), Duration::from_millis(30));
    }

    #[test]
    fn timer_forgets_oldest_sample() {
        let mut timer = FrameTimer::new(2);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.count(), 2);
        assert_eq!(timer.average(), Duration::from_millis(25));
    }

    #[test]
    fn empty_timer_reports_zero() {
        let timer = FrameTimer::new(0);
        assert_eq!(timer.count(), 0);
        assert_eq!(timer.average(), Duration::ZERO);
        assert_eq!(timer.max(), Duration::ZERO);
        assert_eq!(timer.percentile(0.95), Duration::ZERO);
    }

    #[test]
    fn percentile_uses_nearest_rank() {
        let mut timer = FrameTimer::new(20);
        for ms in (1..=20).rev() {
            timer.record(Duration::from_millis(ms));
        }
        assert_eq!(timer.percentile(0.95), Duration::from_millis(19));
        assert_eq!(timer.percentile(0.5), Duration::from_millis(10));
        assert_eq!(timer.percentile(1.0), Duration::from_millis(20));
        assert_eq!(timer.percentile(0.0), Duration::from_millis(1));
        assert_eq!(timer.percentile(7.0), Duration::from_millis(20));
    }

    #[test]
    fn single_stall_shows_in_tail_not_median() {
        let mut timer = FrameTimer::new(10);
        for _ in 0..9 {
            timer.record(Duration::from_millis(16));
        }
        timer.record(Duration::from_millis(250));
        assert_eq!(timer.percentile(0.5), Duration::from_millis(16));
        assert_eq!(timer.percentile(0.95), Duration::from_millis(250));
    }
}
