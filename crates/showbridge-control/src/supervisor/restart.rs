//! Windowed restart policy

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Timing of restarts after the child fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Delay before a normal restart
    pub restart_delay: Duration,
    /// Sliding window restarts are counted in
    pub window: Duration,
    /// Restarts within `window` that trigger a backoff
    pub max_restarts: usize,
    /// Pause after too many restarts
    pub backoff: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            restart_delay: Duration::from_secs(10),
            window: Duration::from_secs(60),
            max_restarts: 5,
            backoff: Duration::from_secs(5 * 60),
        }
    }
}

/// What to do after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Restart after the given delay
    RestartAfter(Duration),
    /// Stop restarting for the given duration, then reset
    Backoff(Duration),
}

/// Counts restarts in a sliding window
#[derive(Debug)]
pub struct RestartTracker {
    policy: RestartPolicy,
    restarts: VecDeque<Instant>,
}

impl RestartTracker {
    pub fn new(policy: RestartPolicy) -> Self {
        Self {
            policy,
            restarts: VecDeque::new(),
        }
    }

    /// Record a failure at `now` and decide how to continue
    pub fn on_failure(&mut self, now: Instant) -> RestartDecision {
        while let Some(&oldest) = self.restarts.front() {
            if now.duration_since(oldest) >= self.policy.window {
                self.restarts.pop_front();
            } else {
                break;
            }
        }

        if self.restarts.len() >= self.policy.max_restarts {
            return RestartDecision::Backoff(self.policy.backoff);
        }

        self.restarts.push_back(now);
        RestartDecision::RestartAfter(self.policy.restart_delay)
    }

    /// Forget all recorded restarts
    pub fn reset(&mut self) {
        self.restarts.clear();
    }

    /// Restarts currently counted
    pub fn recent_restarts(&self) -> usize {
        self.restarts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sixth_failure_backs_off() {
        let start = Instant::now();
        let mut tracker = RestartTracker::new(RestartPolicy::default());

        for i in 0..5 {
            let now = start + Duration::from_secs(i * 10);
            assert_eq!(
                tracker.on_failure(now),
                RestartDecision::RestartAfter(Duration::from_secs(10))
            );
        }
        assert_eq!(
            tracker.on_failure(start + Duration::from_secs(50)),
            RestartDecision::Backoff(Duration::from_secs(300))
        );

        tracker.reset();
        assert_eq!(tracker.recent_restarts(), 0);
        assert_eq!(
            tracker.on_failure(start + Duration::from_secs(350)),
            RestartDecision::RestartAfter(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_old_restarts_leave_window() {
        let start = Instant::now();
        let mut tracker = RestartTracker::new(RestartPolicy::default());

        for i in 0..5 {
            tracker.on_failure(start + Duration::from_secs(i * 20));
        }
        // At t=100 the failures at 0, 20 and 40 are out of the window
        assert_eq!(
            tracker.on_failure(start + Duration::from_secs(100)),
            RestartDecision::RestartAfter(Duration::from_secs(10))
        );
        assert_eq!(tracker.recent_restarts(), 3);
    }
}
