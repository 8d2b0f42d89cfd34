use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Extra slack added to every computed wait so the oldest admission has
/// definitely left the window when we wake up.
const SAFETY_MARGIN: Duration = Duration::from_millis(1);

/// A rolling window of admission instants.
///
/// Instants are pushed in chronological order, so everything that has left
/// the window is always a prefix of the queue and pruning only touches the
/// evicted entries.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    timestamps: VecDeque<Instant>,
    period: Duration,
}

impl SlidingWindow {
    /// Create an empty window spanning `period`
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            timestamps: VecDeque::new(),
            period,
        }
    }

    /// Record an admission at `now`
    pub fn record(&mut self, now: Instant) {
        debug_assert!(self.timestamps.back().is_none_or(|last| *last <= now));
        self.timestamps.push_back(now);
    }

    /// Drop every instant that is at least one `period` old
    pub fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.timestamps.front() {
            if now.saturating_duration_since(*oldest) >= self.period {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of admissions currently inside the window
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the window holds no admissions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Slots left out of `limit` once `in_flight` requests are accounted for
    #[must_use]
    pub fn available(&self, limit: usize, in_flight: usize) -> usize {
        limit.saturating_sub(self.timestamps.len() + in_flight)
    }

    /// Time until the oldest admission leaves the window.
    ///
    /// Returns zero for an empty window; capacity then only depends on the
    /// number of in-flight requests, which no amount of waiting changes.
    #[must_use]
    pub fn wait_time(&self, now: Instant) -> Duration {
        match self.timestamps.front() {
            Some(oldest) => {
                let expires_at = *oldest + self.period;
                expires_at.saturating_duration_since(now) + SAFETY_MARGIN
            }
            None => Duration::ZERO,
        }
    }
}
