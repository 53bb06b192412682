use std::time::{Duration, Instant};

/// The periodic tick schedule. Arming always replaces whatever was armed
/// before, so there is never more than one live tick stream.
#[derive(Debug, Default)]
pub struct Ticker {
    interval: Option<Duration>,
    next_due: Option<Instant>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, interval: Duration, now: Instant) {
        self.interval = Some(interval);
        self.next_due = Some(now + interval);
    }

    pub fn cancel(&mut self) {
        self.interval = None;
        self.next_due = None;
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    #[cfg(test)]
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Time left until the next tick, if armed.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }

    /// Consumes a due tick. A loop that fell behind gets one tick, not a burst.
    pub fn poll(&mut self, now: Instant) -> bool {
        match (self.interval, self.next_due) {
            (Some(interval), Some(due)) if now >= due => {
                let next = due + interval;
                self.next_due = Some(if next > now { next } else { now + interval });
                true
            }
            _ => false,
        }
    }
}
