use std::time::{Duration, Instant};

/// Trailing-edge debounce over an externally driven clock.
///
/// Every [`poke`](Self::poke) re-arms the deadline to `now + interval`, so a
/// burst of events collapses into a single firing once the burst has been
/// quiet for the full interval. There is no leading edge, and a stream of
/// events that never quiesces never fires.
///
/// `now` is supplied by the caller rather than read internally, so the
/// debounce window is exact under test.
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    /// The configured quiescence interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Record an event at `now`, cancelling and rescheduling any pending
    /// firing.
    pub fn poke(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    /// True while a firing is scheduled.
    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fire if the quiescence window has elapsed by `now`. Consumes the
    /// pending deadline, so each poked window fires at most once.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
