//! Clock and timer subsystem (§4.4): one abstract contract, two
//! monomorphized implementors (test, live) per REDESIGN FLAG #1. Consumers
//! are generic over `C: Clock`, never `Box<dyn Clock>`.

mod live_clock;
mod test_clock;

pub use live_clock::LiveClock;
pub use test_clock::TestClock;

use std::sync::Arc;

use thiserror::Error;

use crate::identifiers::Timestamp;

/// Fired when an alert or timer reaches its scheduled time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEvent {
    pub label: String,
    pub timestamp: Timestamp,
}

/// A callback registered against a label. Held behind `Arc` so the same
/// handler can be shared between the clock's default and per-schedule
/// overrides without cloning the closure itself.
pub type Handler = Arc<dyn Fn(&TimeEvent) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    #[error("label {0} is already scheduled on this clock")]
    DuplicateLabel(String),

    #[error("alert time {requested} is before current clock time {now}")]
    AlertInPast { requested: Timestamp, now: Timestamp },

    #[error("timer interval must be strictly positive, got {0}")]
    NonPositiveInterval(Timestamp),

    #[error("timer start {start} + interval {interval} exceeds stop {stop}")]
    StartAfterStop {
        start: Timestamp,
        interval: Timestamp,
        stop: Timestamp,
    },

    #[error("no handler registered: set a default handler or pass one explicitly")]
    NoHandler,
}

/// Abstract clock contract shared by [`TestClock`] and [`LiveClock`].
pub trait Clock {
    /// Current time, nanosecond resolution.
    fn time_now(&self) -> Timestamp;

    /// Registers a callback invoked for every fired alert/timer that was not
    /// given an explicit handler.
    fn set_default_handler(&mut self, handler: Handler);

    /// Schedules a single-shot firing at `alert_time`. Fails if `label` is
    /// already in use on this clock, or if `alert_time < time_now()`.
    fn set_time_alert(
        &mut self,
        label: &str,
        alert_time: Timestamp,
        handler: Option<Handler>,
    ) -> Result<(), ClockError>;

    /// Schedules a repeating timer firing at `start + k*interval` for
    /// `k >= 1` while the firing time is `<= stop` (or indefinitely if
    /// `stop` is `None`). `start` defaults to `time_now()` if omitted.
    fn set_timer(
        &mut self,
        label: &str,
        interval: Timestamp,
        start: Option<Timestamp>,
        stop: Option<Timestamp>,
        handler: Option<Handler>,
    ) -> Result<(), ClockError>;

    /// Idempotent, best-effort: suppresses further firings of `label`. An
    /// in-flight callback already dispatched is not aborted.
    fn cancel_timer(&mut self, label: &str);

    /// Minimum `next_time` across every still-scheduled alert/timer.
    fn next_event_time(&self) -> Option<Timestamp>;

    /// Count of still-scheduled alerts and timers.
    fn timer_count(&self) -> usize;
}

/// One registered schedule: either a single-shot alert or a repeating timer.
#[derive(Clone)]
pub(crate) struct Schedule {
    pub label: String,
    pub next_time: Timestamp,
    pub interval: Option<Timestamp>,
    pub stop: Option<Timestamp>,
    pub handler: Option<Handler>,
}

impl Schedule {
    /// Advances a repeating timer to its next firing time. Returns `false`
    /// (signaling removal) once past `stop` or for one-shot alerts.
    pub(crate) fn rearm(&mut self) -> bool {
        match self.interval {
            None => false,
            Some(interval) => {
                let candidate = self.next_time + interval;
                match self.stop {
                    Some(stop) if candidate > stop => false,
                    _ => {
                        self.next_time = candidate;
                        true
                    }
                }
            }
        }
    }
}
