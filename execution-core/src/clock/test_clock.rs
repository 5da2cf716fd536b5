//! Discrete clock for deterministic backtests and unit tests (§4.4).
//!
//! `advance_time` never invokes a handler itself — it hands back the ordered
//! list of `(event, handler)` pairs that fired so the caller decides whether,
//! and in what order relative to other simulated clocks, to run them. This is
//! what keeps replay deterministic and reorderable.

use std::collections::HashSet;

use super::{Clock, ClockError, Handler, Schedule, TimeEvent};
use crate::identifiers::Timestamp;

#[derive(Default)]
pub struct TestClock {
    now: Timestamp,
    schedules: Vec<Schedule>,
    default_handler: Option<Handler>,
}

impl TestClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the starting time without consulting any schedule. Intended for
    /// test setup before the first `advance_time` call.
    pub fn set_time(&mut self, t: Timestamp) {
        self.now = t;
    }

    fn resolve_handler(&self, explicit: Option<Handler>) -> Option<Handler> {
        explicit.or_else(|| self.default_handler.clone())
    }

    fn labels(&self) -> HashSet<&str> {
        self.schedules.iter().map(|s| s.label.as_str()).collect()
    }

    /// Returns every `(event, handler)` pair that fires in `(previous_now, t]`,
    /// in firing-time order (ties broken by label), consumes expired
    /// schedules, and advances current time to `t`.
    pub fn advance_time(&mut self, t: Timestamp) -> Vec<(TimeEvent, Handler)> {
        let mut fired = Vec::new();
        loop {
            let next = self
                .schedules
                .iter()
                .enumerate()
                .filter(|(_, s)| s.next_time <= t)
                .min_by(|(_, a), (_, b)| (a.next_time, &a.label).cmp(&(b.next_time, &b.label)))
                .map(|(idx, _)| idx);

            let Some(idx) = next else { break };
            let mut schedule = self.schedules.remove(idx);
            let event = TimeEvent {
                label: schedule.label.clone(),
                timestamp: schedule.next_time,
            };
            if let Some(handler) = schedule.handler.clone() {
                fired.push((event, handler));
            }
            if schedule.rearm() {
                self.schedules.push(schedule);
            }
        }
        self.now = t;
        fired
    }
}

impl Clock for TestClock {
    fn time_now(&self) -> Timestamp {
        self.now
    }

    fn set_default_handler(&mut self, handler: Handler) {
        self.default_handler = Some(handler);
    }

    fn set_time_alert(
        &mut self,
        label: &str,
        alert_time: Timestamp,
        handler: Option<Handler>,
    ) -> Result<(), ClockError> {
        if self.labels().contains(label) {
            return Err(ClockError::DuplicateLabel(label.to_string()));
        }
        if alert_time < self.now {
            return Err(ClockError::AlertInPast {
                requested: alert_time,
                now: self.now,
            });
        }
        let handler = self.resolve_handler(handler).ok_or(ClockError::NoHandler)?;
        self.schedules.push(Schedule {
            label: label.to_string(),
            next_time: alert_time,
            interval: None,
            stop: None,
            handler: Some(handler),
        });
        Ok(())
    }

    fn set_timer(
        &mut self,
        label: &str,
        interval: Timestamp,
        start: Option<Timestamp>,
        stop: Option<Timestamp>,
        handler: Option<Handler>,
    ) -> Result<(), ClockError> {
        if self.labels().contains(label) {
            return Err(ClockError::DuplicateLabel(label.to_string()));
        }
        if interval <= 0 {
            return Err(ClockError::NonPositiveInterval(interval));
        }
        let start = start.unwrap_or(self.now);
        if let Some(stop) = stop {
            if start + interval > stop {
                return Err(ClockError::StartAfterStop {
                    start,
                    interval,
                    stop,
                });
            }
        }
        let handler = self.resolve_handler(handler).ok_or(ClockError::NoHandler)?;
        self.schedules.push(Schedule {
            label: label.to_string(),
            next_time: start + interval,
            interval: Some(interval),
            stop,
            handler: Some(handler),
        });
        Ok(())
    }

    fn cancel_timer(&mut self, label: &str) {
        self.schedules.retain(|s| s.label != label);
    }

    fn next_event_time(&self) -> Option<Timestamp> {
        self.schedules.iter().map(|s| s.next_time).min()
    }

    fn timer_count(&self) -> usize {
        self.schedules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_handler() -> (Handler, Arc<Mutex<Vec<TimeEvent>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        let handler: Handler = Arc::new(move |event: &TimeEvent| {
            log_clone.lock().unwrap().push(event.clone());
        });
        (handler, log)
    }

    #[test]
    fn scenario_e_alert_and_timer_fire_in_order() {
        let mut clock = TestClock::new();
        let (handler, _log) = recording_handler();

        clock.set_time_alert("alert-10s", 10, Some(handler.clone())).unwrap();
        clock
            .set_timer("timer-3s", 3, Some(0), Some(9), Some(handler))
            .unwrap();

        let fired = clock.advance_time(10);
        let timestamps: Vec<Timestamp> = fired.iter().map(|(e, _)| e.timestamp).collect();
        assert_eq!(timestamps, vec![3, 6, 9, 10]);
        assert_eq!(clock.time_now(), 10);
        assert_eq!(clock.timer_count(), 0);
    }

    #[test]
    fn advance_before_next_event_fires_nothing() {
        let mut clock = TestClock::new();
        let (handler, _log) = recording_handler();
        clock.set_time_alert("a", 10, Some(handler)).unwrap();
        let fired = clock.advance_time(5);
        assert!(fired.is_empty());
        assert_eq!(clock.time_now(), 5);
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let mut clock = TestClock::new();
        let (handler, _log) = recording_handler();
        clock.set_time_alert("a", 10, Some(handler.clone())).unwrap();
        let err = clock.set_time_alert("a", 20, Some(handler)).unwrap_err();
        assert!(matches!(err, ClockError::DuplicateLabel(_)));
    }

    #[test]
    fn cancel_timer_suppresses_future_firings() {
        let mut clock = TestClock::new();
        let (handler, _log) = recording_handler();
        clock.set_timer("t", 1, Some(0), None, Some(handler)).unwrap();
        clock.cancel_timer("t");
        let fired = clock.advance_time(100);
        assert!(fired.is_empty());
    }

    #[test]
    fn default_handler_is_used_when_none_given() {
        let mut clock = TestClock::new();
        let (handler, log) = recording_handler();
        clock.set_default_handler(handler);
        clock.set_time_alert("a", 5, None).unwrap();
        let fired = clock.advance_time(5);
        assert_eq!(fired.len(), 1);
        fired[0].1(&fired[0].0);
        assert_eq!(log.lock().unwrap().len(), 1);
    }
}
