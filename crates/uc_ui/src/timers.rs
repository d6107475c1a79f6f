//! Per-element timers driven by the application loop

use std::time::{Duration, Instant};

use crate::element::ElementId;

#[derive(Clone, Debug, PartialEq)]
struct ElementTimer {
    element: ElementId,
    timer_id: u64,
    interval: Duration,
    repeat: bool,
    due: Instant,
}

/// Pending timers of one window
#[derive(Clone, Debug, Default)]
pub struct TimerSet {
    timers: Vec<ElementTimer>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start or restart a timer
    pub fn start(
        &mut self,
        element: ElementId,
        timer_id: u64,
        interval: Duration,
        repeat: bool,
        now: Instant,
    ) {
        self.stop(element, timer_id);
        self.timers.push(ElementTimer {
            element,
            timer_id,
            interval,
            repeat,
            due: now + interval,
        });
    }

    pub fn stop(&mut self, element: ElementId, timer_id: u64) -> bool {
        let before = self.timers.len();
        self.timers
            .retain(|t| !(t.element == element && t.timer_id == timer_id));
        self.timers.len() != before
    }

    pub fn remove_element(&mut self, element: ElementId) {
        self.timers.retain(|t| t.element != element);
    }

    /// Timers that fired by `now`, in due order
    ///
    /// Repeating timers are rescheduled from their previous deadline; a
    /// zero interval repeats at most once per call.
    pub fn due(&mut self, now: Instant) -> Vec<(ElementId, u64)> {
        let mut fired: Vec<(Instant, ElementId, u64)> = Vec::new();
        self.timers.retain_mut(|t| {
            if t.due > now {
                return true;
            }
            fired.push((t.due, t.element, t.timer_id));
            if t.repeat {
                t.due = if t.interval.is_zero() {
                    now + Duration::from_nanos(1)
                } else {
                    let mut next = t.due + t.interval;
                    while next <= now {
                        next += t.interval;
                    }
                    next
                };
                true
            } else {
                false
            }
        });
        fired.sort_by_key(|(due, _, _)| *due);
        fired.into_iter().map(|(_, e, id)| (e, id)).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|t| t.due).min()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn element() -> ElementId {
        let mut map: SlotMap<ElementId, ()> = SlotMap::with_key();
        map.insert(())
    }

    #[test]
    fn test_one_shot_fires_once() {
        let e = element();
        let start = Instant::now();
        let mut timers = TimerSet::new();
        timers.start(e, 1, Duration::from_millis(100), false, start);

        assert!(timers.due(start + Duration::from_millis(50)).is_empty());
        assert_eq!(timers.due(start + Duration::from_millis(100)), vec![(e, 1)]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_repeating_skips_missed_ticks() {
        let e = element();
        let start = Instant::now();
        let mut timers = TimerSet::new();
        timers.start(e, 2, Duration::from_millis(10), true, start);

        assert_eq!(timers.due(start + Duration::from_millis(35)), vec![(e, 2)]);
        assert_eq!(timers.next_deadline(), Some(start + Duration::from_millis(40)));
    }

    #[test]
    fn test_restart_replaces_and_remove_element() {
        let e = element();
        let start = Instant::now();
        let mut timers = TimerSet::new();
        timers.start(e, 3, Duration::from_millis(10), false, start);
        timers.start(e, 3, Duration::from_millis(50), false, start);
        assert_eq!(timers.len(), 1);
        timers.start(e, 4, Duration::from_millis(50), true, start);
        timers.remove_element(e);
        assert!(timers.is_empty());
        assert!(!timers.stop(e, 3));
    }
}
