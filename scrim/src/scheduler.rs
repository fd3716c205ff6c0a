//! One-shot timers for overlay transitions.
//!
//! Transitions are fire-and-forget callbacks that run on the UI loop when
//! their deadline passes. Every timer is owned by a [`TimerHandle`]; dropping
//! the handle cancels the timer, so a disposed or re-triggered overlay can
//! never receive a stale transition.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

use log::trace;
use scrim_dom::Document;

use crate::clock::Clock;

type TimerCallback = Box<dyn FnOnce(&mut Document) + Send>;

/// Unique identifier for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

struct Timer {
    id: TimerId,
    label: &'static str,
    deadline: Instant,
    callback: TimerCallback,
}

#[derive(Default)]
struct SchedulerInner {
    timers: Vec<Timer>,
    next_id: u64,
}

impl SchedulerInner {
    fn remove(&mut self, id: TimerId) -> Option<Timer> {
        let idx = self.timers.iter().position(|t| t.id == id)?;
        Some(self.timers.remove(idx))
    }
}

/// Cancellable timer queue shared by every overlay of a host.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Mutex<SchedulerInner>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("clock", &self.clock)
            .finish()
    }
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner::default())),
            clock,
        }
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Run `callback` once, `delay` from now.
    pub fn schedule<F>(&self, label: &'static str, delay: Duration, callback: F) -> TimerHandle
    where
        F: FnOnce(&mut Document) + Send + 'static,
    {
        let deadline = self.clock.now() + delay;
        let mut inner = self.lock();
        let id = TimerId(inner.next_id);
        inner.next_id += 1;
        trace!("[timer] schedule {:?} '{}' in {:?}", id, label, delay);
        inner.timers.push(Timer {
            id,
            label,
            deadline,
            callback: Box::new(callback),
        });
        TimerHandle {
            id,
            scheduler: Arc::downgrade(&self.inner),
        }
    }

    /// Number of timers waiting to fire.
    pub fn pending(&self) -> usize {
        self.lock().timers.len()
    }

    /// Earliest deadline among pending timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.lock().timers.iter().map(|t| t.deadline).min()
    }

    /// Fire every timer whose deadline has passed, earliest first.
    ///
    /// Timers scheduled by the callbacks themselves wait for the next poll.
    /// Returns the number of timers fired.
    pub fn poll(&self, doc: &mut Document) -> usize {
        let now = self.clock.now();
        let horizon = self.lock().next_id;
        let mut fired = 0;

        loop {
            // The lock is released before running the callback: callbacks
            // schedule and cancel timers themselves.
            let due = {
                let mut inner = self.lock();
                let next = inner
                    .timers
                    .iter()
                    .filter(|t| t.deadline <= now && t.id.0 < horizon)
                    .min_by_key(|t| (t.deadline, t.id))
                    .map(|t| t.id);
                next.and_then(|id| inner.remove(id))
            };
            let Some(timer) = due else { break };
            trace!("[timer] fire {:?} '{}'", timer.id, timer.label);
            (timer.callback)(doc);
            fired += 1;
        }

        fired
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Owner of a scheduled timer. Dropping it cancels the timer.
#[derive(Debug)]
pub struct TimerHandle {
    id: TimerId,
    scheduler: Weak<Mutex<SchedulerInner>>,
}

impl TimerHandle {
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Whether the timer is still waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.scheduler.upgrade().is_some_and(|inner| {
            inner
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .timers
                .iter()
                .any(|t| t.id == self.id)
        })
    }

    /// Cancel the timer now.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(inner) = self.scheduler.upgrade() {
            let removed = inner
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(self.id);
            if let Some(timer) = removed {
                trace!("[timer] cancel {:?} '{}'", timer.id, timer.label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::clock::ManualClock;

    fn scheduler() -> (Scheduler, ManualClock) {
        let clock = ManualClock::new();
        (Scheduler::new(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_timer_fires_after_deadline() {
        let (scheduler, clock) = scheduler();
        let mut doc = Document::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let _handle = scheduler.schedule("t", Duration::from_millis(10), move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(scheduler.poll(&mut doc), 0);
        clock.advance(Duration::from_millis(9));
        assert_eq!(scheduler.poll(&mut doc), 0);
        clock.advance(Duration::from_millis(1));
        assert_eq!(scheduler.poll(&mut doc), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_dropping_handle_cancels() {
        let (scheduler, clock) = scheduler();
        let mut doc = Document::new();
        let handle = scheduler.schedule("t", Duration::from_millis(5), |_| {
            panic!("cancelled timer fired");
        });
        assert!(handle.is_pending());

        handle.cancel();
        clock.advance(Duration::from_millis(50));

        assert_eq!(scheduler.poll(&mut doc), 0);
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let (scheduler, clock) = scheduler();
        let mut doc = Document::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o = Arc::clone(&order);
        let _late = scheduler.schedule("late", Duration::from_millis(20), move |_| {
            o.lock().unwrap().push("late");
        });
        let o = Arc::clone(&order);
        let _early = scheduler.schedule("early", Duration::from_millis(10), move |_| {
            o.lock().unwrap().push("early");
        });

        clock.advance(Duration::from_millis(30));
        scheduler.poll(&mut doc);

        assert_eq!(*order.lock().unwrap(), vec!["early", "late"]);
    }

    #[test]
    fn test_callback_may_schedule_without_running_in_same_poll() {
        let (scheduler, clock) = scheduler();
        let mut doc = Document::new();
        let nested: Arc<Mutex<Option<TimerHandle>>> = Arc::new(Mutex::new(None));

        let s = scheduler.clone();
        let n = Arc::clone(&nested);
        let _outer = scheduler.schedule("outer", Duration::ZERO, move |_| {
            let handle = s.schedule("inner", Duration::ZERO, |_| {});
            *n.lock().unwrap() = Some(handle);
        });

        assert_eq!(scheduler.poll(&mut doc), 1);
        assert_eq!(scheduler.pending(), 1);
        clock.advance(Duration::from_millis(1));
        assert_eq!(scheduler.poll(&mut doc), 1);
    }
}
