//! Document-level event listeners with scoped registration.
//!
//! A listener lives exactly as long as its [`ListenerHandle`]. Overlays keep
//! the handles of their escape/outside-click/tab listeners and drop them on
//! deactivation, so a listener can't outlive the activation that created it.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use log::{debug, trace};
use scrim_dom::{Document, Event, EventKind};

/// What the host should do after listeners ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flow {
    /// Let the native default action happen.
    #[default]
    Continue,
    /// Suppress the native default action (tab navigation, focus on click).
    PreventDefault,
}

impl Flow {
    pub fn is_prevented(self) -> bool {
        self == Flow::PreventDefault
    }

    fn merge(self, other: Flow) -> Flow {
        if self.is_prevented() || other.is_prevented() {
            Flow::PreventDefault
        } else {
            Flow::Continue
        }
    }
}

type Callback = Box<dyn FnMut(&Event, &mut Document) -> Flow + Send>;

/// Unique identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    kind: EventKind,
    owner: String,
    callback: Arc<Mutex<Callback>>,
}

#[derive(Default)]
struct Registry {
    listeners: Vec<Listener>,
    next_id: u64,
}

/// Registry of document-level listeners.
#[derive(Clone, Default)]
pub struct Dispatcher {
    registry: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("listeners", &self.len())
            .finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one event kind.
    ///
    /// `owner` is only used for logging and [`Dispatcher::count_for`].
    pub fn listen<F>(&self, kind: EventKind, owner: impl Into<String>, callback: F) -> ListenerHandle
    where
        F: FnMut(&Event, &mut Document) -> Flow + Send + 'static,
    {
        let owner = owner.into();
        let mut registry = self.lock();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        debug!("[listeners] add {:?} {:?} for {}", id, kind, owner);
        registry.listeners.push(Listener {
            id,
            kind,
            owner,
            callback: Arc::new(Mutex::new(Box::new(callback))),
        });
        ListenerHandle {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Run every listener registered for the event's kind, in registration order.
    ///
    /// Listeners removed by an earlier listener during the same dispatch are
    /// skipped. Listeners added during dispatch only see later events.
    pub fn dispatch(&self, event: &Event, doc: &mut Document) -> Flow {
        let kind = event.kind();
        let snapshot: Vec<(ListenerId, Arc<Mutex<Callback>>)> = self
            .lock()
            .listeners
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| (l.id, Arc::clone(&l.callback)))
            .collect();

        let mut flow = Flow::Continue;
        for (id, callback) in snapshot {
            if !self.is_registered(id) {
                trace!("[listeners] skip removed {:?}", id);
                continue;
            }
            // A listener that re-enters dispatch doesn't see its own event again.
            let Ok(mut callback) = callback.try_lock() else {
                trace!("[listeners] skip re-entrant {:?}", id);
                continue;
            };
            flow = flow.merge((callback)(event, doc));
        }
        flow
    }

    /// Total number of registered listeners.
    pub fn len(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of listeners registered for an event kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.lock()
            .listeners
            .iter()
            .filter(|l| l.kind == kind)
            .count()
    }

    /// Number of listeners registered by an owner.
    pub fn count_for(&self, owner: &str) -> usize {
        self.lock()
            .listeners
            .iter()
            .filter(|l| l.owner == owner)
            .count()
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.lock().listeners.iter().any(|l| l.id == id)
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Owner of a registered listener. Dropping it removes the listener.
#[derive(Debug)]
pub struct ListenerHandle {
    id: ListenerId,
    registry: Weak<Mutex<Registry>>,
}

impl ListenerHandle {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener now.
    pub fn remove(self) {
        drop(self);
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        // Taken out under the lock, dropped after it: the callback may own
        // other handles whose drop needs this registry.
        let removed = {
            let mut registry = registry.lock().unwrap_or_else(|e| e.into_inner());
            registry
                .listeners
                .iter()
                .position(|l| l.id == self.id)
                .map(|idx| registry.listeners.remove(idx))
        };
        if let Some(listener) = removed {
            debug!(
                "[listeners] remove {:?} {:?} for {}",
                listener.id, listener.kind, listener.owner
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use scrim_dom::{Key, Modifiers};

    use super::*;

    fn escape() -> Event {
        Event::key(Key::Escape, Modifiers::new())
    }

    #[test]
    fn test_listener_removed_on_drop() {
        let dispatcher = Dispatcher::new();
        let mut doc = Document::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        let handle = dispatcher.listen(EventKind::Key, "test", move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Flow::Continue
        });
        dispatcher.dispatch(&escape(), &mut doc);
        assert_eq!(dispatcher.len(), 1);

        drop(handle);
        dispatcher.dispatch(&escape(), &mut doc);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn test_only_matching_kind_runs() {
        let dispatcher = Dispatcher::new();
        let mut doc = Document::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        let _h = dispatcher.listen(EventKind::PointerDown, "test", move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Flow::Continue
        });
        dispatcher.dispatch(&escape(), &mut doc);

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.count(EventKind::PointerDown), 1);
        assert_eq!(dispatcher.count(EventKind::Key), 0);
    }

    #[test]
    fn test_prevent_default_wins() {
        let dispatcher = Dispatcher::new();
        let mut doc = Document::new();
        let _a = dispatcher.listen(EventKind::Key, "a", |_, _| Flow::PreventDefault);
        let _b = dispatcher.listen(EventKind::Key, "b", |_, _| Flow::Continue);

        assert_eq!(dispatcher.dispatch(&escape(), &mut doc), Flow::PreventDefault);
    }

    #[test]
    fn test_listener_removed_mid_dispatch_is_skipped() {
        let dispatcher = Dispatcher::new();
        let mut doc = Document::new();
        let second_ran = Arc::new(AtomicUsize::new(0));
        let victim: Arc<Mutex<Option<ListenerHandle>>> = Arc::new(Mutex::new(None));

        let v = Arc::clone(&victim);
        let _first = dispatcher.listen(EventKind::Key, "first", move |_, _| {
            v.lock().unwrap().take();
            Flow::Continue
        });
        let s = Arc::clone(&second_ran);
        let second = dispatcher.listen(EventKind::Key, "second", move |_, _| {
            s.fetch_add(1, Ordering::SeqCst);
            Flow::Continue
        });
        *victim.lock().unwrap() = Some(second);

        dispatcher.dispatch(&escape(), &mut doc);

        assert_eq!(second_ran.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.count_for("second"), 0);
    }
}
