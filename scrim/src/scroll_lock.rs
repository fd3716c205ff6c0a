//! Reference-counted body scroll lock.
//!
//! Every overlay that wants the page frozen holds a [`ScrollLockGuard`]. The
//! page is locked while at least one guard is alive, so one overlay closing
//! never unlocks scrolling underneath another.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use log::debug;

type Observer = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Default)]
struct LockState {
    holders: Vec<(u64, String)>,
    next_id: u64,
    observer: Option<Observer>,
}

/// Shared scroll lock. Clones refer to the same lock.
#[derive(Clone, Default)]
pub struct ScrollLock {
    state: Arc<Mutex<LockState>>,
}

impl std::fmt::Debug for ScrollLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollLock")
            .field("holders", &self.holders())
            .finish()
    }
}

impl ScrollLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a share of the lock. The page stays locked until the guard drops.
    pub fn acquire(&self, owner: impl Into<String>) -> ScrollLockGuard {
        let owner = owner.into();
        let (id, notify) = {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.holders.push((id, owner.clone()));
            debug!(
                "[scroll_lock] acquire by {} (holders: {})",
                owner,
                state.holders.len()
            );
            let notify = (state.holders.len() == 1)
                .then(|| state.observer.clone())
                .flatten();
            (id, notify)
        };
        if let Some(observer) = notify {
            observer(true);
        }
        ScrollLockGuard {
            id,
            state: Arc::downgrade(&self.state),
        }
    }

    pub fn is_locked(&self) -> bool {
        !self.lock().holders.is_empty()
    }

    /// Number of live guards.
    pub fn holders(&self) -> usize {
        self.lock().holders.len()
    }

    /// Owners of the live guards, oldest first.
    pub fn owners(&self) -> Vec<String> {
        self.lock()
            .holders
            .iter()
            .map(|(_, owner)| owner.clone())
            .collect()
    }

    /// Called with `true` when the first guard is taken and `false` when the
    /// last one is released. This is where a renderer toggles body overflow.
    pub fn on_change<F>(&self, observer: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.lock().observer = Some(Arc::new(observer));
    }

    fn lock(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One share of the [`ScrollLock`]. Dropping it releases the share.
#[derive(Debug)]
pub struct ScrollLockGuard {
    id: u64,
    state: Weak<Mutex<LockState>>,
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let notify = {
            let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
            let Some(idx) = state.holders.iter().position(|(id, _)| *id == self.id) else {
                return;
            };
            let (_, owner) = state.holders.remove(idx);
            debug!(
                "[scroll_lock] release by {} (holders: {})",
                owner,
                state.holders.len()
            );
            state
                .holders
                .is_empty()
                .then(|| state.observer.clone())
                .flatten()
        };
        if let Some(observer) = notify {
            observer(false);
        }
    }
}
