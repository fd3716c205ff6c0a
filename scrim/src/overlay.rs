//! Overlay Lifecycle Controller.
//!
//! Drives one overlay through `Closed -> Opening -> Open -> Closing -> Closed`.
//! While the overlay is up it holds a share of the scroll lock and the
//! dismissal listeners; while Open it also holds a focus trap. Every one of
//! those is a scoped handle stored in the overlay, so leaving a phase (or
//! dropping the overlay) releases exactly what the phase acquired.
//!
//! Transitions that wait for an animation are timers on the shared
//! [`Scheduler`]. Each transition bumps a generation counter and a timer
//! only applies if the generation it was scheduled under is still current.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use log::{debug, trace};
use scrim_dom::Document;

use crate::config::OverlayConfig;
use crate::dismiss::DismissalDetector;
use crate::focus_trap::FocusTrap;
use crate::listeners::Dispatcher;
use crate::scheduler::{Scheduler, TimerHandle};
use crate::scroll_lock::{ScrollLock, ScrollLockGuard};

/// Lifecycle phase of an overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OverlayPhase {
    #[default]
    Closed,
    /// Mounted but not yet visible; waiting for the stabilization delay.
    Opening,
    Open,
    /// Visually hidden, waiting for the leave animation.
    Closing,
}

impl OverlayPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            OverlayPhase::Closed => "closed",
            OverlayPhase::Opening => "opening",
            OverlayPhase::Open => "open",
            OverlayPhase::Closing => "closing",
        }
    }
}

impl fmt::Display for OverlayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Hook = Arc<dyn Fn() + Send + Sync>;

/// Called on every phase change with the document, before the lifecycle
/// hooks. Widgets re-render from here.
pub type PhaseObserver = Arc<dyn Fn(OverlayPhase, &mut Document) + Send + Sync>;

/// Caller-facing lifecycle callbacks.
#[derive(Clone, Default)]
pub struct OverlayHooks {
    /// Entering Opening.
    pub on_open: Option<Hook>,
    /// Reached Open.
    pub on_after_open: Option<Hook>,
    /// Entering Closing.
    pub on_close: Option<Hook>,
    /// Reached Closed after the leave animation.
    pub on_after_close: Option<Hook>,
}

impl fmt::Debug for OverlayHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayHooks")
            .field("on_open", &self.on_open.is_some())
            .field("on_after_open", &self.on_after_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_after_close", &self.on_after_close.is_some())
            .finish()
    }
}

impl OverlayHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_open<F: Fn() + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.on_open = Some(Arc::new(f));
        self
    }

    pub fn on_after_open<F: Fn() + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.on_after_open = Some(Arc::new(f));
        self
    }

    pub fn on_close<F: Fn() + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.on_close = Some(Arc::new(f));
        self
    }

    pub fn on_after_close<F: Fn() + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.on_after_close = Some(Arc::new(f));
        self
    }
}

/// The shared collaborators every overlay of a host is built from.
#[derive(Debug, Clone)]
pub struct OverlayEnv {
    pub dispatcher: Dispatcher,
    pub scheduler: Scheduler,
    pub scroll_lock: ScrollLock,
}

struct OverlayInner {
    container_id: String,
    config: OverlayConfig,
    phase: OverlayPhase,
    generation: u64,
    saved_focus: Option<String>,
    scroll_guard: Option<ScrollLockGuard>,
    pending: Option<TimerHandle>,
    trap: FocusTrap,
    dismiss: DismissalDetector,
    hooks: OverlayHooks,
    observer: Option<PhaseObserver>,
}

impl OverlayInner {
    fn enter(&mut self, phase: OverlayPhase) -> u64 {
        debug!(
            "[overlay] {} {} -> {}",
            self.container_id, self.phase, phase
        );
        self.phase = phase;
        self.generation += 1;
        self.generation
    }

    fn is_current(&self, phase: OverlayPhase, generation: u64) -> bool {
        self.phase == phase && self.generation == generation
    }
}

/// Side effects collected under the lock and run after it is released, so
/// hooks and observers may call back into the overlay.
struct Notify {
    phase: OverlayPhase,
    observer: Option<PhaseObserver>,
    hook: Option<Hook>,
}

impl Notify {
    fn run(self, doc: &mut Document) {
        if let Some(observer) = self.observer {
            observer(self.phase, doc);
        }
        if let Some(hook) = self.hook {
            hook();
        }
    }
}

/// Handle to one overlay's lifecycle. Clones share the same overlay.
///
/// The overlay and every listener, timer and lock share it holds are
/// released when the last clone is dropped.
#[derive(Clone)]
pub struct Overlay {
    inner: Arc<Mutex<OverlayInner>>,
    env: OverlayEnv,
}

impl fmt::Debug for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Overlay")
            .field("container_id", &inner.container_id)
            .field("phase", &inner.phase)
            .field("generation", &inner.generation)
            .finish()
    }
}

impl Overlay {
    /// Create a closed overlay for the element `container_id`.
    ///
    /// The container doesn't need to be mounted yet; it is only looked up
    /// when dismissal and focus trapping run.
    pub fn new(env: &OverlayEnv, container_id: impl Into<String>, config: OverlayConfig) -> Self {
        let dismiss = DismissalDetector::new(env.dispatcher.clone(), config.dismiss_options());
        let inner = OverlayInner {
            container_id: container_id.into(),
            config,
            phase: OverlayPhase::Closed,
            generation: 0,
            saved_focus: None,
            scroll_guard: None,
            pending: None,
            trap: FocusTrap::new(env.dispatcher.clone()),
            dismiss,
            hooks: OverlayHooks::default(),
            observer: None,
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            env: env.clone(),
        }
    }

    pub fn phase(&self) -> OverlayPhase {
        self.lock().phase
    }

    /// True in Opening and Open.
    pub fn is_open(&self) -> bool {
        matches!(self.phase(), OverlayPhase::Opening | OverlayPhase::Open)
    }

    /// True only in Open.
    pub fn is_visible(&self) -> bool {
        self.phase() == OverlayPhase::Open
    }

    pub fn container_id(&self) -> String {
        self.lock().container_id.clone()
    }

    pub fn config(&self) -> OverlayConfig {
        self.lock().config.clone()
    }

    /// Element that had focus when the overlay opened.
    pub fn saved_focus(&self) -> Option<String> {
        self.lock().saved_focus.clone()
    }

    pub fn is_trapping(&self) -> bool {
        self.lock().trap.is_active()
    }

    pub fn is_dismissable(&self) -> bool {
        self.lock().dismiss.is_active()
    }

    pub fn holds_scroll_lock(&self) -> bool {
        self.lock().scroll_guard.is_some()
    }

    pub fn set_hooks(&self, hooks: OverlayHooks) {
        self.lock().hooks = hooks;
    }

    /// Install the phase observer, replacing any previous one.
    pub fn on_phase<F>(&self, observer: F)
    where
        F: Fn(OverlayPhase, &mut Document) + Send + Sync + 'static,
    {
        self.lock().observer = Some(Arc::new(observer));
    }

    /// Start opening. A no-op while Opening or Open.
    ///
    /// From Closing this re-opens: the pending Closed transition is dropped
    /// and the scroll lock share already held is kept.
    pub fn open(&self, doc: &mut Document) {
        let (notify, generation, wants_lock) = {
            let mut inner = self.lock();
            match inner.phase {
                OverlayPhase::Opening | OverlayPhase::Open => {
                    trace!("[overlay] {} already open", inner.container_id);
                    return;
                }
                OverlayPhase::Closed | OverlayPhase::Closing => {}
            }

            inner.pending = None;
            inner.saved_focus = doc.focused().map(str::to_string);
            let wants_lock = inner.config.prevent_scroll && inner.scroll_guard.is_none();

            let generation = inner.enter(OverlayPhase::Opening);

            let weak = self.downgrade();
            let container_id = inner.container_id.clone();
            inner.dismiss.activate(&container_id, move |doc| {
                if let Some(overlay) = weak.upgrade() {
                    overlay.close(doc);
                }
            });

            let weak = self.downgrade();
            inner.pending = Some(self.env.scheduler.schedule(
                "overlay-open",
                inner.config.stabilization_delay(),
                move |doc| {
                    if let Some(overlay) = weak.upgrade() {
                        overlay.finish_opening(doc, generation);
                    }
                },
            ));

            let notify = Notify {
                phase: OverlayPhase::Opening,
                observer: inner.observer.clone(),
                hook: inner.hooks.on_open.clone(),
            };
            (notify, generation, wants_lock)
        };

        // Scroll lock observers may call back into this overlay.
        if wants_lock {
            let guard = self.env.scroll_lock.acquire(self.container_id());
            let stale = {
                let mut inner = self.lock();
                if inner.is_current(OverlayPhase::Opening, generation) && inner.scroll_guard.is_none() {
                    inner.scroll_guard = Some(guard);
                    None
                } else {
                    Some(guard)
                }
            };
            drop(stale);
        }
        notify.run(doc);
    }

    /// Start closing. A no-op while Closing or Closed.
    ///
    /// From Opening the pending Open transition is dropped, so the overlay
    /// never reaches Open.
    pub fn close(&self, doc: &mut Document) {
        let (notify, restore) = {
            let mut inner = self.lock();
            match inner.phase {
                OverlayPhase::Closed | OverlayPhase::Closing => {
                    trace!("[overlay] {} already closed", inner.container_id);
                    return;
                }
                OverlayPhase::Opening | OverlayPhase::Open => {}
            }

            inner.pending = None;
            inner.trap.deactivate();
            inner.dismiss.deactivate();
            let restore = inner.saved_focus.take();

            let generation = inner.enter(OverlayPhase::Closing);
            let weak = self.downgrade();
            inner.pending = Some(self.env.scheduler.schedule(
                "overlay-close",
                inner.config.animation_duration(),
                move |doc| {
                    if let Some(overlay) = weak.upgrade() {
                        overlay.finish_closing(doc, generation);
                    }
                },
            ));

            let notify = Notify {
                phase: OverlayPhase::Closing,
                observer: inner.observer.clone(),
                hook: inner.hooks.on_close.clone(),
            };
            (notify, restore)
        };

        match restore {
            Some(id) if doc.is_attached(&id) => {
                doc.focus(&id);
            }
            Some(id) => debug!("[overlay] saved focus {} is gone, not restoring", id),
            None => {}
        }
        notify.run(doc);
    }

    /// Open when closed or closing, close otherwise.
    pub fn toggle(&self, doc: &mut Document) {
        if self.is_open() {
            self.close(doc);
        } else {
            self.open(doc);
        }
    }

    /// Jump straight to Closed, releasing everything without running hooks
    /// or restoring focus. Used when the owning widget unmounts.
    pub fn dispose(&self) {
        let guard = {
            let mut inner = self.lock();
            if inner.phase == OverlayPhase::Closed {
                return;
            }
            inner.pending = None;
            inner.trap.deactivate();
            inner.dismiss.deactivate();
            inner.saved_focus = None;
            inner.enter(OverlayPhase::Closed);
            inner.scroll_guard.take()
        };
        drop(guard);
    }

    fn finish_opening(&self, doc: &mut Document, generation: u64) {
        let (notify, generation) = {
            let mut inner = self.lock();
            if !inner.is_current(OverlayPhase::Opening, generation) {
                trace!("[overlay] {} stale open timer", inner.container_id);
                return;
            }
            inner.pending = None;
            let generation = inner.enter(OverlayPhase::Open);
            let notify = Notify {
                phase: OverlayPhase::Open,
                observer: inner.observer.clone(),
                hook: None,
            };
            (notify, generation)
        };

        // Render the visible state first so the trap sees the real content.
        notify.run(doc);

        let hook = {
            let mut inner = self.lock();
            if !inner.is_current(OverlayPhase::Open, generation) {
                return;
            }
            if inner.config.trap_focus {
                let container_id = inner.container_id.clone();
                inner.trap.activate(doc, &container_id);
            }
            inner.hooks.on_after_open.clone()
        };
        if let Some(hook) = hook {
            hook();
        }
    }

    fn finish_closing(&self, doc: &mut Document, generation: u64) {
        let (notify, guard) = {
            let mut inner = self.lock();
            if !inner.is_current(OverlayPhase::Closing, generation) {
                trace!("[overlay] {} stale close timer", inner.container_id);
                return;
            }
            inner.pending = None;
            inner.enter(OverlayPhase::Closed);
            let notify = Notify {
                phase: OverlayPhase::Closed,
                observer: inner.observer.clone(),
                hook: inner.hooks.on_after_close.clone(),
            };
            (notify, inner.scroll_guard.take())
        };
        // The lock is held through the leave animation so content behind a
        // closing overlay can't scroll, and another overlay's share is never
        // released early.
        drop(guard);
        notify.run(doc);
    }

    fn downgrade(&self) -> WeakOverlay {
        WeakOverlay {
            inner: Arc::downgrade(&self.inner),
            env: self.env.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OverlayInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Non-owning reference held by listeners and timers.
struct WeakOverlay {
    inner: Weak<Mutex<OverlayInner>>,
    env: OverlayEnv,
}

impl WeakOverlay {
    fn upgrade(&self) -> Option<Overlay> {
        Some(Overlay {
            inner: self.inner.upgrade()?,
            env: self.env.clone(),
        })
    }
}
