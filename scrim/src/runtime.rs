//! The host that owns the document and drives events and timers.

use std::sync::Arc;
use std::time::Instant;

use crossterm::event::Event as CrosstermEvent;
use futures::{Stream, StreamExt};
use log::{debug, trace};
use scrim_dom::{
    translate_event, Content, Document, Element, ElementKind, Event, Key, LayoutResult, Modifiers,
    MouseButton,
};
use tokio::time::sleep_until;

use crate::clock::{Clock, SystemClock};
use crate::listeners::{Dispatcher, Flow};
use crate::overlay::OverlayEnv;
use crate::scheduler::Scheduler;
use crate::scroll_lock::ScrollLock;

/// Owns a [`Document`] and the collaborators every overlay shares.
///
/// Events go through [`Host::dispatch`]: document listeners first, then the
/// native default action unless a listener prevented it.
#[derive(Debug)]
pub struct Host {
    document: Document,
    env: OverlayEnv,
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

impl Host {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Host on a custom clock. [`Host::run`] sleeps on tokio time, so only
    /// [`SystemClock`] is meaningful there; a `ManualClock` host is driven
    /// with [`Host::poll_timers`].
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_document(Document::new(), clock)
    }

    pub fn with_document(document: Document, clock: Arc<dyn Clock>) -> Self {
        Self {
            document,
            env: OverlayEnv {
                dispatcher: Dispatcher::new(),
                scheduler: Scheduler::new(clock),
                scroll_lock: ScrollLock::new(),
            },
        }
    }

    pub fn env(&self) -> &OverlayEnv {
        &self.env
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// The environment and the document at once, for mounting widgets.
    pub fn parts(&mut self) -> (&OverlayEnv, &mut Document) {
        (&self.env, &mut self.document)
    }

    pub fn focused(&self) -> Option<&str> {
        self.document.focused()
    }

    pub fn scroll_lock(&self) -> &ScrollLock {
        &self.env.scroll_lock
    }

    /// Deliver an event. Key events without a target go to the focused
    /// element.
    pub fn dispatch(&mut self, event: Event) -> Flow {
        let event = event.with_focus_target(&self.document);
        trace!("[host] dispatch {:?}", event);

        if let Event::Input { target, value } = &event {
            self.set_value(target, value);
        }

        let flow = self.env.dispatcher.dispatch(&event, &mut self.document);
        if flow.is_prevented() {
            trace!("[host] default prevented for {:?}", event.kind());
        } else {
            self.default_action(&event);
        }
        flow
    }

    pub fn press(&mut self, key: Key) -> Flow {
        self.dispatch(Event::key(key, Modifiers::new()))
    }

    pub fn press_with(&mut self, key: Key, modifiers: Modifiers) -> Flow {
        self.dispatch(Event::key(key, modifiers))
    }

    pub fn pointer_down(&mut self, target: &str) -> Flow {
        self.dispatch(Event::pointer_down(target))
    }

    /// Pointer-down on the page background, outside every element.
    pub fn pointer_down_outside(&mut self) -> Flow {
        self.dispatch(Event::PointerDown {
            target: None,
            x: 0,
            y: 0,
            button: MouseButton::Left,
        })
    }

    /// Pointer-down followed by a click on the same target.
    pub fn click(&mut self, target: &str) -> Flow {
        self.pointer_down(target);
        self.dispatch(Event::click(target))
    }

    /// Type `value` into a text field.
    pub fn input(&mut self, target: &str, value: &str) -> Flow {
        self.dispatch(Event::input(target, value))
    }

    /// Deliver a raw terminal event, hit-testing mouse events against
    /// `layout`. Returns None for events the document has no use for.
    pub fn dispatch_terminal(&mut self, raw: &CrosstermEvent, layout: &LayoutResult) -> Option<Flow> {
        let event = translate_event(raw, &self.document, layout)?;
        Some(self.dispatch(event))
    }

    /// Fire due timers.
    pub fn poll_timers(&mut self) -> usize {
        self.env.scheduler.poll(&mut self.document)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.env.scheduler.next_deadline()
    }

    /// Process events until the stream ends, firing timers as their
    /// deadlines pass.
    pub async fn run<S>(&mut self, mut events: S)
    where
        S: Stream<Item = Event> + Unpin,
    {
        debug!("[host] run loop started");
        loop {
            self.poll_timers();
            let next_deadline = self.next_deadline();

            tokio::select! {
                event = events.next() => match event {
                    Some(event) => {
                        self.dispatch(event);
                    }
                    None => break,
                },
                _ = sleep_until_optional(next_deadline) => {
                    trace!("[host] timer deadline reached");
                }
            }
        }
        debug!("[host] event stream ended");
    }

    /// Wait until no timers are pending, firing each as it comes due.
    pub async fn settle(&mut self) {
        while let Some(deadline) = self.next_deadline() {
            sleep_until(tokio::time::Instant::from_std(deadline)).await;
            self.poll_timers();
        }
    }

    fn default_action(&mut self, event: &Event) {
        match event {
            Event::Key {
                key: Key::Tab,
                modifiers,
                ..
            } if !modifiers.shift => {
                self.document.focus_next();
            }
            Event::Key {
                key: Key::Tab | Key::BackTab,
                ..
            } => {
                self.document.focus_prev();
            }
            Event::Key {
                target: Some(target),
                ..
            } if event.is_activation_key() && self.is_button(target) => {
                let target = target.clone();
                self.dispatch(Event::click(target));
            }
            Event::PointerDown { target, .. } => {
                match target
                    .as_deref()
                    .and_then(|t| self.document.focusable_ancestor(t))
                {
                    Some(id) => {
                        self.document.focus(&id);
                    }
                    None => {
                        self.document.blur();
                    }
                }
            }
            _ => {}
        }
    }

    fn is_button(&self, id: &str) -> bool {
        self.document
            .get(id)
            .is_some_and(|el| el.kind == ElementKind::Button && !el.disabled)
    }

    fn set_value(&mut self, id: &str, value: &str) {
        let Some(element) = self.document.get(id) else {
            return;
        };
        let updated = Element {
            content: Content::Text(value.to_string()),
            ..element.clone()
        };
        if let Err(e) = self.document.replace(updated) {
            debug!("[host] value of {} not updated: {}", id, e);
        }
    }
}

/// Sleep until a deadline, or wait forever if None.
async fn sleep_until_optional(deadline: Option<Instant>) {
    match deadline {
        Some(d) => sleep_until(tokio::time::Instant::from_std(d)).await,
        None => std::future::pending::<()>().await,
    }
}
