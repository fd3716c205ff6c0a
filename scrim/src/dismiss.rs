//! Escape-key and outside-pointer dismissal.

use std::sync::Arc;

use log::debug;
use scrim_dom::{contains, Document, Event, EventKind, Key};

use crate::listeners::{Dispatcher, Flow, ListenerHandle};

/// Which dismissal channels are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismissOptions {
    /// Escape key press dismisses.
    pub escape: bool,
    /// Pointer-down outside the container dismisses.
    pub outside: bool,
}

impl Default for DismissOptions {
    fn default() -> Self {
        Self {
            escape: true,
            outside: true,
        }
    }
}

impl DismissOptions {
    pub fn none() -> Self {
        Self {
            escape: false,
            outside: false,
        }
    }
}

pub type DismissCallback = Arc<dyn Fn(&mut Document) + Send + Sync>;

/// Scoped activation of a [`DismissalDetector`]. Dropping it unregisters
/// every listener the activation added.
#[derive(Debug)]
pub struct DismissHandle {
    container_id: String,
    listeners: Vec<ListenerHandle>,
}

impl DismissHandle {
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Dismissal Detector.
#[derive(Debug)]
pub struct DismissalDetector {
    dispatcher: Dispatcher,
    options: DismissOptions,
    active: Option<DismissHandle>,
}

impl DismissalDetector {
    pub fn new(dispatcher: Dispatcher, options: DismissOptions) -> Self {
        Self {
            dispatcher,
            options,
            active: None,
        }
    }

    pub fn options(&self) -> DismissOptions {
        self.options
    }

    /// Takes effect on the next activation.
    pub fn set_options(&mut self, options: DismissOptions) {
        self.options = options;
    }

    /// Start listening. Any previous activation is removed first, so the
    /// callback never runs twice for one event.
    pub fn activate<F>(&mut self, container_id: &str, on_dismiss: F)
    where
        F: Fn(&mut Document) + Send + Sync + 'static,
    {
        self.deactivate();
        self.active = Some(listen(
            &self.dispatcher,
            container_id,
            self.options,
            Arc::new(on_dismiss),
        ));
    }

    pub fn deactivate(&mut self) {
        if let Some(handle) = self.active.take() {
            debug!("[dismiss] deactivate {}", handle.container_id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

/// Register the enabled dismissal listeners for `container_id`.
pub fn listen(
    dispatcher: &Dispatcher,
    container_id: &str,
    options: DismissOptions,
    on_dismiss: DismissCallback,
) -> DismissHandle {
    let mut listeners = Vec::new();

    if options.escape {
        let on_dismiss = Arc::clone(&on_dismiss);
        let container = container_id.to_string();
        listeners.push(dispatcher.listen(EventKind::Key, container_id, move |event, doc| {
            if !matches!(event, Event::Key { key: Key::Escape, .. }) {
                return Flow::Continue;
            }
            debug!("[dismiss] escape on {}", container);
            on_dismiss(doc);
            Flow::PreventDefault
        }));
    }

    if options.outside {
        let container = container_id.to_string();
        listeners.push(dispatcher.listen(EventKind::PointerDown, container_id, move |event, doc| {
            if is_inside(doc, &container, event.target()) {
                return Flow::Continue;
            }
            debug!("[dismiss] outside pointer on {} ({:?})", container, event.target());
            on_dismiss(doc);
            Flow::Continue
        }));
    }

    debug!(
        "[dismiss] activate {} (escape: {}, outside: {})",
        container_id, options.escape, options.outside
    );
    DismissHandle {
        container_id: container_id.to_string(),
        listeners,
    }
}

/// A pointer with no target landed on the page background, which is outside.
fn is_inside(doc: &Document, container_id: &str, target: Option<&str>) -> bool {
    target.is_some_and(|target| contains(doc.root(), container_id, target))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use scrim_dom::{Element, Modifiers};

    use super::*;

    fn doc() -> Document {
        let mut doc = Document::new();
        doc.mount("body", Element::button("page").id("page")).unwrap();
        doc.mount(
            "body",
            Element::box_()
                .id("panel")
                .child(Element::button("inner").id("inner")),
        )
        .unwrap();
        doc
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&mut Document) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move |_: &mut Document| {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_escape_and_outside_pointer_dismiss() {
        let dispatcher = Dispatcher::new();
        let mut doc = doc();
        let (count, on_dismiss) = counter();
        let mut detector = DismissalDetector::new(dispatcher.clone(), DismissOptions::default());
        detector.activate("panel", on_dismiss);

        let flow = dispatcher.dispatch(&Event::key(Key::Escape, Modifiers::new()), &mut doc);
        assert_eq!(flow, Flow::PreventDefault);
        dispatcher.dispatch(&Event::pointer_down("page"), &mut doc);

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_inside_pointer_does_not_dismiss() {
        let dispatcher = Dispatcher::new();
        let mut doc = doc();
        let (count, on_dismiss) = counter();
        let mut detector = DismissalDetector::new(dispatcher.clone(), DismissOptions::default());
        detector.activate("panel", on_dismiss);

        dispatcher.dispatch(&Event::pointer_down("inner"), &mut doc);
        dispatcher.dispatch(&Event::pointer_down("panel"), &mut doc);
        dispatcher.dispatch(&Event::key(Key::Enter, Modifiers::new()), &mut doc);

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_channels_toggle_independently() {
        let dispatcher = Dispatcher::new();
        let mut doc = doc();
        let (count, on_dismiss) = counter();
        let options = DismissOptions {
            escape: false,
            outside: true,
        };
        let mut detector = DismissalDetector::new(dispatcher.clone(), options);
        detector.activate("panel", on_dismiss);

        dispatcher.dispatch(&Event::key(Key::Escape, Modifiers::new()), &mut doc);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.count(EventKind::Key), 0);

        dispatcher.dispatch(&Event::pointer_down("page"), &mut doc);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_repeated_activation_does_not_leak() {
        let dispatcher = Dispatcher::new();
        let mut doc = doc();
        let (count, _) = counter();
        let mut detector = DismissalDetector::new(dispatcher.clone(), DismissOptions::default());

        for _ in 0..5 {
            let c = Arc::clone(&count);
            detector.activate("panel", move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            });
            detector.deactivate();
            let c = Arc::clone(&count);
            detector.activate("panel", move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(dispatcher.len(), 2);

        dispatcher.dispatch(&Event::key(Key::Escape, Modifiers::new()), &mut doc);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        drop(detector);
        assert!(dispatcher.is_empty());
    }
}
