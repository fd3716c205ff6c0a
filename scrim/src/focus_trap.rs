//! Keeps Tab navigation inside a container while it is active.

use log::{debug, trace};
use scrim_dom::{collect_focusable, contains, Document, Event, EventKind, Key};

use crate::listeners::{Dispatcher, Flow, ListenerHandle};

/// Scoped activation of a focus trap. Dropping it removes the Tab listener
/// and leaves focus wherever it is.
#[derive(Debug)]
pub struct FocusTrapHandle {
    container_id: String,
    _listener: ListenerHandle,
}

impl FocusTrapHandle {
    pub fn container_id(&self) -> &str {
        &self.container_id
    }
}

/// Focus Trap Manager.
///
/// One trap per overlay. Activating again replaces the previous activation.
#[derive(Debug)]
pub struct FocusTrap {
    dispatcher: Dispatcher,
    active: Option<FocusTrapHandle>,
}

impl FocusTrap {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            active: None,
        }
    }

    /// Trap focus inside `container_id`.
    ///
    /// Moves focus to the first focusable descendant unless focus is already
    /// inside the container. With nothing focusable inside, this is a no-op
    /// and returns false.
    pub fn activate(&mut self, doc: &mut Document, container_id: &str) -> bool {
        self.deactivate();
        match trap(&self.dispatcher, doc, container_id) {
            Some(handle) => {
                self.active = Some(handle);
                true
            }
            None => false,
        }
    }

    /// Remove Tab interception. Focus is not touched.
    pub fn deactivate(&mut self) {
        if let Some(handle) = self.active.take() {
            debug!("[focus_trap] deactivate {}", handle.container_id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn container_id(&self) -> Option<&str> {
        self.active.as_ref().map(FocusTrapHandle::container_id)
    }
}

/// Activate a trap on `container_id` and return its handle.
pub fn trap(dispatcher: &Dispatcher, doc: &mut Document, container_id: &str) -> Option<FocusTrapHandle> {
    let focusable = focusable_in(doc, container_id);
    if focusable.is_empty() {
        debug!("[focus_trap] {} has nothing focusable, not trapping", container_id);
        return None;
    }

    let inside = doc
        .focused()
        .is_some_and(|id| contains(doc.root(), container_id, id));
    if !inside {
        doc.focus(&focusable[0]);
    }
    debug!(
        "[focus_trap] activate {} ({} focusable)",
        container_id,
        focusable.len()
    );

    let container = container_id.to_string();
    let listener = dispatcher.listen(EventKind::Key, container_id, move |event, doc| {
        handle_tab(event, doc, &container)
    });
    Some(FocusTrapHandle {
        container_id: container_id.to_string(),
        _listener: listener,
    })
}

/// Focusable descendants of a container in document order. Empty when the
/// container is not attached or hidden.
pub fn focusable_in(doc: &Document, container_id: &str) -> Vec<String> {
    if doc.is_hidden(container_id) {
        return Vec::new();
    }
    doc.get(container_id)
        .map(collect_focusable)
        .unwrap_or_default()
}

fn handle_tab(event: &Event, doc: &mut Document, container_id: &str) -> Flow {
    let Event::Key { key, modifiers, .. } = event else {
        return Flow::Continue;
    };
    let backward = match key {
        Key::BackTab => true,
        Key::Tab => modifiers.shift,
        _ => return Flow::Continue,
    };

    // Recomputed per press: the container may re-render while open.
    let focusable = focusable_in(doc, container_id);
    let (Some(first), Some(last)) = (focusable.first(), focusable.last()) else {
        return Flow::Continue;
    };

    let current = doc
        .focused()
        .and_then(|id| focusable.iter().position(|f| f == id));
    let edge = match current {
        None => true,
        Some(0) if backward => true,
        Some(i) if !backward => i == focusable.len() - 1,
        Some(_) => false,
    };
    if !edge {
        return Flow::Continue;
    }

    let target = if backward { last } else { first };
    trace!("[focus_trap] wrap {:?} -> {}", doc.focused(), target);
    doc.focus(target);
    Flow::PreventDefault
}

#[cfg(test)]
mod tests {
    use scrim_dom::{Element, Modifiers};

    use super::*;

    fn doc() -> Document {
        let mut doc = Document::new();
        doc.mount("body", Element::button("outside").id("outside"))
            .unwrap();
        doc.mount(
            "body",
            Element::box_()
                .id("panel")
                .child(Element::button("a").id("a"))
                .child(Element::text("label"))
                .child(Element::input("").id("b"))
                .child(Element::button("c").id("c")),
        )
        .unwrap();
        doc
    }

    fn tab() -> Event {
        Event::key(Key::Tab, Modifiers::new())
    }

    #[test]
    fn test_activation_moves_focus_inside() {
        let dispatcher = Dispatcher::new();
        let mut doc = doc();
        doc.focus("outside");

        let mut trap = FocusTrap::new(dispatcher.clone());
        assert!(trap.activate(&mut doc, "panel"));

        assert_eq!(doc.focused(), Some("a"));
        assert_eq!(dispatcher.count(EventKind::Key), 1);
    }

    #[test]
    fn test_activation_keeps_focus_already_inside() {
        let mut doc = doc();
        doc.focus("b");

        let mut trap = FocusTrap::new(Dispatcher::new());
        trap.activate(&mut doc, "panel");

        assert_eq!(doc.focused(), Some("b"));
    }

    #[test]
    fn test_empty_container_is_noop() {
        let dispatcher = Dispatcher::new();
        let mut doc = doc();
        doc.mount("body", Element::box_().id("empty").child(Element::text("x")))
            .unwrap();
        doc.focus("outside");

        let mut trap = FocusTrap::new(dispatcher.clone());
        assert!(!trap.activate(&mut doc, "empty"));

        assert!(!trap.is_active());
        assert_eq!(doc.focused(), Some("outside"));
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn test_middle_tab_passes_through() {
        let dispatcher = Dispatcher::new();
        let mut doc = doc();
        let mut trap = FocusTrap::new(dispatcher.clone());
        trap.activate(&mut doc, "panel");

        assert_eq!(dispatcher.dispatch(&tab(), &mut doc), Flow::Continue);
        assert_eq!(doc.focused(), Some("a"));
    }

    #[test]
    fn test_deactivate_removes_listener_and_keeps_focus() {
        let dispatcher = Dispatcher::new();
        let mut doc = doc();
        let mut trap = FocusTrap::new(dispatcher.clone());
        trap.activate(&mut doc, "panel");
        doc.focus("c");

        trap.deactivate();

        assert!(dispatcher.is_empty());
        assert_eq!(doc.focused(), Some("c"));
        assert_eq!(dispatcher.dispatch(&tab(), &mut doc), Flow::Continue);
    }

    #[test]
    fn test_reactivation_does_not_stack_listeners() {
        let dispatcher = Dispatcher::new();
        let mut doc = doc();
        let mut trap = FocusTrap::new(dispatcher.clone());
        for _ in 0..3 {
            trap.activate(&mut doc, "panel");
        }
        assert_eq!(dispatcher.len(), 1);
    }
}
