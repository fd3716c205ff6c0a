//! Modal Dialog Widget.
//!
//! Renders as
//!
//! ```text
//! {id}-overlay         backdrop; pointer-down here is outside the dialog
//!   {id}               dialog container, the overlay container
//!     {id}-header
//!       {id}-title
//!       header actions
//!       {id}-close
//!     {id}-body
//!     {id}-footer
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use log::{debug, warn};
use scrim_dom::{Document, DomError, Element, Event, EventKind};

use super::{ancestors_of, flag, rerender};
use crate::config::ModalConfig;
use crate::listeners::{Flow, ListenerHandle};
use crate::overlay::{Overlay, OverlayEnv, OverlayHooks, OverlayPhase};

/// Everything a modal is mounted with.
#[derive(Debug, Clone, Default)]
pub struct ModalProps {
    pub id: String,
    pub config: ModalConfig,
    pub body: Vec<Element>,
    pub footer: Option<Vec<Element>>,
    pub header_actions: Vec<Element>,
    pub hooks: OverlayHooks,
}

impl ModalProps {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn config(mut self, config: ModalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn body(mut self, body: Vec<Element>) -> Self {
        self.body = body;
        self
    }

    pub fn footer(mut self, footer: Vec<Element>) -> Self {
        self.footer = Some(footer);
        self
    }

    pub fn header_actions(mut self, actions: Vec<Element>) -> Self {
        self.header_actions = actions;
        self
    }

    pub fn hooks(mut self, hooks: OverlayHooks) -> Self {
        self.hooks = hooks;
        self
    }
}

struct ModalState {
    id: String,
    parent_id: String,
    config: ModalConfig,
    body: Vec<Element>,
    footer: Option<Vec<Element>>,
    header_actions: Vec<Element>,
}

impl ModalState {
    fn part(&self, name: &str) -> String {
        format!("{}-{}", self.id, name)
    }

    fn render(&self, phase: OverlayPhase) -> Element {
        let config = &self.config;
        let animation_ms = config.overlay.animation_duration_ms.to_string();

        let mut dialog = Element::box_()
            .id(self.id.clone())
            .tab_index(-1)
            .data("role", config.role.clone())
            .data("aria-modal", "true")
            .data("data-size", config.size.as_str())
            .data("data-animation", config.animation.as_str())
            .data("data-centered", flag(config.centered))
            .data("data-duration", animation_ms);
        let labelled_by = match (&config.labelled_by, &config.title) {
            (Some(id), _) => Some(id.clone()),
            (None, Some(_)) => Some(self.part("title")),
            (None, None) => None,
        };
        if let Some(id) = labelled_by {
            dialog = dialog.data("aria-labelledby", id);
        }
        if let Some(id) = &config.described_by {
            dialog = dialog.data("aria-describedby", id.clone());
        }

        if config.show_header {
            let mut header = Element::box_().id(self.part("header"));
            if let Some(title) = &config.title {
                header = header.child(Element::text(title.clone()).id(self.part("title")));
            }
            header = header.children(self.header_actions.clone());
            if config.show_close_button {
                header = header.child(
                    Element::button("×")
                        .id(self.part("close"))
                        .data("aria-label", "Close"),
                );
            }
            dialog = dialog.child(header);
        }

        dialog = dialog.child(Element::box_().id(self.part("body")).children(self.body.clone()));
        if let Some(footer) = &self.footer {
            dialog = dialog.child(Element::box_().id(self.part("footer")).children(footer.clone()));
        }

        Element::box_()
            .id(self.part("overlay"))
            .hidden(phase == OverlayPhase::Closed)
            .data("data-state", phase.as_str())
            .data("visible", flag(phase == OverlayPhase::Open))
            .child(dialog)
    }
}

/// Shared between the widget handle and its listener.
#[derive(Clone)]
struct Core {
    state: Arc<Mutex<ModalState>>,
    overlay: Overlay,
}

impl Core {
    fn lock(&self) -> MutexGuard<'_, ModalState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Re-render in place. A destroyed (unmounted) modal stays unmounted.
    fn render(&self, doc: &mut Document) {
        let phase = self.overlay.phase();
        let (element, root_id) = {
            let state = self.lock();
            (state.render(phase), state.part("overlay"))
        };
        if doc.is_attached(&root_id) {
            rerender(doc, element);
        }
    }

    fn on_click(&self, event: &Event, doc: &mut Document) -> Flow {
        let Some(target) = event.target() else {
            return Flow::Continue;
        };
        let close = self.lock().part("close");
        if ancestors_of(doc, target).contains(&close) {
            self.overlay.close(doc);
        }
        Flow::Continue
    }
}

/// A mounted modal dialog.
///
/// Dropping it removes its listener and releases its overlay. The rendered
/// elements stay in the document until [`Modal::unmount`].
pub struct Modal {
    listener: Option<ListenerHandle>,
    core: Core,
}

impl fmt::Debug for Modal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modal")
            .field("overlay", &self.core.overlay)
            .finish()
    }
}

impl Modal {
    /// Set up the modal under `parent_id`.
    ///
    /// With `destroy_on_close` nothing is rendered until the first open;
    /// otherwise the dialog is mounted hidden right away.
    pub fn mount(
        env: &OverlayEnv,
        doc: &mut Document,
        parent_id: &str,
        props: ModalProps,
    ) -> Result<Self, DomError> {
        let ModalProps {
            id,
            config,
            body,
            footer,
            header_actions,
            hooks,
        } = props;

        if doc.get(parent_id).is_none() {
            return Err(DomError::ParentNotFound(parent_id.to_string()));
        }

        let overlay = Overlay::new(env, id.clone(), config.overlay.clone());
        overlay.set_hooks(hooks);

        let state = ModalState {
            id: id.clone(),
            parent_id: parent_id.to_string(),
            config,
            body,
            footer,
            header_actions,
        };
        if !state.config.destroy_on_close {
            doc.mount(parent_id, state.render(OverlayPhase::Closed))?;
        }
        let state = Arc::new(Mutex::new(state));

        let weak = Arc::downgrade(&state);
        overlay.on_phase(move |phase, doc| on_phase(&weak, phase, doc));

        let core = Core { state, overlay };
        let listener = {
            let core = core.clone();
            env.dispatcher
                .listen(EventKind::Click, id.clone(), move |event, doc| core.on_click(event, doc))
        };
        debug!("[modal] mounted {} under {}", id, parent_id);

        Ok(Self {
            listener: Some(listener),
            core,
        })
    }

    pub fn id(&self) -> String {
        self.core.lock().id.clone()
    }

    pub fn overlay(&self) -> &Overlay {
        &self.core.overlay
    }

    pub fn phase(&self) -> OverlayPhase {
        self.core.overlay.phase()
    }

    pub fn is_open(&self) -> bool {
        self.core.overlay.is_open()
    }

    pub fn config(&self) -> ModalConfig {
        self.core.lock().config.clone()
    }

    pub fn open(&self, doc: &mut Document) {
        self.core.overlay.open(doc);
    }

    pub fn close(&self, doc: &mut Document) {
        self.core.overlay.close(doc);
    }

    pub fn toggle(&self, doc: &mut Document) {
        self.core.overlay.toggle(doc);
    }

    pub fn set_title(&self, doc: &mut Document, title: Option<String>) {
        self.core.lock().config.title = title;
        self.core.render(doc);
    }

    pub fn set_body(&self, doc: &mut Document, body: Vec<Element>) {
        self.core.lock().body = body;
        self.core.render(doc);
    }

    pub fn set_footer(&self, doc: &mut Document, footer: Option<Vec<Element>>) {
        self.core.lock().footer = footer;
        self.core.render(doc);
    }

    /// Release the widget and remove its elements from the document, if
    /// they are mounted.
    pub fn unmount(self, doc: &mut Document) -> Result<(), DomError> {
        let root_id = self.core.lock().part("overlay");
        drop(self);
        if doc.is_attached(&root_id) {
            doc.unmount(&root_id)?;
        }
        Ok(())
    }
}

impl Drop for Modal {
    fn drop(&mut self) {
        self.listener.take();
        self.core.overlay.dispose();
    }
}

fn on_phase(state: &Weak<Mutex<ModalState>>, phase: OverlayPhase, doc: &mut Document) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let (element, parent_id, destroy) = {
        let state = state.lock().unwrap_or_else(|e| e.into_inner());
        (
            state.render(phase),
            state.parent_id.clone(),
            state.config.destroy_on_close,
        )
    };

    let root_id = element.id.clone();
    if destroy && phase == OverlayPhase::Closed {
        if doc.is_attached(&root_id) {
            debug!("[modal] destroying {}", root_id);
            if let Err(e) = doc.unmount(&root_id) {
                warn!("[modal] unmount of {} failed: {}", root_id, e);
            }
        }
        return;
    }
    if let Err(e) = doc.upsert(&parent_id, element) {
        warn!("[modal] render of {} failed: {}", root_id, e);
    }
}
