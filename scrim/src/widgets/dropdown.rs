//! Dropdown Select Widget.
//!
//! Renders as
//!
//! ```text
//! {id}                 combobox root, the overlay container
//!   {id}-trigger       button showing the display label
//!   {id}-clear         clear button (clearable, with a value)
//!   {id}-panel         hidden while Closed
//!     {id}-search      search input (searchable)
//!     {id}-options     option rows {id}-opt-{index}
//!     {id}-empty       shown instead of the rows when nothing matches
//! ```
//!
//! Option row ids use the index into the full option list, so a row keeps its
//! id (and focus) while the search text changes.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use log::debug;
use scrim_dom::{contains, Document, DomError, Element, Event, EventKind, Key};

use super::{ancestors_of, flag, rerender};
use crate::config::SelectConfig;
use crate::listeners::{Flow, ListenerHandle};
use crate::overlay::{Overlay, OverlayEnv, OverlayHooks, OverlayPhase};
use crate::selection::{InitialValue, SelectOption, SelectOutcome, SelectValue, SelectionModel};

pub type ChangeHandler<V> = Arc<dyn Fn(SelectValue<V>) + Send + Sync>;

/// Everything a dropdown is mounted with.
pub struct DropdownProps<V> {
    pub id: String,
    pub options: Vec<SelectOption<V>>,
    pub config: SelectConfig,
    pub value: InitialValue<V>,
    pub on_change: Option<ChangeHandler<V>>,
    pub hooks: OverlayHooks,
}

impl<V> DropdownProps<V> {
    pub fn new<O>(id: impl Into<String>, options: impl IntoIterator<Item = O>) -> Self
    where
        O: Into<SelectOption<V>>,
    {
        Self {
            id: id.into(),
            options: options.into_iter().map(Into::into).collect(),
            config: SelectConfig::default(),
            value: InitialValue::None,
            on_change: None,
            hooks: OverlayHooks::default(),
        }
    }

    pub fn config(mut self, config: SelectConfig) -> Self {
        self.config = config;
        self
    }

    pub fn value(mut self, value: impl Into<InitialValue<V>>) -> Self {
        self.value = value.into();
        self
    }

    pub fn on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(SelectValue<V>) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(f));
        self
    }

    pub fn hooks(mut self, hooks: OverlayHooks) -> Self {
        self.hooks = hooks;
        self
    }
}

struct DropdownState<V> {
    id: String,
    config: SelectConfig,
    model: SelectionModel<V>,
    on_change: Option<ChangeHandler<V>>,
}

impl<V> DropdownState<V> {
    fn part(&self, name: &str) -> String {
        format!("{}-{}", self.id, name)
    }

    fn option_id(&self, index: usize) -> String {
        format!("{}-opt-{}", self.id, index)
    }

    fn option_index(&self, element_id: &str) -> Option<usize> {
        element_id
            .strip_prefix(self.id.as_str())?
            .strip_prefix("-opt-")?
            .parse()
            .ok()
    }

    fn inert(&self) -> bool {
        self.config.disabled || self.config.loading
    }
}

impl<V: Clone + PartialEq> DropdownState<V> {
    /// Indices of the visible, enabled option rows.
    fn navigable(&self) -> Vec<usize> {
        let options = self.model.options();
        self.model
            .filtered_indices()
            .into_iter()
            .filter(|&i| !options[i].disabled)
            .collect()
    }

    fn render(&self, phase: OverlayPhase) -> Element {
        let config = &self.config;
        let expanded = matches!(phase, OverlayPhase::Opening | OverlayPhase::Open);
        let has_value = !self.model.selected().is_empty();

        let mut trigger = Element::button(self.model.display_label(&config.placeholder))
            .id(self.part("trigger"))
            .disabled(config.disabled)
            .data("aria-haspopup", "listbox")
            .data("aria-expanded", flag(expanded))
            .data("aria-controls", self.part("panel"))
            .data("placeholder", flag(!has_value));
        if config.loading {
            trigger = trigger.data("aria-busy", "true");
        }

        let mut root = Element::box_()
            .id(self.id.clone())
            .data("role", "combobox")
            .data("data-state", phase.as_str())
            .data("data-disabled", flag(config.disabled))
            .data("data-loading", flag(config.loading))
            .child(trigger);

        if config.clearable && has_value && !self.inert() {
            root = root.child(
                Element::button("×")
                    .id(self.part("clear"))
                    .tab_index(-1)
                    .data("aria-label", "Clear selection"),
            );
        }

        let mut panel = Element::box_()
            .id(self.part("panel"))
            .hidden(phase == OverlayPhase::Closed)
            .data("visible", flag(phase == OverlayPhase::Open));
        if config.searchable {
            panel = panel.child(
                Element::input(self.model.search_text())
                    .id(self.part("search"))
                    .data("placeholder", config.search_placeholder.clone()),
            );
        }

        let indices = self.model.filtered_indices();
        let list = if indices.is_empty() {
            Element::text(config.empty_text.clone())
                .id(self.part("empty"))
                .data("role", "status")
        } else {
            let rows = indices.into_iter().map(|i| self.render_option(i)).collect();
            Element::box_()
                .id(self.part("options"))
                .data("role", "listbox")
                .data("aria-multiselectable", flag(self.model.multiple()))
                .children(rows)
        };

        root.child(panel.child(list))
    }

    fn render_option(&self, index: usize) -> Element {
        let option = &self.model.options()[index];
        let selected = self.model.is_selected(&option.value);

        let mut row = Element::box_()
            .id(self.option_id(index))
            .tab_index(0)
            .disabled(option.disabled)
            .data("role", "option")
            .data("aria-selected", flag(selected))
            .data("aria-disabled", flag(option.disabled));
        if self.model.multiple() {
            row = row.data("checkbox", flag(selected));
        }
        if let Some(icon) = &option.icon {
            row = row.data("icon", icon.clone());
        }
        row = row.child(Element::text(option.label.clone()));
        if let Some(description) = &option.description {
            row = row.child(Element::text(description.clone()).data("role", "description"));
        }
        row
    }
}

/// Shared between the widget handle and its listeners.
struct Core<V> {
    state: Arc<Mutex<DropdownState<V>>>,
    overlay: Overlay,
}

impl<V> Clone for Core<V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            overlay: self.overlay.clone(),
        }
    }
}

impl<V: Clone + PartialEq + Send + 'static> Core<V> {
    fn lock(&self) -> MutexGuard<'_, DropdownState<V>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn render(&self, doc: &mut Document) {
        let phase = self.overlay.phase();
        let element = self.lock().render(phase);
        rerender(doc, element);
    }

    fn open(&self, doc: &mut Document) {
        if self.lock().inert() {
            debug!("[dropdown] {} is disabled or loading, not opening", self.overlay.container_id());
            return;
        }
        self.overlay.open(doc);
    }

    fn toggle(&self, doc: &mut Document) {
        if self.overlay.is_open() {
            self.overlay.close(doc);
        } else {
            self.open(doc);
        }
    }

    fn select(&self, doc: &mut Document, value: &V) -> SelectOutcome {
        let (outcome, current, handler) = {
            let mut state = self.lock();
            let outcome = state.model.select(value);
            (outcome, state.model.value(), state.on_change.clone())
        };
        if outcome == SelectOutcome::Rejected {
            return outcome;
        }
        debug!("[dropdown] {} select -> {:?}", self.overlay.container_id(), outcome);

        self.render(doc);
        if outcome.is_change() {
            if let Some(handler) = handler {
                handler(current);
            }
        }
        if outcome.closes_overlay() {
            self.overlay.close(doc);
        }
        outcome
    }

    fn select_index(&self, doc: &mut Document, index: usize) -> SelectOutcome {
        let value = self
            .lock()
            .model
            .options()
            .get(index)
            .map(|o| o.value.clone());
        match value {
            Some(value) => self.select(doc, &value),
            None => SelectOutcome::Rejected,
        }
    }

    fn clear(&self, doc: &mut Document) -> bool {
        let (changed, current, handler) = {
            let mut state = self.lock();
            let changed = state.model.clear();
            (changed, state.model.value(), state.on_change.clone())
        };
        if !changed {
            return false;
        }
        self.render(doc);
        if let Some(handler) = handler {
            handler(current);
        }
        true
    }

    fn set_search_text(&self, doc: &mut Document, text: &str) {
        self.lock().model.set_search_text(text);
        self.render(doc);
    }

    /// Move focus to the next or previous enabled row, clamped at the ends.
    fn step(&self, doc: &mut Document, from: Option<usize>, forward: bool) {
        let target = {
            let state = self.lock();
            let rows = state.navigable();
            let next = match from.and_then(|i| rows.iter().position(|&r| r == i)) {
                Some(pos) if forward => rows.get(pos + 1).or(rows.last()),
                Some(pos) => rows.get(pos.saturating_sub(1)),
                None => rows.first(),
            };
            next.map(|&i| state.option_id(i))
        };
        if let Some(id) = target {
            doc.focus(&id);
        }
    }

    fn on_click(&self, event: &Event, doc: &mut Document) -> Flow {
        let Some(target) = event.target() else {
            return Flow::Continue;
        };
        let (id, trigger, clear) = {
            let state = self.lock();
            (state.id.clone(), state.part("trigger"), state.part("clear"))
        };

        for ancestor in ancestors_of(doc, target) {
            if ancestor == trigger {
                self.toggle(doc);
                return Flow::Continue;
            }
            if ancestor == clear {
                self.clear(doc);
                doc.focus(&trigger);
                return Flow::PreventDefault;
            }
            let index = self.lock().option_index(&ancestor);
            if let Some(index) = index {
                if self.overlay.is_open() {
                    self.select_index(doc, index);
                }
                return Flow::Continue;
            }
            if ancestor == id {
                break;
            }
        }
        Flow::Continue
    }

    fn on_key(&self, event: &Event, doc: &mut Document) -> Flow {
        let Event::Key {
            target: Some(target),
            key,
            ..
        } = event
        else {
            return Flow::Continue;
        };
        let (id, trigger, search, index) = {
            let state = self.lock();
            (
                state.id.clone(),
                state.part("trigger"),
                state.part("search"),
                state.option_index(target),
            )
        };
        if !contains(doc.root(), &id, target) {
            return Flow::Continue;
        }
        let activation = event.is_activation_key();
        let open = self.overlay.is_open();

        if *target == trigger {
            if activation {
                self.toggle(doc);
                return Flow::PreventDefault;
            }
            if *key == Key::Down {
                if open {
                    self.step(doc, None, true);
                } else {
                    self.open(doc);
                }
                return Flow::PreventDefault;
            }
        } else if let Some(index) = index {
            match key {
                _ if activation && open => {
                    self.select_index(doc, index);
                    return Flow::PreventDefault;
                }
                Key::Down => {
                    self.step(doc, Some(index), true);
                    return Flow::PreventDefault;
                }
                Key::Up => {
                    self.step(doc, Some(index), false);
                    return Flow::PreventDefault;
                }
                _ => {}
            }
        } else if *target == search && *key == Key::Down {
            self.step(doc, None, true);
            return Flow::PreventDefault;
        }
        Flow::Continue
    }

    fn on_input(&self, event: &Event, doc: &mut Document) -> Flow {
        let Event::Input { target, value } = event else {
            return Flow::Continue;
        };
        if *target != self.lock().part("search") {
            return Flow::Continue;
        }
        self.set_search_text(doc, value);
        Flow::Continue
    }
}

/// A mounted dropdown select.
///
/// Dropping it removes its listeners and releases its overlay. The rendered
/// elements stay in the document until [`Dropdown::unmount`].
pub struct Dropdown<V> {
    listeners: Vec<ListenerHandle>,
    core: Core<V>,
}

impl<V> fmt::Debug for Dropdown<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dropdown")
            .field("overlay", &self.core.overlay)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<V: Clone + PartialEq + Send + 'static> Dropdown<V> {
    /// Render the dropdown under `parent_id` and start listening.
    pub fn mount(
        env: &OverlayEnv,
        doc: &mut Document,
        parent_id: &str,
        props: DropdownProps<V>,
    ) -> Result<Self, DomError> {
        let DropdownProps {
            id,
            options,
            config,
            value,
            on_change,
            hooks,
        } = props;

        let overlay = Overlay::new(env, id.clone(), config.overlay.clone());
        overlay.set_hooks(hooks);

        let state = DropdownState {
            model: SelectionModel::new(options, config.multiple, value),
            id: id.clone(),
            config,
            on_change,
        };
        doc.mount(parent_id, state.render(OverlayPhase::Closed))?;
        let state = Arc::new(Mutex::new(state));

        let weak = Arc::downgrade(&state);
        overlay.on_phase(move |phase, doc| on_phase(&weak, phase, doc));

        let core = Core { state, overlay };
        let listeners = vec![
            listen(env, &id, EventKind::Click, &core, Core::on_click),
            listen(env, &id, EventKind::Key, &core, Core::on_key),
            listen(env, &id, EventKind::Input, &core, Core::on_input),
        ];
        debug!("[dropdown] mounted {} under {}", id, parent_id);

        Ok(Self { listeners, core })
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

    pub fn config(&self) -> SelectConfig {
        self.core.lock().config.clone()
    }

    pub fn value(&self) -> SelectValue<V> {
        self.core.lock().model.value()
    }

    pub fn selected(&self) -> Vec<V> {
        self.core.lock().model.selected().to_vec()
    }

    pub fn is_selected(&self, value: &V) -> bool {
        self.core.lock().model.is_selected(value)
    }

    pub fn options(&self) -> Vec<SelectOption<V>> {
        self.core.lock().model.options().to_vec()
    }

    /// Options matching the current search text.
    pub fn filtered_options(&self) -> Vec<SelectOption<V>> {
        self.core
            .lock()
            .model
            .filtered_options()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn search_text(&self) -> String {
        self.core.lock().model.search_text().to_string()
    }

    pub fn display_label(&self) -> String {
        let state = self.core.lock();
        state.model.display_label(&state.config.placeholder)
    }

    /// Open the panel. Ignored while disabled or loading.
    pub fn open(&self, doc: &mut Document) {
        self.core.open(doc);
    }

    pub fn close(&self, doc: &mut Document) {
        self.core.overlay.close(doc);
    }

    pub fn toggle(&self, doc: &mut Document) {
        self.core.toggle(doc);
    }

    /// Select a value as if its row was activated. A single-select closes
    /// the panel; a multi-select toggles the value and stays open.
    pub fn select(&self, doc: &mut Document, value: &V) -> SelectOutcome {
        self.core.select(doc, value)
    }

    /// Clear the selection without opening or closing the panel.
    /// Returns true if anything was selected.
    pub fn clear(&self, doc: &mut Document) -> bool {
        self.core.clear(doc)
    }

    pub fn set_search_text(&self, doc: &mut Document, text: &str) {
        self.core.set_search_text(doc, text);
    }

    /// Replace the value from outside. `on_change` is not called.
    pub fn set_value(&self, doc: &mut Document, value: impl Into<InitialValue<V>>) {
        self.core.lock().model.set_value(value.into());
        self.core.render(doc);
    }

    pub fn set_options(&self, doc: &mut Document, options: Vec<SelectOption<V>>) {
        self.core.lock().model.set_options(options);
        self.core.render(doc);
    }

    /// Disabling an open dropdown closes it.
    pub fn set_disabled(&self, doc: &mut Document, disabled: bool) {
        self.core.lock().config.disabled = disabled;
        if disabled {
            self.core.overlay.close(doc);
        }
        self.core.render(doc);
    }

    pub fn set_loading(&self, doc: &mut Document, loading: bool) {
        self.core.lock().config.loading = loading;
        self.core.render(doc);
    }

    pub fn set_on_change<F>(&self, f: F)
    where
        F: Fn(SelectValue<V>) + Send + Sync + 'static,
    {
        self.core.lock().on_change = Some(Arc::new(f));
    }

    /// Release the widget and remove its elements from the document.
    pub fn unmount(self, doc: &mut Document) -> Result<(), DomError> {
        let id = self.id();
        drop(self);
        doc.unmount(&id).map(|_| ())
    }
}

impl<V> Drop for Dropdown<V> {
    fn drop(&mut self) {
        self.listeners.clear();
        self.core.overlay.dispose();
    }
}

fn listen<V, F>(
    env: &OverlayEnv,
    id: &str,
    kind: EventKind,
    core: &Core<V>,
    handler: F,
) -> ListenerHandle
where
    V: Clone + PartialEq + Send + 'static,
    F: Fn(&Core<V>, &Event, &mut Document) -> Flow + Send + 'static,
{
    let core = core.clone();
    env.dispatcher
        .listen(kind, id, move |event, doc| handler(&core, event, doc))
}

fn on_phase<V: Clone + PartialEq>(
    state: &Weak<Mutex<DropdownState<V>>>,
    phase: OverlayPhase,
    doc: &mut Document,
) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let (element, focus) = {
        let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
        if phase == OverlayPhase::Closing {
            state.model.set_search_text("");
        }
        let focus = (phase == OverlayPhase::Open && state.config.searchable)
            .then(|| state.part("search"));
        (state.render(phase), focus)
    };
    rerender(doc, element);
    if let Some(id) = focus {
        doc.focus(&id);
    }
}
