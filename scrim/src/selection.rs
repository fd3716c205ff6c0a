//! Selection Model for the dropdown select.
//!
//! Pure data: selected values, the search text and option filtering. Nothing
//! here knows about the document or the overlay; [`SelectOutcome`] tells the
//! widget whether a selection should close the panel.

/// One selectable option.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption<V> {
    pub label: String,
    pub value: V,
    pub disabled: bool,
    pub description: Option<String>,
    /// Opaque icon name, passed through to the renderer.
    pub icon: Option<String>,
}

impl<V> SelectOption<V> {
    pub fn new(label: impl Into<String>, value: V) -> Self {
        Self {
            label: label.into(),
            value,
            disabled: false,
            description: None,
            icon: None,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    fn matches(&self, needle_lower: &str) -> bool {
        needle_lower.is_empty() || self.label.to_lowercase().contains(needle_lower)
    }
}

impl<V, L: Into<String>> From<(L, V)> for SelectOption<V> {
    fn from((label, value): (L, V)) -> Self {
        Self::new(label, value)
    }
}

/// Externally supplied value, in whatever shape the caller has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitialValue<V> {
    None,
    One(V),
    Many(Vec<V>),
}

impl<V> Default for InitialValue<V> {
    fn default() -> Self {
        InitialValue::None
    }
}

impl<V> From<Option<V>> for InitialValue<V> {
    fn from(value: Option<V>) -> Self {
        value.map_or(InitialValue::None, InitialValue::One)
    }
}

impl<V> From<Vec<V>> for InitialValue<V> {
    fn from(values: Vec<V>) -> Self {
        InitialValue::Many(values)
    }
}

/// Value reported to `on_change`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectValue<V> {
    Single(Option<V>),
    Multiple(Vec<V>),
}

/// Result of [`SelectionModel::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Disabled option; nothing changed.
    Rejected,
    /// Single-select commit. The panel closes whether or not the value changed.
    Committed { changed: bool },
    /// Multi-select toggle. The panel stays open.
    Toggled { selected: bool },
}

impl SelectOutcome {
    pub fn closes_overlay(self) -> bool {
        matches!(self, SelectOutcome::Committed { .. })
    }

    pub fn is_change(self) -> bool {
        match self {
            SelectOutcome::Rejected => false,
            SelectOutcome::Committed { changed } => changed,
            SelectOutcome::Toggled { .. } => true,
        }
    }
}

/// Selected values and search text.
///
/// With `multiple == false` at most one value is ever selected. Values keep
/// selection order and never repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState<V> {
    multiple: bool,
    selected: Vec<V>,
    /// Only filters the visible options, never the selection.
    pub search_text: String,
}

impl<V: Clone + PartialEq> SelectionState<V> {
    pub fn new(multiple: bool, initial: InitialValue<V>) -> Self {
        let mut state = Self {
            multiple,
            selected: Vec::new(),
            search_text: String::new(),
        };
        state.set_value(initial);
        state
    }

    pub fn multiple(&self) -> bool {
        self.multiple
    }

    pub fn selected(&self) -> &[V] {
        &self.selected
    }

    /// Replace the selection with an external value, coerced to this
    /// state's shape: a multi-select wraps a lone value, a single-select
    /// keeps the first of several. Duplicates collapse.
    pub fn set_value(&mut self, value: InitialValue<V>) {
        let values = match value {
            InitialValue::None => Vec::new(),
            InitialValue::One(v) => vec![v],
            InitialValue::Many(vs) => vs,
        };
        self.selected.clear();
        for v in values {
            if !self.multiple && !self.selected.is_empty() {
                break;
            }
            if !self.selected.contains(&v) {
                self.selected.push(v);
            }
        }
    }

    pub fn value(&self) -> SelectValue<V> {
        if self.multiple {
            SelectValue::Multiple(self.selected.clone())
        } else {
            SelectValue::Single(self.selected.first().cloned())
        }
    }

    pub fn is_selected(&self, value: &V) -> bool {
        self.selected.contains(value)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Empty the selection. Returns true if anything was selected.
    pub fn clear(&mut self) -> bool {
        let had = !self.selected.is_empty();
        self.selected.clear();
        had
    }

    /// Select `value` without looking at options.
    fn apply(&mut self, value: &V) -> SelectOutcome {
        if self.multiple {
            match self.selected.iter().position(|v| v == value) {
                Some(idx) => {
                    self.selected.remove(idx);
                    SelectOutcome::Toggled { selected: false }
                }
                None => {
                    self.selected.push(value.clone());
                    SelectOutcome::Toggled { selected: true }
                }
            }
        } else {
            let changed = self.selected.first() != Some(value);
            self.selected = vec![value.clone()];
            SelectOutcome::Committed { changed }
        }
    }

    /// Options whose label contains the search text, ignoring case, in their
    /// original order. An empty search returns everything.
    pub fn filtered_options<'a>(&self, all: &'a [SelectOption<V>]) -> Vec<&'a SelectOption<V>> {
        let needle = self.search_text.to_lowercase();
        all.iter().filter(|o| o.matches(&needle)).collect()
    }

    /// Like [`filtered_options`](Self::filtered_options) but yields indices
    /// into `all`.
    pub fn filtered_indices(&self, all: &[SelectOption<V>]) -> Vec<usize> {
        let needle = self.search_text.to_lowercase();
        all.iter()
            .enumerate()
            .filter(|(_, o)| o.matches(&needle))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Options plus selection state, as owned by one dropdown.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionModel<V> {
    options: Vec<SelectOption<V>>,
    state: SelectionState<V>,
}

impl<V: Clone + PartialEq> SelectionModel<V> {
    pub fn new(options: Vec<SelectOption<V>>, multiple: bool, initial: InitialValue<V>) -> Self {
        Self {
            options,
            state: SelectionState::new(multiple, initial),
        }
    }

    pub fn options(&self) -> &[SelectOption<V>] {
        &self.options
    }

    /// Replace the option list. The selection is kept as is.
    pub fn set_options(&mut self, options: Vec<SelectOption<V>>) {
        self.options = options;
    }

    pub fn state(&self) -> &SelectionState<V> {
        &self.state
    }

    pub fn multiple(&self) -> bool {
        self.state.multiple
    }

    pub fn selected(&self) -> &[V] {
        self.state.selected()
    }

    pub fn value(&self) -> SelectValue<V> {
        self.state.value()
    }

    pub fn set_value(&mut self, value: InitialValue<V>) {
        self.state.set_value(value);
    }

    /// Select `value`: replace in single mode, toggle in multi mode.
    ///
    /// Values of disabled options are rejected. Values without a matching
    /// option are accepted.
    pub fn select(&mut self, value: &V) -> SelectOutcome {
        if self.option_for(value).is_some_and(|o| o.disabled) {
            return SelectOutcome::Rejected;
        }
        self.state.apply(value)
    }

    pub fn clear(&mut self) -> bool {
        self.state.clear()
    }

    pub fn is_selected(&self, value: &V) -> bool {
        self.state.is_selected(value)
    }

    pub fn search_text(&self) -> &str {
        &self.state.search_text
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.state.search_text = text.into();
    }

    pub fn filtered_options(&self) -> Vec<&SelectOption<V>> {
        self.state.filtered_options(&self.options)
    }

    pub fn filtered_indices(&self) -> Vec<usize> {
        self.state.filtered_indices(&self.options)
    }

    pub fn option_for(&self, value: &V) -> Option<&SelectOption<V>> {
        self.options.iter().find(|o| &o.value == value)
    }

    /// Trigger text: the selected label, a count for multi-select, or the
    /// placeholder.
    pub fn display_label(&self, placeholder: &str) -> String {
        let selected = self.state.selected();
        if self.state.multiple {
            return match selected.len() {
                0 => placeholder.to_string(),
                1 => "1 item selected".to_string(),
                n => format!("{} items selected", n),
            };
        }
        selected
            .first()
            .and_then(|v| self.option_for(v))
            .map(|o| o.label.clone())
            .unwrap_or_else(|| placeholder.to_string())
    }
}
