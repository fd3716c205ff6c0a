use crate::element::{find_element, find_element_mut, path_to, remove_element, Content, Element};
use crate::error::DomError;
use crate::focus::{accepts_focus, collect_focusable};

/// The element tree plus the single focused element.
///
/// Focus is tracked by element id. An id that is no longer attached is never
/// kept as the focused element: structural edits drop focus back to the body
/// (`None`), the way a browser does when the active element is removed.
#[derive(Debug, Clone)]
pub struct Document {
    root: Element,
    focused: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document whose root element is `body`.
    pub fn new() -> Self {
        Self::with_root(Element::box_().id("body"))
    }

    pub fn with_root(root: Element) -> Self {
        Self {
            root,
            focused: None,
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        find_element(&self.root, id)
    }

    pub fn is_attached(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// True if the element or one of its ancestors is hidden.
    pub fn is_hidden(&self, id: &str) -> bool {
        path_to(&self.root, id)
            .map(|path| path.iter().any(|el| el.hidden))
            .unwrap_or(true)
    }

    /// Append `element` as the last child of `parent_id`.
    pub fn mount(&mut self, parent_id: &str, element: Element) -> Result<(), DomError> {
        if let Some(dup) = element.ids().into_iter().find(|id| self.is_attached(id)) {
            return Err(DomError::DuplicateId(dup));
        }
        let parent = find_element_mut(&mut self.root, parent_id)
            .ok_or_else(|| DomError::ParentNotFound(parent_id.to_string()))?;
        log::trace!("[dom] mount {} under {}", element.id, parent_id);
        match &mut parent.content {
            Content::Children(children) => children.push(element),
            content => *content = Content::Children(vec![element]),
        }
        Ok(())
    }

    /// Replace the attached element that has the same id as `element`.
    pub fn replace(&mut self, element: Element) -> Result<(), DomError> {
        if element.id == self.root.id {
            return Err(DomError::RootElement);
        }
        let old_ids = self
            .get(&element.id)
            .ok_or_else(|| DomError::NotFound(element.id.clone()))?
            .ids();
        if let Some(dup) = element
            .ids()
            .into_iter()
            .find(|id| !old_ids.contains(id) && self.is_attached(id))
        {
            return Err(DomError::DuplicateId(dup));
        }
        if let Some(slot) = find_element_mut(&mut self.root, &element.id) {
            *slot = element;
        }
        self.drop_detached_focus();
        Ok(())
    }

    /// Replace the element if it's attached, otherwise mount it under `parent_id`.
    pub fn upsert(&mut self, parent_id: &str, element: Element) -> Result<(), DomError> {
        if self.is_attached(&element.id) {
            self.replace(element)
        } else {
            self.mount(parent_id, element)
        }
    }

    /// Detach an element (and its subtree) from the document.
    pub fn unmount(&mut self, id: &str) -> Result<Element, DomError> {
        if id == self.root.id {
            return Err(DomError::RootElement);
        }
        let removed =
            remove_element(&mut self.root, id).ok_or_else(|| DomError::NotFound(id.to_string()))?;
        log::trace!("[dom] unmount {}", id);
        self.drop_detached_focus();
        Ok(removed)
    }

    /// Get the currently focused element ID.
    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Programmatically focus an element by ID.
    /// Returns true if focus changed. Detached, hidden, disabled or
    /// non-focusable elements are refused.
    pub fn focus(&mut self, id: &str) -> bool {
        if self.focused.as_deref() == Some(id) {
            return false;
        }
        let accepted = self.get(id).is_some_and(accepts_focus) && !self.is_hidden(id);
        if !accepted {
            log::trace!("[dom] focus refused for {}", id);
            return false;
        }
        log::trace!("[dom] focus {:?} -> {}", self.focused, id);
        self.focused = Some(id.to_string());
        true
    }

    /// Clear focus.
    /// Returns true if there was something focused.
    pub fn blur(&mut self) -> bool {
        self.focused.take().is_some()
    }

    /// Focus the next focusable element (Tab navigation).
    /// Returns the newly focused element ID if focus changed.
    pub fn focus_next(&mut self) -> Option<String> {
        let focusable = collect_focusable(&self.root);
        if focusable.is_empty() {
            return None;
        }

        let new_focus = match &self.focused {
            None => focusable[0].clone(),
            Some(current) => match focusable.iter().position(|id| id == current) {
                Some(i) => focusable[(i + 1) % focusable.len()].clone(),
                None => focusable[0].clone(),
            },
        };

        self.set_focus_if_changed(new_focus)
    }

    /// Focus the previous focusable element (Shift+Tab navigation).
    /// Returns the newly focused element ID if focus changed.
    pub fn focus_prev(&mut self) -> Option<String> {
        let focusable = collect_focusable(&self.root);
        if focusable.is_empty() {
            return None;
        }

        let last = focusable.len() - 1;
        let new_focus = match &self.focused {
            None => focusable[last].clone(),
            Some(current) => match focusable.iter().position(|id| id == current) {
                Some(0) | None => focusable[last].clone(),
                Some(i) => focusable[i - 1].clone(),
            },
        };

        self.set_focus_if_changed(new_focus)
    }

    /// Nearest ancestor-or-self of `id` that accepts focus.
    pub fn focusable_ancestor(&self, id: &str) -> Option<String> {
        let path = path_to(&self.root, id)?;
        path.iter()
            .rev()
            .find(|el| accepts_focus(el))
            .map(|el| el.id.clone())
    }

    fn set_focus_if_changed(&mut self, new_focus: String) -> Option<String> {
        if self.focused.as_ref() != Some(&new_focus) {
            self.focused = Some(new_focus.clone());
            Some(new_focus)
        } else {
            None
        }
    }

    fn drop_detached_focus(&mut self) {
        if let Some(id) = self.focused.clone() {
            if !self.is_attached(&id) || self.is_hidden(&id) {
                log::debug!("[dom] focused element {} left the document, focus -> body", id);
                self.focused = None;
            }
        }
    }
}
