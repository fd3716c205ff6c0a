use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::Content;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn generate_id(prefix: &str) -> String {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id}")
}

/// What sort of element this is. Decides whether it is interactive by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ElementKind {
    /// Plain container or text, only focusable with an explicit tab index.
    #[default]
    Generic,
    Button,
    /// Interactive only when it carries an href.
    Link,
    Input,
    Select,
    TextArea,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    // Identity
    pub id: String,
    pub kind: ElementKind,

    // Content
    pub content: Content,

    // Interaction
    /// Explicit tab index. Negative removes the element from tab order,
    /// non-negative makes any element focusable.
    pub tab_index: Option<i32>,
    pub href: Option<String>,
    /// Disabled elements can't receive focus.
    pub disabled: bool,
    /// Hidden elements (and their whole subtree) are skipped by focus and hit testing.
    pub hidden: bool,

    // Attributes for renderers (role, aria-*, data-state, ...)
    pub data: BTreeMap<String, String>,
}

impl Default for Element {
    fn default() -> Self {
        Self {
            id: generate_id("el"),
            kind: ElementKind::Generic,
            content: Content::None,
            tab_index: None,
            href: None,
            disabled: false,
            hidden: false,
            data: BTreeMap::new(),
        }
    }
}

impl Element {
    pub fn box_() -> Self {
        Self {
            id: generate_id("box"),
            ..Default::default()
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            id: generate_id("text"),
            content: Content::Text(content.into()),
            ..Default::default()
        }
    }

    pub fn button(label: impl Into<String>) -> Self {
        Self {
            id: generate_id("button"),
            kind: ElementKind::Button,
            content: Content::Text(label.into()),
            ..Default::default()
        }
    }

    pub fn link(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            id: generate_id("link"),
            kind: ElementKind::Link,
            content: Content::Text(label.into()),
            href: Some(href.into()),
            ..Default::default()
        }
    }

    /// Create a text input element.
    pub fn input(value: impl Into<String>) -> Self {
        Self {
            id: generate_id("input"),
            kind: ElementKind::Input,
            content: Content::Text(value.into()),
            ..Default::default()
        }
    }

    pub fn select() -> Self {
        Self {
            id: generate_id("select"),
            kind: ElementKind::Select,
            ..Default::default()
        }
    }

    pub fn textarea(value: impl Into<String>) -> Self {
        Self {
            id: generate_id("textarea"),
            kind: ElementKind::TextArea,
            content: Content::Text(value.into()),
            ..Default::default()
        }
    }

    // Builders

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        match &mut self.content {
            Content::Children(children) => children.push(child),
            _ => self.content = Content::Children(vec![child]),
        }
        self
    }

    pub fn children(mut self, children: Vec<Element>) -> Self {
        self.content = Content::Children(children);
        self
    }

    pub fn tab_index(mut self, index: i32) -> Self {
        self.tab_index = Some(index);
        self
    }

    /// Shorthand for tab index 0 (focusable) or -1 (programmatic focus only).
    pub fn focusable(self, focusable: bool) -> Self {
        self.tab_index(if focusable { 0 } else { -1 })
    }

    pub fn href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    // Queries

    pub fn child_elements(&self) -> &[Element] {
        self.content.children()
    }

    pub fn child_elements_mut(&mut self) -> Option<&mut Vec<Element>> {
        match &mut self.content {
            Content::Children(children) => Some(children),
            _ => None,
        }
    }

    pub fn text_content(&self) -> Option<&str> {
        self.content.text()
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Native interactive elements: buttons, links with an href, form controls.
    pub fn is_interactive(&self) -> bool {
        match self.kind {
            ElementKind::Button
            | ElementKind::Input
            | ElementKind::Select
            | ElementKind::TextArea => true,
            ElementKind::Link => self.href.is_some(),
            ElementKind::Generic => false,
        }
    }

    /// Ids of this element and every descendant, in document order.
    pub fn ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        collect_ids(self, &mut ids);
        ids
    }
}

fn collect_ids(element: &Element, ids: &mut Vec<String>) {
    ids.push(element.id.clone());
    for child in element.child_elements() {
        collect_ids(child, ids);
    }
}
