//! Widgets built on the overlay engine.
//!
//! A widget owns one [`Overlay`](crate::overlay::Overlay), renders itself
//! into the [`Document`] and turns clicks and key presses into calls on the
//! overlay and its own model. It has no state machine of its own.

pub mod dropdown;
pub mod modal;

pub use dropdown::{ChangeHandler, Dropdown, DropdownProps};
pub use modal::{Modal, ModalProps};

use log::warn;
use scrim_dom::{element::path_to, Document, Element};

/// Swap a rendered subtree in place. A widget whose root was removed from
/// under it just stops rendering.
fn rerender(doc: &mut Document, element: Element) {
    let id = element.id.clone();
    if let Err(e) = doc.replace(element) {
        warn!("[widget] re-render of {} skipped: {}", id, e);
    }
}

/// Ids from `id` up to the root, innermost first.
fn ancestors_of(doc: &Document, id: &str) -> Vec<String> {
    path_to(doc.root(), id)
        .map(|path| path.iter().rev().map(|el| el.id.clone()).collect())
        .unwrap_or_default()
}

fn flag(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
