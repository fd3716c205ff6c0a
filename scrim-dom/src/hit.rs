use crate::element::Element;
use crate::focus::is_focusable;
use crate::layout::LayoutResult;

/// Find the deepest visible element at the given coordinates.
/// Returns None if the point is outside the root.
pub fn hit_test(layout: &LayoutResult, root: &Element, x: u16, y: u16) -> Option<String> {
    hit_test_element(layout, root, x, y, &|_| true)
}

/// Find the deepest focusable element at the given coordinates.
pub fn hit_test_focusable(
    layout: &LayoutResult,
    root: &Element,
    x: u16,
    y: u16,
) -> Option<String> {
    hit_test_element(layout, root, x, y, &is_focusable)
}

fn hit_test_element(
    layout: &LayoutResult,
    element: &Element,
    x: u16,
    y: u16,
    accept: &dyn Fn(&Element) -> bool,
) -> Option<String> {
    if element.hidden {
        return None;
    }

    // Children without a layout entry are still searched: they may be
    // positioned absolutely outside their parent (dropdown panels).
    let inside = layout.get(&element.id).map(|rect| rect.contains(x, y));

    // Check children in reverse order (last rendered = on top)
    for child in element.child_elements().iter().rev() {
        if let Some(id) = hit_test_element(layout, child, x, y, accept) {
            return Some(id);
        }
    }

    if inside == Some(true) && accept(element) {
        Some(element.id.clone())
    } else {
        None
    }
}
