mod content;
mod node;

pub use content::Content;
pub use node::{Element, ElementKind};

/// Find an element by ID in the tree.
pub fn find_element<'a>(root: &'a Element, id: &str) -> Option<&'a Element> {
    if root.id == id {
        return Some(root);
    }

    for child in root.child_elements() {
        if let Some(found) = find_element(child, id) {
            return Some(found);
        }
    }

    None
}

/// Find an element by ID in the tree, mutably.
pub fn find_element_mut<'a>(root: &'a mut Element, id: &str) -> Option<&'a mut Element> {
    if root.id == id {
        return Some(root);
    }

    if let Content::Children(children) = &mut root.content {
        for child in children.iter_mut() {
            if let Some(found) = find_element_mut(child, id) {
                return Some(found);
            }
        }
    }

    None
}

/// Elements from `root` down to the element with `id`, inclusive.
/// Returns None if the element isn't in the tree.
pub fn path_to<'a>(root: &'a Element, id: &str) -> Option<Vec<&'a Element>> {
    if root.id == id {
        return Some(vec![root]);
    }

    for child in root.child_elements() {
        if let Some(mut path) = path_to(child, id) {
            path.insert(0, root);
            return Some(path);
        }
    }

    None
}

/// Whether `descendant_id` is `ancestor_id` itself or lives inside it.
pub fn contains(root: &Element, ancestor_id: &str, descendant_id: &str) -> bool {
    find_element(root, ancestor_id)
        .map(|ancestor| find_element(ancestor, descendant_id).is_some())
        .unwrap_or(false)
}

/// Remove the element with `id` from the children of its parent.
pub(crate) fn remove_element(root: &mut Element, id: &str) -> Option<Element> {
    let children = root.child_elements_mut()?;
    if let Some(idx) = children.iter().position(|c| c.id == id) {
        return Some(children.remove(idx));
    }
    children
        .iter_mut()
        .find_map(|child| remove_element(child, id))
}
