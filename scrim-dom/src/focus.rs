use crate::element::Element;

/// Whether an element can be reached with Tab, ignoring its ancestors.
///
/// Interactive elements are focusable unless disabled or given a negative tab
/// index. Any other element needs an explicit non-negative tab index.
pub fn is_focusable(element: &Element) -> bool {
    if element.disabled || element.hidden {
        return false;
    }
    match element.tab_index {
        Some(index) => index >= 0,
        None => element.is_interactive(),
    }
}

/// Whether an element accepts programmatic focus (tab index -1 included).
pub fn accepts_focus(element: &Element) -> bool {
    !element.disabled
        && !element.hidden
        && (element.is_interactive() || element.tab_index.is_some())
}

/// Collect all focusable element IDs in tree order.
/// Hidden subtrees are skipped entirely.
pub fn collect_focusable(element: &Element) -> Vec<String> {
    let mut result = Vec::new();
    collect_focusable_recursive(element, &mut result);
    result
}

fn collect_focusable_recursive(element: &Element, result: &mut Vec<String>) {
    if element.hidden {
        return;
    }
    if is_focusable(element) {
        result.push(element.id.clone());
    }
    for child in element.child_elements() {
        collect_focusable_recursive(child, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_interactive_elements_are_focusable() {
        assert!(is_focusable(&Element::button("ok")));
        assert!(is_focusable(&Element::input("")));
        assert!(is_focusable(&Element::select()));
        assert!(is_focusable(&Element::textarea("")));
        assert!(is_focusable(&Element::link("home", "/")));
    }

    #[test]
    fn test_link_without_href_is_not_focusable() {
        let mut link = Element::link("home", "/");
        link.href = None;
        assert!(!is_focusable(&link));
    }

    #[test]
    fn test_tab_index_overrides() {
        assert!(is_focusable(&Element::box_().tab_index(0)));
        assert!(is_focusable(&Element::box_().tab_index(3)));
        assert!(!is_focusable(&Element::box_()));
        assert!(!is_focusable(&Element::button("x").tab_index(-1)));
        assert!(accepts_focus(&Element::button("x").tab_index(-1)));
        assert!(!accepts_focus(&Element::text("plain")));
    }

    #[test]
    fn test_disabled_is_not_focusable() {
        assert!(!is_focusable(&Element::button("x").disabled(true)));
    }

    #[test]
    fn test_collect_skips_hidden_subtrees() {
        let root = Element::box_()
            .id("root")
            .child(Element::button("a").id("a"))
            .child(
                Element::box_()
                    .id("hidden")
                    .hidden(true)
                    .child(Element::button("b").id("b")),
            )
            .child(Element::input("").id("c"));

        assert_eq!(collect_focusable(&root), vec!["a", "c"]);
    }
}
