use super::Element;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Content {
    #[default]
    None,
    Text(String),
    Children(Vec<Element>),
}

impl Content {
    /// Child elements, empty for text and empty content.
    pub fn children(&self) -> &[Element] {
        match self {
            Content::Children(children) => children,
            _ => &[],
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            _ => None,
        }
    }
}
