use thiserror::Error;

/// Structural errors when editing the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("parent element '{0}' not found")]
    ParentNotFound(String),

    #[error("element id '{0}' already exists in the document")]
    DuplicateId(String),

    #[error("element '{0}' not found")]
    NotFound(String),

    #[error("the root element cannot be removed or replaced")]
    RootElement,
}
