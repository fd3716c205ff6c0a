pub mod document;
pub mod element;
pub mod error;
pub mod event;
pub mod focus;
pub mod hit;
pub mod layout;

pub use document::Document;
pub use element::{contains, find_element, Content, Element, ElementKind};
pub use error::DomError;
pub use event::{translate_event, Event, EventKind, Key, Modifiers, MouseButton};
pub use focus::{collect_focusable, is_focusable};
pub use hit::{hit_test, hit_test_focusable};
pub use layout::{LayoutResult, Rect};
