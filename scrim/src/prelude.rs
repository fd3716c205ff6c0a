//! Prelude module for convenient imports.
//!
//! ```ignore
//! use scrim::prelude::*;
//! ```

pub use crate::config::{ModalAnimation, ModalConfig, ModalSize, OverlayConfig, SelectConfig};
pub use crate::overlay::{Overlay, OverlayHooks, OverlayPhase};
pub use crate::runtime::Host;
pub use crate::selection::{InitialValue, SelectOption, SelectValue};
pub use crate::widgets::{Dropdown, DropdownProps, Modal, ModalProps};

pub use scrim_dom::{Document, Element, Event, Key, Modifiers};
