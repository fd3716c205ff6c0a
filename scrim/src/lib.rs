//! Overlay interaction engine.
//!
//! Lifecycle, focus trapping, dismissal and selection for dropdowns and
//! modal dialogs, running against a [`scrim_dom::Document`].
//!
//! ```ignore
//! use scrim::prelude::*;
//!
//! let mut host = Host::new();
//! let (env, doc) = host.parts();
//! let modal = Modal::mount(env, doc, "body", ModalProps::new("confirm"))?;
//! modal.open(host.document_mut());
//! ```

pub mod clock;
pub mod config;
pub mod dismiss;
pub mod focus_trap;
pub mod listeners;
pub mod overlay;
pub mod prelude;
pub mod runtime;
pub mod scheduler;
pub mod scroll_lock;
pub mod selection;
pub mod widgets;

pub use scrim_dom as dom;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ModalAnimation, ModalConfig, ModalSize, OverlayConfig, SelectConfig};
pub use dismiss::{DismissHandle, DismissOptions, DismissalDetector};
pub use focus_trap::{FocusTrap, FocusTrapHandle};
pub use listeners::{Dispatcher, Flow, ListenerHandle};
pub use overlay::{Overlay, OverlayEnv, OverlayHooks, OverlayPhase};
pub use runtime::Host;
pub use scheduler::{Scheduler, TimerHandle};
pub use scroll_lock::{ScrollLock, ScrollLockGuard};
pub use selection::{
    InitialValue, SelectOption, SelectOutcome, SelectValue, SelectionModel, SelectionState,
};
pub use widgets::{Dropdown, DropdownProps, Modal, ModalProps};
