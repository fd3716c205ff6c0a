//! Construction parameters for overlays and widgets.
//!
//! Every config is a plain struct with builder methods. All of them also
//! deserialize with missing fields falling back to their defaults, so they can
//! be loaded from any serde format.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dismiss::DismissOptions;

/// Overlay lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Duration of the Closing -> Closed transition.
    pub animation_duration_ms: u64,

    /// Delay between Opening and Open. Never zero: the renderer has to see
    /// the mounted-but-hidden state before the visible one.
    pub stabilization_delay_ms: u64,

    /// Hold the body scroll lock while not Closed.
    pub prevent_scroll: bool,

    /// Pointer-down outside the overlay closes it.
    pub close_on_overlay_click: bool,

    /// Escape closes the overlay.
    pub close_on_escape: bool,

    /// Trap Tab navigation inside the overlay while Open.
    pub trap_focus: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            animation_duration_ms: 300,
            stabilization_delay_ms: 10,
            prevent_scroll: true,
            close_on_overlay_click: true,
            close_on_escape: true,
            trap_focus: true,
        }
    }
}

impl OverlayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn animation_duration_ms(mut self, ms: u64) -> Self {
        self.animation_duration_ms = ms;
        self
    }

    pub fn stabilization_delay_ms(mut self, ms: u64) -> Self {
        self.stabilization_delay_ms = ms;
        self
    }

    pub fn prevent_scroll(mut self, prevent: bool) -> Self {
        self.prevent_scroll = prevent;
        self
    }

    pub fn close_on_overlay_click(mut self, close: bool) -> Self {
        self.close_on_overlay_click = close;
        self
    }

    pub fn close_on_escape(mut self, close: bool) -> Self {
        self.close_on_escape = close;
        self
    }

    pub fn trap_focus(mut self, trap: bool) -> Self {
        self.trap_focus = trap;
        self
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    /// The stabilization delay, raised to at least one millisecond.
    pub fn stabilization_delay(&self) -> Duration {
        Duration::from_millis(self.stabilization_delay_ms.max(1))
    }

    pub fn dismiss_options(&self) -> DismissOptions {
        DismissOptions {
            escape: self.close_on_escape,
            outside: self.close_on_overlay_click,
        }
    }
}

/// Dropdown select configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectConfig {
    pub multiple: bool,
    pub searchable: bool,
    pub clearable: bool,
    pub disabled: bool,
    pub loading: bool,
    pub placeholder: String,
    pub search_placeholder: String,
    /// Shown instead of the option list when the search matches nothing.
    pub empty_text: String,
    pub overlay: OverlayConfig,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            multiple: false,
            searchable: false,
            clearable: false,
            disabled: false,
            loading: false,
            placeholder: "Select an option".into(),
            search_placeholder: "Search options...".into(),
            empty_text: "No options found".into(),
            // A dropdown panel doesn't freeze the page.
            overlay: OverlayConfig::default().prevent_scroll(false),
        }
    }
}

impl SelectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn clearable(mut self, clearable: bool) -> Self {
        self.clearable = clearable;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = text.into();
        self
    }

    pub fn search_placeholder(mut self, text: impl Into<String>) -> Self {
        self.search_placeholder = text.into();
        self
    }

    pub fn empty_text(mut self, text: impl Into<String>) -> Self {
        self.empty_text = text.into();
        self
    }

    pub fn overlay(mut self, overlay: OverlayConfig) -> Self {
        self.overlay = overlay;
        self
    }
}

/// Modal width preset, passed through to the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalSize {
    Xs,
    Sm,
    #[default]
    Md,
    Lg,
    Xl,
    Full,
}

impl ModalSize {
    pub fn as_str(self) -> &'static str {
        match self {
            ModalSize::Xs => "xs",
            ModalSize::Sm => "sm",
            ModalSize::Md => "md",
            ModalSize::Lg => "lg",
            ModalSize::Xl => "xl",
            ModalSize::Full => "full",
        }
    }
}

/// Modal enter/leave animation, passed through to the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModalAnimation {
    #[default]
    Fade,
    Slide,
    Zoom,
    SlideUp,
}

impl ModalAnimation {
    pub fn as_str(self) -> &'static str {
        match self {
            ModalAnimation::Fade => "fade",
            ModalAnimation::Slide => "slide",
            ModalAnimation::Zoom => "zoom",
            ModalAnimation::SlideUp => "slide-up",
        }
    }
}

/// Modal dialog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalConfig {
    pub title: Option<String>,
    pub show_header: bool,
    pub show_close_button: bool,
    pub size: ModalSize,
    pub animation: ModalAnimation,
    pub centered: bool,
    /// Unmount the dialog subtree once Closed instead of hiding it.
    pub destroy_on_close: bool,
    pub role: String,
    /// Element labelling the dialog. Defaults to the title when one is set.
    pub labelled_by: Option<String>,
    /// Element describing the dialog.
    pub described_by: Option<String>,
    pub overlay: OverlayConfig,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            title: None,
            show_header: true,
            show_close_button: true,
            size: ModalSize::default(),
            animation: ModalAnimation::default(),
            centered: true,
            destroy_on_close: false,
            role: "dialog".into(),
            labelled_by: None,
            described_by: None,
            overlay: OverlayConfig::default(),
        }
    }
}

impl ModalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn show_header(mut self, show: bool) -> Self {
        self.show_header = show;
        self
    }

    pub fn show_close_button(mut self, show: bool) -> Self {
        self.show_close_button = show;
        self
    }

    pub fn size(mut self, size: ModalSize) -> Self {
        self.size = size;
        self
    }

    pub fn animation(mut self, animation: ModalAnimation) -> Self {
        self.animation = animation;
        self
    }

    pub fn centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }

    pub fn destroy_on_close(mut self, destroy: bool) -> Self {
        self.destroy_on_close = destroy;
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn labelled_by(mut self, id: impl Into<String>) -> Self {
        self.labelled_by = Some(id.into());
        self
    }

    pub fn described_by(mut self, id: impl Into<String>) -> Self {
        self.described_by = Some(id.into());
        self
    }

    pub fn overlay(mut self, overlay: OverlayConfig) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn close_on_escape(mut self, close: bool) -> Self {
        self.overlay.close_on_escape = close;
        self
    }

    pub fn close_on_overlay_click(mut self, close: bool) -> Self {
        self.overlay.close_on_overlay_click = close;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let overlay = OverlayConfig::default();
        assert_eq!(overlay.animation_duration(), Duration::from_millis(300));
        assert!(overlay.prevent_scroll);
        assert_eq!(overlay.dismiss_options(), DismissOptions::default());

        let select = SelectConfig::default();
        assert!(!select.multiple && !select.searchable && !select.clearable);
        assert!(!select.overlay.prevent_scroll);

        let modal = ModalConfig::default();
        assert_eq!(modal.size, ModalSize::Md);
        assert_eq!(modal.role, "dialog");
    }

    #[test]
    fn test_zero_stabilization_delay_is_raised() {
        let overlay = OverlayConfig::new().stabilization_delay_ms(0);
        assert_eq!(overlay.stabilization_delay(), Duration::from_millis(1));
    }
}
