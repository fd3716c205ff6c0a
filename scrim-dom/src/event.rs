use crossterm::event::{Event as CrosstermEvent, KeyEventKind, MouseEventKind};

use crate::document::Document;
use crate::hit::hit_test;
use crate::layout::LayoutResult;

/// High-level events with element targeting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Key press event, targeted at the focused element
    Key {
        target: Option<String>,
        key: Key,
        modifiers: Modifiers,
    },
    /// Mouse button pressed
    PointerDown {
        target: Option<String>,
        x: u16,
        y: u16,
        button: MouseButton,
    },
    /// Mouse button released over the element (activation)
    Click {
        target: Option<String>,
        x: u16,
        y: u16,
        button: MouseButton,
    },
    /// Text field value changed
    Input { target: String, value: String },
}

/// Event discriminant, used to register listeners per event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Key,
    PointerDown,
    Click,
    Input,
}

impl Event {
    pub fn key(key: Key, modifiers: Modifiers) -> Self {
        Event::Key {
            target: None,
            key,
            modifiers,
        }
    }

    pub fn pointer_down(target: impl Into<String>) -> Self {
        Event::PointerDown {
            target: Some(target.into()),
            x: 0,
            y: 0,
            button: MouseButton::Left,
        }
    }

    pub fn click(target: impl Into<String>) -> Self {
        Event::Click {
            target: Some(target.into()),
            x: 0,
            y: 0,
            button: MouseButton::Left,
        }
    }

    pub fn input(target: impl Into<String>, value: impl Into<String>) -> Self {
        Event::Input {
            target: target.into(),
            value: value.into(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::Key { .. } => EventKind::Key,
            Event::PointerDown { .. } => EventKind::PointerDown,
            Event::Click { .. } => EventKind::Click,
            Event::Input { .. } => EventKind::Input,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Event::Key { target, .. }
            | Event::PointerDown { target, .. }
            | Event::Click { target, .. } => target.as_deref(),
            Event::Input { target, .. } => Some(target),
        }
    }

    /// Fill in the target of a key event from the document focus.
    pub fn with_focus_target(self, doc: &Document) -> Self {
        match self {
            Event::Key {
                target: None,
                key,
                modifiers,
            } => Event::Key {
                target: doc.focused().map(str::to_string),
                key,
                modifiers,
            },
            other => other,
        }
    }

    /// True for Enter or Space, the keys that activate buttons and rows.
    pub fn is_activation_key(&self) -> bool {
        matches!(
            self,
            Event::Key {
                key: Key::Enter | Key::Char(' '),
                ..
            }
        )
    }
}

/// Simplified key representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Tab,
    BackTab,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    F(u8),
}

/// Key modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Default::default()
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Default::default()
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Default::default()
        }
    }

    pub fn none(&self) -> bool {
        !self.shift && !self.ctrl && !self.alt
    }
}

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

// Conversion from crossterm types
impl From<crossterm::event::KeyCode> for Key {
    fn from(code: crossterm::event::KeyCode) -> Self {
        use crossterm::event::KeyCode;
        match code {
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Enter => Key::Enter,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Delete => Key::Delete,
            KeyCode::Tab => Key::Tab,
            KeyCode::BackTab => Key::BackTab,
            KeyCode::Esc => Key::Escape,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            KeyCode::PageUp => Key::PageUp,
            KeyCode::PageDown => Key::PageDown,
            KeyCode::Insert => Key::Insert,
            KeyCode::F(n) => Key::F(n),
            _ => Key::Char('\0'), // Placeholder for unsupported keys
        }
    }
}

impl From<crossterm::event::KeyModifiers> for Modifiers {
    fn from(mods: crossterm::event::KeyModifiers) -> Self {
        use crossterm::event::KeyModifiers;
        Self {
            shift: mods.contains(KeyModifiers::SHIFT),
            ctrl: mods.contains(KeyModifiers::CONTROL),
            alt: mods.contains(KeyModifiers::ALT),
        }
    }
}

impl From<crossterm::event::MouseButton> for MouseButton {
    fn from(btn: crossterm::event::MouseButton) -> Self {
        use crossterm::event::MouseButton as CtBtn;
        match btn {
            CtBtn::Left => MouseButton::Left,
            CtBtn::Right => MouseButton::Right,
            CtBtn::Middle => MouseButton::Middle,
        }
    }
}

/// Convert a raw terminal event into a targeted document event.
///
/// Keys go to the focused element, mouse presses and releases to the
/// deepest element under the pointer. Everything else is dropped.
pub fn translate_event(
    raw: &CrosstermEvent,
    doc: &Document,
    layout: &LayoutResult,
) -> Option<Event> {
    match raw {
        CrosstermEvent::Key(key_event) => {
            // Only process key press events (not release/repeat on some terminals)
            if key_event.kind != KeyEventKind::Press {
                return None;
            }
            Some(Event::Key {
                target: doc.focused().map(str::to_string),
                key: key_event.code.into(),
                modifiers: key_event.modifiers.into(),
            })
        }
        CrosstermEvent::Mouse(mouse_event) => {
            let x = mouse_event.column;
            let y = mouse_event.row;
            match mouse_event.kind {
                MouseEventKind::Down(button) => Some(Event::PointerDown {
                    target: hit_test(layout, doc.root(), x, y),
                    x,
                    y,
                    button: button.into(),
                }),
                MouseEventKind::Up(button) => Some(Event::Click {
                    target: hit_test(layout, doc.root(), x, y),
                    x,
                    y,
                    button: button.into(),
                }),
                _ => None,
            }
        }
        _ => None,
    }
}
