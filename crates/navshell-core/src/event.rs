#![forbid(unsafe_code)]

//! Canonical input events consumed by the shell.
//!
//! The terminal backend is translated into these types once, at the edge, so
//! models and tests never see crossterm types.
//!
//! - Mouse coordinates are 0-indexed.
//! - `KeyEventKind` defaults to `Press` when the terminal cannot report it.

use bitflags::bitflags;
#[cfg(not(target_arch = "wasm32"))]
use crossterm::event as cte;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// A mouse event.
    Mouse(MouseEvent),

    /// Terminal was resized.
    Resize {
        /// New terminal width in columns.
        width: u16,
        /// New terminal height in rows.
        height: u16,
    },

    /// Focus gained (`true`) or lost (`false`).
    Focus(bool),

    /// Idle tick from the runtime loop.
    Tick,
}

impl Event {
    /// Convert a crossterm event into a shell [`Event`].
    ///
    /// Returns `None` for events the shell has no use for (pastes, unmapped keys).
    #[must_use]
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_crossterm(event: cte::Event) -> Option<Self> {
        match event {
            cte::Event::Key(key) => {
                let mapped = map_key_event(key).map(Event::Key);
                if mapped.is_none() {
                    crate::trace!(code = ?key.code, "unmapped key ignored");
                }
                mapped
            }
            cte::Event::Mouse(mouse) => Some(Event::Mouse(map_mouse_event(mouse))),
            cte::Event::Resize(width, height) => Some(Event::Resize { width, height }),
            cte::Event::FocusGained => Some(Event::Focus(true)),
            cte::Event::FocusLost => Some(Event::Focus(false)),
            cte::Event::Paste(_text) => {
                crate::trace!(len = _text.len(), "paste ignored");
                None
            }
        }
    }

    /// Shorthand for a plain key press.
    #[must_use]
    pub const fn key(code: KeyCode) -> Self {
        Event::Key(KeyEvent::new(code))
    }

    /// Shorthand for a left-button press at a cell.
    #[must_use]
    pub const fn click(x: u16, y: u16) -> Self {
        Event::Mouse(MouseEvent::new(
            MouseEventKind::Down(MouseButton::Left),
            x,
            y,
        ))
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// Press, repeat, or release.
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a key press with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Replace the modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Replace the event kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// Check if Ctrl is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// True for presses and auto-repeats; false for releases.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        !matches!(self.kind, KeyEventKind::Release)
    }

    /// The digit `1..=9` this key represents, if any.
    #[must_use]
    pub fn digit(&self) -> Option<u8> {
        match self.code {
            KeyCode::Char(c @ '1'..='9') => c.to_digit(10).map(|d| d as u8),
            _ => None,
        }
    }
}

/// Key codes the shell distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),
    /// Enter/Return.
    Enter,
    /// Escape.
    Escape,
    /// Backspace.
    Backspace,
    /// Tab.
    Tab,
    /// Shift+Tab.
    BackTab,
    /// Home.
    Home,
    /// End.
    End,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Function key (F1-F24).
    F(u8),
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,
    /// Key is being held.
    Repeat,
    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys held during an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    /// The type of mouse event.
    pub kind: MouseEventKind,
    /// Column (0-indexed).
    pub x: u16,
    /// Row (0-indexed).
    pub y: u16,
    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// Create a new mouse event.
    #[must_use]
    pub const fn new(kind: MouseEventKind, x: u16, y: u16) -> Self {
        Self {
            kind,
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    /// Replace the modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Position as `(x, y)`.
    #[must_use]
    pub const fn position(&self) -> (u16, u16) {
        (self.x, self.y)
    }

    /// True for a left-button press, the only mouse action the shell reacts to.
    #[must_use]
    pub const fn is_left_click(&self) -> bool {
        matches!(self.kind, MouseEventKind::Down(MouseButton::Left))
    }
}

/// The type of mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    /// Button pressed.
    Down(MouseButton),
    /// Button released.
    Up(MouseButton),
    /// Moved with a button held.
    Drag(MouseButton),
    /// Moved with no button held.
    Moved,
    /// Wheel up.
    ScrollUp,
    /// Wheel down.
    ScrollDown,
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left button.
    Left,
    /// Right button.
    Right,
    /// Middle button.
    Middle,
}

#[cfg(not(target_arch = "wasm32"))]
fn map_key_event(event: cte::KeyEvent) -> Option<KeyEvent> {
    let code = map_key_code(event.code)?;
    let kind = match event.kind {
        cte::KeyEventKind::Press => KeyEventKind::Press,
        cte::KeyEventKind::Repeat => KeyEventKind::Repeat,
        cte::KeyEventKind::Release => KeyEventKind::Release,
    };
    Some(KeyEvent {
        code,
        modifiers: map_modifiers(event.modifiers),
        kind,
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn map_key_code(code: cte::KeyCode) -> Option<KeyCode> {
    match code {
        cte::KeyCode::Char(c) => Some(KeyCode::Char(c)),
        cte::KeyCode::Enter => Some(KeyCode::Enter),
        cte::KeyCode::Esc => Some(KeyCode::Escape),
        cte::KeyCode::Backspace => Some(KeyCode::Backspace),
        cte::KeyCode::Tab => Some(KeyCode::Tab),
        cte::KeyCode::BackTab => Some(KeyCode::BackTab),
        cte::KeyCode::Home => Some(KeyCode::Home),
        cte::KeyCode::End => Some(KeyCode::End),
        cte::KeyCode::Up => Some(KeyCode::Up),
        cte::KeyCode::Down => Some(KeyCode::Down),
        cte::KeyCode::Left => Some(KeyCode::Left),
        cte::KeyCode::Right => Some(KeyCode::Right),
        cte::KeyCode::F(n) => Some(KeyCode::F(n)),
        _ => None,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn map_modifiers(modifiers: cte::KeyModifiers) -> Modifiers {
    let mut mapped = Modifiers::NONE;
    if modifiers.contains(cte::KeyModifiers::SHIFT) {
        mapped |= Modifiers::SHIFT;
    }
    if modifiers.contains(cte::KeyModifiers::ALT) {
        mapped |= Modifiers::ALT;
    }
    if modifiers.contains(cte::KeyModifiers::CONTROL) {
        mapped |= Modifiers::CTRL;
    }
    if modifiers.contains(cte::KeyModifiers::SUPER) || modifiers.contains(cte::KeyModifiers::META)
    {
        mapped |= Modifiers::SUPER;
    }
    mapped
}

#[cfg(not(target_arch = "wasm32"))]
fn map_mouse_event(event: cte::MouseEvent) -> MouseEvent {
    let button = |b: cte::MouseButton| match b {
        cte::MouseButton::Left => MouseButton::Left,
        cte::MouseButton::Right => MouseButton::Right,
        cte::MouseButton::Middle => MouseButton::Middle,
    };
    let kind = match event.kind {
        cte::MouseEventKind::Down(b) => MouseEventKind::Down(button(b)),
        cte::MouseEventKind::Up(b) => MouseEventKind::Up(button(b)),
        cte::MouseEventKind::Drag(b) => MouseEventKind::Drag(button(b)),
        cte::MouseEventKind::ScrollUp => MouseEventKind::ScrollUp,
        cte::MouseEventKind::ScrollDown => MouseEventKind::ScrollDown,
        // Horizontal scroll is treated as plain movement.
        cte::MouseEventKind::Moved
        | cte::MouseEventKind::ScrollLeft
        | cte::MouseEventKind::ScrollRight => MouseEventKind::Moved,
    };
    MouseEvent::new(kind, event.column, event.row).with_modifiers(map_modifiers(event.modifiers))
}
