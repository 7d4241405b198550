//! Key events as delivered by the host input-method shell.
//!
//! Keys arrive as `(keyval, keycode, modifiers)` tuples using X11/IBus keysym
//! values. `keysym` holds the handful of keysyms the editor dispatches on.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Modifier mask, bit-compatible with the IBus/X11 state mask.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Modifiers: u32 {
        const SHIFT   = 1 << 0;
        const LOCK    = 1 << 1;
        const CONTROL = 1 << 2;
        const MOD1    = 1 << 3;
        const MOD2    = 1 << 4;
        const MOD3    = 1 << 5;
        const MOD4    = 1 << 6;
        const MOD5    = 1 << 7;
        const SUPER   = 1 << 26;
        const HYPER   = 1 << 27;
        const META    = 1 << 28;
        const RELEASE = 1 << 30;
    }
}

impl Modifiers {
    /// Alt is reported as Mod1.
    pub const ALT: Modifiers = Modifiers::MOD1;

    /// Keep only Control, Alt, Super, Hyper and Meta.
    ///
    /// Shift, CapsLock, NumLock (Mod2) and the remaining lock/level bits are
    /// noise for function-key dispatch.
    pub fn filtered(self) -> Modifiers {
        self & (Modifiers::CONTROL
            | Modifiers::MOD1
            | Modifiers::SUPER
            | Modifiers::HYPER
            | Modifiers::META)
    }
}

/// X11 keysym values used by the editor.
pub mod keysym {
    pub const SPACE: u32 = 0x0020;
    pub const APOSTROPHE: u32 = 0x0027;
    pub const UPPER_D: u32 = 0x0044;
    pub const LOWER_D: u32 = 0x0064;

    pub const BACKSPACE: u32 = 0xff08;
    pub const TAB: u32 = 0xff09;
    pub const RETURN: u32 = 0xff0d;
    pub const ESCAPE: u32 = 0xff1b;
    pub const HOME: u32 = 0xff50;
    pub const LEFT: u32 = 0xff51;
    pub const UP: u32 = 0xff52;
    pub const RIGHT: u32 = 0xff53;
    pub const DOWN: u32 = 0xff54;
    pub const PAGE_UP: u32 = 0xff55;
    pub const PAGE_DOWN: u32 = 0xff56;
    pub const END: u32 = 0xff57;
    pub const KP_ENTER: u32 = 0xff8d;
    pub const KP_HOME: u32 = 0xff95;
    pub const KP_LEFT: u32 = 0xff96;
    pub const KP_UP: u32 = 0xff97;
    pub const KP_RIGHT: u32 = 0xff98;
    pub const KP_DOWN: u32 = 0xff99;
    pub const KP_PAGE_UP: u32 = 0xff9a;
    pub const KP_PAGE_DOWN: u32 = 0xff9b;
    pub const KP_END: u32 = 0xff9c;
    pub const KP_DELETE: u32 = 0xff9f;
    pub const DELETE: u32 = 0xffff;
}

/// Result of processing a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyResult {
    /// Key was handled by the IME
    Handled,
    /// Key was not handled (pass through to application)
    NotHandled,
}

impl KeyResult {
    pub fn is_handled(self) -> bool {
        self == KeyResult::Handled
    }
}

/// A key event from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyEvent {
    pub keyval: u32,
    pub keycode: u32,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(keyval: u32, keycode: u32, modifiers: Modifiers) -> Self {
        Self {
            keyval,
            keycode,
            modifiers,
        }
    }

    /// Unmodified key with no hardware keycode.
    pub fn key(keyval: u32) -> Self {
        Self::new(keyval, 0, Modifiers::empty())
    }

    /// Key with modifiers and no hardware keycode.
    pub fn with_modifiers(keyval: u32, modifiers: Modifiers) -> Self {
        Self::new(keyval, 0, modifiers)
    }

    /// Control chord for `keyval`.
    pub fn ctrl(keyval: u32) -> Self {
        Self::with_modifiers(keyval, Modifiers::CONTROL)
    }

    /// Unmodified printable character. Latin-1 keysyms equal their code point.
    pub fn from_char(ch: char) -> Self {
        Self::key(ch as u32)
    }

    /// Printable character carried by the keysym, if any.
    pub fn printable(&self) -> Option<char> {
        match self.keyval {
            0x20..=0x7e => char::from_u32(self.keyval),
            _ => None,
        }
    }

    pub fn is_release(&self) -> bool {
        self.modifiers.contains(Modifiers::RELEASE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtered_drops_lock_noise() {
        let m = Modifiers::MOD2 | Modifiers::LOCK | Modifiers::SHIFT;
        assert!(m.filtered().is_empty());

        let m = Modifiers::CONTROL | Modifiers::MOD2;
        assert_eq!(m.filtered(), Modifiers::CONTROL);

        let m = Modifiers::ALT | Modifiers::CONTROL | Modifiers::LOCK;
        assert_eq!(m.filtered(), Modifiers::CONTROL | Modifiers::MOD1);
    }

    #[test]
    fn test_printable_range() {
        assert_eq!(KeyEvent::from_char('a').printable(), Some('a'));
        assert_eq!(KeyEvent::from_char(' ').printable(), Some(' '));
        assert_eq!(KeyEvent::key(keysym::RETURN).printable(), None);
    }

    #[test]
    fn test_key_result_is_handled() {
        assert!(KeyResult::Handled.is_handled());
        assert!(!KeyResult::NotHandled.is_handled());
    }

    #[test]
    fn test_release_flag() {
        let ev = KeyEvent::with_modifiers(keysym::LEFT, Modifiers::RELEASE);
        assert!(ev.is_release());
        assert!(!KeyEvent::key(keysym::LEFT).is_release());
    }
}
