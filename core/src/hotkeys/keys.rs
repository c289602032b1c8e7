//! Supported hotkey symbols.
//!
//! Keys are an explicit closed set with stable snake_case names. The names
//! match what existing `hotkeys.csv` files contain (`ctrl_r`, `page_down`,
//! `f7`, ...). Lookup by name goes through a compile-time table; unknown
//! names resolve to `None` and callers fall back to the default binding.

use std::fmt;
use std::str::FromStr;

// Names are taken as `tt` so they reach `phf_map!` as plain string literals.
macro_rules! key_symbols {
    ($($variant:ident => $name:tt),* $(,)?) => {
        /// A key that can be bound as a global hotkey
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum KeySymbol {
            $($variant),*
        }

        impl KeySymbol {
            /// Every supported key, in listing order
            pub const ALL: &'static [KeySymbol] = &[$(KeySymbol::$variant),*];

            /// Stable name used in the hotkey file
            pub fn name(self) -> &'static str {
                match self {
                    $(KeySymbol::$variant => $name),*
                }
            }
        }

        static KEYS_BY_NAME: phf::Map<&'static str, KeySymbol> = phf::phf_map! {
            $($name => KeySymbol::$variant),*
        };
    };
}

key_symbols! {
    Alt => "alt",
    AltL => "alt_l",
    AltR => "alt_r",
    AltGr => "alt_gr",
    Backspace => "backspace",
    CapsLock => "caps_lock",
    Cmd => "cmd",
    CmdL => "cmd_l",
    CmdR => "cmd_r",
    Ctrl => "ctrl",
    CtrlL => "ctrl_l",
    CtrlR => "ctrl_r",
    Delete => "delete",
    Down => "down",
    End => "end",
    Enter => "enter",
    Esc => "esc",
    F1 => "f1",
    F2 => "f2",
    F3 => "f3",
    F4 => "f4",
    F5 => "f5",
    F6 => "f6",
    F7 => "f7",
    F8 => "f8",
    F9 => "f9",
    F10 => "f10",
    F11 => "f11",
    F12 => "f12",
    F13 => "f13",
    F14 => "f14",
    F15 => "f15",
    F16 => "f16",
    F17 => "f17",
    F18 => "f18",
    F19 => "f19",
    F20 => "f20",
    Home => "home",
    Insert => "insert",
    Left => "left",
    MediaNext => "media_next",
    MediaPlayPause => "media_play_pause",
    MediaPrevious => "media_previous",
    MediaVolumeDown => "media_volume_down",
    MediaVolumeMute => "media_volume_mute",
    MediaVolumeUp => "media_volume_up",
    Menu => "menu",
    NumLock => "num_lock",
    PageDown => "page_down",
    PageUp => "page_up",
    Pause => "pause",
    PrintScreen => "print_screen",
    Right => "right",
    ScrollLock => "scroll_lock",
    Shift => "shift",
    ShiftL => "shift_l",
    ShiftR => "shift_r",
    Space => "space",
    Tab => "tab",
    Up => "up",
}

impl KeySymbol {
    /// Default primary hotkey
    pub const DEFAULT: KeySymbol = KeySymbol::CtrlR;

    /// Look a key up by its file name. Case-sensitive, like the file format.
    pub fn from_name(name: &str) -> Option<Self> {
        KEYS_BY_NAME.get(name).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key '{0}'")]
pub struct UnknownKey(pub String);

impl FromStr for KeySymbol {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeySymbol::from_name(s.trim()).ok_or_else(|| UnknownKey(s.trim().to_string()))
    }
}

impl fmt::Display for KeySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
