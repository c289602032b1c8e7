//! Global hotkeys: key symbols, the binding file, and routing presses to
//! lanes.

mod binding;
mod keys;
mod router;

pub use binding::{HotkeyBinding, MAIN_ROW, SECONDARY_ROW, UNBOUND};
pub use keys::{KeySymbol, UnknownKey};
pub use router::{
    DetachedHook, HookError, HotkeyRouter, KEY_CHANNEL_CAPACITY, KeyEvent, KeyHook, RouterState,
};

#[cfg(test)]
pub(crate) use router::tests::ChannelHook;
