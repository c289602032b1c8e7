use tokio::sync::mpsc;

use shinycount_types::{HuntMode, LaneId};

use super::binding::HotkeyBinding;
use super::keys::KeySymbol;

/// Capacity of the hook → router channel. A full channel drops presses.
pub const KEY_CHANNEL_CAPACITY: usize = 32;

/// A press of one of the bound keys, as delivered by the OS hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeySymbol,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HookError {
    #[error("global hotkeys unavailable: {0}")]
    Unavailable(String),
    #[error("failed to register {key}: {message}")]
    Register { key: KeySymbol, message: String },
}

/// OS-level keyboard hook.
///
/// `install` starts delivering [`KeyEvent`]s for the binding's keys on
/// `events`, from whatever thread the platform uses. `uninstall` stops
/// delivery; it must be safe to call when nothing is installed.
pub trait KeyHook {
    fn install(
        &mut self,
        binding: &HotkeyBinding,
        events: mpsc::Sender<KeyEvent>,
    ) -> Result<(), HookError>;

    fn uninstall(&mut self);
}

/// Hook that never delivers anything. Used when running without OS hotkeys.
#[derive(Debug, Default)]
pub struct DetachedHook;

impl KeyHook for DetachedHook {
    fn install(&mut self, _: &HotkeyBinding, _: mpsc::Sender<KeyEvent>) -> Result<(), HookError> {
        Ok(())
    }

    fn uninstall(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    /// No hook installed, presses are ignored
    Unbound,
    /// Every bound key goes to lane 1
    Single,
    /// Primary key goes to lane 2, secondary key to lane 1
    Dual,
}

/// Maps key presses to counting lanes.
pub struct HotkeyRouter<H> {
    hook: H,
    binding: HotkeyBinding,
    mode: HuntMode,
    installed: bool,
    events: mpsc::Sender<KeyEvent>,
}

impl<H: KeyHook> HotkeyRouter<H> {
    /// Create the router and the channel its hook feeds. Nothing is installed
    /// until [`start`](Self::start).
    pub fn new(hook: H, binding: HotkeyBinding) -> (Self, mpsc::Receiver<KeyEvent>) {
        let (events, rx) = mpsc::channel(KEY_CHANNEL_CAPACITY);
        let router = Self {
            hook,
            binding,
            mode: HuntMode::Single,
            installed: false,
            events,
        };
        (router, rx)
    }

    /// Install the hook. On failure the router stays `Unbound`; counters keep
    /// working through direct calls.
    pub fn start(&mut self) -> Result<(), HookError> {
        self.install()
    }

    fn install(&mut self) -> Result<(), HookError> {
        match self.hook.install(&self.binding, self.events.clone()) {
            Ok(()) => {
                self.installed = true;
                tracing::info!(
                    primary = %self.binding.primary,
                    secondary = ?self.binding.secondary.map(KeySymbol::name),
                    "Hotkeys installed"
                );
                Ok(())
            }
            Err(e) => {
                self.installed = false;
                tracing::warn!(error = %e, "Hotkey hook unavailable");
                Err(e)
            }
        }
    }

    pub fn state(&self) -> RouterState {
        match (self.installed, self.mode) {
            (false, _) => RouterState::Unbound,
            (true, HuntMode::Single) => RouterState::Single,
            (true, HuntMode::Dual) => RouterState::Dual,
        }
    }

    pub fn mode(&self) -> HuntMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: HuntMode) {
        self.mode = mode;
    }

    pub fn binding(&self) -> &HotkeyBinding {
        &self.binding
    }

    /// Lane a press of `key` should increment, if any.
    pub fn route(&self, key: KeySymbol) -> Option<LaneId> {
        if !self.installed {
            return None;
        }
        if key == self.binding.primary {
            return Some(match self.mode {
                HuntMode::Dual => LaneId::Secondary,
                HuntMode::Single => LaneId::Primary,
            });
        }
        if Some(key) == self.binding.secondary {
            return Some(LaneId::Primary);
        }
        None
    }

    /// Swap to a new binding. The old hook is removed before the new one is
    /// installed, so both are never active together.
    pub fn rebind(&mut self, binding: HotkeyBinding) -> Result<(), HookError> {
        self.hook.uninstall();
        self.installed = false;
        self.binding = binding;
        self.install()
    }

    pub fn shutdown(&mut self) {
        if self.installed {
            self.hook.uninstall();
            self.installed = false;
            tracing::debug!("Hotkeys uninstalled");
        }
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }
}
