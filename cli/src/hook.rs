//! OS-wide hotkey hook backed by `global-hotkey`.
//!
//! The manager must live on the thread that created it (the main thread).
//! Presses arrive on global-hotkey's own channel; a forwarder thread maps the
//! hotkey id back to a [`KeySymbol`] and hands it to the engine's bounded
//! channel with `try_send`, so the OS side never blocks.

use std::sync::{Arc, Mutex, PoisonError};

use global_hotkey::hotkey::{Code, HotKey};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tokio::sync::mpsc;

use shinycount_core::{HookError, HotkeyBinding, KeyEvent, KeyHook, KeySymbol};

/// Where the forwarder sends presses, and which ids it should recognise
#[derive(Default)]
struct Forwarding {
    keys: Vec<(u32, KeySymbol)>,
    events: Option<mpsc::Sender<KeyEvent>>,
}

pub struct GlobalKeyHook {
    manager: Option<GlobalHotKeyManager>,
    registered: Vec<HotKey>,
    forwarding: Arc<Mutex<Forwarding>>,
    forwarder_started: bool,
}

impl GlobalKeyHook {
    pub fn new() -> Self {
        Self {
            manager: None,
            registered: Vec::new(),
            forwarding: Arc::default(),
            forwarder_started: false,
        }
    }

    fn manager(&mut self) -> Result<&GlobalHotKeyManager, HookError> {
        if self.manager.is_none() {
            let manager =
                GlobalHotKeyManager::new().map_err(|e| HookError::Unavailable(e.to_string()))?;
            self.manager = Some(manager);
        }
        self.manager
            .as_ref()
            .ok_or_else(|| HookError::Unavailable("hotkey manager missing".to_string()))
    }

    fn start_forwarder(&mut self) {
        if self.forwarder_started {
            return;
        }
        self.forwarder_started = true;

        let forwarding = Arc::clone(&self.forwarding);
        std::thread::spawn(move || {
            let receiver = GlobalHotKeyEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if event.state != HotKeyState::Pressed {
                    continue;
                }
                let forwarding = forwarding.lock().unwrap_or_else(PoisonError::into_inner);
                let Some((_, key)) = forwarding.keys.iter().find(|(id, _)| *id == event.id) else {
                    continue;
                };
                let Some(events) = &forwarding.events else {
                    continue;
                };
                if let Err(e) = events.try_send(KeyEvent { key: *key }) {
                    tracing::warn!(%key, error = %e, "Dropping hotkey press");
                }
            }
        });
    }
}

impl Default for GlobalKeyHook {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyHook for GlobalKeyHook {
    fn install(
        &mut self,
        binding: &HotkeyBinding,
        events: mpsc::Sender<KeyEvent>,
    ) -> Result<(), HookError> {
        let mut hotkeys = Vec::new();
        for key in binding.keys() {
            hotkeys.push((HotKey::new(None, key_code(key)), key));
        }

        let manager = self.manager()?;
        let mut registered = Vec::new();
        for (hotkey, key) in &hotkeys {
            if let Err(e) = manager.register(*hotkey) {
                // leave nothing half-installed
                if let Err(rollback) = manager.unregister_all(&registered) {
                    tracing::warn!(error = %rollback, "Failed to roll back hotkeys");
                }
                return Err(HookError::Register {
                    key: *key,
                    message: e.to_string(),
                });
            }
            registered.push(*hotkey);
        }
        self.registered = registered;

        {
            let mut forwarding = self.forwarding.lock().unwrap_or_else(PoisonError::into_inner);
            forwarding.keys = hotkeys.iter().map(|(h, k)| (h.id(), *k)).collect();
            forwarding.events = Some(events);
        }
        self.start_forwarder();
        Ok(())
    }

    fn uninstall(&mut self) {
        {
            let mut forwarding = self.forwarding.lock().unwrap_or_else(PoisonError::into_inner);
            forwarding.keys.clear();
            forwarding.events = None;
        }

        if let Some(manager) = &self.manager {
            if let Err(e) = manager.unregister_all(&self.registered) {
                tracing::warn!(error = %e, "Failed to unregister hotkeys");
            }
        }
        self.registered.clear();
    }
}

fn key_code(key: KeySymbol) -> Code {
    match key {
        KeySymbol::Alt | KeySymbol::AltL => Code::AltLeft,
        KeySymbol::AltR | KeySymbol::AltGr => Code::AltRight,
        KeySymbol::Backspace => Code::Backspace,
        KeySymbol::CapsLock => Code::CapsLock,
        KeySymbol::Cmd | KeySymbol::CmdL => Code::MetaLeft,
        KeySymbol::CmdR => Code::MetaRight,
        KeySymbol::Ctrl | KeySymbol::CtrlL => Code::ControlLeft,
        KeySymbol::CtrlR => Code::ControlRight,
        KeySymbol::Delete => Code::Delete,
        KeySymbol::Down => Code::ArrowDown,
        KeySymbol::End => Code::End,
        KeySymbol::Enter => Code::Enter,
        KeySymbol::Esc => Code::Escape,
        KeySymbol::F1 => Code::F1,
        KeySymbol::F2 => Code::F2,
        KeySymbol::F3 => Code::F3,
        KeySymbol::F4 => Code::F4,
        KeySymbol::F5 => Code::F5,
        KeySymbol::F6 => Code::F6,
        KeySymbol::F7 => Code::F7,
        KeySymbol::F8 => Code::F8,
        KeySymbol::F9 => Code::F9,
        KeySymbol::F10 => Code::F10,
        KeySymbol::F11 => Code::F11,
        KeySymbol::F12 => Code::F12,
        KeySymbol::F13 => Code::F13,
        KeySymbol::F14 => Code::F14,
        KeySymbol::F15 => Code::F15,
        KeySymbol::F16 => Code::F16,
        KeySymbol::F17 => Code::F17,
        KeySymbol::F18 => Code::F18,
        KeySymbol::F19 => Code::F19,
        KeySymbol::F20 => Code::F20,
        KeySymbol::Home => Code::Home,
        KeySymbol::Insert => Code::Insert,
        KeySymbol::Left => Code::ArrowLeft,
        KeySymbol::MediaNext => Code::MediaTrackNext,
        KeySymbol::MediaPlayPause => Code::MediaPlayPause,
        KeySymbol::MediaPrevious => Code::MediaTrackPrevious,
        KeySymbol::MediaVolumeDown => Code::AudioVolumeDown,
        KeySymbol::MediaVolumeMute => Code::AudioVolumeMute,
        KeySymbol::MediaVolumeUp => Code::AudioVolumeUp,
        KeySymbol::Menu => Code::ContextMenu,
        KeySymbol::NumLock => Code::NumLock,
        KeySymbol::PageDown => Code::PageDown,
        KeySymbol::PageUp => Code::PageUp,
        KeySymbol::Pause => Code::Pause,
        KeySymbol::PrintScreen => Code::PrintScreen,
        KeySymbol::Right => Code::ArrowRight,
        KeySymbol::ScrollLock => Code::ScrollLock,
        KeySymbol::Shift | KeySymbol::ShiftL => Code::ShiftLeft,
        KeySymbol::ShiftR => Code::ShiftRight,
        KeySymbol::Space => Code::Space,
        KeySymbol::Tab => Code::Tab,
        KeySymbol::Up => Code::ArrowUp,
    }
}
