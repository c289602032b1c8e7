//! Hotkey binding and its two-row file.
//!
//! ```text
//! Main HOTKEY,ctrl_r
//! Secondary HOTKEY,None
//! ```
//!
//! A missing, malformed or unrecognised file yields the default binding
//! (right Control, no secondary). A file that only lacks one of the rows keeps
//! the other one.

use std::fs;
use std::io;
use std::path::Path;

use super::keys::KeySymbol;
use crate::rows::{join_row, split_row};

pub const MAIN_ROW: &str = "Main HOTKEY";
pub const SECONDARY_ROW: &str = "Secondary HOTKEY";
pub const UNBOUND: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub primary: KeySymbol,
    pub secondary: Option<KeySymbol>,
}

impl Default for HotkeyBinding {
    fn default() -> Self {
        Self {
            primary: KeySymbol::DEFAULT,
            secondary: None,
        }
    }
}

impl HotkeyBinding {
    pub fn new(primary: KeySymbol, secondary: Option<KeySymbol>) -> Self {
        Self { primary, secondary }
    }

    /// Keys that need to be hooked
    pub fn keys(&self) -> impl Iterator<Item = KeySymbol> {
        std::iter::once(self.primary).chain(self.secondary)
    }

    /// Parse file contents; `None` if anything is malformed or unknown.
    pub fn parse(contents: &str) -> Option<Self> {
        let mut binding = Self::default();

        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            let fields = split_row(line)?;
            let [label, value] = fields.as_slice() else {
                return None;
            };
            let value = value.trim();
            match label.trim() {
                MAIN_ROW => binding.primary = KeySymbol::from_name(value)?,
                SECONDARY_ROW if value == UNBOUND => binding.secondary = None,
                SECONDARY_ROW => binding.secondary = Some(KeySymbol::from_name(value)?),
                _ => return None,
            }
        }

        Some(binding)
    }

    pub fn render(&self) -> String {
        let secondary = self.secondary.map_or(UNBOUND, KeySymbol::name);
        format!(
            "{}\n{}\n",
            join_row(&[MAIN_ROW, self.primary.name()]),
            join_row(&[SECONDARY_ROW, secondary])
        )
    }

    /// Read the binding file, falling back to defaults. Never fails.
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Failed to read hotkeys, using defaults");
                return Self::default();
            }
        };

        Self::parse(&contents).unwrap_or_else(|| {
            tracing::warn!(path = ?path, "Invalid hotkey file, using defaults");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let binding = HotkeyBinding::load(&dir.path().join("hotkeys.csv"));
        assert_eq!(binding.primary, KeySymbol::CtrlR);
        assert_eq!(binding.secondary, None);
    }

    #[test]
    fn test_parse_both_rows() {
        let binding = HotkeyBinding::parse("Main HOTKEY,f7\r\nSecondary HOTKEY,page_down\r\n").unwrap();
        assert_eq!(binding, HotkeyBinding::new(KeySymbol::F7, Some(KeySymbol::PageDown)));

        let binding = HotkeyBinding::parse("Main HOTKEY,f7\nSecondary HOTKEY,None\n").unwrap();
        assert_eq!(binding.secondary, None);
    }

    #[test]
    fn test_single_row_keeps_other_default() {
        let binding = HotkeyBinding::parse("Secondary HOTKEY,f8\n").unwrap();
        assert_eq!(binding.primary, KeySymbol::CtrlR);
        assert_eq!(binding.secondary, Some(KeySymbol::F8));
    }

    #[test]
    fn test_bad_files_fall_back_to_defaults() {
        for contents in [
            "Main HOTKEY,hyper\nSecondary HOTKEY,None\n",
            "Main HOTKEY,f7\nSecondary HOTKEY,warp\n",
            "Main HOTKEY\n",
            "Main HOTKEY,f7,extra\n",
            "Other,f7\n",
        ] {
            assert_eq!(HotkeyBinding::parse(contents), None, "{contents:?}");
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotkeys.csv");
        fs::write(&path, "Main HOTKEY,hyper\n").unwrap();
        assert_eq!(HotkeyBinding::load(&path), HotkeyBinding::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("hotkeys.csv");
        let binding = HotkeyBinding::new(KeySymbol::ShiftR, Some(KeySymbol::F1));

        binding.save(&path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Main HOTKEY,shift_r\nSecondary HOTKEY,f1\n"
        );
        assert_eq!(HotkeyBinding::load(&path), binding);
    }
}
