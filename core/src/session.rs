//! Per-lane "last active entry + variant" record.
//!
//! Each lane owns one single-line file (`entry,-,variant`). The path depends
//! only on the lane id, so the two lanes never share state. Reads are
//! forgiving: anything that doesn't parse means "nothing selected".

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use shinycount_types::LaneId;

pub const STATE_DELIMITER: &str = ",-,";

/// File name of a lane's state file inside the data directory
pub fn state_file_name(lane: LaneId) -> &'static str {
    match lane {
        LaneId::Primary => "last_state.txt",
        LaneId::Secondary => "last_state_2.txt",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub entry: String,
    pub variant: Option<String>,
}

impl SessionState {
    /// Parse the one-line file format
    pub fn parse(contents: &str) -> Option<Self> {
        let line = contents.trim();
        let (entry, variant) = line.split_once(STATE_DELIMITER)?;
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }
        let variant = variant.trim();
        Some(Self {
            entry: entry.to_string(),
            variant: (!variant.is_empty()).then(|| variant.to_string()),
        })
    }

    pub fn render(&self) -> String {
        format!(
            "{}{}{}",
            self.entry,
            STATE_DELIMITER,
            self.variant.as_deref().unwrap_or("")
        )
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    lane: LaneId,
    path: PathBuf,
}

impl SessionStore {
    pub fn for_lane(data_dir: &Path, lane: LaneId) -> Self {
        Self {
            lane,
            path: data_dir.join(state_file_name(lane)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, entry: &str, variant: Option<&str>) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let state = SessionState {
            entry: entry.to_string(),
            variant: variant.map(str::to_string),
        };
        fs::write(&self.path, state.render())
    }

    /// Read back the last saved state. Never fails; anything unusable is `None`.
    pub fn restore(&self) -> Option<SessionState> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(lane = %self.lane, path = ?self.path, error = %e, "Failed to read lane state");
                return None;
            }
        };

        let state = SessionState::parse(&contents);
        if state.is_none() && !contents.trim().is_empty() {
            tracing::warn!(lane = %self.lane, path = ?self.path, "Ignoring malformed lane state");
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_depend_only_on_lane() {
        let dir = Path::new("/data");
        let one = SessionStore::for_lane(dir, LaneId::Primary);
        let two = SessionStore::for_lane(dir, LaneId::Secondary);
        assert_ne!(one.path(), two.path());
        assert_eq!(one.path(), SessionStore::for_lane(dir, LaneId::Primary).path());
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            SessionState::parse("pikachu,-,scarlet-violet: pikachu\n"),
            Some(SessionState {
                entry: "pikachu".to_string(),
                variant: Some("scarlet-violet: pikachu".to_string()),
            })
        );
        assert_eq!(
            SessionState::parse("eevee,-,"),
            Some(SessionState {
                entry: "eevee".to_string(),
                variant: None,
            })
        );
        assert_eq!(SessionState::parse("pikachu"), None);
        assert_eq!(SessionState::parse(",-,home: pikachu"), None);
        assert_eq!(SessionState::parse(""), None);
    }

    #[test]
    fn test_save_restore() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::for_lane(&dir.path().join("config"), LaneId::Secondary);

        assert_eq!(store.restore(), None);

        store.save("pikachu", Some("home: pikachu")).unwrap();
        let state = store.restore().unwrap();
        assert_eq!(state.entry, "pikachu");
        assert_eq!(state.variant.as_deref(), Some("home: pikachu"));

        // the other lane's file is untouched
        let other = SessionStore::for_lane(&dir.path().join("config"), LaneId::Primary);
        assert_eq!(other.restore(), None);
    }

    #[test]
    fn test_malformed_file_restores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::for_lane(dir.path(), LaneId::Primary);
        fs::write(store.path(), "garbage without delimiter").unwrap();
        assert_eq!(store.restore(), None);
    }
}
