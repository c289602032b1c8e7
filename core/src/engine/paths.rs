use std::path::{Path, PathBuf};

use shinycount_types::LaneId;

use crate::session::state_file_name;

/// Layout of the data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog(&self) -> PathBuf {
        self.root.join("pkmn.yaml")
    }

    pub fn progress(&self) -> PathBuf {
        self.root.join("progress.csv")
    }

    pub fn hotkeys(&self) -> PathBuf {
        self.root.join("hotkeys.csv")
    }

    pub fn session(&self, lane: LaneId) -> PathBuf {
        self.root.join(state_file_name(lane))
    }

    pub fn logs(&self) -> PathBuf {
        self.root.join("logs")
    }
}
