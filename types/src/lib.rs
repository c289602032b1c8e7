//! Shared configuration types for shinycount.
//!
//! These are plain serde types so both the engine (`shinycount-core`) and the
//! command-line front end agree on the on-disk config shape. Every field has a
//! default, so a partial or empty `config.toml` still loads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Lanes
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a counting lane. Single-hunt mode uses only `Primary`;
/// dual-hunt mode adds `Secondary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneId {
    Primary,
    Secondary,
}

impl LaneId {
    pub const ALL: [LaneId; 2] = [LaneId::Primary, LaneId::Secondary];

    /// 1-based lane number as shown to users
    pub fn number(self) -> u8 {
        match self {
            LaneId::Primary => 1,
            LaneId::Secondary => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(LaneId::Primary),
            2 => Some(LaneId::Secondary),
            _ => None,
        }
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lane {}", self.number())
    }
}

/// Single- or dual-hunt mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HuntMode {
    #[default]
    Single,
    Dual,
}

// ─────────────────────────────────────────────────────────────────────────────
// App config
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the catalog, progress, state and hotkey files.
    /// `None` means the platform config dir (`~/.config/shinycount` on Linux).
    pub data_dir: Option<PathBuf>,
    /// Mode restored at startup
    pub hunt_mode: HuntMode,
    pub sound: SoundConfig,
    pub remote: RemoteConfig,
    pub throttle: ThrottleConfig,
}

/// Click sound played when a counter goes up
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    pub enabled: bool,
    /// 0.0 - 1.0
    pub volume: f32,
    /// WAV/OGG/MP3 file. Relative paths resolve against the data dir.
    pub path: PathBuf,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.4,
            path: PathBuf::from("sounds/click.wav"),
        }
    }
}

impl SoundConfig {
    /// Volume clamped to the range rodio expects
    pub fn clamped_volume(&self) -> f32 {
        self.volume.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Per-entry sprite pages live at `{sprite_base}/{entry}`
    pub sprite_base: String,
    /// Generation listing API root, with trailing slash
    pub api_base: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            sprite_base: "https://pokemondb.net/sprites".to_string(),
            api_base: "https://pokeapi.co/api/v2/".to_string(),
            user_agent: concat!("shinycount/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 15,
        }
    }
}

/// Self-imposed rate limits for the sprite host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Minimum spacing between remote lookups on one lane
    pub min_interval_ms: u64,
    /// Stall applied to an image fetch that violates the spacing
    pub image_penalty_ms: u64,
    /// Image fetches per lane that skip the spacing check
    pub free_image_calls: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 500,
            image_penalty_ms: 1500,
            free_image_calls: 2,
        }
    }
}
