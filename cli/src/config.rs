use std::path::{Path, PathBuf};

use shinycount_types::AppConfig;

pub const APP_NAME: &str = "shinycount";
const CONFIG_NAME: &str = "config";

/// Load `shinycount/config.toml` from the platform config dir. A missing file
/// is created with defaults by confy; an unreadable one falls back to
/// defaults.
pub fn load_config() -> AppConfig {
    match confy::load(APP_NAME, CONFIG_NAME) {
        Ok(config) => config,
        Err(e) => {
            // logging isn't up yet; the data dir decides where it goes
            eprintln!("Failed to load config, using defaults: {e}");
            AppConfig::default()
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    confy::get_configuration_file_path(APP_NAME, CONFIG_NAME).ok()
}

/// Data directory: command-line flag, then config, then the platform
/// config dir.
pub fn resolve_data_dir(flag: Option<&Path>, config: &AppConfig) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| config.data_dir.clone())
        .or_else(|| dirs::config_dir().map(|dir| dir.join(APP_NAME)))
        .unwrap_or_else(|| PathBuf::from(APP_NAME))
}
