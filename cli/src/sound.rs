//! Click feedback for counter increments.
//!
//! Playback is fire and forget on its own thread so a slow or missing audio
//! device never holds up a count. Built without the `sound` feature this only
//! logs.

use std::path::{Path, PathBuf};

use shinycount_types::SoundConfig;

#[derive(Debug, Clone)]
pub struct ClickSound {
    path: PathBuf,
    volume: f32,
    enabled: bool,
}

impl ClickSound {
    pub fn new(config: &SoundConfig, data_dir: &Path) -> Self {
        let path = if config.path.is_absolute() {
            config.path.clone()
        } else {
            data_dir.join(&config.path)
        };

        let enabled = config.enabled && path.exists();
        if config.enabled && !enabled {
            tracing::warn!(path = ?path, "Sound file not found, click disabled");
        }

        Self {
            path,
            volume: config.clamped_volume(),
            enabled,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn play(&self) {
        if !self.enabled {
            return;
        }
        self.spawn_playback();
    }

    #[cfg(feature = "sound")]
    fn spawn_playback(&self) {
        let path = self.path.clone();
        let volume = self.volume;

        std::thread::spawn(move || {
            use rodio::{Decoder, OutputStream, Sink};
            use std::fs::File;
            use std::io::BufReader;

            let Ok((_stream, stream_handle)) = OutputStream::try_default() else {
                tracing::debug!("No audio output device");
                return;
            };
            let Ok(file) = File::open(&path) else { return };
            let Ok(source) = Decoder::new(BufReader::new(file)) else {
                tracing::warn!(path = ?path, "Failed to decode sound file");
                return;
            };
            let Ok(sink) = Sink::try_new(&stream_handle) else {
                return;
            };

            sink.set_volume(volume);
            sink.append(source);
            sink.sleep_until_end();
        });
    }

    #[cfg(not(feature = "sound"))]
    fn spawn_playback(&self) {
        tracing::trace!(path = ?self.path, volume = self.volume, "Click (built without sound)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_disables_click() {
        let dir = tempfile::tempdir().unwrap();
        let click = ClickSound::new(&SoundConfig::default(), dir.path());
        assert!(!click.enabled());
        assert_eq!(click.path(), dir.path().join("sounds/click.wav"));
        click.play();
    }

    #[test]
    fn test_disabled_in_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("click.wav"), b"RIFF").unwrap();
        let config = SoundConfig {
            enabled: false,
            path: PathBuf::from("click.wav"),
            ..SoundConfig::default()
        };
        assert!(!ClickSound::new(&config, dir.path()).enabled());

        let config = SoundConfig {
            path: PathBuf::from("click.wav"),
            ..SoundConfig::default()
        };
        assert!(ClickSound::new(&config, dir.path()).enabled());
    }
}
