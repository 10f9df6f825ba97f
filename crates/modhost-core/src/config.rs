//! User preference snapshot
//!
//! Read once at startup from `<config dir>/modhost/userprefs.yaml`. The shell
//! never writes it; the file is the user's to edit.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::{AUTO_DEVICE, DEFAULT_BUFFER_SIZE, DEFAULT_SAMPLE_RATE};

/// Preference file name inside the app config directory
pub const PREFS_FILE_NAME: &str = "userprefs.yaml";

/// Startup preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPrefs {
    /// Window width in logical pixels
    pub width: u32,
    /// Window height in logical pixels
    pub height: u32,
    /// Output device name, or "auto"
    pub audio_output_device: String,
    /// Input device name, or "auto"
    pub audio_input_device: String,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Buffer size in frames
    pub buffer_size: u32,
    /// Display scale override; unset means use the display's own scale
    pub pixel_ratio: Option<f32>,
}

impl Default for UserPrefs {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
            audio_output_device: AUTO_DEVICE.to_string(),
            audio_input_device: AUTO_DEVICE.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            pixel_ratio: None,
        }
    }
}

impl UserPrefs {
    /// Pixel ratio for a display reporting `display_scale`
    ///
    /// A valid override wins, then the display scale, then 1.0.
    pub fn effective_pixel_ratio(&self, display_scale: f32) -> f32 {
        let valid = |ratio: f32| ratio.is_finite() && ratio > 0.0;
        match self.pixel_ratio {
            Some(ratio) if valid(ratio) => ratio,
            _ if valid(display_scale) => display_scale,
            _ => 1.0,
        }
    }
}

/// Default preferences path
///
/// Returns `~/.config/modhost/userprefs.yaml` on Linux, the platform
/// equivalent elsewhere.
pub fn default_prefs_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("modhost")
        .join(PREFS_FILE_NAME)
}

/// Load preferences from a YAML file
///
/// A missing file gives the defaults. An unreadable or invalid file logs a
/// warning and gives the defaults.
pub fn load_prefs(path: &Path) -> UserPrefs {
    log::info!("load_prefs: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_prefs: Preferences file doesn't exist, using defaults");
        return UserPrefs::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<UserPrefs>(&contents) {
            Ok(prefs) => {
                log::info!(
                    "load_prefs: {}x{}, output: {}, input: {}, {}Hz, {} frames",
                    prefs.width,
                    prefs.height,
                    prefs.audio_output_device,
                    prefs.audio_input_device,
                    prefs.sample_rate,
                    prefs.buffer_size
                );
                prefs
            }
            Err(e) => {
                log::warn!("load_prefs: Failed to parse preferences: {}, using defaults", e);
                UserPrefs::default()
            }
        },
        Err(e) => {
            log::warn!(
                "load_prefs: Failed to read preferences file: {}, using defaults",
                e
            );
            UserPrefs::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_prefs() {
        let prefs = UserPrefs::default();
        assert_eq!((prefs.width, prefs.height), (600, 400));
        assert_eq!(prefs.audio_output_device, "auto");
        assert_eq!(prefs.audio_input_device, "auto");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = load_prefs(&dir.path().join(PREFS_FILE_NAME));
        assert_eq!(prefs, UserPrefs::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "audio_output_device: Speakers").unwrap();
        writeln!(file, "width: 1024").unwrap();

        let prefs = load_prefs(file.path());
        assert_eq!(prefs.audio_output_device, "Speakers");
        assert_eq!(prefs.width, 1024);
        assert_eq!(prefs.height, 400);
        assert_eq!(prefs.audio_input_device, "auto");
        assert_eq!(prefs.sample_rate, DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "width: [not, a, number").unwrap();

        assert_eq!(load_prefs(file.path()), UserPrefs::default());
    }

    #[test]
    fn test_pixel_ratio_follows_display() {
        let prefs = UserPrefs::default();
        assert_eq!(prefs.effective_pixel_ratio(2.0), 2.0);
        assert_eq!(prefs.effective_pixel_ratio(0.0), 1.0);
    }

    #[test]
    fn test_pixel_ratio_override() {
        let prefs = UserPrefs {
            pixel_ratio: Some(1.5),
            ..UserPrefs::default()
        };
        assert_eq!(prefs.effective_pixel_ratio(2.0), 1.5);

        let broken = UserPrefs {
            pixel_ratio: Some(-1.0),
            ..UserPrefs::default()
        };
        assert_eq!(broken.effective_pixel_ratio(2.0), 2.0);
    }

    #[test]
    fn test_pixel_ratio_read_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "pixel_ratio: 2.0").unwrap();

        assert_eq!(load_prefs(file.path()).pixel_ratio, Some(2.0));
    }

    #[test]
    fn test_default_path_ends_with_prefs_file() {
        let path = default_prefs_path();
        assert!(path.ends_with("modhost/userprefs.yaml"));
    }
}
