// Configuration management
//
// Handles emulator configuration, settings persistence, and speed control.

use crate::apu::DEFAULT_SAMPLE_RATE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default configuration file path
pub const CONFIG_FILE: &str = "emulator_config.toml";

/// Emulator configuration
///
/// Stores all user-configurable settings for the emulator. Missing sections
/// and keys fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Video settings
    pub video: VideoConfig,

    /// Audio settings
    pub audio: AudioConfig,

    /// Save state settings
    pub save_state: SaveStateConfig,

    /// Screenshot settings
    pub screenshot: ScreenshotConfig,

    /// Emulation settings
    pub emulation: EmulationConfig,
}

/// Video configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Force grayscale output regardless of PPUMASK bit 0
    pub grayscale_override: bool,
}

/// Audio configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
}

/// Save state configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveStateConfig {
    /// Number of save slots
    pub slots: u8,

    /// Save directory
    pub save_directory: PathBuf,
}

/// Screenshot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotConfig {
    /// Screenshot directory
    pub screenshot_directory: PathBuf,

    /// Include timestamp in filename
    pub include_timestamp: bool,
}

/// Emulation configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulationConfig {
    /// Initial speed mode
    pub speed: SpeedMode,
}

/// Speed mode for emulation
///
/// Front-ends pace frames with [`SpeedMode::multiplier`]; the core itself
/// always runs a frame per `Emulator::frame` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedMode {
    /// Normal speed (1x)
    #[default]
    Normal,

    /// Fast forward 2x
    FastForward2x,

    /// Fast forward 4x
    FastForward4x,

    /// Slow motion (0.5x)
    SlowMotion,

    /// Paused (0x)
    Paused,
}

impl SpeedMode {
    /// Get the speed multiplier
    ///
    /// # Returns
    ///
    /// The speed multiplier (1.0 = normal speed)
    pub fn multiplier(self) -> f32 {
        match self {
            SpeedMode::Normal => 1.0,
            SpeedMode::FastForward2x => 2.0,
            SpeedMode::FastForward4x => 4.0,
            SpeedMode::SlowMotion => 0.5,
            SpeedMode::Paused => 0.0,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl Default for SaveStateConfig {
    fn default() -> Self {
        SaveStateConfig {
            slots: 10,
            save_directory: PathBuf::from("saves"),
        }
    }
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        ScreenshotConfig {
            screenshot_directory: PathBuf::from("screenshots"),
            include_timestamp: true,
        }
    }
}

impl EmulatorConfig {
    /// Load configuration from the default file or create it
    ///
    /// A missing file is created with the default configuration. A file
    /// that cannot be read or parsed is left untouched and the defaults are
    /// used for this run.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nes_machine::EmulatorConfig;
    ///
    /// let config = EmulatorConfig::load_or_default();
    /// ```
    pub fn load_or_default() -> Self {
        Self::load_or_default_from(CONFIG_FILE)
    }

    /// Same as [`EmulatorConfig::load_or_default`] for an explicit path
    pub fn load_or_default_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("creating default configuration at {}", path.display());
                let config = Self::default();
                if let Err(e) = config.save_to(path) {
                    log::warn!("could not write {}: {}", path.display(), e);
                }
                config
            }
            Err(e) => {
                log::warn!(
                    "using default configuration, {} left unchanged: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, io::Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration text
    ///
    /// Unknown keys are ignored with a warning.
    pub fn from_toml(contents: &str) -> Result<Self, io::Error> {
        let config: EmulatorConfig = toml::from_str(contents)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let known = toml::Value::try_from(&config)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if let (Ok(raw), Some(known)) = (contents.parse::<toml::Table>(), known.as_table()) {
            warn_unknown_keys("", &raw, known);
        }
        Ok(config)
    }

    /// Save configuration to a TOML file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nes_machine::EmulatorConfig;
    ///
    /// let config = EmulatorConfig::default();
    /// config.save_to("emulator_config.toml").expect("Failed to save configuration");
    /// ```
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), io::Error> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)
    }
}

fn warn_unknown_keys(prefix: &str, raw: &toml::Table, known: &toml::Table) {
    for (key, value) in raw {
        match (value, known.get(key)) {
            (toml::Value::Table(raw), Some(toml::Value::Table(known))) => {
                warn_unknown_keys(&format!("{prefix}{key}."), raw, known)
            }
            (_, Some(_)) => {}
            (_, None) => log::warn!("ignoring unknown config key `{prefix}{key}`"),
        }
    }
}
