//! Configuration loading and model directory resolution
//!
//! Bootstrap configuration comes from an optional TOML file. Every field has a
//! built-in default, so a missing file never prevents startup.
//!
//! # Model Directory Priority
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`AED_MODEL_DIR`)
//! 3. TOML config file (`model_dir`)
//! 4. Current working directory (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the model directory
pub const MODEL_DIR_ENV: &str = "AED_MODEL_DIR";

/// Environment variable pointing at the TOML config file
pub const CONFIG_PATH_ENV: &str = "AED_CONFIG";

/// Sample rate every waveform is resampled to before analysis
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;

/// RMS energy below which a clip is treated as silence
pub const LOW_RMS_THRESHOLD: f64 = 0.02;

/// Peak amplitude below which a clip is treated as silence
pub const LOW_AMPLITUDE_THRESHOLD: f64 = 0.1;

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change while the worker runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Directory holding classifier and scaler artifacts
    #[serde(default)]
    pub model_dir: Option<PathBuf>,

    /// Audio decoding settings
    #[serde(default)]
    pub audio: AudioSettings,

    /// Loudness gate thresholds
    #[serde(default)]
    pub gate: GateSettings,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Audio decoding settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Target sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
        }
    }
}

/// Loudness gate thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSettings {
    #[serde(default = "default_rms_threshold")]
    pub rms_threshold: f64,

    #[serde(default = "default_amplitude_threshold")]
    pub amplitude_threshold: f64,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            rms_threshold: default_rms_threshold(),
            amplitude_threshold: default_amplitude_threshold(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_rms_threshold() -> f64 {
    LOW_RMS_THRESHOLD
}

fn default_amplitude_threshold() -> f64 {
    LOW_AMPLITUDE_THRESHOLD
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Read and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML {}: {}", path.display(), e)))?;

        config.validate()?;
        info!("Loaded TOML configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults when no file exists
    ///
    /// `explicit` comes from `--config` / `AED_CONFIG`; otherwise the
    /// platform config directory is tried. A file that exists but fails to
    /// parse is an error; an absent file is not.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let candidate = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };

        match candidate {
            Some(path) if path.exists() => Self::load(&path),
            Some(path) => {
                if explicit.is_some() {
                    warn!(
                        "Config file {} not found, using built-in defaults",
                        path.display()
                    );
                }
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Reject values that would make the worker misbehave
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(Error::Config("audio.sample_rate must be positive".to_string()));
        }

        for (name, value) in [
            ("gate.rms_threshold", self.gate.rms_threshold),
            ("gate.amplitude_threshold", self.gate.amplitude_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{} must be a finite, non-negative number (got {})",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

/// Default config file location: `<config_dir>/aed/worker.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("aed").join("worker.toml"))
}

/// Resolve the model directory following the priority order above
pub fn resolve_model_dir(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(MODEL_DIR_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.model_dir {
        return Ok(path.clone());
    }

    // Priority 4: Current working directory
    std::env::current_dir().map_err(Error::Io)
}
