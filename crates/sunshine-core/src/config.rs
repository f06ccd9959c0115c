use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single-line summary of all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Phone-side sender settings
    #[serde(default)]
    pub sender: SenderConfig,

    /// Wearable watch face settings
    #[serde(default)]
    pub watch_face: WatchFaceConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Temperature unit used when formatting outgoing records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SenderConfig {
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,
}

/// Clock format on the watch face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HourFormat {
    /// Follow the device setting
    #[default]
    #[serde(rename = "system")]
    System,
    #[serde(rename = "12h")]
    TwelveHour,
    #[serde(rename = "24h")]
    TwentyFourHour,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchFaceConfig {
    #[serde(default)]
    pub hour_format: HourFormat,

    /// Interactive redraw period in milliseconds
    #[serde(default = "default_interactive_update_ms")]
    pub interactive_update_ms: u64,

    #[serde(default)]
    pub layout: LayoutConfig,
}

fn default_interactive_update_ms() -> u64 {
    1000
}

impl Default for WatchFaceConfig {
    fn default() -> Self {
        Self {
            hour_format: HourFormat::default(),
            interactive_update_ms: default_interactive_update_ms(),
            layout: LayoutConfig::default(),
        }
    }
}

/// Vertical baselines and text sizes, in surface pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub time_y_offset: f32,
    pub date_y_offset: f32,
    pub divider_y_offset: f32,
    pub weather_y_offset: f32,
    pub time_text_size: f32,
    pub time_text_size_round: f32,
    pub date_text_size: f32,
    pub date_text_size_round: f32,
    pub temp_text_size: f32,
    pub temp_text_size_round: f32,
    /// Gap between the weather icon and the high temperature
    pub icon_gap: f32,
    /// Half-width of the divider line
    pub divider_half_width: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            time_y_offset: 120.0,
            date_y_offset: 160.0,
            divider_y_offset: 190.0,
            weather_y_offset: 250.0,
            time_text_size: 48.0,
            time_text_size_round: 56.0,
            date_text_size: 20.0,
            date_text_size_round: 22.0,
            temp_text_size: 36.0,
            temp_text_size_round: 40.0,
            icon_gap: 10.0,
            divider_half_width: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    crate::DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, writing defaults there if the file is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(ConfigError::from)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings, which the caller
    /// logs once logging is up. Fails with [`ConfigError::Invalid`] on errors.
    pub fn load_validated(path: &Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load_from(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        let update_ms = self.watch_face.interactive_update_ms;
        if update_ms == 0 {
            result.add_error(
                "watch_face.interactive_update_ms",
                "Update interval must be greater than 0",
            );
        } else if update_ms < 100 {
            result.add_warning(
                "watch_face.interactive_update_ms",
                "Update interval below 100ms will drain the battery",
            );
        }

        let layout = &self.watch_face.layout;
        let sizes = [
            ("time_text_size", layout.time_text_size),
            ("time_text_size_round", layout.time_text_size_round),
            ("date_text_size", layout.date_text_size),
            ("date_text_size_round", layout.date_text_size_round),
            ("temp_text_size", layout.temp_text_size),
            ("temp_text_size_round", layout.temp_text_size_round),
        ];
        for (name, size) in sizes {
            if size.is_nan() || size <= 0.0 {
                result.add_error(
                    format!("watch_face.layout.{}", name),
                    "Text size must be greater than 0",
                );
            }
        }

        if layout.time_y_offset >= layout.date_y_offset
            || layout.date_y_offset >= layout.weather_y_offset
        {
            result.add_warning(
                "watch_face.layout",
                "Time, date and weather rows are not ordered top to bottom",
            );
        }

        if self.logging.filter.trim().is_empty() {
            result.add_warning("logging.filter", "Empty log filter, falling back to info");
        }

        result
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("no platform config directory".into()))?
            .join("sunshine");

        Ok(config_dir.join("config.toml"))
    }
}
