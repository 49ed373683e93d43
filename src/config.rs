//! Configuration file handling for photo-bridge.
//!
//! Loads configuration from `<config dir>/photo-bridge/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::plugin::CHANNEL_NAME;

/// Configuration file structure for photo-bridge.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// ffmpeg executable
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    /// ffmpeg input device format (avfoundation, v4l2, dshow)
    #[serde(default = "default_input_format")]
    pub input_format: String,
    /// Device passed to ffmpeg's `-i`
    #[serde(default = "default_device")]
    pub device: String,
    /// Requested capture size, WIDTHxHEIGHT; the device default when unset
    #[serde(default)]
    pub resolution: Option<String>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            input_format: default_input_format(),
            device: default_device(),
            resolution: None,
        }
    }
}

impl CameraConfig {
    /// The configured resolution, parsed.
    pub fn resolution(&self) -> Result<Option<(u32, u32)>, ConfigError> {
        self.resolution
            .as_deref()
            .map(|s| {
                parse_resolution(s).map_err(|message| ConfigError::InvalidValue {
                    key: "camera.resolution",
                    message,
                })
            })
            .transpose()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    #[serde(default = "default_channel_name")]
    pub name: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: default_channel_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_input_format() -> String {
    if cfg!(target_os = "macos") {
        "avfoundation".to_string()
    } else if cfg!(windows) {
        "dshow".to_string()
    } else {
        "v4l2".to_string()
    }
}

fn default_device() -> String {
    if cfg!(target_os = "macos") {
        "0".to_string()
    } else if cfg!(windows) {
        "video=Integrated Camera".to_string()
    } else {
        "/dev/video0".to_string()
    }
}

fn default_channel_name() -> String {
    CHANNEL_NAME.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            Self::load_explicit(&path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from a file that must exist.
    pub fn load_explicit(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.camera.resolution()?;
        Ok(config)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        key: &'static str,
        message: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { key, message } => {
                write!(f, "Invalid value for '{}': {}", key, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("photo-bridge").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/photo-bridge/config.toml")
        })
}

/// Parse and validate resolution (WIDTHxHEIGHT format)
pub fn parse_resolution(s: &str) -> Result<(u32, u32), String> {
    let Some((width, height)) = s.split_once('x') else {
        return Err(format!(
            "Invalid resolution format '{}'. Use WIDTHxHEIGHT (e.g., 1280x720)",
            s
        ));
    };
    let width: u32 = width
        .parse()
        .map_err(|_| format!("Invalid width '{}' in resolution", width))?;
    let height: u32 = height
        .parse()
        .map_err(|_| format!("Invalid height '{}' in resolution", height))?;
    if width == 0 || height == 0 {
        return Err("Resolution width and height must be greater than 0".to_string());
    }
    if width > 7680 || height > 4320 {
        return Err("Resolution exceeds maximum supported (7680x4320)".to_string());
    }
    Ok((width, height))
}

/// Contents written by `photo-bridge config init`.
pub const DEFAULT_CONFIG: &str = r#"# photo-bridge configuration

[camera]
# ffmpeg executable
ffmpeg = "ffmpeg"
# ffmpeg input format: avfoundation (macOS), v4l2 (Linux), dshow (Windows)
# input_format = "avfoundation"
# Device passed to ffmpeg -i
# device = "0"
# Capture size (device default when unset)
# resolution = "1280x720"

[channel]
# Channel the photo picker answers on
name = "photo_bridge/photo_picker"

[log]
# Log filter when RUST_LOG is not set
level = "info"
"#;
