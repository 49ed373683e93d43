//! Camera access through the ffmpeg command line.
//!
//! Availability is probed from ffmpeg's device listing (or the device node
//! for v4l2). A photo is one frame piped out of ffmpeg as PPM and decoded
//! into a [`RawImage`].

use std::path::Path;
use std::process::{Command, Stdio};

use image::ImageFormat;
use thiserror::Error;

use crate::bridge::{PixelFormat, RawImage};
use crate::config::{CameraConfig, ConfigError};

/// Errors that can occur while grabbing a frame.
#[derive(Debug, Error)]
pub enum GrabError {
    #[error("FFmpeg not found. Install it or set camera.ffmpeg in the config file")]
    FfmpegNotFound,
    #[error("FFmpeg failed: {0}")]
    FfmpegFailed(String),
    #[error("FFmpeg produced no frame")]
    EmptyFrame,
    #[error("Failed to decode frame: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Failed to run FFmpeg: {0}")]
    Io(#[from] std::io::Error),
}

/// Settings for ffmpeg camera access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraSettings {
    pub ffmpeg: String,
    pub input_format: String,
    pub device: String,
    pub resolution: Option<(u32, u32)>,
}

impl CameraSettings {
    pub fn from_config(config: &CameraConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            ffmpeg: config.ffmpeg.clone(),
            input_format: config.input_format.clone(),
            device: config.device.clone(),
            resolution: config.resolution()?,
        })
    }
}

/// A video input device as listed by ffmpeg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDevice {
    pub index: u32,
    pub name: String,
}

impl std::fmt::Display for VideoDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.index, self.name)
    }
}

/// Result of an availability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraProbe {
    /// Whether ffmpeg could be run at all
    pub ffmpeg_found: bool,
    /// Cameras ffmpeg reported (empty when the input format has no listing)
    pub devices: Vec<VideoDevice>,
    /// Whether the configured device can be captured from
    pub available: bool,
    /// Why the device is unavailable
    pub details: Option<String>,
}

impl CameraProbe {
    fn unavailable(ffmpeg_found: bool, devices: Vec<VideoDevice>, details: String) -> Self {
        Self {
            ffmpeg_found,
            devices,
            available: false,
            details: Some(details),
        }
    }

    fn available(devices: Vec<VideoDevice>) -> Self {
        Self {
            ffmpeg_found: true,
            devices,
            available: true,
            details: None,
        }
    }
}

/// A camera read through ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegCamera {
    settings: CameraSettings,
}

impl FfmpegCamera {
    pub fn new(settings: CameraSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Check that ffmpeg runs and the configured device is there.
    pub async fn probe(&self) -> CameraProbe {
        let version = tokio::process::Command::new(&self.settings.ffmpeg)
            .args(["-hide_banner", "-version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if let Err(e) = version {
            let details = if e.kind() == std::io::ErrorKind::NotFound {
                "FFmpeg not found".to_string()
            } else {
                format!("Failed to run FFmpeg: {}", e)
            };
            return CameraProbe::unavailable(false, Vec::new(), details);
        }

        match self.settings.input_format.as_str() {
            "avfoundation" | "dshow" => {
                let listing = match self.list_devices_output().await {
                    Ok(listing) => listing,
                    Err(e) => {
                        return CameraProbe::unavailable(
                            true,
                            Vec::new(),
                            format!("Failed to list devices: {}", e),
                        )
                    }
                };
                let devices = if self.settings.input_format == "avfoundation" {
                    parse_avfoundation_video_devices(&listing)
                } else {
                    parse_dshow_video_devices(&listing)
                };
                if device_listed(&self.settings.device, &devices) {
                    CameraProbe::available(devices)
                } else if devices.is_empty() {
                    CameraProbe::unavailable(
                        true,
                        devices,
                        "No cameras found. Make sure a camera is connected and camera permission is granted".to_string(),
                    )
                } else {
                    CameraProbe::unavailable(
                        true,
                        devices,
                        format!("Camera '{}' not found", self.settings.device),
                    )
                }
            }
            "v4l2" => {
                if Path::new(&self.settings.device).exists() {
                    CameraProbe::available(Vec::new())
                } else {
                    CameraProbe::unavailable(
                        true,
                        Vec::new(),
                        format!("Video device {} does not exist", self.settings.device),
                    )
                }
            }
            other => {
                log::debug!("No device probe for input format '{}'", other);
                CameraProbe::available(Vec::new())
            }
        }
    }

    async fn list_devices_output(&self) -> std::io::Result<String> {
        let dummy = if self.settings.input_format == "dshow" {
            "dummy"
        } else {
            ""
        };
        let output = tokio::process::Command::new(&self.settings.ffmpeg)
            .args([
                "-hide_banner",
                "-f",
                self.settings.input_format.as_str(),
                "-list_devices",
                "true",
                "-i",
                dummy,
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;
        // ffmpeg exits non-zero after listing; the listing is on stderr.
        Ok(String::from_utf8_lossy(&output.stderr).into_owned())
    }

    /// Grab a single frame. Blocks until ffmpeg exits.
    pub fn grab_frame(&self) -> Result<RawImage, GrabError> {
        let args = grab_args(&self.settings);
        log::debug!("Running {} {}", self.settings.ffmpeg, args.join(" "));

        let output = Command::new(&self.settings.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GrabError::FfmpegNotFound
                } else {
                    GrabError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GrabError::FfmpegFailed(stderr.trim().to_string()));
        }

        decode_frame(&output.stdout)
    }
}

/// ffmpeg arguments for grabbing one frame to stdout as PPM.
pub fn grab_args(settings: &CameraSettings) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-f"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.push(settings.input_format.clone());

    // avfoundation refuses to open without an explicit rate
    if settings.input_format == "avfoundation" {
        args.extend(["-framerate".to_string(), "30".to_string()]);
    }
    if let Some((width, height)) = settings.resolution {
        args.extend(["-video_size".to_string(), format!("{}x{}", width, height)]);
    }

    args.extend(
        [
            "-i",
            settings.device.as_str(),
            "-frames:v",
            "1",
            "-f",
            "image2pipe",
            "-vcodec",
            "ppm",
            "-",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args
}

/// Decode ffmpeg's PPM output into an RGB image.
pub fn decode_frame(bytes: &[u8]) -> Result<RawImage, GrabError> {
    if bytes.is_empty() {
        return Err(GrabError::EmptyFrame);
    }
    let frame = image::load_from_memory_with_format(bytes, ImageFormat::Pnm)?.to_rgb8();
    let (width, height) = frame.dimensions();
    Ok(RawImage::new(width, height, PixelFormat::Rgb8, frame.into_raw()))
}

/// Cameras in ffmpeg's avfoundation device listing, screens excluded.
///
/// ```text
/// [AVFoundation indev @ 0x7f8] AVFoundation video devices:
/// [AVFoundation indev @ 0x7f8] [0] FaceTime HD Camera
/// [AVFoundation indev @ 0x7f8] [1] Capture screen 0
/// [AVFoundation indev @ 0x7f8] AVFoundation audio devices:
/// ```
pub fn parse_avfoundation_video_devices(listing: &str) -> Vec<VideoDevice> {
    let mut devices = Vec::new();
    let mut in_video_section = false;

    for line in listing.lines() {
        if line.contains("AVFoundation video devices:") {
            in_video_section = true;
            continue;
        }
        if line.contains("AVFoundation audio devices:") {
            break;
        }
        if !in_video_section || line.contains("Capture screen") {
            continue;
        }

        // "[AVFoundation indev @ 0x...] [0] Name"
        let Some((_, entry)) = line.split_once("] [") else {
            continue;
        };
        let Some((index, name)) = entry.split_once("] ") else {
            continue;
        };
        if let Ok(index) = index.trim().parse() {
            devices.push(VideoDevice {
                index,
                name: name.trim().to_string(),
            });
        }
    }

    devices
}

/// Cameras in ffmpeg's dshow device listing.
///
/// ```text
/// [dshow @ 000001] "Integrated Camera" (video)
/// [dshow @ 000001] "Microphone Array" (audio)
/// ```
pub fn parse_dshow_video_devices(listing: &str) -> Vec<VideoDevice> {
    listing
        .lines()
        .filter(|line| line.trim_end().ends_with("(video)"))
        .filter_map(|line| {
            let start = line.find('"')?;
            let end = line[start + 1..].find('"')? + start + 1;
            Some(line[start + 1..end].to_string())
        })
        .enumerate()
        .map(|(index, name)| VideoDevice {
            index: index as u32,
            name,
        })
        .collect()
}

/// Whether `device` (an index, a name, or dshow's `video=Name`) is listed.
fn device_listed(device: &str, devices: &[VideoDevice]) -> bool {
    let wanted = device.strip_prefix("video=").unwrap_or(device);
    match wanted.parse::<u32>() {
        Ok(index) => devices.iter().any(|d| d.index == index),
        Err(_) => devices.iter().any(|d| d.name == wanted),
    }
}
