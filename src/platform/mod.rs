//! Platform adapters for the capture bridge ports.
//!
//! # Structure
//!
//! - [`ffmpeg`] - Camera probing and single-frame grabs through ffmpeg
//! - [`terminal`] - Terminal presentation host and prompt-driven capture provider
//! - [`png`] - PNG image encoder

mod ffmpeg;
mod png;
mod terminal;

pub use ffmpeg::{
    decode_frame, grab_args, parse_avfoundation_video_devices, parse_dshow_video_devices,
    CameraProbe, CameraSettings, FfmpegCamera, GrabError, VideoDevice,
};
pub use png::PngImageEncoder;
pub use terminal::{TerminalCamera, TerminalHost, DEFAULT_TTY};
