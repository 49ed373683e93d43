//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::parse_resolution;

/// Camera capture bridge: takes a photo for a calling application layer
#[derive(Parser, Debug)]
#[command(name = "photo-bridge")]
#[command(version, about = "Camera capture bridge for application layers", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Camera device passed to ffmpeg (overrides config)
    #[arg(long, global = true)]
    pub device: Option<String>,

    /// ffmpeg input format, e.g. avfoundation or v4l2 (overrides config)
    #[arg(long, global = true)]
    pub input_format: Option<String>,

    /// Capture resolution WIDTHxHEIGHT (overrides config)
    #[arg(long, global = true, value_parser = parse_resolution)]
    pub resolution: Option<(u32, u32)>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer photo picker calls as JSON lines on stdin/stdout
    Serve {
        /// Channel name to answer on (overrides config)
        #[arg(long)]
        channel: Option<String>,
    },
    /// Take one photo and save it as PNG
    Capture {
        /// Output file
        #[arg(short, long, default_value = "photo.png")]
        output: PathBuf,
    },
    /// Check camera and terminal availability
    Check,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_defaults() {
        let args = Args::parse_from(["photo-bridge", "serve"]);
        assert!(matches!(args.command, Command::Serve { channel: None }));
        assert!(args.config.is_none());
        assert!(args.device.is_none());
        assert!(args.input_format.is_none());
        assert!(args.resolution.is_none());
    }

    #[test]
    fn test_capture_default_output() {
        let args = Args::parse_from(["photo-bridge", "capture"]);
        match args.command {
            Command::Capture { output } => assert_eq!(output, PathBuf::from("photo.png")),
            other => panic!("Expected Capture, got {:?}", other),
        }
    }

    #[test]
    fn test_capture_output_flag() {
        let args = Args::parse_from(["photo-bridge", "capture", "-o", "/tmp/me.png"]);
        match args.command {
            Command::Capture { output } => assert_eq!(output, PathBuf::from("/tmp/me.png")),
            other => panic!("Expected Capture, got {:?}", other),
        }
    }

    #[test]
    fn test_global_overrides_after_subcommand() {
        let args = Args::parse_from([
            "photo-bridge",
            "check",
            "--device",
            "/dev/video2",
            "--input-format",
            "v4l2",
            "--resolution",
            "640x480",
        ]);
        assert!(matches!(args.command, Command::Check));
        assert_eq!(args.device.as_deref(), Some("/dev/video2"));
        assert_eq!(args.input_format.as_deref(), Some("v4l2"));
        assert_eq!(args.resolution, Some((640, 480)));
    }

    #[test]
    fn test_invalid_resolution_rejected() {
        let result = Args::try_parse_from(["photo-bridge", "check", "--resolution", "big"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_serve_channel_flag() {
        let args = Args::parse_from(["photo-bridge", "serve", "--channel", "app/camera"]);
        match args.command {
            Command::Serve { channel } => assert_eq!(channel.as_deref(), Some("app/camera")),
            other => panic!("Expected Serve, got {:?}", other),
        }
    }

    #[test]
    fn test_config_actions() {
        let args = Args::parse_from(["photo-bridge", "config", "init"]);
        assert!(matches!(
            args.command,
            Command::Config {
                action: ConfigAction::Init
            }
        ));
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Args::try_parse_from(["photo-bridge"]).is_err());
    }
}
