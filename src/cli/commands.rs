//! Subcommand handlers for serve, capture, check and config actions.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Notify;

use super::args::{Args, ConfigAction};
use crate::bridge::{CaptureBridge, CaptureResult, PresentationHost};
use crate::channel::{serve_stdio, ChannelRegistry};
use crate::config::{default_path as get_config_path, Config, DEFAULT_CONFIG};
use crate::platform::{CameraSettings, FfmpegCamera, PngImageEncoder, TerminalCamera, TerminalHost};
use crate::plugin::PhotoPickerPlugin;

/// Camera settings from the config file with CLI overrides applied.
pub fn camera_settings(args: &Args, config: &Config) -> Result<CameraSettings, String> {
    let mut settings =
        CameraSettings::from_config(&config.camera).map_err(|e| e.to_string())?;
    if let Some(device) = &args.device {
        settings.device = device.clone();
    }
    if let Some(input_format) = &args.input_format {
        settings.input_format = input_format.clone();
    }
    if args.resolution.is_some() {
        settings.resolution = args.resolution;
    }
    Ok(settings)
}

fn new_runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Runtime::new().map_err(|e| format!("Failed to create async runtime: {}", e))
}

fn build_bridge(settings: CameraSettings) -> Result<(CaptureBridge, Arc<TerminalCamera>), String> {
    let camera = Arc::new(TerminalCamera::new(FfmpegCamera::new(settings)));
    let host = TerminalHost::new().map_err(|e| format!("Failed to start UI thread: {}", e))?;
    let bridge = CaptureBridge::new(camera.clone(), Arc::new(host), Arc::new(PngImageEncoder));
    Ok((bridge, camera))
}

/// Set up the Ctrl+C handler.
///
/// Ctrl+C dismisses an open capture prompt; with no prompt open, `on_idle`
/// runs instead. Can only be installed once per process.
fn install_interrupt_handler<F>(camera: Arc<TerminalCamera>, mut on_idle: F) -> Result<(), String>
where
    F: FnMut() + Send + 'static,
{
    ctrlc::set_handler(move || {
        if !camera.interrupt() {
            on_idle();
        }
    })
    .map_err(|e| format!("Failed to install Ctrl+C handler: {}", e))
}

/// Serve the photo picker channel on stdin/stdout until input closes or Ctrl+C.
pub fn serve(settings: CameraSettings, channel: &str) -> Result<(), String> {
    let rt = new_runtime()?;
    let (bridge, camera) = build_bridge(settings)?;

    let shutdown = Arc::new(Notify::new());
    let notify = Arc::clone(&shutdown);
    install_interrupt_handler(camera, move || notify.notify_one())?;

    let mut registry = ChannelRegistry::new();
    PhotoPickerPlugin::new(bridge).register(&mut registry, channel);
    log::info!("Serving channel '{}' on stdin/stdout", channel);

    let result = rt.block_on(serve_stdio(Arc::new(registry), async move {
        shutdown.notified().await
    }));
    // stdin is read on a blocking thread that cannot be interrupted
    rt.shutdown_background();

    result.map_err(|e| format!("Channel host failed: {}", e))
}

/// Take one photo and write it to `output`.
pub fn capture(settings: CameraSettings, output: &Path) -> Result<(), String> {
    let rt = new_runtime()?;
    let (bridge, camera) = build_bridge(settings)?;
    install_interrupt_handler(camera, || {
        eprintln!("\nReceived Ctrl+C, shutting down...");
        std::process::exit(130);
    })?;

    let result = rt.block_on(bridge.capture()).map_err(|e| e.to_string())?;
    write_result(result, output)
}

fn write_result(result: CaptureResult, output: &Path) -> Result<(), String> {
    match result {
        CaptureResult::Success(bytes) => {
            std::fs::write(output, &bytes)
                .map_err(|e| format!("Failed to write '{}': {}", output.display(), e))?;
            println!("Saved {} ({} bytes)", output.display(), bytes.len());
            Ok(())
        }
        CaptureResult::Cancelled => {
            println!("Capture cancelled.");
            Ok(())
        }
        CaptureResult::Failed { kind, message } => Err(format!("{} [{}]", message, kind)),
    }
}

/// Report camera and terminal availability.
pub fn check(settings: CameraSettings) -> Result<(), String> {
    let rt = new_runtime()?;
    let probe = rt.block_on(FfmpegCamera::new(settings.clone()).probe());

    println!(
        "FFmpeg:   {} ({})",
        if probe.ffmpeg_found { "found" } else { "not found" },
        settings.ffmpeg
    );
    println!("Input:    {} {}", settings.input_format, settings.device);
    if !probe.devices.is_empty() {
        println!("Cameras:");
        for device in &probe.devices {
            println!("  {}", device);
        }
    }
    match &probe.details {
        None => println!("Camera:   available"),
        Some(details) => println!("Camera:   unavailable ({})", details),
    }

    let host = TerminalHost::new().map_err(|e| format!("Failed to start UI thread: {}", e))?;
    match host.active_surface() {
        Some(surface) => println!("Terminal: {}", surface),
        None => println!("Terminal: none (captures will fail with NO_PRESENTATION_CONTEXT)"),
    }

    if probe.available {
        Ok(())
    } else {
        Err("Camera is not available".to_string())
    }
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, config: &Config, settings: &CameraSettings) {
    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            println!("  FFmpeg: {}", settings.ffmpeg);
            println!("  Input format: {}", settings.input_format);
            println!("  Device: {}", settings.device);
            match settings.resolution {
                Some((width, height)) => println!("  Resolution: {}x{}", width, height),
                None => println!("  Resolution: device default"),
            }
            println!("  Channel: {}", config.channel.name);
            println!("  Log level: {}", config.log.level);
            println!();

            let config_path = get_config_path();
            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
        }
        ConfigAction::Init => {
            let config_path = get_config_path();

            if config_path.exists() {
                eprintln!("Config file already exists: {}", config_path.display());
                eprintln!("Use 'photo-bridge config show' to view current settings.");
                std::process::exit(1);
            }

            if let Some(parent) = config_path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    eprintln!("Error creating config directory: {}", e);
                    std::process::exit(1);
                }
            }

            if let Err(e) = std::fs::write(&config_path, DEFAULT_CONFIG) {
                eprintln!("Error writing config file: {}", e);
                std::process::exit(1);
            }

            println!("Created config file: {}", config_path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ErrorKind;
    use clap::Parser;

    #[test]
    fn test_camera_settings_from_config() {
        let args = Args::parse_from(["photo-bridge", "check"]);
        let mut config = Config::default();
        config.camera.device = "/dev/video3".to_string();
        config.camera.resolution = Some("320x240".to_string());

        let settings = camera_settings(&args, &config).unwrap();
        assert_eq!(settings.device, "/dev/video3");
        assert_eq!(settings.resolution, Some((320, 240)));
    }

    #[test]
    fn test_camera_settings_cli_overrides_config() {
        let args = Args::parse_from([
            "photo-bridge",
            "check",
            "--device",
            "1",
            "--input-format",
            "avfoundation",
            "--resolution",
            "1280x720",
        ]);
        let mut config = Config::default();
        config.camera.device = "/dev/video3".to_string();
        config.camera.resolution = Some("320x240".to_string());

        let settings = camera_settings(&args, &config).unwrap();
        assert_eq!(settings.device, "1");
        assert_eq!(settings.input_format, "avfoundation");
        assert_eq!(settings.resolution, Some((1280, 720)));
    }

    #[test]
    fn test_camera_settings_invalid_config_resolution() {
        let args = Args::parse_from(["photo-bridge", "check"]);
        let mut config = Config::default();
        config.camera.resolution = Some("tiny".to_string());
        assert!(camera_settings(&args, &config).is_err());
    }

    #[test]
    fn test_write_result_success_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("photo.png");

        write_result(CaptureResult::Success(vec![1, 2, 3]), &output).unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_write_result_cancel_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("photo.png");

        write_result(CaptureResult::Cancelled, &output).unwrap();
        assert!(!output.exists());
    }

    #[test]
    fn test_write_result_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("photo.png");

        let err = write_result(
            CaptureResult::failed(ErrorKind::CameraUnavailable, "Camera is not available"),
            &output,
        )
        .unwrap_err();
        assert!(err.contains("CAMERA_UNAVAILABLE"));
        assert!(!output.exists());
    }
}
