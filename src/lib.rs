//! photo-bridge library crate.
//!
//! Lets a calling application layer take a single photo with the device
//! camera over a named method channel.
//!
//! # Structure
//!
//! - [`bridge`] - Capture bridge: request lifecycle, ports and result types
//! - [`channel`] - Method channel messages, registry and JSON-lines host
//! - [`plugin`] - Photo picker plugin answering `pickPhoto`
//! - [`platform`] - ffmpeg camera, terminal presentation and PNG encoding
//! - [`config`] - Configuration file handling
//! - [`cli`] - Command-line arguments and subcommand handlers

pub mod bridge;
pub mod channel;
pub mod cli;
pub mod config;
pub mod platform;
pub mod plugin;
