//! Single-in-flight capture bridge.
//!
//! Turns an external capture UI with callback-style outcomes into one awaited
//! [`CaptureResult`] per request.
//!
//! # Structure
//!
//! - [`types`] - Results, error kinds, raw images and bridge state
//! - [`error`] - Bridge and encoder error types
//! - [`ports`] - Collaborator traits: capture provider, presentation host, encoder
//! - [`session`] - Handle a provider reports outcomes through
//! - [`capture`] - The bridge and its per-request state machine

mod capture;
mod error;
mod ports;
mod session;
mod types;

pub use capture::CaptureBridge;
pub use error::{BridgeError, EncodeError};
pub use ports::{CaptureProvider, ImageEncoder, PresentationHost, UiTask};
pub use session::CaptureSession;
pub use types::{
    BridgeState, CaptureResult, ErrorKind, PixelFormat, RawImage, RequestId, Surface,
};
