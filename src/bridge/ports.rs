//! Collaborator interfaces the bridge is built against.
//!
//! Each port is injected as a trait object so the bridge's resolution logic
//! runs the same against real platform adapters and test doubles.

use async_trait::async_trait;

use super::error::EncodeError;
use super::session::CaptureSession;
use super::types::{RawImage, Surface};

/// Work scheduled onto the presentation host's UI context.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// The facility that shows a camera UI and reports a photo or a dismissal.
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Whether a camera can be used on this device right now.
    async fn is_available(&self) -> bool;

    /// Show the capture UI on `surface`.
    ///
    /// Called on the presentation host's UI context. The outcome is reported
    /// later through `session`, from any thread.
    fn present(&self, surface: &Surface, session: CaptureSession);

    /// Take the capture UI off screen.
    fn dismiss(&self);
}

/// Owner of the application's UI surfaces.
pub trait PresentationHost: Send + Sync {
    /// The active foreground surface, if any.
    fn active_surface(&self) -> Option<Surface>;

    /// Run `task` on the context UI work must happen on.
    fn run_on_ui(&self, task: UiTask);
}

/// Converts a raw image into encoded bytes.
pub trait ImageEncoder: Send + Sync {
    fn encode(&self, image: &RawImage) -> Result<Vec<u8>, EncodeError>;

    /// Format name used in messages (e.g. "PNG").
    fn format_name(&self) -> &'static str;
}
