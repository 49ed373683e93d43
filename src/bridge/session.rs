//! Handle a capture provider uses to report the outcome of one request.

use std::sync::Weak;

use super::capture::BridgeInner;
use super::types::{RawImage, RequestId};

/// Reports the outcome of one presented capture request.
///
/// Sessions are bound to the request they were created for. Once that
/// request is resolved, by this session, a clone of it, or a bridge
/// shutdown, every further call is a no-op returning `false`. A session never
/// keeps its bridge alive.
#[derive(Clone)]
pub struct CaptureSession {
    bridge: Weak<BridgeInner>,
    id: RequestId,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession").field("id", &self.id).finish()
    }
}

impl CaptureSession {
    pub(crate) fn new(bridge: Weak<BridgeInner>, id: RequestId) -> Self {
        Self { bridge, id }
    }

    /// The request this session reports for.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// The user took a photo.
    ///
    /// `None` means the capture UI finished without handing over an image,
    /// which resolves the request as an image conversion failure. Returns
    /// whether this call resolved the request.
    pub fn finish(&self, image: Option<RawImage>) -> bool {
        match self.bridge.upgrade() {
            Some(bridge) => bridge.on_finished(
                self.id,
                image.ok_or_else(|| "no image was returned".to_string()),
            ),
            None => false,
        }
    }

    /// The capture UI could not produce a photo, for `reason`.
    ///
    /// Resolves the request as an image conversion failure carrying the
    /// reason. Returns whether this call resolved the request.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        match self.bridge.upgrade() {
            Some(bridge) => bridge.on_finished(self.id, Err(reason.into())),
            None => false,
        }
    }

    /// The user dismissed the capture UI. Returns whether this call resolved
    /// the request.
    pub fn cancel(&self) -> bool {
        match self.bridge.upgrade() {
            Some(bridge) => bridge.on_cancelled(self.id),
            None => false,
        }
    }

    /// Whether the request is still waiting for an outcome.
    pub fn is_pending(&self) -> bool {
        self.bridge
            .upgrade()
            .is_some_and(|bridge| bridge.is_pending(self.id))
    }
}
