//! Photo picker plugin: exposes the capture bridge on a method channel.

use std::sync::Arc;

use async_trait::async_trait;

use crate::bridge::{CaptureBridge, CaptureResult};
use crate::channel::{ChannelRegistry, MethodCall, MethodCallHandler, MethodResponse};

/// Default channel the plugin registers under.
pub const CHANNEL_NAME: &str = "photo_bridge/photo_picker";

/// Method that takes a photo. It has no arguments.
pub const PICK_PHOTO: &str = "pickPhoto";

/// Answers `pickPhoto` calls with the outcome of one bridge capture.
#[derive(Debug, Clone)]
pub struct PhotoPickerPlugin {
    bridge: CaptureBridge,
}

impl PhotoPickerPlugin {
    pub fn new(bridge: CaptureBridge) -> Self {
        Self { bridge }
    }

    /// Install the plugin on `registry` under `channel`.
    pub fn register(self, registry: &mut ChannelRegistry, channel: &str) {
        registry.register(channel, Arc::new(self));
    }

    async fn pick_photo(&self) -> MethodResponse {
        match self.bridge.capture().await {
            Ok(result) => to_response(result),
            Err(e) => MethodResponse::error(e.code(), e.to_string()),
        }
    }
}

#[async_trait]
impl MethodCallHandler for PhotoPickerPlugin {
    async fn handle(&self, call: MethodCall) -> MethodResponse {
        match call.method.as_str() {
            PICK_PHOTO => self.pick_photo().await,
            other => {
                log::warn!("Method '{}' is not implemented", other);
                MethodResponse::NotImplemented
            }
        }
    }

    fn shutdown(&self) {
        self.bridge.shutdown();
    }
}

/// Map a capture outcome onto the channel's result encoding.
///
/// Cancellation is an empty success, not an error.
pub fn to_response(result: CaptureResult) -> MethodResponse {
    match result {
        CaptureResult::Success(bytes) => MethodResponse::Success(Some(bytes)),
        CaptureResult::Cancelled => MethodResponse::Success(None),
        CaptureResult::Failed { kind, message } => MethodResponse::error(kind.code(), message),
    }
}
