//! Bridge-level error types.
//!
//! Capture failures are not errors here: they travel as
//! [`CaptureResult::Failed`](super::CaptureResult::Failed). These types cover
//! invocations the bridge refuses and collaborator failures.

use thiserror::Error;

/// Errors returned by [`CaptureBridge::capture`](super::CaptureBridge::capture)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// Another request is still pending on this bridge
    #[error("A capture is already in progress")]
    CaptureInProgress,
    /// The bridge was dropped before the request was resolved
    #[error("Capture bridge shut down before the request was resolved")]
    Abandoned,
}

impl BridgeError {
    /// Error identifier used on the method channel.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::CaptureInProgress => "CAPTURE_IN_PROGRESS",
            BridgeError::Abandoned => "BRIDGE_SHUT_DOWN",
        }
    }
}

/// Errors raised by an [`ImageEncoder`](super::ImageEncoder).
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Width or height is zero
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    /// Pixel buffer does not match the declared dimensions
    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },
    /// The codec rejected the image
    #[error("Encoding failed: {0}")]
    Encoding(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_error_display() {
        assert_eq!(
            BridgeError::CaptureInProgress.to_string(),
            "A capture is already in progress"
        );
        assert!(BridgeError::Abandoned.to_string().contains("shut down"));
    }

    #[test]
    fn test_bridge_error_codes() {
        assert_eq!(BridgeError::CaptureInProgress.code(), "CAPTURE_IN_PROGRESS");
        assert_eq!(BridgeError::Abandoned.code(), "BRIDGE_SHUT_DOWN");
    }

    #[test]
    fn test_encode_error_display() {
        let err = EncodeError::BufferSizeMismatch {
            expected: 12,
            actual: 10,
        };
        assert_eq!(err.to_string(), "Pixel buffer holds 10 bytes, expected 12");

        let err = EncodeError::EmptyImage {
            width: 0,
            height: 5,
        };
        assert!(err.to_string().contains("0x5"));
    }
}
