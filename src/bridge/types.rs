//! Bridge types and data structures.

use std::fmt;

/// Identifier of one capture request, unique per bridge instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a capture request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The capture provider is not present or usable on this device
    CameraUnavailable,
    /// No active surface to present the capture UI onto
    NoPresentationContext,
    /// The captured image could not be encoded
    ImageConversionFailed,
}

impl ErrorKind {
    /// Error identifier used on the method channel.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::CameraUnavailable => "CAMERA_UNAVAILABLE",
            ErrorKind::NoPresentationContext => "NO_PRESENTATION_CONTEXT",
            ErrorKind::ImageConversionFailed => "IMAGE_CONVERSION_FAILED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of one capture request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureResult {
    /// Encoded image bytes
    Success(Vec<u8>),
    /// The user dismissed the capture UI without taking a photo
    Cancelled,
    /// The request failed; terminal for this request
    Failed { kind: ErrorKind, message: String },
}

impl CaptureResult {
    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        CaptureResult::Failed {
            kind,
            message: message.into(),
        }
    }

    /// Short outcome label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            CaptureResult::Success(_) => "success",
            CaptureResult::Cancelled => "cancelled",
            CaptureResult::Failed { .. } => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CaptureResult::Success(_))
    }
}

/// Pixel layout of a raw captured image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit grayscale (1 byte per pixel)
    Gray8,
    /// RGB (3 bytes per pixel)
    Rgb8,
    /// RGBA (4 bytes per pixel)
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// An unencoded image as reported by a capture provider.
#[derive(Clone, PartialEq, Eq)]
pub struct RawImage {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Pixel layout of `data`
    pub format: PixelFormat,
    /// Tightly packed pixel rows
    pub data: Vec<u8>,
}

impl RawImage {
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            data,
        }
    }

    /// Number of bytes `data` must hold for the declared dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

impl fmt::Debug for RawImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("len", &self.data.len())
            .finish()
    }
}

/// A surface the capture UI can be presented onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    name: String,
}

impl Surface {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Observable state of a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// No request pending
    Idle,
    /// A request is stored and waiting for presentation
    Requested(RequestId),
    /// The capture UI is on screen for this request
    Presenting(RequestId),
}

impl BridgeState {
    pub fn is_idle(&self) -> bool {
        matches!(self, BridgeState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        assert_eq!(ErrorKind::CameraUnavailable.code(), "CAMERA_UNAVAILABLE");
        assert_eq!(
            ErrorKind::NoPresentationContext.code(),
            "NO_PRESENTATION_CONTEXT"
        );
        assert_eq!(
            ErrorKind::ImageConversionFailed.to_string(),
            "IMAGE_CONVERSION_FAILED"
        );
    }

    #[test]
    fn test_raw_image_expected_len() {
        let image = RawImage::new(4, 3, PixelFormat::Rgb8, vec![]);
        assert_eq!(image.expected_len(), 36);

        let image = RawImage::new(4, 3, PixelFormat::Rgba8, vec![]);
        assert_eq!(image.expected_len(), 48);

        let image = RawImage::new(4, 3, PixelFormat::Gray8, vec![]);
        assert_eq!(image.expected_len(), 12);
    }

    #[test]
    fn test_raw_image_debug_omits_pixels() {
        let image = RawImage::new(2, 1, PixelFormat::Rgb8, vec![0; 6]);
        let debug = format!("{:?}", image);
        assert!(debug.contains("len: 6"));
        assert!(!debug.contains("[0, 0"));
    }

    #[test]
    fn test_capture_result_failed_helper() {
        let result = CaptureResult::failed(ErrorKind::CameraUnavailable, "no camera");
        assert_eq!(
            result,
            CaptureResult::Failed {
                kind: ErrorKind::CameraUnavailable,
                message: "no camera".to_string()
            }
        );
        assert_eq!(result.label(), "failed");
        assert!(!result.is_success());
    }

    #[test]
    fn test_request_id_display() {
        assert_eq!(RequestId(7).to_string(), "#7");
    }
}
