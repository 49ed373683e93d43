//! The capture bridge and its per-request state machine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use super::error::BridgeError;
use super::ports::{CaptureProvider, ImageEncoder, PresentationHost};
use super::session::CaptureSession;
use super::types::{BridgeState, CaptureResult, ErrorKind, RawImage, RequestId};

/// Adapts a callback-driven capture UI into a single awaited result.
///
/// At most one request is pending per bridge. A request moves
/// `Requested -> Presenting -> Resolved`, or straight to `Resolved` when the
/// camera is unavailable or no surface can host the UI. Resolution goes
/// through one guarded transition, so every request completes exactly once.
///
/// Cloning is cheap; clones share the same completion slot.
#[derive(Clone)]
pub struct CaptureBridge {
    inner: Arc<BridgeInner>,
}

impl std::fmt::Debug for CaptureBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureBridge")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl CaptureBridge {
    pub fn new(
        provider: Arc<dyn CaptureProvider>,
        host: Arc<dyn PresentationHost>,
        encoder: Arc<dyn ImageEncoder>,
    ) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                provider,
                host,
                encoder,
                slot: Mutex::new(Slot::Idle),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Take a photo.
    ///
    /// Resolves once the user captures or dismisses, or immediately when the
    /// camera is unavailable or there is nothing to present onto. There is no
    /// timeout: the wait lasts as long as the capture UI stays up.
    ///
    /// # Errors
    /// * `BridgeError::CaptureInProgress` - another request is pending; it is
    ///   left untouched
    /// * `BridgeError::Abandoned` - the request was dropped by [`shutdown`](Self::shutdown)
    pub async fn capture(&self) -> Result<CaptureResult, BridgeError> {
        let (id, completion) = self.inner.begin()?;
        let mut guard = PendingGuard {
            inner: &self.inner,
            id,
            armed: true,
        };

        if self.inner.provider.is_available().await {
            let inner = Arc::clone(&self.inner);
            self.inner.host.run_on_ui(Box::new(move || inner.present(id)));
        } else {
            self.inner.resolve(
                id,
                CaptureResult::failed(
                    ErrorKind::CameraUnavailable,
                    "Camera is not available on this device",
                ),
            );
        }
        guard.armed = false;

        completion.await.map_err(|_| BridgeError::Abandoned)
    }

    /// Current state of the completion slot.
    pub fn state(&self) -> BridgeState {
        self.inner.state()
    }

    /// Drop the pending request without a result and take its UI down.
    ///
    /// The waiting caller gets `BridgeError::Abandoned`. Returns whether a
    /// request was pending.
    pub fn shutdown(&self) -> bool {
        match self.inner.take_pending(None) {
            Some(request) => {
                log::info!("Abandoning capture request {} on shutdown", request.id);
                self.inner.provider.dismiss();
                true
            }
            None => false,
        }
    }
}

/// Clears a request whose `capture()` future is dropped before the UI was
/// scheduled, so the bridge does not stay busy with nobody presenting.
struct PendingGuard<'a> {
    inner: &'a BridgeInner,
    id: RequestId,
    armed: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed && self.inner.take_pending(Some(self.id)).is_some() {
            log::debug!("Request {} dropped before presentation", self.id);
        }
    }
}

pub(crate) struct BridgeInner {
    provider: Arc<dyn CaptureProvider>,
    host: Arc<dyn PresentationHost>,
    encoder: Arc<dyn ImageEncoder>,
    slot: Mutex<Slot>,
    next_id: AtomicU64,
}

enum Slot {
    Idle,
    Pending(PendingRequest),
}

struct PendingRequest {
    id: RequestId,
    phase: Phase,
    completion: oneshot::Sender<CaptureResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Requested,
    Presenting,
}

impl BridgeInner {
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        // The slot holds no invariant a panicking holder could break halfway.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> BridgeState {
        match &*self.lock_slot() {
            Slot::Idle => BridgeState::Idle,
            Slot::Pending(request) => match request.phase {
                Phase::Requested => BridgeState::Requested(request.id),
                Phase::Presenting => BridgeState::Presenting(request.id),
            },
        }
    }

    pub(crate) fn is_pending(&self, id: RequestId) -> bool {
        matches!(&*self.lock_slot(), Slot::Pending(request) if request.id == id)
    }

    /// `Idle -> Requested`
    fn begin(&self) -> Result<(RequestId, oneshot::Receiver<CaptureResult>), BridgeError> {
        let mut slot = self.lock_slot();
        if let Slot::Pending(request) = &*slot {
            log::warn!(
                "Rejecting capture: request {} is still pending",
                request.id
            );
            return Err(BridgeError::CaptureInProgress);
        }

        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (completion, receiver) = oneshot::channel();
        *slot = Slot::Pending(PendingRequest {
            id,
            phase: Phase::Requested,
            completion,
        });
        log::debug!("Capture request {} started", id);
        Ok((id, receiver))
    }

    /// `Requested -> Presenting`. False if `id` is no longer pending.
    fn mark_presenting(&self, id: RequestId) -> bool {
        match &mut *self.lock_slot() {
            Slot::Pending(request) if request.id == id => {
                request.phase = Phase::Presenting;
                true
            }
            _ => false,
        }
    }

    /// The single exit from the pending state.
    ///
    /// With `Some(id)`, only that request is taken; a stale id leaves the slot
    /// alone. With `None`, whatever is pending is taken.
    fn take_pending(&self, id: Option<RequestId>) -> Option<PendingRequest> {
        let mut slot = self.lock_slot();
        let matches = match (&*slot, id) {
            (Slot::Pending(request), Some(id)) => request.id == id,
            (Slot::Pending(_), None) => true,
            (Slot::Idle, _) => false,
        };
        if !matches {
            return None;
        }
        match std::mem::replace(&mut *slot, Slot::Idle) {
            Slot::Pending(request) => Some(request),
            Slot::Idle => None,
        }
    }

    fn resolve(&self, id: RequestId, result: CaptureResult) -> bool {
        match self.take_pending(Some(id)) {
            Some(request) => {
                complete(request, result);
                true
            }
            None => {
                log::debug!("Ignoring resolution of request {}: not pending", id);
                false
            }
        }
    }

    /// Runs on the host's UI context.
    fn present(self: &Arc<Self>, id: RequestId) {
        let Some(surface) = self.host.active_surface() else {
            self.resolve(
                id,
                CaptureResult::failed(
                    ErrorKind::NoPresentationContext,
                    "Could not find an active presentation surface",
                ),
            );
            return;
        };

        if !self.mark_presenting(id) {
            log::debug!("Request {} resolved before it could be presented", id);
            return;
        }

        log::debug!("Presenting capture UI for request {} on {}", id, surface);
        self.provider
            .present(&surface, CaptureSession::new(Arc::downgrade(self), id));
    }

    /// `image` is the photo, or why the provider could not produce one.
    pub(crate) fn on_finished(&self, id: RequestId, image: Result<RawImage, String>) -> bool {
        let Some(request) = self.take_pending(Some(id)) else {
            log::warn!("Capture report for request {} arrived after resolution", id);
            return false;
        };
        self.provider.dismiss();

        let format = self.encoder.format_name();
        let result = match image.and_then(|image| self.encoder.encode(&image).map_err(|e| e.to_string())) {
            Ok(bytes) => CaptureResult::Success(bytes),
            Err(reason) => CaptureResult::failed(
                ErrorKind::ImageConversionFailed,
                format!("Failed to convert captured image to {}: {}", format, reason),
            ),
        };
        complete(request, result);
        true
    }

    pub(crate) fn on_cancelled(&self, id: RequestId) -> bool {
        let Some(request) = self.take_pending(Some(id)) else {
            log::warn!("Cancellation for request {} arrived after resolution", id);
            return false;
        };
        self.provider.dismiss();
        complete(request, CaptureResult::Cancelled);
        true
    }
}

fn complete(request: PendingRequest, result: CaptureResult) {
    match &result {
        CaptureResult::Success(bytes) => {
            log::info!("Capture request {} succeeded ({} bytes)", request.id, bytes.len())
        }
        CaptureResult::Cancelled => log::info!("Capture request {} cancelled", request.id),
        CaptureResult::Failed { kind, message } => {
            log::info!("Capture request {} failed: {} ({})", request.id, kind, message)
        }
    }
    if request.completion.send(result).is_err() {
        log::debug!("Caller of request {} stopped waiting", request.id);
    }
}
