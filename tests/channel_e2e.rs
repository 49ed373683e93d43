//! End-to-end tests for the photo picker over the JSON-lines channel host.
//!
//! A scripted camera stands in for the device; calls and responses travel
//! through in-memory pipes exactly as they would over stdin/stdout.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use photo_bridge::bridge::{
    CaptureBridge, CaptureProvider, CaptureSession, PixelFormat, PresentationHost, RawImage,
    Surface, UiTask,
};
use photo_bridge::channel::{serve, ChannelError, ChannelRegistry};
use photo_bridge::platform::PngImageEncoder;
use photo_bridge::plugin::{PhotoPickerPlugin, CHANNEL_NAME};

struct ScriptedCamera {
    available: bool,
    sessions: Mutex<Vec<CaptureSession>>,
}

impl ScriptedCamera {
    async fn session(&self, n: usize) -> CaptureSession {
        for _ in 0..200 {
            if let Some(session) = self.sessions.lock().unwrap().get(n - 1).cloned() {
                return session;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("capture UI was never presented for request {}", n);
    }
}

#[async_trait]
impl CaptureProvider for ScriptedCamera {
    async fn is_available(&self) -> bool {
        self.available
    }

    fn present(&self, _surface: &Surface, session: CaptureSession) {
        self.sessions.lock().unwrap().push(session);
    }

    fn dismiss(&self) {}
}

struct InlineHost;

impl PresentationHost for InlineHost {
    fn active_surface(&self) -> Option<Surface> {
        Some(Surface::new("test"))
    }

    fn run_on_ui(&self, task: UiTask) {
        task();
    }
}

/// A running channel host and the caller's ends of its pipes.
struct Harness {
    camera: Arc<ScriptedCamera>,
    input: DuplexStream,
    output: Lines<BufReader<DuplexStream>>,
    shutdown: Arc<Notify>,
    server: JoinHandle<Result<(), ChannelError>>,
}

impl Harness {
    fn start(available: bool) -> Self {
        let camera = Arc::new(ScriptedCamera {
            available,
            sessions: Mutex::new(Vec::new()),
        });
        let bridge = CaptureBridge::new(camera.clone(), Arc::new(InlineHost), Arc::new(PngImageEncoder));

        let mut registry = ChannelRegistry::new();
        PhotoPickerPlugin::new(bridge).register(&mut registry, CHANNEL_NAME);

        let (input, server_input) = duplex(4096);
        let (server_output, output) = duplex(64 * 1024);
        let shutdown = Arc::new(Notify::new());
        let notify = Arc::clone(&shutdown);
        let server = tokio::spawn(serve(
            Arc::new(registry),
            BufReader::new(server_input),
            server_output,
            async move { notify.notified().await },
        ));

        Self {
            camera,
            input,
            output: BufReader::new(output).lines(),
            shutdown,
            server,
        }
    }

    async fn call(&mut self, id: u64, method: &str) {
        let line = serde_json::json!({
            "id": id,
            "channel": CHANNEL_NAME,
            "method": method,
        })
        .to_string();
        self.send_line(&line).await;
    }

    async fn send_line(&mut self, line: &str) {
        self.input.write_all(line.as_bytes()).await.unwrap();
        self.input.write_all(b"\n").await.unwrap();
    }

    async fn response(&mut self) -> Value {
        let line = tokio::time::timeout(Duration::from_secs(5), self.output.next_line())
            .await
            .expect("timed out waiting for a response")
            .unwrap()
            .expect("channel host closed its output");
        serde_json::from_str(&line).unwrap()
    }
}

#[tokio::test]
async fn test_pick_photo_returns_hex_png() {
    let mut harness = Harness::start(true);
    harness.call(1, "pickPhoto").await;

    let image = RawImage::new(1, 1, PixelFormat::Rgb8, vec![0, 128, 255]);
    assert!(harness.camera.session(1).await.finish(Some(image)));

    let response = harness.response().await;
    assert_eq!(response["id"], 1);
    assert_eq!(response["status"], "success");
    let data = hex::decode(response["data"].as_str().unwrap()).unwrap();
    assert!(data.starts_with(b"\x89PNG"));
}

#[tokio::test]
async fn test_cancelled_pick_is_success_without_data() {
    let mut harness = Harness::start(true);
    harness.call(3, "pickPhoto").await;
    harness.camera.session(1).await.cancel();

    let response = harness.response().await;
    assert_eq!(response["id"], 3);
    assert_eq!(response["status"], "success");
    assert!(response["data"].is_null());
}

#[tokio::test]
async fn test_unavailable_camera_is_error() {
    let mut harness = Harness::start(false);
    harness.call(4, "pickPhoto").await;

    let response = harness.response().await;
    assert_eq!(response["id"], 4);
    assert_eq!(response["status"], "error");
    assert_eq!(response["code"], "CAMERA_UNAVAILABLE");
    assert!(response["details"].is_null());
}

#[tokio::test]
async fn test_unknown_method_is_not_implemented() {
    let mut harness = Harness::start(true);
    harness.call(5, "pickVideo").await;

    let response = harness.response().await;
    assert_eq!(response["id"], 5);
    assert_eq!(response["status"], "not_implemented");
}

#[tokio::test]
async fn test_overlapping_pick_is_rejected_and_first_still_answers() {
    let mut harness = Harness::start(true);
    harness.call(1, "pickPhoto").await;
    let session = harness.camera.session(1).await;

    harness.call(2, "pickPhoto").await;
    let rejected = harness.response().await;
    assert_eq!(rejected["id"], 2);
    assert_eq!(rejected["code"], "CAPTURE_IN_PROGRESS");

    session.cancel();
    let first = harness.response().await;
    assert_eq!(first["id"], 1);
    assert_eq!(first["status"], "success");
}

#[tokio::test]
async fn test_calls_are_answered_while_capture_waits() {
    let mut harness = Harness::start(true);
    harness.call(1, "pickPhoto").await;
    let session = harness.camera.session(1).await;

    harness.send_line("not json").await;
    let bad = harness.response().await;
    assert_eq!(bad["code"], "BAD_REQUEST");

    session.cancel();
    assert_eq!(harness.response().await["id"], 1);
}

#[tokio::test]
async fn test_shutdown_releases_pending_pick() {
    let mut harness = Harness::start(true);
    harness.call(9, "pickPhoto").await;
    harness.camera.session(1).await;

    harness.shutdown.notify_one();

    let response = harness.response().await;
    assert_eq!(response["id"], 9);
    assert_eq!(response["status"], "error");
    assert_eq!(response["code"], "BRIDGE_SHUT_DOWN");
    harness.server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_end_of_input_waits_for_pending_pick() {
    let Harness {
        camera,
        input,
        mut output,
        server,
        ..
    } = {
        let mut harness = Harness::start(true);
        harness.call(1, "pickPhoto").await;
        harness
    };
    let session = camera.session(1).await;
    drop(input);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!server.is_finished());

    session.cancel();
    let line = output.next_line().await.unwrap().unwrap();
    let response: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(response["id"], 1);
    server.await.unwrap().unwrap();
    assert!(output.next_line().await.unwrap().is_none());
}
