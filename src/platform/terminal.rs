//! Terminal presentation: the controlling TTY is the foreground surface.
//!
//! [`TerminalHost`] runs UI work on a dedicated thread and reports the TTY as
//! the active surface when there is one. [`TerminalCamera`] presents a
//! prompt on that TTY and grabs a frame through [`FfmpegCamera`] once the
//! user confirms. One reader thread per camera owns the TTY input and hands
//! each line to whichever capture is open.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use async_trait::async_trait;

use super::ffmpeg::FfmpegCamera;
use crate::bridge::{CaptureProvider, CaptureSession, PresentationHost, Surface, UiTask};

/// Path of the controlling terminal.
#[cfg(unix)]
pub const DEFAULT_TTY: &str = "/dev/tty";
#[cfg(windows)]
pub const DEFAULT_TTY: &str = "CONIN$";
#[cfg(not(any(unix, windows)))]
pub const DEFAULT_TTY: &str = "";

fn open_tty(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).open(path)
}

/// Presentation host backed by the process's terminal.
pub struct TerminalHost {
    tty_path: PathBuf,
    ui_tx: Option<Sender<UiTask>>,
    ui_thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for TerminalHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalHost")
            .field("tty_path", &self.tty_path)
            .finish_non_exhaustive()
    }
}

impl TerminalHost {
    /// Host on the controlling terminal.
    pub fn new() -> io::Result<Self> {
        Self::with_tty(DEFAULT_TTY)
    }

    /// Host on a specific terminal device.
    ///
    /// Spawns the UI thread; it runs until the host is dropped.
    pub fn with_tty(tty_path: impl Into<PathBuf>) -> io::Result<Self> {
        let (ui_tx, ui_rx) = mpsc::channel::<UiTask>();
        let ui_thread = thread::Builder::new()
            .name("photo-bridge-ui".to_string())
            .spawn(move || {
                while let Ok(task) = ui_rx.recv() {
                    task();
                }
                log::debug!("UI thread stopped");
            })?;

        Ok(Self {
            tty_path: tty_path.into(),
            ui_tx: Some(ui_tx),
            ui_thread: Some(ui_thread),
        })
    }
}

impl PresentationHost for TerminalHost {
    fn active_surface(&self) -> Option<Surface> {
        match open_tty(&self.tty_path) {
            Ok(file) if file.is_terminal() => {
                Some(Surface::new(self.tty_path.to_string_lossy()))
            }
            Ok(_) => {
                log::debug!("{} is not a terminal", self.tty_path.display());
                None
            }
            Err(e) => {
                log::debug!("No terminal at {}: {}", self.tty_path.display(), e);
                None
            }
        }
    }

    fn run_on_ui(&self, task: UiTask) {
        let task = match &self.ui_tx {
            Some(tx) => match tx.send(task) {
                Ok(()) => return,
                Err(mpsc::SendError(task)) => task,
            },
            None => task,
        };
        log::error!("UI thread is gone; running UI task on the calling thread");
        task();
    }
}

impl Drop for TerminalHost {
    fn drop(&mut self) {
        self.ui_tx.take();
        if let Some(handle) = self.ui_thread.take() {
            let _ = handle.join();
        }
    }
}

/// Capture provider that prompts on the terminal and grabs a frame with ffmpeg.
pub struct TerminalCamera {
    camera: Arc<FfmpegCamera>,
    active: Arc<Mutex<Option<CaptureSession>>>,
    reader: Mutex<Option<PromptReader>>,
}

/// The thread reading terminal input for a camera.
struct PromptReader {
    tty: PathBuf,
    /// Cleared when input ends or the reader is replaced
    alive: Arc<AtomicBool>,
}

impl std::fmt::Debug for TerminalCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalCamera")
            .field("camera", &self.camera)
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TerminalCamera {
    pub fn new(camera: FfmpegCamera) -> Self {
        Self {
            camera: Arc::new(camera),
            active: Arc::new(Mutex::new(None)),
            reader: Mutex::new(None),
        }
    }

    /// Dismiss the prompt on screen, as if the user cancelled.
    ///
    /// Returns whether a capture was active.
    pub fn interrupt(&self) -> bool {
        let session = lock(&self.active).take();
        match session {
            Some(session) => {
                log::info!("Capture {} interrupted", session.id());
                session.cancel()
            }
            None => false,
        }
    }

    /// Start the thread that answers prompts from `input`, retiring any
    /// previous reader.
    pub(crate) fn spawn_reader<R>(&self, tty: PathBuf, input: R) -> io::Result<()>
    where
        R: BufRead + Send + 'static,
    {
        let alive = Arc::new(AtomicBool::new(true));
        let camera = Arc::clone(&self.camera);
        let active = Arc::clone(&self.active);
        let flag = Arc::clone(&alive);
        thread::Builder::new()
            .name("photo-bridge-prompt".to_string())
            .spawn(move || read_prompts(input, &camera, &active, &flag))?;

        if let Some(old) = lock(&self.reader).replace(PromptReader { tty, alive }) {
            old.alive.store(false, Ordering::SeqCst);
        }
        Ok(())
    }

    /// Make sure a live reader is attached to `tty`.
    fn ensure_reader(&self, tty: &Path) -> io::Result<()> {
        let attached = lock(&self.reader)
            .as_ref()
            .is_some_and(|r| r.tty == tty && r.alive.load(Ordering::SeqCst));
        if attached {
            return Ok(());
        }
        let file = open_tty(tty)?;
        self.spawn_reader(tty.to_path_buf(), BufReader::new(file))
    }
}

impl Drop for TerminalCamera {
    fn drop(&mut self) {
        // The reader may be blocked on input; it exits after its next line.
        if let Some(reader) = lock(&self.reader).take() {
            reader.alive.store(false, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl CaptureProvider for TerminalCamera {
    async fn is_available(&self) -> bool {
        let probe = self.camera.probe().await;
        if let Some(details) = &probe.details {
            log::warn!("Camera unavailable: {}", details);
        }
        probe.available
    }

    fn present(&self, surface: &Surface, session: CaptureSession) {
        *lock(&self.active) = Some(session.clone());

        if let Err(e) = self.ensure_reader(Path::new(surface.name())) {
            log::error!("Failed to open {}: {}", surface, e);
            session.cancel();
            return;
        }
        eprintln!("Camera ready. Press Enter to take a photo, or type q and Enter to cancel.");
    }

    fn dismiss(&self) {
        lock(&self.active).take();
        eprintln!("Camera closed.");
    }
}

enum PromptAnswer {
    Capture,
    Cancel,
    Unknown,
}

fn parse_answer(line: &str) -> PromptAnswer {
    match line.trim() {
        "" => PromptAnswer::Capture,
        "q" | "Q" | "quit" | "cancel" => PromptAnswer::Cancel,
        _ => PromptAnswer::Unknown,
    }
}

/// Reader thread body: routes each input line to the open capture.
///
/// Lines typed while no capture is open are dropped. End of input or a read
/// error cancels the open capture and stops the reader.
fn read_prompts<R: BufRead>(
    mut input: R,
    camera: &FfmpegCamera,
    active: &Mutex<Option<CaptureSession>>,
    alive: &AtomicBool,
) {
    let mut line = String::new();
    loop {
        line.clear();
        let read = input.read_line(&mut line);
        if !alive.load(Ordering::SeqCst) {
            log::debug!("Prompt reader retired");
            return;
        }

        match read {
            Ok(0) => {
                log::debug!("Terminal input closed");
                stop_reading(active, alive);
                return;
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("Failed to read terminal input: {}", e);
                stop_reading(active, alive);
                return;
            }
        }

        let Some(session) = lock(active).clone() else {
            log::debug!("Ignoring terminal input with no capture open");
            continue;
        };

        match parse_answer(&line) {
            PromptAnswer::Capture => {
                eprintln!("Capturing...");
                match camera.grab_frame() {
                    Ok(image) => session.finish(Some(image)),
                    Err(e) => {
                        log::error!("Frame grab failed: {}", e);
                        session.fail(e.to_string())
                    }
                };
            }
            PromptAnswer::Cancel => {
                session.cancel();
            }
            PromptAnswer::Unknown => {
                eprintln!("Press Enter to take a photo, or type q and Enter to cancel.")
            }
        }
    }
}

fn stop_reading(active: &Mutex<Option<CaptureSession>>, alive: &AtomicBool) {
    alive.store(false, Ordering::SeqCst);
    let session = lock(active).clone();
    if let Some(session) = session {
        session.cancel();
    }
}
