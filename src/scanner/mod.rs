//! Live camera scanning
//!
//! A session runs on its own worker thread: open the camera, poll frames,
//! feed each one to the decoder and stop at the first hit. The camera lives
//! in a guard so it is stopped on every way out of the loop, and the UI
//! cancels through a shared token rather than by dropping the thread.

pub mod decoder;
pub mod v4l2;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::scanner::{IDLE_POLL_MS, PREVIEW_EVERY_N_FRAMES};

pub use decoder::RqrrDecoder;
pub use v4l2::V4l2Provider;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("No usable camera: {0}")]
    DeviceUnavailable(String),
    #[error("Camera stopped delivering frames: {0}")]
    Capture(String),
}

/// One RGBA frame, row-major, `width * height * 4` bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    /// Rear camera on devices that have one
    #[default]
    Environment,
    User,
}

/// Opened and dropped on the scanner thread, so no `Send` bound
pub trait Camera {
    /// The next frame if one is ready
    fn poll_frame(&mut self) -> Result<Option<Frame>, ScanError>;

    fn supports_torch(&self) -> bool;

    fn set_torch(&mut self, on: bool) -> Result<(), ScanError>;

    /// Release the device; called exactly once
    fn stop(&mut self);
}

pub trait CameraProvider: Send + Sync {
    fn open(&self, facing: Facing) -> Result<Box<dyn Camera>, ScanError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InversionMode {
    DontInvert,
    AttemptBoth,
}

pub trait Decoder: Send + Sync {
    fn decode(&self, rgba: &[u8], width: u32, height: u32, mode: InversionMode) -> Option<String>;
}

/// Shared cancellation flag checked once per loop iteration
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanCommand {
    Torch(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Streaming { torch_supported: bool },
    Preview(Frame),
    Found(String),
    Cancelled,
    Failed(ScanError),
}

/// What the scanner modal shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Idle,
    RequestingCamera,
    Streaming { torch_supported: bool },
    Found(String),
    Cancelled,
    CameraError(ScanError),
}

impl ScanState {
    /// Fold a worker event into the state; previews do not change it
    pub fn apply(&mut self, event: &ScanEvent) {
        let next = match event {
            ScanEvent::Streaming { torch_supported } => ScanState::Streaming {
                torch_supported: *torch_supported,
            },
            ScanEvent::Preview(_) => return,
            ScanEvent::Found(text) => ScanState::Found(text.clone()),
            ScanEvent::Cancelled => ScanState::Cancelled,
            ScanEvent::Failed(err) => ScanState::CameraError(err.clone()),
        };
        *self = next;
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Found(_) | ScanState::Cancelled | ScanState::CameraError(_))
    }
}

/// Owns the camera for the duration of a session
struct CameraGuard {
    camera: Box<dyn Camera>,
}

impl Drop for CameraGuard {
    fn drop(&mut self) {
        self.camera.stop();
        debug!("Camera released");
    }
}

/// Drive one scan session to its end; the camera is stopped before this returns.
/// `emit` returns false once nobody is listening, which ends the session.
pub fn run_session(
    provider: &dyn CameraProvider,
    decoder: &dyn Decoder,
    facing: Facing,
    cancel: &CancelToken,
    commands: &Receiver<ScanCommand>,
    emit: &dyn Fn(ScanEvent) -> bool,
) -> ScanEvent {
    if cancel.is_cancelled() {
        return ScanEvent::Cancelled;
    }

    let camera = match provider.open(facing) {
        Ok(camera) => camera,
        Err(err) => {
            warn!(error = %err, "Could not open camera");
            return ScanEvent::Failed(err);
        }
    };
    let mut guard = CameraGuard { camera };

    let torch_supported = guard.camera.supports_torch();
    info!(torch_supported, "Camera streaming");
    if !emit(ScanEvent::Streaming { torch_supported }) {
        return ScanEvent::Cancelled;
    }

    let mut frames: u64 = 0;
    loop {
        if cancel.is_cancelled() {
            info!(frames, "Scan cancelled");
            return ScanEvent::Cancelled;
        }

        while let Ok(command) = commands.try_recv() {
            match command {
                ScanCommand::Torch(on) => {
                    if let Err(err) = guard.camera.set_torch(on) {
                        warn!(on, error = %err, "Failed to switch torch");
                    }
                }
            }
        }

        match guard.camera.poll_frame() {
            Ok(Some(frame)) => {
                frames += 1;
                if let Some(text) = decoder.decode(&frame.rgba, frame.width, frame.height, InversionMode::DontInvert) {
                    info!(frames, len = text.len(), "Decoded QR code from camera");
                    return ScanEvent::Found(text);
                }
                if frames % PREVIEW_EVERY_N_FRAMES == 1 && !emit(ScanEvent::Preview(frame)) {
                    return ScanEvent::Cancelled;
                }
            }
            Ok(None) => thread::sleep(Duration::from_millis(IDLE_POLL_MS)),
            Err(err) => {
                warn!(frames, error = %err, "Camera capture failed");
                return ScanEvent::Failed(err);
            }
        }
    }
}

pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Handle to a running session; dropping it cancels and joins the worker
pub struct ScannerHandle {
    cancel: CancelToken,
    commands: Sender<ScanCommand>,
    events: Receiver<ScanEvent>,
    worker: Option<JoinHandle<()>>,
}

impl ScannerHandle {
    /// Start a session. `wake` runs after every event so the UI can repaint.
    pub fn spawn(
        provider: Arc<dyn CameraProvider>,
        decoder: Arc<dyn Decoder>,
        facing: Facing,
        wake: Waker,
    ) -> Result<Self> {
        let cancel = CancelToken::new();
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let token = cancel.clone();
        let worker = thread::Builder::new()
            .name("qr-scanner".into())
            .spawn(move || {
                let emit = |event: ScanEvent| {
                    let delivered = event_tx.send(event).is_ok();
                    wake();
                    delivered
                };
                let outcome = run_session(
                    provider.as_ref(),
                    decoder.as_ref(),
                    facing,
                    &token,
                    &command_rx,
                    &emit,
                );
                emit(outcome);
            })
            .context("Failed to spawn scanner thread")?;

        Ok(Self {
            cancel,
            commands: command_tx,
            events: event_rx,
            worker: Some(worker),
        })
    }

    pub fn set_torch(&self, on: bool) {
        if self.commands.send(ScanCommand::Torch(on)).is_err() {
            debug!("Torch toggle after scanner finished");
        }
    }

    /// Drain pending events without blocking
    pub fn poll_events(&self) -> Vec<ScanEvent> {
        self.events.try_iter().collect()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel and wait for the camera to be released
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Scanner thread panicked");
            }
        }
    }
}

impl Drop for ScannerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Probe {
        stopped: AtomicUsize,
        polled: AtomicUsize,
        decoded: AtomicUsize,
        torch: Mutex<Vec<bool>>,
    }

    struct FakeCamera {
        probe: Arc<Probe>,
        fail_at: Option<usize>,
        torch: bool,
    }

    impl Camera for FakeCamera {
        fn poll_frame(&mut self) -> Result<Option<Frame>, ScanError> {
            let n = self.probe.polled.fetch_add(1, Ordering::SeqCst) + 1;
            if Some(n) == self.fail_at {
                return Err(ScanError::Capture("unplugged".into()));
            }
            Ok(Some(Frame { width: 2, height: 2, rgba: vec![n as u8; 16] }))
        }

        fn supports_torch(&self) -> bool {
            self.torch
        }

        fn set_torch(&mut self, on: bool) -> Result<(), ScanError> {
            self.probe.torch.lock().unwrap().push(on);
            Err(ScanError::Capture("no flash".into()))
        }

        fn stop(&mut self) {
            self.probe.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeProvider {
        probe: Arc<Probe>,
        fail_at: Option<usize>,
        deny: bool,
    }

    impl CameraProvider for FakeProvider {
        fn open(&self, _facing: Facing) -> Result<Box<dyn Camera>, ScanError> {
            if self.deny {
                return Err(ScanError::PermissionDenied("/dev/video0".into()));
            }
            Ok(Box::new(FakeCamera { probe: self.probe.clone(), fail_at: self.fail_at, torch: true }))
        }
    }

    /// Succeeds on the nth call, or never
    struct NthDecoder {
        probe: Arc<Probe>,
        succeed_on: Option<usize>,
    }

    impl Decoder for NthDecoder {
        fn decode(&self, _rgba: &[u8], _w: u32, _h: u32, mode: InversionMode) -> Option<String> {
            assert_eq!(mode, InversionMode::DontInvert);
            let n = self.probe.decoded.fetch_add(1, Ordering::SeqCst) + 1;
            (Some(n) == self.succeed_on).then(|| "https://example.com/scanned".to_string())
        }
    }

    fn setup(fail_at: Option<usize>, succeed_on: Option<usize>, deny: bool) -> (FakeProvider, NthDecoder, Arc<Probe>) {
        let probe = Arc::new(Probe::default());
        (
            FakeProvider { probe: probe.clone(), fail_at, deny },
            NthDecoder { probe: probe.clone(), succeed_on },
            probe,
        )
    }

    #[test]
    fn test_fifth_frame_decodes_once_and_releases_camera() {
        let (provider, decoder, probe) = setup(None, Some(5), false);
        let (_cmd_tx, cmd_rx) = mpsc::channel();
        let (tx, rx) = mpsc::channel();
        let emit = |e: ScanEvent| tx.send(e).is_ok();

        let outcome = run_session(&provider, &decoder, Facing::Environment, &CancelToken::new(), &cmd_rx, &emit);

        assert_eq!(outcome, ScanEvent::Found("https://example.com/scanned".into()));
        assert_eq!(probe.decoded.load(Ordering::SeqCst), 5);
        assert_eq!(probe.stopped.load(Ordering::SeqCst), 1);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events[0], ScanEvent::Streaming { torch_supported: true });
        assert!(!events.iter().any(|e| matches!(e, ScanEvent::Found(_))));
    }

    #[test]
    fn test_capture_error_releases_camera() {
        let (provider, decoder, probe) = setup(Some(3), None, false);
        let (_cmd_tx, cmd_rx) = mpsc::channel();
        let emit = |_: ScanEvent| true;

        let outcome = run_session(&provider, &decoder, Facing::Environment, &CancelToken::new(), &cmd_rx, &emit);

        assert!(matches!(outcome, ScanEvent::Failed(ScanError::Capture(_))));
        assert_eq!(probe.decoded.load(Ordering::SeqCst), 2);
        assert_eq!(probe.stopped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_permission_denied_is_camera_error() {
        let (provider, decoder, probe) = setup(None, None, true);
        let (_cmd_tx, cmd_rx) = mpsc::channel();
        let emit = |_: ScanEvent| true;

        let outcome = run_session(&provider, &decoder, Facing::User, &CancelToken::new(), &cmd_rx, &emit);
        let mut state = ScanState::RequestingCamera;
        state.apply(&outcome);

        assert!(matches!(state, ScanState::CameraError(ScanError::PermissionDenied(_))));
        assert!(state.is_terminal());
        assert_eq!(probe.polled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_torch_failure_is_not_fatal() {
        let (provider, decoder, probe) = setup(None, Some(3), false);
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let emit = |_: ScanEvent| true;
        cmd_tx.send(ScanCommand::Torch(true)).unwrap();

        let outcome = run_session(&provider, &decoder, Facing::Environment, &CancelToken::new(), &cmd_rx, &emit);

        assert!(matches!(outcome, ScanEvent::Found(_)));
        assert_eq!(*probe.torch.lock().unwrap(), vec![true]);
    }

    #[test]
    fn test_cancel_from_handle_releases_camera() {
        let (provider, decoder, probe) = setup(None, None, false);
        let handle = ScannerHandle::spawn(
            Arc::new(provider),
            Arc::new(decoder),
            Facing::Environment,
            Arc::new(|| {}),
        )
        .unwrap();

        while probe.polled.load(Ordering::SeqCst) < 3 {
            thread::sleep(Duration::from_millis(1));
        }
        handle.cancel();
        // Joining waits for the guard to drop
        let events = {
            let mut seen = Vec::new();
            loop {
                let batch = handle.poll_events();
                let done = batch.iter().any(|e| matches!(e, ScanEvent::Cancelled));
                seen.extend(batch);
                if done {
                    break seen;
                }
                thread::sleep(Duration::from_millis(1));
            }
        };
        handle.close();

        assert_eq!(probe.stopped.load(Ordering::SeqCst), 1);
        assert_eq!(events.iter().filter(|e| matches!(e, ScanEvent::Cancelled)).count(), 1);
    }

    #[test]
    fn test_handle_reports_found_exactly_once() {
        let (provider, decoder, probe) = setup(None, Some(5), false);
        let handle = ScannerHandle::spawn(
            Arc::new(provider),
            Arc::new(decoder),
            Facing::Environment,
            Arc::new(|| {}),
        )
        .unwrap();

        let mut found = Vec::new();
        while found.is_empty() {
            for event in handle.poll_events() {
                if let ScanEvent::Found(text) = event {
                    found.push(text);
                }
            }
            thread::sleep(Duration::from_millis(1));
        }
        handle.close();

        assert_eq!(found, vec!["https://example.com/scanned".to_string()]);
        assert_eq!(probe.decoded.load(Ordering::SeqCst), 5);
        assert_eq!(probe.stopped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_before_open_never_touches_camera() {
        let (provider, decoder, probe) = setup(None, None, false);
        let (_cmd_tx, cmd_rx) = mpsc::channel();
        let emit = |_: ScanEvent| true;
        let token = CancelToken::new();
        token.cancel();

        let outcome = run_session(&provider, &decoder, Facing::Environment, &token, &cmd_rx, &emit);
        assert_eq!(outcome, ScanEvent::Cancelled);
        assert_eq!(probe.stopped.load(Ordering::SeqCst), 0);
    }
}
