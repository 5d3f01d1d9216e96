//! Keeps one engine per preview and paces style changes
//!
//! Text-only changes go straight to the engine. Any other change fades the
//! preview out and is applied once the transition delay has elapsed; a newer
//! change during that window replaces the pending one and restarts the timer.
//! Time is passed in explicitly so the state machine can be driven in tests.

use std::time::{Duration, Instant};

use tracing::{debug, error};

use super::{QrEngine, RenderError};
use crate::config::StyleConfig;
use crate::constants::timing::{FADE_IN_MS, STYLE_TRANSITION_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Stable,
    Transitioning,
}

#[derive(Debug, Clone)]
struct Pending {
    text: String,
    style: StyleConfig,
    due: Instant,
}

pub type EngineFactory<E> = Box<dyn Fn(&str, &StyleConfig) -> Result<E, RenderError> + Send>;

pub struct RendererAdapter<E: QrEngine> {
    factory: EngineFactory<E>,
    engine: Option<E>,
    applied_text: String,
    applied_style: Option<StyleConfig>,
    pending: Option<Pending>,
    /// Last input the engine rejected; not retried until the input changes
    failed: Option<(String, StyleConfig)>,
    transition: Duration,
    fade_in: Duration,
    landed_at: Option<Instant>,
    revision: u64,
    last_error: Option<String>,
}

impl<E: QrEngine> RendererAdapter<E> {
    pub fn new(factory: EngineFactory<E>) -> Self {
        Self {
            factory,
            engine: None,
            applied_text: String::new(),
            applied_style: None,
            pending: None,
            failed: None,
            transition: Duration::from_millis(STYLE_TRANSITION_MS),
            fade_in: Duration::from_millis(FADE_IN_MS),
            landed_at: None,
            revision: 0,
            last_error: None,
        }
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    /// Bumped whenever the engine raster changes
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn state(&self) -> AdapterState {
        if self.pending.is_some() {
            AdapterState::Transitioning
        } else {
            AdapterState::Stable
        }
    }

    /// Preview opacity: fades out while a change is pending, back in after it lands
    pub fn opacity(&self, now: Instant) -> f32 {
        if let Some(p) = &self.pending {
            let left = p.due.saturating_duration_since(now).as_secs_f32();
            return (left / self.transition.as_secs_f32().max(f32::EPSILON)).clamp(0.0, 1.0);
        }
        match self.landed_at {
            Some(at) if !self.fade_in.is_zero() => {
                (now.saturating_duration_since(at).as_secs_f32() / self.fade_in.as_secs_f32()).clamp(0.0, 1.0)
            }
            _ => 1.0,
        }
    }

    /// True while a frame should be scheduled to finish a transition or fade
    pub fn is_animating(&self, now: Instant) -> bool {
        self.pending.is_some() || self.opacity(now) < 1.0
    }

    /// Feed the latest text and style
    pub fn request(&mut self, text: &str, style: &StyleConfig, now: Instant) {
        if self.engine.is_none() {
            self.mount(text, style, now);
            return;
        }

        if let Some(pending) = &mut self.pending {
            if &pending.style == style {
                if pending.text != text {
                    pending.text = text.to_string();
                }
                return;
            }
        }

        if matches!(&self.failed, Some((t, s)) if t == text && s == style) {
            self.pending = None;
            return;
        }
        self.failed = None;

        let style_changed = self.applied_style.as_ref() != Some(style);
        if style_changed {
            debug!(delay_ms = self.transition.as_millis() as u64, "Style change scheduled");
            self.pending = Some(Pending {
                text: text.to_string(),
                style: style.clone(),
                due: now + self.transition,
            });
            return;
        }

        // A newer request reverted to the applied style
        self.pending = None;
        if text != self.applied_text {
            if let Some(engine) = self.engine.as_mut() {
                match engine.update_data(text) {
                    Ok(()) => {
                        self.applied_text = text.to_string();
                        self.revision += 1;
                        self.last_error = None;
                    }
                    Err(err) => self.record_error(err),
                }
            }
        }
    }

    /// Apply the pending change once it is due; returns true if the raster changed
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = matches!(&self.pending, Some(p) if p.due <= now);
        if !due {
            return false;
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };

        self.landed_at = Some(now);
        match engine.update(&pending.text, &pending.style) {
            Ok(()) => {
                self.applied_text = pending.text;
                self.applied_style = Some(pending.style);
                self.revision += 1;
                self.last_error = None;
                true
            }
            Err(err) => {
                self.record_error(err);
                self.failed = Some((pending.text, pending.style));
                false
            }
        }
    }

    fn mount(&mut self, text: &str, style: &StyleConfig, now: Instant) {
        match (self.factory)(text, style) {
            Ok(engine) => {
                debug!("Engine created");
                self.engine = Some(engine);
                self.applied_text = text.to_string();
                self.applied_style = Some(style.clone());
                self.landed_at = Some(now);
                self.revision += 1;
                self.last_error = None;
            }
            Err(err) => self.record_error(err),
        }
    }

    fn record_error(&mut self, err: RenderError) {
        error!(error = %err, "Render failed, keeping previous preview");
        self.last_error = Some(err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::style::DotType;
    use image::RgbaImage;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        created: AtomicUsize,
        reject_update: AtomicBool,
        full: Mutex<Vec<String>>,
        data: Mutex<Vec<String>>,
    }

    struct FakeEngine {
        calls: Arc<Calls>,
        raster: RgbaImage,
    }

    impl QrEngine for FakeEngine {
        fn update(&mut self, text: &str, _style: &StyleConfig) -> Result<(), RenderError> {
            self.calls.full.lock().unwrap().push(text.to_string());
            if self.calls.reject_update.load(Ordering::SeqCst) {
                return Err(RenderError::Encode("data too long".into()));
            }
            Ok(())
        }

        fn update_data(&mut self, text: &str) -> Result<(), RenderError> {
            self.calls.data.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn raster(&self) -> &RgbaImage {
            &self.raster
        }

        fn margin(&self) -> u32 {
            0
        }

        fn export_svg(&self) -> Result<String, RenderError> {
            Ok(String::new())
        }
    }

    fn adapter() -> (RendererAdapter<FakeEngine>, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let shared = calls.clone();
        let adapter = RendererAdapter::new(Box::new(move |_, _| {
            shared.created.fetch_add(1, Ordering::SeqCst);
            Ok(FakeEngine { calls: shared.clone(), raster: RgbaImage::new(1, 1) })
        }));
        (adapter, calls)
    }

    #[test]
    fn test_text_change_is_immediate() {
        let (mut a, calls) = adapter();
        let t0 = Instant::now();
        let style = StyleConfig::default();
        a.request("one", &style, t0);
        a.request("two", &style, t0);

        assert_eq!(a.state(), AdapterState::Stable);
        assert_eq!(*calls.data.lock().unwrap(), vec!["two".to_string()]);
        assert_eq!(a.revision(), 2);
    }

    #[test]
    fn test_style_change_waits_for_transition() {
        let (mut a, calls) = adapter();
        let t0 = Instant::now();
        let style = StyleConfig::default();
        a.request("x", &style, t0);

        let next = style.with_dots(|d| d.kind = DotType::Dots);
        a.request("x", &next, t0);
        assert_eq!(a.state(), AdapterState::Transitioning);
        assert!(!a.tick(t0 + Duration::from_millis(79)));
        assert!(calls.full.lock().unwrap().is_empty());
        assert!(a.opacity(t0 + Duration::from_millis(40)) < 1.0);

        assert!(a.tick(t0 + Duration::from_millis(80)));
        assert_eq!(a.state(), AdapterState::Stable);
        assert_eq!(calls.full.lock().unwrap().len(), 1);
        assert_eq!(a.opacity(t0 + Duration::from_millis(80)), 0.0);
        assert_eq!(a.opacity(t0 + Duration::from_millis(400)), 1.0);
    }

    #[test]
    fn test_latest_style_supersedes_and_restarts_timer() {
        let (mut a, calls) = adapter();
        let t0 = Instant::now();
        let style = StyleConfig::default();
        a.request("x", &style, t0);

        let first = style.with_dots(|d| d.kind = DotType::Dots);
        let second = style.with_dots(|d| d.kind = DotType::Classy);
        a.request("x", &first, t0);
        a.request("y", &second, t0 + Duration::from_millis(50));

        assert!(!a.tick(t0 + Duration::from_millis(100)));
        assert!(a.tick(t0 + Duration::from_millis(130)));
        assert_eq!(*calls.full.lock().unwrap(), vec!["y".to_string()]);
        assert_eq!(calls.created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_text_during_transition_rides_along() {
        let (mut a, calls) = adapter();
        let t0 = Instant::now();
        let style = StyleConfig::default();
        a.request("x", &style, t0);

        let next = style.with_dots(|d| d.kind = DotType::Dots);
        a.request("x", &next, t0);
        a.request("xy", &next, t0 + Duration::from_millis(10));
        a.tick(t0 + Duration::from_millis(80));

        assert!(calls.data.lock().unwrap().is_empty());
        assert_eq!(*calls.full.lock().unwrap(), vec!["xy".to_string()]);
    }

    #[test]
    fn test_reverting_style_cancels_pending() {
        let (mut a, calls) = adapter();
        let t0 = Instant::now();
        let style = StyleConfig::default();
        a.request("x", &style, t0);
        a.request("x", &style.with_dots(|d| d.kind = DotType::Dots), t0);
        a.request("x", &style, t0);

        assert_eq!(a.state(), AdapterState::Stable);
        assert!(!a.tick(t0 + Duration::from_secs(1)));
        assert!(calls.full.lock().unwrap().is_empty());
    }

    #[test]
    fn test_factory_error_is_recorded() {
        let mut a: RendererAdapter<FakeEngine> =
            RendererAdapter::new(Box::new(|_, _| Err(RenderError::Encode("too long".into()))));
        a.request("x", &StyleConfig::default(), Instant::now());
        assert!(a.engine().is_none());
        assert!(a.last_error().unwrap().contains("too long"));
    }

    #[test]
    fn test_rejected_style_is_not_retried() {
        let (mut a, calls) = adapter();
        calls.reject_update.store(true, Ordering::SeqCst);
        let t0 = Instant::now();
        let style = StyleConfig::default();
        a.request("x", &style, t0);
        let revision = a.revision();

        let next = style.with_dots(|d| d.kind = DotType::Dots);
        let frame = Duration::from_millis(16);
        let mut now = t0;
        for _ in 0..60 {
            a.request("x", &next, now);
            a.tick(now);
            now += frame;
        }

        assert_eq!(a.state(), AdapterState::Stable);
        assert_eq!(calls.full.lock().unwrap().len(), 1);
        assert!(!a.is_animating(now));
        assert_eq!(a.revision(), revision);
        assert!(a.engine().is_some());
        assert!(a.last_error().unwrap().contains("data too long"));
    }

    #[test]
    fn test_rejected_style_retried_after_text_edit() {
        let (mut a, calls) = adapter();
        calls.reject_update.store(true, Ordering::SeqCst);
        let t0 = Instant::now();
        let style = StyleConfig::default();
        a.request("long", &style, t0);

        let next = style.with_dots(|d| d.kind = DotType::Dots);
        a.request("long", &next, t0);
        assert!(!a.tick(t0 + Duration::from_millis(80)));

        calls.reject_update.store(false, Ordering::SeqCst);
        let t1 = t0 + Duration::from_millis(100);
        a.request("short", &next, t1);
        assert_eq!(a.state(), AdapterState::Transitioning);
        assert!(a.tick(t1 + Duration::from_millis(80)));
        assert_eq!(*calls.full.lock().unwrap(), vec!["long".to_string(), "short".to_string()]);
        assert!(a.last_error().is_none());
    }
}
