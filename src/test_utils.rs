//! In-memory collaborators for exercising the viewer without MuPDF or a
//! real display.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::notification::{Notifier, Toast};
use crate::viewer::{
    DocumentBackend, DocumentHandle, Engine, FullscreenPlatform, LoadError, PdfViewer,
    PlatformError, Raster, RenderConfig, RenderError, Rasterizer, ViewerConfig,
};

/// Longest a gate will block before letting work through anyway, so a
/// forgotten `release` fails a test instead of hanging it
const GATE_LIMIT: Duration = Duration::from_secs(10);

/// One-shot latch used to hold a load or render in flight
#[derive(Clone, Default)]
pub struct Gate {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn wait(&self) {
        let (lock, cvar) = &*self.inner;
        let deadline = Instant::now() + GATE_LIMIT;
        let mut released = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !*released {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            released = cvar
                .wait_timeout(released, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

#[derive(Clone, Copy)]
struct FakeDoc {
    pages: usize,
    width: u32,
    height: u32,
}

#[derive(Default)]
struct FakeState {
    docs: HashMap<String, FakeDoc>,
    failing: HashSet<(String, usize)>,
    held_pages: HashMap<(String, usize), Gate>,
    held_opens: HashMap<String, Gate>,
    renders: HashMap<(String, usize), usize>,
    opens: HashMap<String, usize>,
}

/// Document backend serving synthetic documents from memory
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a document of `pages` 10x14 pages
    pub fn add_document(&self, url: &str, pages: usize) {
        self.add_document_sized(url, pages, 10, 14);
    }

    /// Register a document whose pages rasterize to `width`x`height` at scale 1
    pub fn add_document_sized(&self, url: &str, pages: usize, width: u32, height: u32) {
        self.lock().docs.insert(
            url.to_string(),
            FakeDoc {
                pages,
                width,
                height,
            },
        );
    }

    /// Make every render of a page fail
    pub fn fail_page(&self, url: &str, page: usize) {
        self.lock().failing.insert((url.to_string(), page));
    }

    pub fn heal_page(&self, url: &str, page: usize) {
        self.lock().failing.remove(&(url.to_string(), page));
    }

    /// Block renders of a page until the returned gate is released
    pub fn hold_page(&self, url: &str, page: usize) -> Gate {
        let gate = Gate::new();
        self.lock()
            .held_pages
            .insert((url.to_string(), page), gate.clone());
        gate
    }

    /// Block opening a document until the returned gate is released
    pub fn hold_open(&self, url: &str) -> Gate {
        let gate = Gate::new();
        self.lock().held_opens.insert(url.to_string(), gate.clone());
        gate
    }

    /// Number of rasterizations attempted for a page
    pub fn render_count(&self, url: &str, page: usize) -> usize {
        self.lock()
            .renders
            .get(&(url.to_string(), page))
            .copied()
            .unwrap_or(0)
    }

    /// Rasterizations attempted for any page of a document
    pub fn total_renders(&self, url: &str) -> usize {
        self.lock()
            .renders
            .iter()
            .filter(|((u, _), _)| u == url)
            .map(|(_, count)| *count)
            .sum()
    }

    pub fn open_count(&self, url: &str) -> usize {
        self.lock().opens.get(url).copied().unwrap_or(0)
    }

    /// Engine wrapping this backend
    pub fn engine(&self) -> Arc<Engine> {
        Arc::new(Engine::ready(Arc::new(self.clone())))
    }
}

impl DocumentBackend for FakeBackend {
    fn open(&self, url: &str) -> Result<Arc<dyn DocumentHandle>, LoadError> {
        let gate = self.lock().held_opens.get(url).cloned();
        if let Some(gate) = gate {
            gate.wait();
        }

        let mut state = self.lock();
        *state.opens.entry(url.to_string()).or_default() += 1;
        let doc = state
            .docs
            .get(url)
            .copied()
            .ok_or_else(|| LoadError::parse(format!("{url}: not a PDF")))?;

        Ok(Arc::new(FakeHandle {
            url: url.to_string(),
            doc,
            backend: self.clone(),
        }))
    }
}

struct FakeHandle {
    url: String,
    doc: FakeDoc,
    backend: FakeBackend,
}

impl DocumentHandle for FakeHandle {
    fn page_count(&self) -> usize {
        self.doc.pages
    }

    fn rasterizer(&self) -> Result<Box<dyn Rasterizer>, String> {
        Ok(Box::new(FakeRasterizer {
            url: self.url.clone(),
            doc: self.doc,
            backend: self.backend.clone(),
        }))
    }
}

struct FakeRasterizer {
    url: String,
    doc: FakeDoc,
    backend: FakeBackend,
}

impl Rasterizer for FakeRasterizer {
    fn rasterize(&mut self, page: usize, scale: f32) -> Result<Raster, RenderError> {
        let key = (self.url.clone(), page);
        let gate = self.backend.lock().held_pages.get(&key).cloned();
        if let Some(gate) = gate {
            gate.wait();
        }

        let mut state = self.backend.lock();
        *state.renders.entry(key.clone()).or_default() += 1;
        if state.failing.contains(&key) {
            return Err(RenderError::page(page, "corrupt page stream"));
        }
        if page == 0 || page > self.doc.pages {
            return Err(RenderError::page(page, "no such page"));
        }
        drop(state);

        let width = ((self.doc.width as f32 * scale).round() as u32).max(1);
        let height = ((self.doc.height as f32 * scale).round() as u32).max(1);
        let shade = (page % 256) as u8;
        Ok(Raster {
            pixels: vec![shade; (width * height * 3) as usize],
            width,
            height,
        })
    }
}

/// Notifier that keeps every toast
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, toast: Toast) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(toast);
    }
}

#[derive(Default)]
struct FullscreenState {
    active: bool,
    reject: bool,
}

/// Fullscreen platform whose state tests can flip from outside
#[derive(Clone, Default)]
pub struct FakeFullscreen {
    state: Arc<Mutex<FullscreenState>>,
}

impl FakeFullscreen {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FullscreenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reject_requests(&self, reject: bool) {
        self.lock().reject = reject;
    }

    /// Simulate the user leaving fullscreen with a system key
    pub fn leave_externally(&self) {
        self.lock().active = false;
    }

    pub fn enter_externally(&self) {
        self.lock().active = true;
    }
}

impl FullscreenPlatform for FakeFullscreen {
    fn request_fullscreen(&mut self) -> Result<(), PlatformError> {
        let mut state = self.lock();
        if state.reject {
            return Err(PlatformError("request denied".to_string()));
        }
        state.active = true;
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), PlatformError> {
        let mut state = self.lock();
        if state.reject {
            return Err(PlatformError("request denied".to_string()));
        }
        state.active = false;
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        self.lock().active
    }
}

/// Viewer wired to fakes. The slideshow interval is long enough that tests
/// deliver ticks themselves.
pub struct TestViewer {
    pub viewer: PdfViewer,
    pub backend: FakeBackend,
    pub notifier: RecordingNotifier,
    pub fullscreen: FakeFullscreen,
}

impl TestViewer {
    pub fn new(backend: &FakeBackend) -> Self {
        Self::with_config(backend, test_config())
    }

    pub fn with_config(backend: &FakeBackend, config: ViewerConfig) -> Self {
        let notifier = RecordingNotifier::new();
        let fullscreen = FakeFullscreen::new();
        let viewer = PdfViewer::new(
            backend.engine(),
            config,
            Box::new(fullscreen.clone()),
            Box::new(notifier.clone()),
        );
        Self {
            viewer,
            backend: backend.clone(),
            notifier,
            fullscreen,
        }
    }
}

pub fn test_config() -> ViewerConfig {
    ViewerConfig {
        slideshow_interval: Duration::from_secs(3600),
        render: RenderConfig {
            workers: 2,
            ..RenderConfig::default()
        },
        ..ViewerConfig::default()
    }
}

/// How long tests wait for background work
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);
