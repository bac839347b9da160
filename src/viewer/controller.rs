//! The viewer: one document, one event loop
//!
//! `PdfViewer` owns every piece of viewer state. Background work (loading,
//! rendering, slideshow ticks) reports back as [`ViewerEvent`]s on a single
//! channel; the owning thread folds them in with [`PdfViewer::pump`] or
//! [`PdfViewer::wait_event`]. Subscribers receive a fresh
//! [`ViewerSnapshot`] whenever something visible changed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender};

use super::engine::{DocumentHandle, Engine};
use super::error::{LoadError, RenderError};
use super::event::{ViewerEvent, ViewerSnapshot, ViewerUpdate};
use super::input::{Key, KeyOutcome, SwipeTracker, ViewerCommand, route_key};
use super::loader::{spawn_load, validate_url};
use super::navigation::{NavCommand, NavEffect, Navigator};
use super::presentation::{FullscreenPlatform, Presentation, PresentationMode};
use super::scale::DisplayMetrics;
use super::service::{RenderConfig, RenderOutcome, RenderService};
use super::slideshow::{Slideshow, SlideshowState, SlideshowTick, TickAction};
use super::types::{DocumentId, RenderedPage};
use super::{
    DEFAULT_MAX_RENDER_SCALE, DEFAULT_PREFETCH_RADIUS, DEFAULT_SLIDESHOW_INTERVAL,
    DEFAULT_SWIPE_THRESHOLD,
};
use crate::notification::{Notifier, Toast};
use crate::settings::Settings;

/// Runtime configuration of a viewer
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub slideshow_interval: Duration,
    pub auto_start_slideshow: bool,
    pub swipe_threshold: f32,
    pub prefetch_radius: usize,
    pub max_render_scale: f32,
    pub render: RenderConfig,
    pub display: DisplayMetrics,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            slideshow_interval: DEFAULT_SLIDESHOW_INTERVAL,
            auto_start_slideshow: false,
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            prefetch_radius: DEFAULT_PREFETCH_RADIUS,
            max_render_scale: DEFAULT_MAX_RENDER_SCALE,
            render: RenderConfig::default(),
            display: DisplayMetrics::default(),
        }
    }
}

impl From<&Settings> for ViewerConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            slideshow_interval: Duration::from_secs(settings.slideshow_interval_secs.max(1)),
            auto_start_slideshow: settings.auto_start_slideshow,
            swipe_threshold: settings.swipe_threshold_px,
            prefetch_radius: settings.prefetch_radius,
            max_render_scale: settings.max_render_scale,
            render: RenderConfig {
                workers: settings.render_workers.max(1),
                jpeg_quality: settings.jpeg_quality,
                timeout: Duration::from_secs(settings.render_timeout_secs.max(1)),
            },
            display: DisplayMetrics::default(),
        }
    }
}

/// Page-at-a-time PDF viewer core
pub struct PdfViewer {
    config: ViewerConfig,
    engine: Arc<Engine>,
    events_tx: Sender<ViewerEvent>,
    events_rx: Receiver<ViewerEvent>,

    doc: DocumentId,
    url: Option<String>,
    pending_load: bool,
    session: Option<RenderService>,

    nav: Navigator,
    displayed: Option<Arc<RenderedPage>>,
    loading: bool,
    error: Option<String>,

    slideshow: Slideshow,
    presentation: Presentation,
    swipe: SwipeTracker,
    display: DisplayMetrics,

    notifier: Box<dyn Notifier>,
    on_close: Option<Box<dyn FnMut()>>,
    subscribers: Vec<Sender<ViewerUpdate>>,
    last_published: ViewerSnapshot,
}

impl PdfViewer {
    pub fn new(
        engine: Arc<Engine>,
        config: ViewerConfig,
        platform: Box<dyn FullscreenPlatform>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let (events_tx, events_rx) = flume::unbounded();

        Self {
            nav: Navigator::new(config.prefetch_radius),
            slideshow: Slideshow::new(config.slideshow_interval),
            swipe: SwipeTracker::new(config.swipe_threshold),
            display: config.display,
            presentation: Presentation::new(platform),
            config,
            engine,
            events_tx,
            events_rx,
            doc: DocumentId(0),
            url: None,
            pending_load: false,
            session: None,
            displayed: None,
            loading: false,
            error: None,
            notifier,
            on_close: None,
            subscribers: Vec::new(),
            last_published: ViewerSnapshot::default(),
        }
    }

    /// Callback for Escape in windowed mode
    pub fn set_on_close(&mut self, on_close: impl FnMut() + 'static) {
        self.on_close = Some(Box::new(on_close));
    }

    /// Receive a snapshot every time visible state changes
    pub fn subscribe(&mut self) -> Receiver<ViewerUpdate> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Sender for platform notifications such as `FullscreenChanged`
    #[must_use]
    pub fn event_sender(&self) -> Sender<ViewerEvent> {
        self.events_tx.clone()
    }

    // ---------------------------------------------------------------------
    // Document lifecycle
    // ---------------------------------------------------------------------

    /// Start loading a document, superseding any load still in progress
    pub fn load(&mut self, url: &str) -> Result<(), LoadError> {
        self.doc = self.doc.next();
        self.teardown();

        let result = self.begin_load(url);
        if let Err(error) = &result {
            self.fail_load(error);
        }
        self.publish();
        result
    }

    /// Load the last accepted URL again. After a rejected blank URL there
    /// is nothing to reload and this fails with `InvalidInput`.
    pub fn reload(&mut self) -> Result<(), LoadError> {
        let url = self.url.clone().unwrap_or_default();
        self.load(&url)
    }

    /// Drop the current document, its cache and timers
    pub fn close_document(&mut self) {
        self.doc = self.doc.next();
        self.teardown();
        self.url = None;
        self.error = None;
        self.publish();
    }

    fn begin_load(&mut self, url: &str) -> Result<(), LoadError> {
        self.url = None;
        let url = validate_url(url)?.to_string();
        let backend = self.engine.ensure_loaded()?;

        self.url = Some(url.clone());
        self.pending_load = true;
        self.loading = true;
        self.error = None;
        spawn_load(backend, self.doc, url, self.events_tx.clone());
        Ok(())
    }

    fn teardown(&mut self) {
        self.slideshow.stop();
        self.session = None;
        self.nav.clear();
        self.displayed = None;
        self.pending_load = false;
        self.loading = false;
    }

    fn fail_load(&mut self, error: &LoadError) {
        self.pending_load = false;
        self.loading = false;
        self.error = Some(error.to_string());
        if !matches!(error, LoadError::InvalidInput) {
            self.notifier.notify(Toast::error(
                "Could not load document",
                format!("{error}. Check the URL or the server's CORS policy."),
            ));
        }
    }

    fn on_loaded(&mut self, doc: DocumentId, handle: Arc<dyn DocumentHandle>) {
        if doc != self.doc {
            log::debug!("Discarding superseded load {doc:?}");
            return;
        }

        let scale = self.display.render_scale(self.config.max_render_scale);
        let session = RenderService::start(
            doc,
            handle,
            self.events_tx.clone(),
            &self.config.render,
            scale,
        );
        let total = session.page_count();
        log::info!("Document ready: {total} pages, render scale {scale:.2}");

        self.session = Some(session);
        self.pending_load = false;
        self.loading = false;

        let effects = self.nav.reset(total);
        self.execute_effects(effects);

        if self.config.auto_start_slideshow {
            self.slideshow.start(total, &self.events_tx);
        }
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    pub fn go_to(&mut self, page: usize) {
        self.navigate(NavCommand::GoTo(page));
    }

    pub fn next(&mut self) {
        self.navigate(NavCommand::Next);
    }

    pub fn previous(&mut self) {
        self.navigate(NavCommand::Previous);
    }

    pub fn first(&mut self) {
        self.navigate(NavCommand::First);
    }

    pub fn last(&mut self) {
        self.navigate(NavCommand::Last);
    }

    fn navigate(&mut self, cmd: NavCommand) {
        let effects = self.nav.apply(cmd);
        self.execute_effects(effects);
        self.publish();
    }

    fn execute_effects(&mut self, effects: Vec<NavEffect>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        for effect in effects {
            match effect {
                NavEffect::Show(page) => {
                    if let Some(cached) = session.cached_page(page) {
                        self.displayed = Some(cached);
                        self.loading = false;
                    } else {
                        self.loading = true;
                        session.request_page(page);
                    }
                }
                NavEffect::Prefetch(page) => {
                    if session.request_page(page).is_some() {
                        log::debug!("Prefetching page {page}");
                    }
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Slideshow and presentation
    // ---------------------------------------------------------------------

    pub fn start_slideshow(&mut self) {
        self.slideshow.start(self.nav.total(), &self.events_tx);
        self.publish();
    }

    pub fn stop_slideshow(&mut self) {
        self.slideshow.stop();
        self.publish();
    }

    pub fn toggle_slideshow(&mut self) {
        self.slideshow.toggle(self.nav.total(), &self.events_tx);
        self.publish();
    }

    pub fn enter_presentation(&mut self) {
        if let Err(e) = self.presentation.enter() {
            log::warn!("{e}");
        }
        self.publish();
    }

    pub fn exit_presentation(&mut self) {
        let was_fullscreen = self.presentation.is_fullscreen();
        if let Err(e) = self.presentation.exit() {
            log::warn!("{e}");
        }
        self.stop_slideshow_if_left(was_fullscreen);
        self.publish();
    }

    pub fn toggle_presentation(&mut self) {
        let was_fullscreen = self.presentation.is_fullscreen();
        if let Err(e) = self.presentation.toggle() {
            log::warn!("{e}");
        }
        self.stop_slideshow_if_left(was_fullscreen);
        self.publish();
    }

    /// Leaving fullscreen, by any route, ends the slideshow
    fn stop_slideshow_if_left(&mut self, was_fullscreen: bool) {
        if was_fullscreen && !self.presentation.is_fullscreen() && self.slideshow.stop() {
            log::info!("Presentation ended, slideshow stopped");
        }
    }

    /// Change the display the pages are rendered for. Affects renders
    /// issued from now on; cached pages are kept.
    pub fn set_display(&mut self, display: DisplayMetrics) {
        self.display = display;
        let scale = display.render_scale(self.config.max_render_scale);
        if let Some(session) = self.session.as_mut() {
            session.set_scale(scale);
        }
    }

    // ---------------------------------------------------------------------
    // Input
    // ---------------------------------------------------------------------

    pub fn execute(&mut self, cmd: ViewerCommand) {
        match cmd {
            ViewerCommand::Next => self.next(),
            ViewerCommand::Previous => self.previous(),
            ViewerCommand::First => self.first(),
            ViewerCommand::Last => self.last(),
            ViewerCommand::GoTo(page) => self.go_to(page),
            ViewerCommand::TogglePresentation => self.toggle_presentation(),
            ViewerCommand::ExitPresentation => self.exit_presentation(),
            ViewerCommand::ToggleSlideshow => self.toggle_slideshow(),
            ViewerCommand::Close => self.request_close(),
        }
    }

    pub fn handle_key(&mut self, key: Key) -> KeyOutcome {
        let outcome = route_key(key, self.presentation.mode());
        if let Some(cmd) = outcome.command {
            self.execute(cmd);
        }
        outcome
    }

    pub fn touch_start(&mut self, x: f32) {
        self.swipe.touch_start(x);
    }

    pub fn touch_end(&mut self, x: f32) -> Option<ViewerCommand> {
        let cmd = self.swipe.touch_end(x)?;
        self.execute(cmd);
        Some(cmd)
    }

    fn request_close(&mut self) {
        if let Some(on_close) = self.on_close.as_mut() {
            on_close();
        }
        self.subscribers
            .retain(|tx| tx.send(ViewerUpdate::CloseRequested).is_ok());
    }

    // ---------------------------------------------------------------------
    // Event loop
    // ---------------------------------------------------------------------

    /// Process every queued event without blocking. Returns how many ran.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event);
            handled += 1;
        }
        self.expire_stalled_renders();
        self.publish();
        handled
    }

    /// Block up to `timeout` for one event, then drain the rest.
    /// Returns whether anything was processed.
    pub fn wait_event(&mut self, timeout: Duration) -> bool {
        let now = Instant::now();
        let timeout = self
            .session
            .as_ref()
            .and_then(RenderService::next_deadline)
            .map_or(timeout, |deadline| {
                timeout.min(deadline.saturating_duration_since(now))
            });

        let handled = match self.events_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.dispatch(event);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        };
        self.pump() > 0 || handled
    }

    /// Run the event loop until no load or render is outstanding.
    /// Returns false if `timeout` elapsed first.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        self.run_until(timeout, |viewer| !viewer.is_busy())
    }

    /// Run the event loop until `done` holds. Returns false on timeout.
    pub fn run_until(&mut self, timeout: Duration, done: impl Fn(&Self) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        self.pump();
        while !done(self) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            self.wait_event(remaining);
        }
        true
    }

    /// Feed one event into the viewer
    pub fn handle_event(&mut self, event: ViewerEvent) {
        self.dispatch(event);
        self.publish();
    }

    fn dispatch(&mut self, event: ViewerEvent) {
        match event {
            ViewerEvent::Loaded { doc, handle } => self.on_loaded(doc, handle),

            ViewerEvent::LoadFailed { doc, error } => {
                if doc == self.doc {
                    self.fail_load(&error);
                } else {
                    log::debug!("Ignoring failure of superseded load {doc:?}: {error}");
                }
            }

            ViewerEvent::Render(response) => self.on_render_response(response),

            ViewerEvent::SlideshowTick(tick) => self.on_slideshow_tick(tick),

            ViewerEvent::FullscreenChanged => {
                if self.presentation.on_fullscreen_changed() && self.slideshow.stop() {
                    log::info!("Fullscreen left externally, slideshow stopped");
                }
            }
        }
    }

    fn on_render_response(&mut self, response: super::request::RenderResponse) {
        let Some(session) = self.session.as_mut() else {
            log::debug!("Dropping render response with no open document");
            return;
        };

        match session.handle_response(response) {
            RenderOutcome::Rendered(data) => {
                log::debug!("Page {} rendered", data.page);
                if self.nav.current() == Some(data.page) {
                    self.displayed = Some(data);
                    self.loading = false;
                }
            }
            RenderOutcome::Failed(error) => self.on_render_error(&error),
            RenderOutcome::Stale => {}
            RenderOutcome::Duplicate(page) | RenderOutcome::Ignored(page) => {
                log::debug!("Redundant render response for page {page}");
            }
        }
    }

    fn on_render_error(&mut self, error: &RenderError) {
        log::warn!("Render failed: {error}");
        let page = error.page_number();
        if self.nav.current() == Some(page) {
            self.loading = false;
        }
        self.notifier.notify(Toast::error(
            "Render failed",
            format!("Could not render page {page}: {error}"),
        ));
    }

    fn on_slideshow_tick(&mut self, tick: SlideshowTick) {
        match self.slideshow.on_tick(tick, self.nav.is_last()) {
            TickAction::Advance => {
                let effects = self.nav.apply(NavCommand::Next);
                self.execute_effects(effects);
            }
            TickAction::Stop => log::info!("Slideshow reached the last page"),
            TickAction::Ignore => {}
        }
    }

    fn expire_stalled_renders(&mut self) {
        let expired = match self.session.as_mut() {
            Some(session) => session.expire_stalled(Instant::now()),
            None => return,
        };
        for error in expired {
            self.on_render_error(&error);
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        if snapshot == self.last_published {
            return;
        }
        self.last_published = snapshot.clone();
        self.subscribers
            .retain(|tx| tx.send(ViewerUpdate::Changed(snapshot.clone())).is_ok());
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> ViewerSnapshot {
        ViewerSnapshot {
            current_page: self.nav.current(),
            total_pages: self.nav.total(),
            displayed_page: self.displayed.as_ref().map(|p| p.page),
            loading: self.loading,
            error: self.error.clone(),
            presentation: self.presentation.mode(),
            slideshow: self.slideshow.state(),
        }
    }

    /// A load or a render is outstanding
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending_load || self.session.as_ref().is_some_and(|s| !s.is_idle())
    }

    #[must_use]
    pub fn current_page(&self) -> Option<usize> {
        self.nav.current()
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.nav.total()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Image currently on screen
    #[must_use]
    pub fn displayed_page(&self) -> Option<Arc<RenderedPage>> {
        self.displayed.clone()
    }

    #[must_use]
    pub fn cached_page(&self, page: usize) -> Option<Arc<RenderedPage>> {
        self.session.as_ref().and_then(|s| s.cached_page(page))
    }

    #[must_use]
    pub fn cached_pages(&self) -> Vec<usize> {
        self.session
            .as_ref()
            .map(RenderService::cached_pages)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn in_flight_pages(&self) -> Vec<usize> {
        self.session
            .as_ref()
            .map(RenderService::in_flight_pages)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn presentation_mode(&self) -> PresentationMode {
        self.presentation.mode()
    }

    #[must_use]
    pub fn slideshow_state(&self) -> SlideshowState {
        self.slideshow.state()
    }

    /// Id of the running slideshow timer, for hosts that drive ticks
    #[must_use]
    pub fn slideshow_tick(&self) -> Option<SlideshowTick> {
        self.slideshow.ticker_id().map(SlideshowTick)
    }

    #[must_use]
    pub fn display(&self) -> DisplayMetrics {
        self.display
    }

    #[must_use]
    pub fn render_scale(&self) -> f32 {
        self.display.render_scale(self.config.max_render_scale)
    }
}

impl std::fmt::Debug for PdfViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfViewer")
            .field("doc", &self.doc)
            .field("url", &self.url)
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}
