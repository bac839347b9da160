//! Slideshow auto-advance
//!
//! `Idle` / `Running` state machine. While running it owns a [`Ticker`]: a
//! thread posting [`SlideshowTick`]s into the viewer's event channel. Dropping
//! the ticker disconnects its stop channel and the thread exits, so a stopped
//! slideshow never leaks a timer.

use std::time::Duration;

use flume::{RecvTimeoutError, Sender};

/// Identifies one run of the slideshow; ticks from earlier runs are ignored
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickerId(pub u64);

/// Timer tick posted by a running slideshow
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlideshowTick(pub TickerId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SlideshowState {
    #[default]
    Idle,
    Running,
}

/// What the viewer should do with a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickAction {
    /// Tick from a cancelled run
    Ignore,
    Advance,
    /// Reached the last page; the slideshow is now idle
    Stop,
}

/// Cancellable repeating timer thread
#[derive(Debug)]
pub struct Ticker {
    id: TickerId,
    stop_tx: Sender<()>,
}

impl Ticker {
    pub fn spawn<E>(id: TickerId, interval: Duration, events: Sender<E>) -> std::io::Result<Self>
    where
        E: From<SlideshowTick> + Send + 'static,
    {
        let (stop_tx, stop_rx) = flume::bounded::<()>(1);

        std::thread::Builder::new()
            .name(format!("folio-slideshow-{}", id.0))
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if events.send(E::from(SlideshowTick(id))).is_err() {
                                break;
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        Ok(Self { id, stop_tx })
    }

    #[must_use]
    pub fn id(&self) -> TickerId {
        self.id
    }

    pub fn cancel(self) {
        let _ = self.stop_tx.try_send(());
    }
}

/// Slideshow state machine
#[derive(Debug)]
pub struct Slideshow {
    interval: Duration,
    next_id: u64,
    ticker: Option<Ticker>,
}

impl Slideshow {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_id: 1,
            ticker: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> SlideshowState {
        if self.ticker.is_some() {
            SlideshowState::Running
        } else {
            SlideshowState::Idle
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Id of the running ticker, if any
    #[must_use]
    pub fn ticker_id(&self) -> Option<TickerId> {
        self.ticker.as_ref().map(Ticker::id)
    }

    /// Start auto-advance. No-op for documents of at most one page or when
    /// already running. Returns whether a new run started.
    pub fn start<E>(&mut self, total_pages: usize, events: &Sender<E>) -> bool
    where
        E: From<SlideshowTick> + Send + 'static,
    {
        if total_pages <= 1 || self.is_running() {
            return false;
        }

        let id = TickerId(self.next_id);
        self.next_id += 1;

        match Ticker::spawn(id, self.interval, events.clone()) {
            Ok(ticker) => {
                log::info!("Slideshow started ({:?} per page)", self.interval);
                self.ticker = Some(ticker);
                true
            }
            Err(e) => {
                log::error!("Failed to start slideshow timer: {e}");
                false
            }
        }
    }

    /// Stop auto-advance from any state. Returns whether it was running.
    pub fn stop(&mut self) -> bool {
        match self.ticker.take() {
            Some(ticker) => {
                ticker.cancel();
                log::info!("Slideshow stopped");
                true
            }
            None => false,
        }
    }

    pub fn toggle<E>(&mut self, total_pages: usize, events: &Sender<E>)
    where
        E: From<SlideshowTick> + Send + 'static,
    {
        if self.is_running() {
            self.stop();
        } else {
            self.start(total_pages, events);
        }
    }

    /// Decide what a tick means given whether the viewer sits on the last page
    pub fn on_tick(&mut self, tick: SlideshowTick, at_last_page: bool) -> TickAction {
        if self.ticker_id() != Some(tick.0) {
            return TickAction::Ignore;
        }
        if at_last_page {
            self.stop();
            TickAction::Stop
        } else {
            TickAction::Advance
        }
    }
}
