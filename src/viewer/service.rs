//! Render service - manages worker pool, in-flight set and cache

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use flume::Sender;

use super::cache::RenderCache;
use super::engine::DocumentHandle;
use super::error::RenderError;
use super::request::{RenderRequest, RenderResponse, RequestId};
use super::types::{DocumentId, RenderedPage};
use super::worker::render_worker;
use super::{DEFAULT_JPEG_QUALITY, DEFAULT_RENDER_TIMEOUT, DEFAULT_WORKERS};

/// Worker pool configuration
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub workers: usize,
    pub jpeg_quality: u8,
    pub timeout: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }
}

#[derive(Debug)]
struct InFlight {
    id: RequestId,
    started: Instant,
}

/// What a render response meant for the session
#[derive(Debug)]
pub enum RenderOutcome {
    /// Response belongs to another document; dropped
    Stale,
    /// Page newly stored in the cache
    Rendered(Arc<RenderedPage>),
    /// Page was already cached; response dropped
    Duplicate(usize),
    /// The outstanding render for this page failed
    Failed(RenderError),
    /// Failure for a request that was already timed out or replaced
    Ignored(usize),
}

/// Renders pages of one document with worker threads and caches the results.
///
/// Lives for exactly one loaded document. Cache and in-flight set are only
/// touched by the owning thread; workers report back through the response
/// channel handed to [`RenderService::start`].
pub struct RenderService {
    doc: DocumentId,
    page_count: usize,
    scale: f32,
    request_tx: Sender<RenderRequest>,
    num_workers: usize,
    next_request_id: u64,
    in_flight: HashMap<usize, InFlight>,
    cache: RenderCache,
    timeout: Duration,
}

impl RenderService {
    /// Spawn workers for a freshly opened document
    pub fn start<E>(
        doc: DocumentId,
        handle: Arc<dyn DocumentHandle>,
        responses: Sender<E>,
        config: &RenderConfig,
        scale: f32,
    ) -> Self
    where
        E: From<RenderResponse> + Send + 'static,
    {
        // flume gives us MPMC: all workers pull from one request queue
        let (request_tx, request_rx) = flume::unbounded();
        let num_workers = config.workers.max(1);

        for n in 0..num_workers {
            let handle = handle.clone();
            let rx = request_rx.clone();
            let tx = responses.clone();
            let quality = config.jpeg_quality;

            let spawned = std::thread::Builder::new()
                .name(format!("folio-render-{n}"))
                .spawn(move || render_worker(handle, rx, tx, quality));
            if let Err(e) = spawned {
                log::error!("Failed to spawn render worker {n}: {e}");
            }
        }

        Self {
            doc,
            page_count: handle.page_count(),
            scale,
            request_tx,
            num_workers,
            next_request_id: 1,
            in_flight: HashMap::new(),
            cache: RenderCache::new(),
            timeout: config.timeout,
        }
    }

    #[must_use]
    pub fn document(&self) -> DocumentId {
        self.doc
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Scale for renders issued from now on. Cached pages are kept.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    /// Request a page unless it is out of range, cached or already in flight
    pub fn request_page(&mut self, page: usize) -> Option<RequestId> {
        if page == 0 || page > self.page_count {
            return None;
        }
        if self.cache.contains(page) || self.in_flight.contains_key(&page) {
            return None;
        }

        let id = self.next_id();
        let request = RenderRequest::Page {
            id,
            doc: self.doc,
            page,
            scale: self.scale,
        };
        if self.request_tx.send(request).is_err() {
            log::warn!("Render queue closed, dropping request for page {page}");
            return None;
        }

        log::debug!("Render requested: page {page} ({id:?})");
        self.in_flight.insert(
            page,
            InFlight {
                id,
                started: Instant::now(),
            },
        );
        Some(id)
    }

    /// Fold a worker response into the cache and in-flight set
    pub fn handle_response(&mut self, response: RenderResponse) -> RenderOutcome {
        if response.document() != self.doc {
            log::debug!(
                "Dropping render response for superseded document {:?}",
                response.document()
            );
            return RenderOutcome::Stale;
        }

        match response {
            RenderResponse::Page { data, .. } => {
                let page = data.page;
                self.in_flight.remove(&page);
                let (data, inserted) = self.cache.insert(data);
                if inserted {
                    RenderOutcome::Rendered(data)
                } else {
                    RenderOutcome::Duplicate(page)
                }
            }

            RenderResponse::Error { id, error, .. } => {
                let page = error.page_number();
                match self.in_flight.get(&page) {
                    Some(entry) if entry.id == id => {
                        self.in_flight.remove(&page);
                        RenderOutcome::Failed(error)
                    }
                    _ => RenderOutcome::Ignored(page),
                }
            }
        }
    }

    /// Evict renders that have been in flight longer than the timeout
    pub fn expire_stalled(&mut self, now: Instant) -> Vec<RenderError> {
        let timeout = self.timeout;
        let mut expired: Vec<usize> = self
            .in_flight
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.started) >= timeout)
            .map(|(page, _)| *page)
            .collect();
        expired.sort_unstable();

        expired
            .into_iter()
            .map(|page| {
                self.in_flight.remove(&page);
                log::warn!("Render of page {page} timed out after {timeout:?}");
                RenderError::Timeout { page }
            })
            .collect()
    }

    /// Earliest instant at which an in-flight render will time out
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.in_flight
            .values()
            .map(|entry| entry.started + self.timeout)
            .min()
    }

    #[must_use]
    pub fn is_page_cached(&self, page: usize) -> bool {
        self.cache.contains(page)
    }

    #[must_use]
    pub fn is_page_in_flight(&self, page: usize) -> bool {
        self.in_flight.contains_key(&page)
    }

    #[must_use]
    pub fn cached_page(&self, page: usize) -> Option<Arc<RenderedPage>> {
        self.cache.get(page)
    }

    #[must_use]
    pub fn cached_pages(&self) -> Vec<usize> {
        self.cache.pages()
    }

    #[must_use]
    pub fn in_flight_pages(&self) -> Vec<usize> {
        let mut pages: Vec<usize> = self.in_flight.keys().copied().collect();
        pages.sort_unstable();
        pages
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Shutdown all workers
    pub fn shutdown(&self) {
        for _ in 0..self.num_workers {
            let _ = self.request_tx.send(RenderRequest::Shutdown);
        }
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use flume::Receiver;

    use super::*;
    use crate::test_utils::FakeBackend;
    use crate::viewer::engine::DocumentBackend;

    fn service(pages: usize, backend: &FakeBackend) -> (RenderService, Receiver<RenderResponse>) {
        backend.add_document("doc.pdf", pages);
        let handle = backend.open("doc.pdf").expect("open");
        let (tx, rx) = flume::unbounded();
        let config = RenderConfig {
            workers: 1,
            ..RenderConfig::default()
        };
        (
            RenderService::start(DocumentId(1), handle, tx, &config, 2.0),
            rx,
        )
    }

    fn drain(service: &mut RenderService, rx: &Receiver<RenderResponse>) {
        while !service.is_idle() {
            let response = rx
                .recv_timeout(Duration::from_secs(5))
                .expect("render response");
            service.handle_response(response);
        }
    }

    #[test]
    fn out_of_range_requests_are_ignored() {
        let backend = FakeBackend::new();
        let (mut service, _rx) = service(3, &backend);

        assert!(service.request_page(0).is_none());
        assert!(service.request_page(4).is_none());
        assert!(service.is_idle());
    }

    #[test]
    fn duplicate_requests_while_in_flight_render_once() {
        let backend = FakeBackend::new();
        let gate = backend.hold_page("doc.pdf", 2);
        let (mut service, rx) = service(3, &backend);

        assert!(service.request_page(2).is_some());
        assert!(service.request_page(2).is_none());
        assert!(service.request_page(2).is_none());
        assert_eq!(service.in_flight_pages(), vec![2]);

        gate.release();
        drain(&mut service, &rx);

        assert!(service.is_page_cached(2));
        assert_eq!(backend.render_count("doc.pdf", 2), 1);
        assert!(service.request_page(2).is_none());
    }

    #[test]
    fn failed_render_leaves_page_uncached_and_retryable() {
        let backend = FakeBackend::new();
        backend.fail_page("doc.pdf", 3);
        let (mut service, rx) = service(5, &backend);

        service.request_page(3);
        let response = rx.recv_timeout(Duration::from_secs(5)).expect("response");
        let outcome = service.handle_response(response);

        assert!(matches!(outcome, RenderOutcome::Failed(RenderError::Page { page: 3, .. })));
        assert!(!service.is_page_cached(3));
        assert!(!service.is_page_in_flight(3));

        backend.heal_page("doc.pdf", 3);
        assert!(service.request_page(3).is_some());
        drain(&mut service, &rx);
        assert!(service.is_page_cached(3));
    }

    #[test]
    fn responses_for_other_documents_are_stale() {
        let backend = FakeBackend::new();
        let (mut service, _rx) = service(3, &backend);

        let foreign = RenderResponse::Page {
            id: RequestId::new(1),
            doc: DocumentId(99),
            data: Arc::new(RenderedPage {
                page: 1,
                width: 1,
                height: 1,
                scale_milli: 1000,
                jpeg: vec![],
            }),
        };

        assert!(matches!(service.handle_response(foreign), RenderOutcome::Stale));
        assert!(!service.is_page_cached(1));
    }

    #[test]
    fn stalled_render_times_out_and_can_be_retried() {
        let backend = FakeBackend::new();
        let gate = backend.hold_page("doc.pdf", 1);
        let (mut service, rx) = service(2, &backend);

        service.request_page(1);
        let later = Instant::now() + DEFAULT_RENDER_TIMEOUT + Duration::from_secs(1);
        let expired = service.expire_stalled(later);

        assert_eq!(expired, vec![RenderError::Timeout { page: 1 }]);
        assert!(!service.is_page_in_flight(1));

        // A late result for an uncached page is still accepted
        gate.release();
        let response = rx.recv_timeout(Duration::from_secs(5)).expect("response");
        assert!(matches!(
            service.handle_response(response),
            RenderOutcome::Rendered(_)
        ));
        assert!(service.is_page_cached(1));
    }
}
