//! Document engine seam
//!
//! The viewer never touches a PDF library directly. It resolves a
//! [`DocumentBackend`] once through an [`Engine`] slot and talks to opened
//! documents through the narrow [`DocumentHandle`] / [`Rasterizer`] pair.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use super::error::{LoadError, RenderError};
use super::types::Raster;

/// Opens documents by URL
pub trait DocumentBackend: Send + Sync {
    fn open(&self, url: &str) -> Result<Arc<dyn DocumentHandle>, LoadError>;
}

/// A parsed document shared between the loader and render workers
pub trait DocumentHandle: Send + Sync {
    fn page_count(&self) -> usize;

    /// Create page access for one worker thread. Called on the worker itself,
    /// so implementations may hold non-`Send` library objects.
    fn rasterizer(&self) -> Result<Box<dyn Rasterizer>, String>;
}

/// Page access owned by a single render worker
pub trait Rasterizer {
    /// Rasterize a 1-based page at the given scale
    fn rasterize(&mut self, page: usize, scale: f32) -> Result<Raster, RenderError>;
}

type BackendInit = Box<dyn FnOnce() -> Result<Arc<dyn DocumentBackend>, String> + Send>;

/// Lifecycle of the engine slot
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineState {
    Pending,
    Ready,
    Failed(String),
}

/// Init-once holder for the document backend
pub struct Engine {
    init: Mutex<Option<BackendInit>>,
    slot: OnceLock<Result<Arc<dyn DocumentBackend>, String>>,
}

impl Engine {
    /// Engine that runs `init` on first use
    pub fn lazy<F>(init: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn DocumentBackend>, String> + Send + 'static,
    {
        Self {
            init: Mutex::new(Some(Box::new(init))),
            slot: OnceLock::new(),
        }
    }

    /// Engine with an already constructed backend
    pub fn ready(backend: Arc<dyn DocumentBackend>) -> Self {
        let slot = OnceLock::new();
        let _ = slot.set(Ok(backend));
        Self {
            init: Mutex::new(None),
            slot,
        }
    }

    /// MuPDF-backed engine
    #[cfg(feature = "pdf")]
    #[must_use]
    pub fn mupdf() -> Self {
        Self::lazy(|| {
            let backend = super::mupdf_backend::MupdfBackend::new()?;
            Ok(Arc::new(backend) as Arc<dyn DocumentBackend>)
        })
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        match self.slot.get() {
            None => EngineState::Pending,
            Some(Ok(_)) => EngineState::Ready,
            Some(Err(e)) => EngineState::Failed(e.clone()),
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self.slot.get(), Some(Ok(_)))
    }

    /// Resolve the backend, initialising it on first call
    pub fn ensure_loaded(&self) -> Result<Arc<dyn DocumentBackend>, LoadError> {
        let result = self.slot.get_or_init(|| {
            let init = self
                .init
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            match init {
                Some(init) => {
                    let result = init();
                    match &result {
                        Ok(_) => log::info!("Document engine ready"),
                        Err(e) => log::error!("Document engine failed to initialise: {e}"),
                    }
                    result
                }
                None => Err("engine initialiser already consumed".to_string()),
            }
        });

        result
            .as_ref()
            .map(Arc::clone)
            .map_err(|e| LoadError::EngineUnavailable(e.clone()))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct NullBackend;

    impl DocumentBackend for NullBackend {
        fn open(&self, _url: &str) -> Result<Arc<dyn DocumentHandle>, LoadError> {
            Err(LoadError::parse("null"))
        }
    }

    #[test]
    fn lazy_engine_initialises_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let engine = Engine::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullBackend) as Arc<dyn DocumentBackend>)
        });

        assert_eq!(engine.state(), EngineState::Pending);
        assert!(!engine.is_available());

        assert!(engine.ensure_loaded().is_ok());
        assert!(engine.ensure_loaded().is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.state(), EngineState::Ready);
        assert!(engine.is_available());
    }

    #[test]
    fn failed_engine_stays_failed() {
        let engine = Engine::lazy(|| Err("no library".to_string()));

        let err = engine.ensure_loaded().err();
        assert_eq!(
            err,
            Some(LoadError::EngineUnavailable("no library".to_string()))
        );
        assert_eq!(engine.state(), EngineState::Failed("no library".to_string()));
        assert!(engine.ensure_loaded().is_err());
    }

    #[test]
    fn ready_engine_is_available_immediately() {
        let engine = Engine::ready(Arc::new(NullBackend));
        assert!(engine.is_available());
    }
}
